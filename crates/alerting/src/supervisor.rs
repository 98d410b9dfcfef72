//! Supervision of the long-running duty cycles.
//!
//! Each cycle runs in its own task. If it panics, or returns while the
//! supervisor is still live, it is respawned after a pause, so a failure in
//! one cycle never halts the other. Cancelling the shared token is the only
//! way to stop them.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Supervisor {
    token: CancellationToken,
    restart_delay: Duration,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    pub fn new(restart_delay: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            restart_delay,
            tasks: Vec::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Start a duty cycle. `factory` is called again for every restart.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, factory: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        let delay = self.restart_delay;

        let handle = tokio::spawn(async move {
            let mut restarts: u64 = 0;
            loop {
                let run = tokio::spawn(factory(token.clone()));
                match run.await {
                    Ok(()) if token.is_cancelled() => break,
                    Ok(()) => warn!("{} exited unexpectedly", name),
                    Err(e) if e.is_panic() => error!("{} panicked", name),
                    Err(e) => error!("{} task failed: {}", name, e),
                }

                restarts = restarts.saturating_add(1);
                warn!("Restarting {} in {:?} (restart #{})", name, delay, restarts);
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(delay) => {}
                }
            }
            info!("{} stopped", name);
        });

        self.tasks.push((name, handle));
    }

    /// Park until `shutdown` resolves, then cancel every cycle and wait for
    /// them to finish.
    pub async fn run_until<S>(self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        shutdown.await;
        info!("Shutting down {} duty cycles", self.tasks.len());
        self.token.cancel();

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                error!("Supervisor for {} failed: {}", name, e);
            }
        }
    }
}
