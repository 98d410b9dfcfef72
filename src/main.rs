//! Volatility-bot: Coinglass volatility alerts for a Telegram channel.
//!
//! Single-binary Tokio application with two supervised duty cycles:
//! 1. Polls the volatility endpoint every minute and alerts once per symbol
//!    per day when a reading reaches the threshold
//! 2. Long-polls Telegram and answers `/start` and `/help`
//!
//! At local midnight the signal log is uploaded to the channel and the
//! per-day dedup set is cleared.

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use alerting::{
    AlertState, Clock, CommandListener, CommandRouter, Notifier, PollCycle, SharedAlertState,
    SignalLog, Supervisor, SystemClock,
};
use coinglass_client::CoinglassClient;
use common::ChatTransport;
use telegram_client::TelegramClient;

/// Coinglass volatility alert bot
#[derive(Parser)]
#[command(name = "volatility-bot", about = "Coinglass volatility alerts for Telegram")]
struct Cli {
    /// Check the Telegram token with getMe, then exit.
    #[arg(long)]
    check_auth: bool,

    /// Run a single poll cycle (reset check, fetch, alert) and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "volatility_bot=info,alerting=info,coinglass_client=info,telegram_client=info"
                    .into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("⚡ Volatility Bot starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let missing = config::missing_secrets(&cfg);
    if !missing.is_empty() {
        warn!(
            "Not set: {} (calls needing them will fail until configured)",
            missing.join(", ")
        );
    }

    let tz = match alerting::parse_timezone(&cfg.alerts.timezone) {
        Ok(tz) => tz,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Alerts: threshold≥{:.2}%, poll every {}s, tz={}, log={}",
        cfg.alerts.threshold, cfg.timing.poll_interval_secs, tz, cfg.alerts.log_file
    );
    info!(
        "Commands: echo={}, long_poll={}s, retry={}s",
        cfg.telegram.echo_unknown_text,
        cfg.telegram.long_poll_timeout_secs,
        cfg.timing.listener_retry_secs
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(tz));
    let log = SignalLog::new(&cfg.alerts.log_file, clock.clone());

    let telegram = match TelegramClient::new(&cfg.telegram_token, &cfg.telegram) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Telegram client init failed: {}", e);
            std::process::exit(1);
        }
    };

    // ── Check-auth mode ──────────────────────────────────────────────
    if cli.check_auth {
        info!("Running auth check...");
        match telegram.get_me().await {
            Ok(me) => info!(
                "✅ Telegram auth successful: @{} (id={})",
                me.username.unwrap_or_default(),
                me.id
            ),
            Err(e) => {
                error!("❌ Telegram auth check failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let coinglass = match CoinglassClient::new(&cfg.coinglass, cfg.coinglass_api_key.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Coinglass client init failed: {}", e);
            std::process::exit(1);
        }
    };

    // ── Shared state ─────────────────────────────────────────────────
    let transport: Arc<dyn ChatTransport> = telegram;
    let notifier = Notifier::new(transport.clone(), cfg.chat_id.clone(), log.clone());
    let state: SharedAlertState = Arc::new(Mutex::new(AlertState::new(
        cfg.alerts.threshold,
        clock.now().date_naive(),
    )));
    let poll = Arc::new(PollCycle::new(
        coinglass,
        notifier.clone(),
        log.clone(),
        clock.clone(),
        state,
        Duration::from_secs(cfg.timing.poll_interval_secs),
    ));

    // ── Single-cycle mode ────────────────────────────────────────────
    if cli.once {
        info!("Running a single poll cycle...");
        let report = poll.run_cycle().await;
        info!(
            "Cycle: fetched={} alerted={} failed={} ignored={} reset={} fetch_failed={}",
            report.fetched,
            report.alerted,
            report.failed,
            report.ignored,
            report.reset,
            report.fetch_failed
        );
        return;
    }

    // ── Spawn duty cycles ────────────────────────────────────────────
    info!("Spawning duty cycles...");

    let listener = Arc::new(CommandListener::new(
        transport,
        CommandRouter::with_defaults(cfg.telegram.echo_unknown_text),
        log.clone(),
        cfg.telegram.long_poll_timeout_secs,
        Duration::from_secs(cfg.timing.listener_retry_secs),
    ));

    let mut supervisor = Supervisor::new(Duration::from_secs(cfg.timing.error_backoff_secs));

    supervisor.spawn("command-listener", move |token| {
        let listener = listener.clone();
        async move { listener.run(token).await }
    });

    let poll_task = poll.clone();
    supervisor.spawn("poll-loop", move |token| {
        let poll = poll_task.clone();
        async move { poll.run(token).await }
    });

    notifier
        .announce_startup(cfg.alerts.startup_announcement)
        .await;

    // ── Wait for shutdown ────────────────────────────────────────────
    info!("🚀 Volatility Bot is running. Press Ctrl+C to stop.");

    supervisor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl+C ({}); running until killed", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await;

    log.append("Bot stopped.");
    info!("Volatility Bot shut down.");
}
