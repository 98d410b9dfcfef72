//! Rate limiter for outbound Bot API sends.
//!
//! The platform allows roughly 20 messages per minute into a group chat.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Single bucket shared by every outbound send (messages and documents).
#[derive(Debug, Clone)]
pub struct RateLimiter {
    send_limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Create with the default group-chat allowance.
    pub fn new() -> Self {
        Self::per_minute(20)
    }

    /// Create with a custom per-minute allowance; zero is treated as one.
    pub fn per_minute(sends_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(sends_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            send_limiter: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a send slot is available.
    pub async fn wait_send(&self) {
        self.send_limiter.until_ready().await;
    }

    /// Try to acquire a send slot without waiting. Returns true if acquired.
    pub fn try_send(&self) -> bool {
        self.send_limiter.check().is_ok()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
