//! Outbound call ceiling

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};

/// Server-side ceiling on input messages per second
pub const INPUT_RATE_LIMIT: u32 = 30;

/// Hard ceiling on outbound input calls, independent of the send cadence.
/// Clones share one quota.
#[derive(Clone)]
pub struct OutboundLimiter {
    input: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OutboundLimiter {
    pub fn new() -> Self {
        Self::per_second(INPUT_RATE_LIMIT)
    }

    pub fn per_second(limit: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN));
        Self {
            input: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Whether another input call may go out now
    pub fn check_input(&self) -> bool {
        self.input.check().is_ok()
    }
}

impl Default for OutboundLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_ceiling_is_refused() {
        let limiter = OutboundLimiter::new();
        let allowed = (0..INPUT_RATE_LIMIT * 2)
            .filter(|_| limiter.check_input())
            .count();
        assert!(allowed >= 1);
        assert!(allowed <= INPUT_RATE_LIMIT as usize + 1);
    }

    #[test]
    fn clones_share_the_quota() {
        let limiter = OutboundLimiter::per_second(1);
        let clone = limiter.clone();
        assert!(limiter.check_input());
        assert!(!clone.check_input());
    }
}
