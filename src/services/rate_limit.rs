//! Best-effort cooldown limiter
//!
//! In-memory only; losing the state on restart just resets cooldowns.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug)]
struct RateLimitState {
    last_allowed: DateTime<Utc>,
    suppressed_count: u32,
}

/// Allows one action per key per cooldown window.
pub struct CooldownLimiter {
    cooldown: Duration,
    state: DashMap<String, RateLimitState>,
}

impl CooldownLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: DashMap::new(),
        }
    }

    /// `Ok(())` when allowed (and the window restarts), otherwise the time
    /// left until the key is allowed again.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> Result<(), Duration> {
        let mut entry = self
            .state
            .entry(key.to_string())
            .or_insert(RateLimitState {
                last_allowed: now - self.cooldown,
                suppressed_count: 0,
            });

        let elapsed = now - entry.last_allowed;
        if elapsed < self.cooldown {
            entry.suppressed_count += 1;
            debug!(
                "Rate limiting '{}' ({} suppressed)",
                key, entry.suppressed_count
            );
            return Err(self.cooldown - elapsed);
        }

        entry.last_allowed = now;
        entry.suppressed_count = 0;
        Ok(())
    }

    pub fn suppressed_count(&self, key: &str) -> u32 {
        self.state
            .get(key)
            .map(|s| s.suppressed_count)
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown() {
        let limiter = CooldownLimiter::new(Duration::seconds(60));
        let t0 = Utc::now();

        assert!(limiter.check("generate", t0).is_ok());
        let wait = limiter
            .check("generate", t0 + Duration::seconds(20))
            .unwrap_err();
        assert_eq!(wait, Duration::seconds(40));
        assert_eq!(limiter.suppressed_count("generate"), 1);

        // Other keys are independent.
        assert!(limiter.check("other", t0).is_ok());

        assert!(limiter.check("generate", t0 + Duration::seconds(60)).is_ok());
        assert_eq!(limiter.suppressed_count("generate"), 0);
    }

    #[test]
    fn test_reset() {
        let limiter = CooldownLimiter::new(Duration::seconds(60));
        let t0 = Utc::now();
        limiter.check("k", t0).unwrap();
        limiter.reset();
        assert!(limiter.check("k", t0).is_ok());
    }
}
