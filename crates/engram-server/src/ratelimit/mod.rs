//! Rate limiter (C8): per-principal sliding one-minute window, keyed by
//! `ratelimit:{auth.id}` (§4.8). Per-process only — §9 fixes this as a
//! deployment concern, not a core contract.

use dashmap::DashMap;
use std::sync::Mutex;

const WINDOW_MS: i64 = 60_000;

struct Window {
    count: u32,
    reset_at: i64,
}

/// Outcome of one `check` call: whether the request is allowed, plus the
/// headers the HTTP layer must emit on every response (§4.8, §6.2).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
    pub retry_after: Option<i64>,
}

pub struct RateLimiter {
    windows: DashMap<String, Mutex<Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Increments the counter for `key` and decides whether this request
    /// is within `limit` for the current window.
    pub fn check(&self, key: &str, limit: u32) -> RateLimitDecision {
        let now = engram_core::now();
        let entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| {
                Mutex::new(Window {
                    count: 0,
                    reset_at: now + WINDOW_MS,
                })
            });
        let mut window = entry.lock().expect("rate limit window mutex poisoned");

        if now >= window.reset_at {
            window.count = 1;
            window.reset_at = now + WINDOW_MS;
        } else {
            window.count += 1;
        }

        let allowed = window.count <= limit;
        let remaining = limit.saturating_sub(window.count);
        let reset_seconds = (window.reset_at + 999) / 1000;
        let retry_after = if allowed {
            None
        } else {
            Some(((window.reset_at - now).max(0) + 999) / 1000)
        };

        RateLimitDecision {
            allowed,
            limit,
            remaining,
            reset: reset_seconds,
            retry_after,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_limit_requests_succeed_then_429() {
        let limiter = RateLimiter::new();
        for _ in 0..2 {
            let decision = limiter.check("auth_1", 2);
            assert!(decision.allowed);
        }
        let third = limiter.check("auth_1", 2);
        assert!(!third.allowed);
        assert!(third.retry_after.unwrap() <= 60);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check("auth_2", 2);
        }
        let decision = limiter.check("auth_2", 2);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn different_keys_are_independent() {
        let limiter = RateLimiter::new();
        limiter.check("a", 1);
        let b = limiter.check("b", 1);
        assert!(b.allowed);
    }
}
