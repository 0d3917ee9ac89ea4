use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_per_window: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_window: 5,
            window: Duration::seconds(60),
        }
    }
}

/// Per-customer sliding-window rate limiter.
///
/// History is keyed by customer id and holds only timestamps of previously
/// admitted requests. Entries are pruned lazily on every admission check,
/// never by a background sweep, so behavior is reproducible against the
/// timestamps carried in the records themselves.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    admitted: DashMap<String, Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            admitted: DashMap::new(),
        }
    }

    /// Limiter allowing `max_per_window` admissions per key per minute.
    pub fn per_minute(max_per_window: usize) -> Self {
        Self::new(RateLimitConfig {
            max_per_window,
            window: Duration::seconds(60),
        })
    }

    /// Decides admission for `key` at the moment the request logically
    /// occurred. The window is measured from `at`, not from the wall clock;
    /// a stored timestamp exactly one window old still counts against the
    /// limit. Prunes stale history and appends `at` only when admitted.
    ///
    /// The dashmap entry guard holds exclusive access to the key's history
    /// for the whole prune-then-append sequence, so two concurrent calls for
    /// one key cannot both be admitted past the limit.
    pub fn admit(&self, key: &str, at: DateTime<Utc>) -> bool {
        let window_start = at - self.config.window;

        let mut history = self.admitted.entry(key.to_string()).or_default();
        history.retain(|&t| t >= window_start);

        if history.len() < self.config.max_per_window {
            history.push(at);
            true
        } else {
            false
        }
    }

    /// Admissions left for `key` within the trailing window measured from the
    /// current wall clock — unlike `admit`, which measures from the supplied
    /// timestamp. Read-only: stored history is not pruned or extended.
    pub fn remaining(&self, key: &str) -> usize {
        let window_start = Utc::now() - self.config.window;

        let in_window = self
            .admitted
            .get(key)
            .map(|history| history.iter().filter(|&&t| t >= window_start).count())
            .unwrap_or(0);

        self.config.max_per_window.saturating_sub(in_window)
    }
}
