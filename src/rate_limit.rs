use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::metrics::RATE_LIMIT_SWEPT;

// Source of "now" in milliseconds since the epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Pre-epoch clocks are treated as the epoch
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

// Rate limit entry - attempts for one identifier in the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: u64, // ms since epoch
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Fixed-window attempt counter keyed by a caller-chosen identifier.
///
/// An entry whose window has passed is treated as absent by [`check`](Self::check)
/// even if the sweep has not removed it yet.
pub struct RateLimiter {
    store: DashMap<String, RateLimitEntry>,
    max_attempts: u32,
    window_ms: u64,
    sweep_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            // zero would make every first attempt underflow `remaining`
            max_attempts: config.max_attempts.max(1),
            window_ms: u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX),
            sweep_interval: config.sweep_interval,
            clock,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Records an attempt for `identifier` and reports whether it may proceed.
    ///
    /// Denied attempts are not counted and do not extend the window.
    pub fn check(&self, identifier: &str) -> Decision {
        let now = self.clock.now_ms();
        let fresh = RateLimitEntry {
            count: 1,
            reset_time: now.saturating_add(self.window_ms),
        };

        // The entry guard holds the shard write lock until it is dropped,
        // so the read-check-increment below is atomic per identifier.
        match self.store.entry(identifier.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                self.allowed(1)
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();

                // window expired..? start over
                if now > entry.reset_time {
                    *entry = fresh;
                    return self.allowed(1);
                }

                if entry.count >= self.max_attempts {
                    return Decision {
                        allowed: false,
                        remaining: 0,
                    };
                }

                entry.count += 1;
                self.allowed(entry.count)
            }
        }
    }

    fn allowed(&self, count: u32) -> Decision {
        Decision {
            allowed: true,
            remaining: self.max_attempts - count,
        }
    }

    pub fn reset(&self, identifier: &str) {
        self.store.remove(identifier);
    }

    /// Drops every entry whose window has passed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        // counted inside retain, len() moves under concurrent inserts
        let mut removed = 0;
        self.store.retain(|_, entry| {
            let keep = now <= entry.reset_time;
            if !keep {
                removed += 1;
            }
            keep
        });

        RATE_LIMIT_SWEPT.inc_by(removed as f64);
        removed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[cfg(test)]
    fn entry(&self, identifier: &str) -> Option<RateLimitEntry> {
        self.store.get(identifier).map(|e| *e)
    }

    // Sweeper - runs until the returned handle is stopped or dropped
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweepHandle {
        let limiter = Arc::clone(self);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(limiter.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately
            ticker.tick().await;

            tracing::info!(interval = ?limiter.sweep_interval, "Rate limit sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = limiter.len(), "Swept expired rate limit entries");
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Rate limit sweeper stopped");
        });

        SweepHandle {
            stop_tx,
            task: Some(task),
        }
    }
}

pub struct SweepHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Sweeper task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};

    // Clock that only moves when told to
    pub struct ManualClock {
        now: AtomicU64,
    }

    impl ManualClock {
        pub fn new(start_ms: u64) -> Self {
            Self {
                now: AtomicU64::new(start_ms),
            }
        }

        pub fn advance(&self, ms: u64) {
            self.now.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
