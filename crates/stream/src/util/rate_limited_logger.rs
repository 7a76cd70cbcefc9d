//! Rate-limited logging
//!
//! A stream sitting behind a dead sink retries every flush interval, and a
//! misbehaving producer can hand us oversized records in a tight loop. This
//! keeps either case from flooding the log: at most one line per interval,
//! carrying the number of events swallowed since the previous line.
//!
//! # Example
//!
//! ```
//! use logship_stream::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//!
//! for _ in 0..1000 {
//!     logger.warn("record dropped", &"too large");
//! }
//! assert_eq!(logger.total_count(), 1000);
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default minimum spacing between two emitted lines
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Logger that emits at most once per interval
#[derive(Debug)]
pub struct RateLimitedLogger {
    /// Minimum spacing between emitted lines
    min_interval: Duration,

    /// When the last line went out
    last_emit: Mutex<Option<Instant>>,

    /// Events since the last emitted line (including the emitted one)
    pending: AtomicU64,

    /// Events ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger with the given interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Count one event; if the interval has passed, return how many earlier
    /// events were suppressed and reset the window
    ///
    /// `None` means this event should not be logged.
    pub fn permit(&self) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let allowed = {
            let mut last = self.last_emit.lock();
            let now = Instant::now();
            match *last {
                Some(prev) if now.duration_since(prev) < self.min_interval => false,
                _ => {
                    *last = Some(now);
                    true
                }
            }
        };

        allowed.then(|| self.pending.swap(0, Ordering::Relaxed).saturating_sub(1))
    }

    /// Record an event and emit a `warn!` line if permitted
    ///
    /// Returns true if a line was emitted.
    pub fn warn(&self, message: &str, detail: &dyn Display) -> bool {
        let Some(suppressed) = self.permit() else {
            return false;
        };

        if suppressed > 0 {
            tracing::warn!(
                detail = %detail,
                suppressed_count = suppressed,
                total = self.total_count(),
                "{message} (rate-limited)"
            );
        } else {
            tracing::warn!(detail = %detail, total = self.total_count(), "{message}");
        }
        true
    }

    /// Record an event and emit an `error!` line if permitted
    ///
    /// Returns true if a line was emitted.
    pub fn error(&self, message: &str, error: &dyn Display) -> bool {
        let Some(suppressed) = self.permit() else {
            return false;
        };

        if suppressed > 0 {
            tracing::error!(
                error = %error,
                suppressed_count = suppressed,
                total = self.total_count(),
                "{message} (rate-limited)"
            );
        } else {
            tracing::error!(error = %error, total = self.total_count(), "{message}");
        }
        true
    }

    /// Events recorded since the last emitted line
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Events ever recorded
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
