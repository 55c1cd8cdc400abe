//! Fixed-window inbound rate limiter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Length of one counting window.
pub const WINDOW: Duration = Duration::from_millis(1000);

/// Default number of messages processed per window.
pub const DEFAULT_MESSAGES_PER_WINDOW: u32 = 10;

/// Per-bridge counter, reset to zero at every window boundary.
#[derive(Debug)]
pub struct RateLimiter {
    threshold: u32,
    count: AtomicU32,
}

impl RateLimiter {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: AtomicU32::new(0),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Count one message. True iff the count before this call was below the threshold.
    pub fn admit(&self) -> bool {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_add(1)))
            .unwrap_or(u32::MAX);
        previous < self.threshold
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Messages counted in the current window, including dropped ones.
    pub fn current(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Reset `limiter` every [`WINDOW`] until the limiter is dropped or the task aborted.
pub fn spawn_reset_ticker(limiter: &Arc<RateLimiter>) -> JoinHandle<()> {
    let limiter: Weak<RateLimiter> = Arc::downgrade(limiter);
    // The first boundary is one window after the spawn, not after the first poll.
    let first_reset = Instant::now() + WINDOW;
    tokio::spawn(async move {
        let mut ticker = interval_at(first_reset, WINDOW);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match limiter.upgrade() {
                Some(limiter) => {
                    trace!(counted = limiter.current(), "Rate limit window reset");
                    limiter.reset();
                }
                None => break,
            }
        }
    })
}
