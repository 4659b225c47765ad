//! Minimal rate limiter for the poll loop.
//!
//! A capacity-1 token bucket refilled every `period`: exactly what a
//! single-consumer poll loop needs, without pulling in a general-purpose
//! scheduling library. The bucket starts full, so the first wait is granted
//! immediately after `open`.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Returned when a wait was cancelled before the tick was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Capacity-1 token bucket with a cancellable blocking wait.
#[derive(Debug)]
pub struct IntervalLimiter {
    period: Duration,
    next_tick: Instant,
}

impl IntervalLimiter {
    pub fn new(period: Duration) -> Self {
        IntervalLimiter {
            period,
            // Starts full: the first wait completes without sleeping.
            next_tick: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Suspend until the next tick is due, or until `cancel` fires.
    ///
    /// A cancelled wait does not consume the tick: calling `wait` again
    /// afterwards behaves as if the cancelled call never happened, and the
    /// tick fires at its originally scheduled time. A token that is already
    /// cancelled on entry returns [`Cancelled`] without consulting the clock.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        tokio::select! {
            // Biased so a pre-cancelled token wins over an already-due tick.
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            _ = sleep_until(self.next_tick) => {
                self.next_tick = Instant::now() + self.period;
                Ok(())
            }
        }
    }
}
