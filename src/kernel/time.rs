use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};

/// Logical cycle counter. Advanced once at the very start of every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick {
    pub frame: u64,
}

impl Tick {
    pub fn new() -> Self {
        Tick { frame: 0 }
    }

    pub fn next(&self) -> Self {
        Tick { frame: self.frame + 1 }
    }
}

/// Converts a loop frequency into the nominal period of one cycle.
pub fn period_for(hertz: f64) -> Duration {
    Duration::from_secs_f64(1.0 / hertz)
}

/// Owns the cadence of the cycle loop.
///
/// `force_immediate` may be called from any task (typically an input listener
/// reacting to something urgent). The override is consumed by exactly one
/// `wait`, whether that wait was already sleeping or starts later.
#[derive(Debug, Default)]
pub struct TickPacer {
    skip_next: AtomicBool,
    wake: Notify,
}

impl TickPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the override flag. Idempotent.
    pub fn force_immediate(&self) {
        self.skip_next.store(true, Ordering::SeqCst);
        // notify_waiters stores no permit, so the flag stays the single source of truth.
        self.wake.notify_waiters();
    }

    pub fn is_forced(&self) -> bool {
        self.skip_next.load(Ordering::SeqCst)
    }

    /// Suspends for `period` measured from now. Returns `true` when the
    /// override cut the wait short.
    pub async fn wait(&self, period: Duration) -> bool {
        self.wait_from(Instant::now(), period).await
    }

    /// Suspends until `cycle_start + period`.
    ///
    /// The deadline is anchored on the start of the cycle that just ran, so the
    /// time spent processing that cycle is absorbed by the wait instead of being
    /// added on top of it.
    pub async fn wait_from(&self, cycle_start: Instant, period: Duration) -> bool {
        let woken = self.wake.notified();
        tokio::pin!(woken);
        // Register interest before checking the flag so a concurrent force is never missed.
        woken.as_mut().enable();

        if self.skip_next.swap(false, Ordering::SeqCst) {
            return true;
        }

        let deadline = cycle_start + period;
        if deadline <= Instant::now() {
            return false;
        }

        tokio::select! {
            _ = sleep_until(deadline) => false,
            _ = &mut woken => {
                self.skip_next.store(false, Ordering::SeqCst);
                true
            }
        }
    }
}
