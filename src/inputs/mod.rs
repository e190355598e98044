//! Perception side of the loop.
//!
//! Each configured source runs its own `InputListener` task that writes into a
//! single-writer latest-value buffer. The cycle reads those buffers through
//! `InputProvider` at its own cadence and never waits on a listener.

pub mod buffer;
pub mod console;
pub mod supervisor;

use std::sync::Arc;

use async_trait::async_trait;

pub use buffer::{InputBuffer, InputHandle, Reading, SourceStatus};
pub use console::ConsoleListener;
pub use supervisor::ListenerSupervisor;

/// Read side of an input source, consumed by the fusion stage.
pub trait InputProvider: Send + Sync {
    /// Most recent observation, formatted for the decision request.
    /// Empty when nothing has been observed yet. Must not block.
    fn formatted_latest_snapshot(&self) -> String;

    /// Whether a non-empty snapshot from this source demands a vocal response.
    /// Such a source should report each reading in one snapshot only, or every
    /// later cycle would be triggered by the same reading.
    fn triggers_vocalization(&self) -> bool {
        false
    }
}

impl<T: InputProvider + ?Sized> InputProvider for Arc<T> {
    fn formatted_latest_snapshot(&self) -> String {
        (**self).formatted_latest_snapshot()
    }

    fn triggers_vocalization(&self) -> bool {
        (**self).triggers_vocalization()
    }
}

impl<T: InputProvider + ?Sized> InputProvider for &T {
    fn formatted_latest_snapshot(&self) -> String {
        (**self).formatted_latest_snapshot()
    }

    fn triggers_vocalization(&self) -> bool {
        (**self).triggers_vocalization()
    }
}

/// Write side of an input source. Runs on its own task for as long as the
/// source produces data; an `Err` or a panic only faults this source.
#[async_trait]
pub trait InputListener: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn triggers_vocalization(&self) -> bool {
        false
    }

    async fn listen(&self, buffer: InputBuffer) -> anyhow::Result<()>;
}
