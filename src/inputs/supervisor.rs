use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::buffer::{self, InputBuffer, InputHandle, SourceStatus};
use super::InputListener;
use crate::kernel::time::TickPacer;

/// Runs one isolated task per input source.
///
/// A listener that errors or panics marks only its own source `Faulted`.
/// With `restart_delay` set, it is started again after that delay.
pub struct ListenerSupervisor {
    pacer: Arc<TickPacer>,
    restart_delay: Option<Duration>,
    shutdown: CancellationToken,
    handles: Vec<InputHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl ListenerSupervisor {
    pub fn new(pacer: Arc<TickPacer>, restart_delay: Option<Duration>) -> Self {
        Self {
            pacer,
            restart_delay,
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Starts `listener` and returns the reader for its buffer.
    /// Sources are fused in the order they are spawned.
    pub fn spawn(&mut self, listener: Arc<dyn InputListener>) -> InputHandle {
        let (buffer, handle) = buffer::source(
            listener.name(),
            listener.triggers_vocalization(),
            Some(self.pacer.clone()),
        );

        let task = tokio::spawn(supervise(
            listener,
            buffer,
            self.restart_delay,
            self.shutdown.child_token(),
        ));

        self.handles.push(handle.clone());
        self.tasks.push(task);
        handle
    }

    pub fn handles(&self) -> &[InputHandle] {
        &self.handles
    }

    /// Token cancelled by `shutdown`; useful to stop the runtime alongside the listeners.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Cancels every listener and waits for the supervising tasks to exit.
    pub async fn join(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn supervise(
    listener: Arc<dyn InputListener>,
    buffer: InputBuffer,
    restart_delay: Option<Duration>,
    shutdown: CancellationToken,
) {
    let name = listener.name().to_string();

    loop {
        buffer.set_status(SourceStatus::Live);
        info!(source = %name, "Listener started");

        let task_listener = listener.clone();
        let task_buffer = buffer.clone();
        let mut run = tokio::spawn(async move { task_listener.listen(task_buffer).await });

        let joined = tokio::select! {
            _ = shutdown.cancelled() => {
                run.abort();
                break;
            }
            joined = &mut run => joined,
        };

        match joined {
            Ok(Ok(())) => {
                info!(source = %name, "Listener finished");
                buffer.set_status(SourceStatus::Finished);
            }
            Ok(Err(e)) => {
                error!(source = %name, "Listener fault: {:#}", e);
                buffer.set_status(SourceStatus::Faulted(e.to_string()));
            }
            Err(e) => {
                let reason = if e.is_panic() { "listener panicked" } else { "listener cancelled" };
                error!(source = %name, "Listener fault: {}", reason);
                buffer.set_status(SourceStatus::Faulted(reason.to_string()));
            }
        }

        let Some(delay) = restart_delay else {
            break;
        };
        warn!(source = %name, "Restarting listener in {}ms", delay.as_millis());
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
