use async_trait::async_trait;
use tracing::info;

use crate::kernel::error::ExecutorError;
use crate::kernel::event::Command;
use crate::kernel::registry::Executor;

/// Prints every command it receives. The default action executor for
/// kinds with no dedicated hardware.
#[derive(Debug, Default)]
pub struct ConsoleExecutor;

#[async_trait]
impl Executor for ConsoleExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        let summary = command.summary();
        info!(kind = %command.kind, "Action executed");
        println!("[ACTION] {} {}", command.kind, summary);
        Ok(format!("{} done", command.kind))
    }
}
