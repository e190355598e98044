use async_trait::async_trait;
use tracing::{info, warn};

use crate::kernel::error::ExecutorError;
use crate::kernel::event::Command;
use crate::kernel::registry::Executor;

/// Speaks the text of a command through an external text-to-speech program
/// (e.g. `say`). Without a program the text is only printed.
#[derive(Debug, Clone, Default)]
pub struct SpeechExecutor {
    program: Option<String>,
}

impl SpeechExecutor {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }
}

#[async_trait]
impl Executor for SpeechExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        let text = command.summary();
        if text.is_empty() {
            return Err(ExecutorError::failed("nothing to say"));
        }

        let Some(program) = &self.program else {
            println!("[SPEECH] {}", text);
            return Ok(format!("said '{}'", text));
        };

        info!(program = %program, chars = text.len(), "Spawning speech");
        let mut child = tokio::process::Command::new(program)
            .arg(&text)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!("Failed to spawn '{}': {}", program, e);
                ExecutorError::failed(format!("failed to spawn '{}': {}", program, e))
            })?;

        let status = child
            .wait()
            .await
            .map_err(|e| ExecutorError::failed(e.to_string()))?;

        if status.success() {
            Ok(format!("said '{}'", text))
        } else {
            Err(ExecutorError::failed(format!("'{}' exited with {}", program, status)))
        }
    }
}
