use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::{InputBuffer, InputListener};

/// Reads lines typed on stdin. Typed input counts as live speech directed at
/// the agent, so every line wakes the loop immediately.
pub struct ConsoleListener {
    name: String,
}

impl ConsoleListener {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Default for ConsoleListener {
    fn default() -> Self {
        Self::new("Voice")
    }
}

#[async_trait]
impl InputListener for ConsoleListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn triggers_vocalization(&self) -> bool {
        true
    }

    async fn listen(&self, buffer: InputBuffer) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            info!(source = %self.name, "Console input received");
            buffer.publish_urgent(line);
        }

        Ok(())
    }
}
