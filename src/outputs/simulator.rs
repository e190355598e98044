use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::kernel::error::ExecutorError;
use crate::kernel::event::Command;
use crate::kernel::registry::Executor;

/// One virtual effect applied to the simulated world.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedEffect {
    pub command: Command,
    pub applied_at: DateTime<Utc>,
}

/// Records every command as a virtual effect instead of touching hardware.
/// Clones share the same effect log.
#[derive(Debug, Clone, Default)]
pub struct SimulatorExecutor {
    effects: Arc<Mutex<Vec<SimulatedEffect>>>,
}

impl SimulatorExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<SimulatedEffect> {
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Executor for SimulatorExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        let effect = SimulatedEffect {
            command: command.clone(),
            applied_at: Utc::now(),
        };
        let count = {
            let mut effects = self.effects.lock().unwrap_or_else(PoisonError::into_inner);
            effects.push(effect);
            effects.len()
        };
        debug!(kind = %command.kind, count, "Simulated effect applied");
        Ok(format!("simulated {}", command.kind))
    }
}
