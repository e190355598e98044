use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ExecutorError;
use super::event::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromiseId(pub Uuid);

impl PromiseId {
    pub fn new() -> Self {
        PromiseId(Uuid::new_v4())
    }
}

impl Default for PromiseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of one unit of work: `Pending -> Running -> {Completed | Failed}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Running,
    Completed(String),
    Failed(ExecutorError),
}

impl PromiseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PromiseState::Completed(_) | PromiseState::Failed(_))
    }
}

/// A promise as tracked inside its registry.
#[derive(Debug, Clone)]
pub struct Promise {
    pub id: PromiseId,
    pub command: Command,
    pub state: PromiseState,
}

impl Promise {
    pub fn new(command: Command) -> Self {
        Self {
            id: PromiseId::new(),
            command,
            state: PromiseState::Pending,
        }
    }

    /// Consumes a terminal promise into its collected form.
    /// Returns the promise unchanged if it has not finished yet.
    pub fn into_result(self) -> Result<PromiseResult, Promise> {
        match self.state {
            PromiseState::Completed(value) => Ok(PromiseResult {
                id: self.id,
                command: self.command,
                outcome: Ok(value),
            }),
            PromiseState::Failed(err) => Ok(PromiseResult {
                id: self.id,
                command: self.command,
                outcome: Err(err),
            }),
            _ => Err(self),
        }
    }
}

/// A collected promise. Handed out by `flush` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PromiseResult {
    pub id: PromiseId,
    pub command: Command,
    pub outcome: Result<String, ExecutorError>,
}

impl PromiseResult {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}
