use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single decided action. Immutable once produced by the inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "value", default)]
    pub parameters: Value,
}

impl Command {
    pub fn new(kind: &str, parameters: Value) -> Self {
        Self {
            kind: kind.to_string(),
            parameters,
        }
    }

    /// Helper for the common case of a plain string payload.
    pub fn text(kind: &str, text: &str) -> Self {
        Self::new(kind, Value::String(text.to_string()))
    }

    pub fn is_audible(&self, audible_kinds: &[String]) -> bool {
        audible_kinds.iter().any(|k| k == &self.kind)
    }

    /// Short human-readable rendering of the payload, used in logs and prompts.
    pub fn summary(&self) -> String {
        match &self.parameters {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One successful inference result. Command order is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Output {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The command set with every audible kind removed, order preserved.
    pub fn silent_commands(&self, audible_kinds: &[String]) -> Vec<Command> {
        self.commands
            .iter()
            .filter(|c| !c.is_audible(audible_kinds))
            .cloned()
            .collect()
    }
}
