use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::promise::PromiseResult;
use crate::inputs::InputProvider;

pub const RESULTS_HEADER: &str = "RECENTLY COMPLETED ACTIONS:";
pub const OPTIONS_HEADER: &str = "AVAILABLE ACTIONS:";
pub const CLOSING_DIRECTIVE: &str = "What will you do? Command: ";
/// Two blank lines between described options.
pub const OPTION_SEPARATOR: &str = "\n\n\n";

/// Static text placed at the top of every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framing {
    #[serde(default)]
    pub system_prompt_base: String,
    #[serde(default)]
    pub system_governance: String,
    #[serde(default)]
    pub system_prompt_examples: String,
}

impl Framing {
    fn render(&self) -> String {
        [
            &self.system_prompt_base,
            &self.system_governance,
            &self.system_prompt_examples,
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// One action the backend may choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub name: String,
    /// Name shown to the backend instead of `name`, when set.
    #[serde(default)]
    pub llm_label: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl DecisionOption {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            llm_label: None,
            description: description.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        let label = self.llm_label.as_deref().unwrap_or(&self.name);
        if self.description.is_empty() {
            label.to_string()
        } else {
            format!("{}: {}", label, self.description)
        }
    }
}

/// The single combined decision input for one cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusedRequest {
    pub text: String,
    /// An input source that demands a vocal response contributed this cycle.
    pub context_triggered: bool,
    /// Number of finished results folded into `text`.
    pub reported_results: usize,
}

impl FusedRequest {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Wall-clock bounds of the last `fuse` call. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionTimings {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FusionTimings {
    pub fn elapsed_micros(&self) -> i64 {
        (self.finished_at - self.started_at)
            .num_microseconds()
            .unwrap_or(i64::MAX)
    }
}

pub struct Fuser {
    framing: Framing,
    options: Vec<DecisionOption>,
    last_timings: Option<FusionTimings>,
}

impl Fuser {
    pub fn new(framing: Framing, options: Vec<DecisionOption>) -> Self {
        Self {
            framing,
            options,
            last_timings: None,
        }
    }

    pub fn last_timings(&self) -> Option<FusionTimings> {
        self.last_timings
    }

    /// Builds this cycle's request.
    ///
    /// Section order: framing, input snapshots (configured source order),
    /// finished results (submission order), every decision option, closing
    /// directive. Returns `None` only when all four content sections are empty.
    pub fn fuse<P>(&mut self, inputs: &[P], finished: &[PromiseResult]) -> Option<FusedRequest>
    where
        P: InputProvider,
    {
        let started_at = Utc::now();
        let request = self.compose(inputs, finished);
        self.last_timings = Some(FusionTimings {
            started_at,
            finished_at: Utc::now(),
        });
        request
    }

    fn compose<P: InputProvider>(&self, inputs: &[P], finished: &[PromiseResult]) -> Option<FusedRequest> {
        let mut sections: Vec<String> = Vec::with_capacity(4);
        let mut context_triggered = false;

        let framing = self.framing.render();
        if !framing.is_empty() {
            sections.push(framing);
        }

        let mut snapshots = Vec::with_capacity(inputs.len());
        for input in inputs {
            let snapshot = input.formatted_latest_snapshot();
            if snapshot.is_empty() {
                continue;
            }
            context_triggered |= input.triggers_vocalization();
            snapshots.push(snapshot);
        }
        if !snapshots.is_empty() {
            sections.push(snapshots.join("\n"));
        }

        if !finished.is_empty() {
            let lines = finished.iter().map(render_result).collect::<Vec<_>>().join("\n");
            sections.push(format!("{}\n{}", RESULTS_HEADER, lines));
        }

        if !self.options.is_empty() {
            let described = self
                .options
                .iter()
                .map(DecisionOption::describe)
                .collect::<Vec<_>>()
                .join(OPTION_SEPARATOR);
            sections.push(format!("{}\n{}", OPTIONS_HEADER, described));
        }

        if sections.is_empty() {
            return None;
        }

        Some(FusedRequest {
            text: format!("{}\n\n{}", sections.join("\n\n"), CLOSING_DIRECTIVE),
            context_triggered,
            reported_results: finished.len(),
        })
    }
}

fn render_result(result: &PromiseResult) -> String {
    let kind = &result.command.kind;
    match &result.outcome {
        Ok(value) if value.is_empty() => format!("- {}", kind),
        Ok(value) => format!("- {}: {}", kind, value),
        Err(err) => format!("- {} FAILED: {}", kind, err),
    }
}
