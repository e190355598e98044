use serde::{Deserialize, Serialize};

use super::event::{Command, Output};

/// How often an agent is allowed to send audible commands to its actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VocalizationPolicy {
    /// Every cycle dispatches the full command set.
    AlwaysSpeak,
    /// Audible commands reach the actions only on urgent input.
    NeverSpeak,
    /// Speaks once the duty-cycle counter exceeds `threshold`, then resets.
    PeriodicSpeak { threshold: u32 },
    /// Speaks only when an urgent input source contributed to the cycle.
    #[default]
    ContextTriggered,
}

/// Which command set a cycle hands to the action registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    Full,
    Silent,
}

/// Evaluates the vocalization policy once per cycle.
///
/// Owns the duty-cycle counter, so each runtime instance throttles
/// independently of any other.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    policy: VocalizationPolicy,
    duty_cycle: u32,
}

impl SpeechGate {
    pub fn new(policy: VocalizationPolicy) -> Self {
        Self {
            policy,
            duty_cycle: 0,
        }
    }

    pub fn policy(&self) -> VocalizationPolicy {
        self.policy
    }

    pub fn duty_cycle(&self) -> u32 {
        self.duty_cycle
    }

    /// Precedence: urgent context, then the configured policy.
    ///
    /// Urgent context dispatches the full set under every policy and leaves the
    /// duty cycle untouched.
    pub fn decide(&mut self, context_triggered: bool) -> DispatchMode {
        if context_triggered {
            return DispatchMode::Full;
        }

        match self.policy {
            VocalizationPolicy::AlwaysSpeak => DispatchMode::Full,
            VocalizationPolicy::PeriodicSpeak { threshold } => {
                self.duty_cycle += 1;
                if self.duty_cycle > threshold {
                    self.duty_cycle = 0;
                    DispatchMode::Full
                } else {
                    DispatchMode::Silent
                }
            }
            VocalizationPolicy::NeverSpeak | VocalizationPolicy::ContextTriggered => DispatchMode::Silent,
        }
    }

    /// Projects an output onto the command set for the action registry.
    pub fn select(mode: DispatchMode, output: &Output, audible_kinds: &[String]) -> Vec<Command> {
        match mode {
            DispatchMode::Full => output.commands.clone(),
            DispatchMode::Silent => output.silent_commands(audible_kinds),
        }
    }
}
