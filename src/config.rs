use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::kernel::error::ConfigError;
use crate::kernel::fusion::{DecisionOption, Framing};
use crate::kernel::gate::VocalizationPolicy;
use crate::kernel::registry::RegistryLimits;
use crate::kernel::time::period_for;
use crate::planner::LlamaConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    #[serde(default)]
    pub execution_timeout_ms: Option<u64>,
}

impl RegistryConfig {
    pub fn limits(&self) -> RegistryLimits {
        RegistryLimits {
            max_in_flight: self.max_in_flight,
            execution_timeout: self.execution_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Restart a faulted or finished listener after this delay. Off when unset.
    #[serde(default)]
    pub restart_delay_ms: Option<u64>,
}

impl ListenerConfig {
    pub fn restart_delay(&self) -> Option<Duration> {
        self.restart_delay_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Agent name, used for logging only. Behavior is selected by `vocalization`.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_hertz")]
    pub hertz: f64,
    /// Run exactly one cycle and stop.
    #[serde(default)]
    pub debug_once: bool,
    #[serde(default)]
    pub vocalization: VocalizationPolicy,
    /// Command kinds removed from the action set on silent cycles.
    #[serde(default = "default_audible_kinds")]
    pub audible_kinds: Vec<String>,
    #[serde(default)]
    pub framing: Framing,
    /// Decision options described to the backend every cycle.
    #[serde(default)]
    pub actions: Vec<DecisionOption>,
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
    #[serde(default)]
    pub actions_registry: RegistryConfig,
    #[serde(default)]
    pub simulator_registry: RegistryConfig,
    #[serde(default)]
    pub listeners: ListenerConfig,
    #[serde(default)]
    pub llm: LlamaConfig,
    /// Text-to-speech program handed the text of `speak` commands (e.g. `say`).
    #[serde(default)]
    pub speech_program: Option<String>,
}

fn default_name() -> String {
    "cortex".to_string()
}

fn default_hertz() -> f64 {
    1.0
}

fn default_audible_kinds() -> Vec<String> {
    vec!["speak".to_string()]
}

fn default_inference_timeout_ms() -> u64 {
    15_000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            hertz: default_hertz(),
            debug_once: false,
            vocalization: VocalizationPolicy::default(),
            audible_kinds: default_audible_kinds(),
            framing: Framing::default(),
            actions: Vec::new(),
            inference_timeout_ms: default_inference_timeout_ms(),
            actions_registry: RegistryConfig::default(),
            simulator_registry: RegistryConfig::default(),
            listeners: ListenerConfig::default(),
            llm: LlamaConfig::default(),
            speech_program: None,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.hertz.is_finite() || self.hertz <= 0.0 {
            return Err(ConfigError::Invalid(format!("hertz must be a positive number, got {}", self.hertz)));
        }
        if let VocalizationPolicy::PeriodicSpeak { threshold: 0 } = self.vocalization {
            return Err(ConfigError::Invalid("periodic_speak threshold must be at least 1".to_string()));
        }
        if self.inference_timeout_ms == 0 {
            return Err(ConfigError::Invalid("inference_timeout_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        period_for(self.hertz)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}
