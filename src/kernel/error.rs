use thiserror::Error;

/// Why a promise ended in `Failed`. Failures are data: they travel through
/// `DispatchRegistry::flush` and are never raised across the registry boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("{0}")]
    Failed(String),
    #[error("no executor registered for command kind '{0}'")]
    NoExecutor(String),
    #[error("execution exceeded {0}ms")]
    TimedOut(u64),
    #[error("executor panicked")]
    Panicked,
    #[error("registry at capacity ({0} in flight)")]
    CapacityExceeded(usize),
}

impl ExecutorError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ExecutorError::Failed(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference backend returned status {0}")]
    Status(u16),
    #[error("malformed inference response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
