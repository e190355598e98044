pub mod config;
pub mod inputs;
pub mod kernel;
pub mod outputs;
pub mod planner;

// Re-export specific items for convenient access
pub use config::RuntimeConfig;
pub use kernel::event::{Command, Output};
pub use kernel::registry::{DispatchRegistry, Executor};
pub use kernel::runtime::{CycleOutcome, Runtime};
