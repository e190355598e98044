pub mod llama;
pub mod types;

pub use llama::{LlamaConfig, LlamaPlanner};
pub use types::InferenceProvider;
