pub mod console;
pub mod simulator;
pub mod speech;

pub use console::ConsoleExecutor;
pub use simulator::{SimulatedEffect, SimulatorExecutor};
pub use speech::SpeechExecutor;
