pub mod error;
pub mod event;
pub mod fusion;
pub mod gate;
pub mod promise;
pub mod registry;
pub mod runtime;
pub mod telemetry;
pub mod time;
