//! Cycle telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (Fuser, Gate, or Runtime control flow).
//! It exists solely for observability and verification.
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain prompt text or command payloads.
//! Only ticks, counts, durations and enums are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
