use serde::{Deserialize, Serialize};

use crate::kernel::gate::DispatchMode;
use crate::kernel::runtime::SkipReason;
use crate::kernel::time::Tick;

// Allowed: Ticks, Durations, Counts, Enums
// Forbidden: Prompt text, Command payloads, Executor results

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// One record per cycle, emitted when the cycle ends.
    Cycle {
        tick: Tick,
        result: CycleResult,
        reported_results: usize,
        duty_cycle: u32,
    },

    FusionTimed {
        tick: Tick,
        micros: i64,
    },

    PromisesCollected {
        registry: RegistryKind,
        completed: usize,
        failed: usize,
        still_pending: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleResult {
    Skipped(SkipReason),
    Dispatched {
        mode: DispatchMode,
        simulated: usize,
        actions: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryKind {
    Actions,
    Simulator,
}
