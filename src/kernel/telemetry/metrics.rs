use std::collections::VecDeque;

use super::event::{CycleResult, RegistryKind, TelemetryEvent};
use crate::kernel::gate::DispatchMode;
use crate::kernel::runtime::SkipReason;

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub cycle_stats: CycleStats,
    pub action_stats: PromiseStats,
    pub simulator_stats: PromiseStats,
    pub fusion_stats: FusionStats,
}

#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    pub total: u64,
    pub skipped_no_request: u64,
    pub skipped_no_output: u64,
    pub full_dispatches: u64,
    pub silent_dispatches: u64,
    pub commands_simulated: u64,
    pub commands_dispatched: u64,
    pub results_reported: u64,
}

impl CycleStats {
    pub fn skipped(&self) -> u64 {
        self.skipped_no_request + self.skipped_no_output
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromiseStats {
    pub completed: u64,
    pub failed: u64,
    pub max_pending: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FusionStats {
    pub count: u64,
    pub total_micros: i64,
    pub max_micros: i64,
    pub avg_micros: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::Cycle { result, reported_results, .. } => {
                let cycles = &mut snap.cycle_stats;
                cycles.total += 1;
                cycles.results_reported += *reported_results as u64;
                match result {
                    CycleResult::Skipped(SkipReason::NoFusedRequest) => cycles.skipped_no_request += 1,
                    CycleResult::Skipped(SkipReason::NoInferenceOutput) => cycles.skipped_no_output += 1,
                    CycleResult::Dispatched { mode, simulated, actions } => {
                        match mode {
                            DispatchMode::Full => cycles.full_dispatches += 1,
                            DispatchMode::Silent => cycles.silent_dispatches += 1,
                        }
                        cycles.commands_simulated += *simulated as u64;
                        cycles.commands_dispatched += *actions as u64;
                    }
                }
            }
            TelemetryEvent::FusionTimed { micros, .. } => {
                snap.fusion_stats.count += 1;
                snap.fusion_stats.total_micros += micros;
                snap.fusion_stats.max_micros = snap.fusion_stats.max_micros.max(*micros);
            }
            TelemetryEvent::PromisesCollected { registry, completed, failed, still_pending } => {
                let stats = match registry {
                    RegistryKind::Actions => &mut snap.action_stats,
                    RegistryKind::Simulator => &mut snap.simulator_stats,
                };
                stats.completed += *completed as u64;
                stats.failed += *failed as u64;
                stats.max_pending = stats.max_pending.max(*still_pending);
            }
        }
    }

    if snap.fusion_stats.count > 0 {
        snap.fusion_stats.avg_micros = snap.fusion_stats.total_micros as f64 / snap.fusion_stats.count as f64;
    }

    snap
}
