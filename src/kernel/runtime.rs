use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::event::Output;
use super::fusion::{FusedRequest, Fuser};
use super::gate::{DispatchMode, SpeechGate};
use super::promise::{PromiseId, PromiseResult};
use super::registry::{DispatchRegistry, Flush};
use super::telemetry::event::{CycleResult, RegistryKind, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::{Tick, TickPacer};
use crate::config::RuntimeConfig;
use crate::inputs::InputProvider;
use crate::planner::InferenceProvider;

/// Stages of one cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStage {
    Idle,
    Flushing,
    Fusing,
    Inferring,
    Dispatching,
    Pacing,
    DebugStop,
}

/// Why a cycle ended before dispatch. Expected and non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoFusedRequest,
    NoInferenceOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    Dispatched {
        mode: DispatchMode,
        simulated: Vec<PromiseId>,
        actions: Vec<PromiseId>,
    },
}

/// Drives flush → fuse → infer → dispatch → pace.
///
/// The cycle itself is single-task logic; it suspends only on the pacer, the
/// inference call, and while spawning submitted work. Submitted promises keep
/// running across cycle boundaries and are folded back in by the next flush.
pub struct Runtime {
    config: RuntimeConfig,
    fuser: Fuser,
    actions: DispatchRegistry,
    simulator: DispatchRegistry,
    inference: Arc<dyn InferenceProvider>,
    inputs: Vec<Arc<dyn InputProvider>>,
    pacer: Arc<TickPacer>,
    gate: SpeechGate,
    // Results flushed by a cycle whose inference produced nothing; reported next cycle.
    carryover: Vec<PromiseResult>,
    stage: CycleStage,
    pub tick: Tick,
    pub telemetry: TelemetryRecorder,
}

impl Runtime {
    pub fn new(
        config: RuntimeConfig,
        inference: Arc<dyn InferenceProvider>,
        actions: DispatchRegistry,
        simulator: DispatchRegistry,
    ) -> Self {
        let fuser = Fuser::new(config.framing.clone(), config.actions.clone());
        let gate = SpeechGate::new(config.vocalization);

        Self {
            config,
            fuser,
            actions,
            simulator,
            inference,
            inputs: Vec::new(),
            pacer: Arc::new(TickPacer::new()),
            gate,
            carryover: Vec::new(),
            stage: CycleStage::Idle,
            tick: Tick::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    /// Adds an input source. Sources are fused in the order they are added.
    pub fn add_input(&mut self, input: Arc<dyn InputProvider>) {
        self.inputs.push(input);
    }

    pub fn with_inputs(mut self, inputs: Vec<Arc<dyn InputProvider>>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Shares an externally created pacer, e.g. one already handed to listeners.
    pub fn with_pacer(mut self, pacer: Arc<TickPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn pacer(&self) -> Arc<TickPacer> {
        self.pacer.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn actions(&self) -> &DispatchRegistry {
        &self.actions
    }

    pub fn simulator(&self) -> &DispatchRegistry {
        &self.simulator
    }

    pub fn gate(&self) -> &SpeechGate {
        &self.gate
    }

    pub fn fuser(&self) -> &Fuser {
        &self.fuser
    }

    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    fn enter(&mut self, stage: CycleStage) {
        debug!(tick = self.tick.frame, ?stage, "Cycle stage");
        self.stage = stage;
    }

    /// Runs one cycle without pacing.
    ///
    /// **KERNEL LAW**: The Tick is advanced at the VERY START of this step.
    pub async fn tick_step(&mut self) -> CycleOutcome {
        self.tick = self.tick.next();

        // === 1. FLUSH ===
        self.enter(CycleStage::Flushing);
        let flushed = self.actions.flush();
        self.record_flush(RegistryKind::Actions, &flushed);
        let simulated = self.simulator.flush();
        self.record_flush(RegistryKind::Simulator, &simulated);

        let mut finished = std::mem::take(&mut self.carryover);
        finished.extend(flushed.collected);

        // === 2. FUSE ===
        self.enter(CycleStage::Fusing);
        let request = self.fuser.fuse(&self.inputs, &finished);
        if let Some(timings) = self.fuser.last_timings() {
            self.telemetry.record(TelemetryEvent::FusionTimed {
                tick: self.tick,
                micros: timings.elapsed_micros(),
            });
        }

        let Some(request) = request else {
            warn!(tick = self.tick.frame, "No request to fuse, skipping cycle");
            return self.finish(CycleOutcome::Skipped(SkipReason::NoFusedRequest), 0);
        };

        // === 3. INFER ===
        self.enter(CycleStage::Inferring);
        let Some(output) = self.infer(&request).await else {
            warn!(tick = self.tick.frame, "No output from inference, skipping cycle");
            // Nothing was decided on these results yet; report them again next cycle.
            self.carryover = finished;
            return self.finish(CycleOutcome::Skipped(SkipReason::NoInferenceOutput), 0);
        };

        // === 4. DISPATCH ===
        self.enter(CycleStage::Dispatching);
        let simulated = self.simulator.submit(output.commands.clone());

        let mode = self.gate.decide(request.context_triggered);
        let commands = SpeechGate::select(mode, &output, &self.config.audible_kinds);
        let actions = self.actions.submit(commands);

        info!(
            agent = %self.config.name,
            tick = self.tick.frame,
            ?mode,
            simulated = simulated.len(),
            actions = actions.len(),
            duty_cycle = self.gate.duty_cycle(),
            "Cycle dispatched"
        );

        self.finish(
            CycleOutcome::Dispatched {
                mode,
                simulated,
                actions,
            },
            request.reported_results,
        )
    }

    async fn infer(&self, request: &FusedRequest) -> Option<Output> {
        let timeout = self.config.inference_timeout();
        match tokio::time::timeout(timeout, self.inference.infer(request)).await {
            Ok(Ok(Some(output))) if !output.is_empty() => Some(output),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(tick = self.tick.frame, "Inference failed: {}", e);
                None
            }
            Err(_) => {
                warn!(tick = self.tick.frame, "Inference timed out after {}ms", timeout.as_millis());
                None
            }
        }
    }

    fn record_flush(&mut self, registry: RegistryKind, flush: &Flush) {
        if flush.collected.is_empty() {
            return;
        }
        let failed = flush.failures();
        debug!(?registry, collected = flush.collected.len(), failed, pending = flush.pending, "Promises collected");
        self.telemetry.record(TelemetryEvent::PromisesCollected {
            registry,
            completed: flush.collected.len() - failed,
            failed,
            still_pending: flush.pending,
        });
    }

    fn finish(&mut self, outcome: CycleOutcome, reported_results: usize) -> CycleOutcome {
        let result = match &outcome {
            CycleOutcome::Skipped(reason) => CycleResult::Skipped(*reason),
            CycleOutcome::Dispatched { mode, simulated, actions } => CycleResult::Dispatched {
                mode: *mode,
                simulated: simulated.len(),
                actions: actions.len(),
            },
        };
        self.telemetry.record(TelemetryEvent::Cycle {
            tick: self.tick,
            result,
            reported_results,
            duty_cycle: self.gate.duty_cycle(),
        });
        outcome
    }

    /// Async Driver Loop. Runs until `shutdown` is cancelled, or for exactly
    /// one cycle when `debug_once` is set.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let period = self.config.period();
        info!(
            agent = %self.config.name,
            period_ms = period.as_millis() as u64,
            policy = ?self.gate.policy(),
            "Runtime started"
        );

        if self.config.debug_once {
            self.tick_step().await;
            self.enter(CycleStage::DebugStop);
            info!("Single cycle complete, stopping");
            return;
        }

        while !shutdown.is_cancelled() {
            let cycle_start = Instant::now();
            self.tick_step().await;

            self.enter(CycleStage::Pacing);
            let pacer = self.pacer.clone();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                skipped = pacer.wait_from(cycle_start, period) => {
                    if skipped {
                        debug!(tick = self.tick.frame, "Wait skipped by override");
                    }
                }
            }
        }

        self.enter(CycleStage::Idle);
        info!(agent = %self.config.name, cycles = self.tick.frame, "Runtime stopped");
    }
}
