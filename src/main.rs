use std::sync::Arc;

use anyhow::Context;
use cortex::config::RuntimeConfig;
use cortex::inputs::{ConsoleListener, InputProvider, ListenerSupervisor};
use cortex::kernel::registry::DispatchRegistry;
use cortex::outputs::{ConsoleExecutor, SimulatorExecutor, SpeechExecutor};
use cortex::planner::LlamaPlanner;
use cortex::Runtime;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    tracing::info!("Cortex Booting...");

    // 2. Config
    let config = match std::env::args().nth(1) {
        Some(path) => RuntimeConfig::load(&path).with_context(|| format!("loading config from {}", path))?,
        None => {
            tracing::warn!("No config path given, using defaults");
            RuntimeConfig::default()
        }
    };

    // 3. Collaborators
    let planner = LlamaPlanner::new(config.llm.clone()).context("building inference client")?;

    let speech = Arc::new(SpeechExecutor::new(config.speech_program.clone()));
    let mut actions = DispatchRegistry::new("actions", config.actions_registry.limits())
        .with_fallback(Arc::new(ConsoleExecutor));
    for kind in &config.audible_kinds {
        actions.register(kind, speech.clone());
    }

    let simulator = DispatchRegistry::new("simulator", config.simulator_registry.limits())
        .with_fallback(Arc::new(SimulatorExecutor::new()));

    let restart_delay = config.listeners.restart_delay();
    let mut runtime = Runtime::new(config, Arc::new(planner), actions, simulator);

    // 4. Input Listeners
    let mut supervisor = ListenerSupervisor::new(runtime.pacer(), restart_delay);
    let console = supervisor.spawn(Arc::new(ConsoleListener::default()));
    runtime.add_input(Arc::new(console) as Arc<dyn InputProvider>);
    println!("Type to talk to the agent. Ctrl+C to stop.");

    let shutdown = supervisor.token();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    // 5. Run Kernel
    runtime.run(shutdown).await;
    supervisor.join().await;

    let snap = runtime.telemetry.snapshot();
    tracing::info!(
        cycles = snap.cycle_stats.total,
        skipped = snap.cycle_stats.skipped(),
        actions_failed = snap.action_stats.failed,
        "Session summary"
    );
    Ok(())
}
