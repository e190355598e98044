#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cortex::inputs::InputProvider;
use cortex::kernel::error::{ExecutorError, InferenceError};
use cortex::kernel::event::{Command, Output};
use cortex::kernel::fusion::FusedRequest;
use cortex::kernel::registry::{DispatchRegistry, Executor};
use cortex::planner::InferenceProvider;
use tokio::sync::Notify;

/// Completes a command only once its gate (keyed by the command's text) is opened.
#[derive(Default)]
pub struct GatedExecutor {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn gate(&self, key: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn open(&self, key: &str) {
        // notify_one stores a permit if the executor has not started waiting yet.
        self.gate(key).notify_one();
    }
}

#[async_trait]
impl Executor for GatedExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        let key = command.summary();
        self.gate(&key).notified().await;
        Ok(key)
    }
}

/// Succeeds immediately and remembers what it ran, in completion order.
#[derive(Default)]
pub struct RecordingExecutor {
    pub seen: Mutex<Vec<Command>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|c| c.kind.clone()).collect()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        self.seen.lock().unwrap().push(command.clone());
        Ok(format!("{} ok", command.kind))
    }
}

pub struct FailingExecutor(pub &'static str);

#[async_trait]
impl Executor for FailingExecutor {
    async fn execute(&self, _command: &Command) -> Result<String, ExecutorError> {
        Err(ExecutorError::failed(self.0))
    }
}

pub struct PanickingExecutor;

#[async_trait]
impl Executor for PanickingExecutor {
    async fn execute(&self, _command: &Command) -> Result<String, ExecutorError> {
        panic!("actuator exploded");
    }
}

pub struct SlowExecutor(pub Duration);

#[async_trait]
impl Executor for SlowExecutor {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError> {
        tokio::time::sleep(self.0).await;
        Ok(command.kind.clone())
    }
}

/// Input provider with a fixed snapshot.
pub struct StaticInput {
    pub snapshot: String,
    pub urgent: bool,
}

impl StaticInput {
    pub fn new(snapshot: &str) -> Self {
        Self {
            snapshot: snapshot.to_string(),
            urgent: false,
        }
    }

    pub fn urgent(snapshot: &str) -> Self {
        Self {
            snapshot: snapshot.to_string(),
            urgent: true,
        }
    }
}

impl InputProvider for StaticInput {
    fn formatted_latest_snapshot(&self) -> String {
        self.snapshot.clone()
    }

    fn triggers_vocalization(&self) -> bool {
        self.urgent
    }
}

pub enum Reply {
    Output(Output),
    Nothing,
    Error,
    Hang,
}

/// Inference backend that plays back a fixed script, then returns nothing.
#[derive(Default)]
pub struct ScriptedPlanner {
    script: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<String>>,
}

impl ScriptedPlanner {
    pub fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn repeating(output: Output, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Reply::Output(output.clone())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl InferenceProvider for ScriptedPlanner {
    async fn infer(&self, request: &FusedRequest) -> Result<Option<Output>, InferenceError> {
        self.requests.lock().unwrap().push(request.text.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Output(output)) => Ok(Some(output)),
            Some(Reply::Nothing) | None => Ok(None),
            Some(Reply::Error) => Err(InferenceError::Status(503)),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

pub fn commands(kinds: &[&str]) -> Vec<Command> {
    kinds.iter().map(|k| Command::text(k, k)).collect()
}

/// Polls until the registry has exactly `pending` unfinished promises.
pub async fn settle(registry: &DispatchRegistry, pending: usize) {
    tokio::time::timeout(Duration::from_secs(30), async {
        while registry.pending() != pending {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("registry did not settle");
}
