use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::ExecutorError;
use super::event::Command;
use super::promise::{Promise, PromiseId, PromiseResult, PromiseState};

/// Performs the effect of one command. Invoked only from a task spawned by a
/// `DispatchRegistry`, never inline with `submit`.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, command: &Command) -> Result<String, ExecutorError>;
}

/// Practical limits on a registry. Both are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Commands submitted while this many promises are unfinished resolve to
    /// `CapacityExceeded` instead of running.
    pub max_in_flight: Option<usize>,
    /// Executions still running after this long resolve to `TimedOut`.
    pub execution_timeout: Option<Duration>,
}

/// Result of one `flush`: everything that finished, in submission order, plus
/// how many promises are still unfinished.
#[derive(Debug, Default)]
pub struct Flush {
    pub collected: Vec<PromiseResult>,
    pub pending: usize,
}

impl Flush {
    pub fn failures(&self) -> usize {
        self.collected.iter().filter(|r| r.is_failure()).count()
    }
}

#[derive(Debug, Default)]
struct Slots {
    // Keyed by submission sequence so iteration order is submission order.
    promises: BTreeMap<u64, Promise>,
    next_seq: u64,
    // Non-terminal promises in `promises`, kept in step by insert and transition.
    unfinished: usize,
}

impl Slots {
    fn insert(&mut self, promise: Promise) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if !promise.state.is_terminal() {
            self.unfinished += 1;
        }
        self.promises.insert(seq, promise);
        seq
    }

    fn unfinished(&self) -> usize {
        self.unfinished
    }

    fn transition(&mut self, seq: u64, next: PromiseState) {
        if let Some(promise) = self.promises.get_mut(&seq) {
            // Terminal states are final; Running only follows Pending.
            match (&promise.state, &next) {
                (s, _) if s.is_terminal() => {}
                (PromiseState::Running, PromiseState::Running) => {}
                _ => {
                    if next.is_terminal() {
                        self.unfinished -= 1;
                    }
                    promise.state = next;
                }
            }
        }
    }
}

/// Owns a set of promises from submission to collection.
///
/// The submitting cycle and the completing executor tasks both mutate the slot
/// map, so every state transition happens under one lock that is never held
/// across an `.await`.
pub struct DispatchRegistry {
    label: String,
    executors: HashMap<String, Arc<dyn Executor>>,
    fallback: Option<Arc<dyn Executor>>,
    limits: RegistryLimits,
    slots: Arc<Mutex<Slots>>,
}

impl DispatchRegistry {
    pub fn new(label: &str, limits: RegistryLimits) -> Self {
        Self {
            label: label.to_string(),
            executors: HashMap::new(),
            fallback: None,
            limits,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Routes commands of `kind` to `executor`. Replaces any previous route.
    pub fn register(&mut self, kind: &str, executor: Arc<dyn Executor>) {
        self.executors.insert(kind.to_string(), executor);
    }

    pub fn with_executor(mut self, kind: &str, executor: Arc<dyn Executor>) -> Self {
        self.register(kind, executor);
        self
    }

    /// Executor used for any kind without a dedicated route.
    pub fn with_fallback(mut self, executor: Arc<dyn Executor>) -> Self {
        self.fallback = Some(executor);
        self
    }

    fn route(&self, kind: &str) -> Option<Arc<dyn Executor>> {
        self.executors
            .get(kind)
            .or(self.fallback.as_ref())
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        lock_slots(&self.slots)
    }

    /// Creates one promise per command and starts its execution on a spawned
    /// task. Returns as soon as every task has been spawned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, commands: Vec<Command>) -> Vec<PromiseId> {
        let mut ids = Vec::with_capacity(commands.len());

        for command in commands {
            let mut promise = Promise::new(command);
            let id = promise.id;
            ids.push(id);

            let command = promise.command.clone();

            let (seq, executor) = {
                let mut slots = self.lock();
                let executor = match (self.route(&command.kind), self.limits.max_in_flight) {
                    (None, _) => {
                        debug!(registry = %self.label, %id, "No executor for '{}'", command.kind);
                        promise.state =
                            PromiseState::Failed(ExecutorError::NoExecutor(command.kind.clone()));
                        None
                    }
                    (Some(_), Some(cap)) if slots.unfinished() >= cap => {
                        warn!(registry = %self.label, cap, "Registry at capacity, rejecting '{}'", command.kind);
                        promise.state = PromiseState::Failed(ExecutorError::CapacityExceeded(cap));
                        None
                    }
                    (executor, _) => executor,
                };
                (slots.insert(promise), executor)
            };

            let Some(executor) = executor else {
                continue;
            };

            debug!(registry = %self.label, %id, kind = %command.kind, "Promise submitted");
            tokio::spawn(run_promise(
                self.slots.clone(),
                self.label.clone(),
                seq,
                id,
                executor,
                command,
                self.limits.execution_timeout,
            ));
        }

        ids
    }

    /// Removes and returns every finished promise, preserving submission order.
    /// Unfinished promises are left for a later flush.
    pub fn flush(&self) -> Flush {
        let mut slots = self.lock();
        let all = std::mem::take(&mut slots.promises);
        let mut collected = Vec::new();

        for (seq, promise) in all {
            match promise.into_result() {
                Ok(result) => collected.push(result),
                Err(unfinished) => {
                    slots.promises.insert(seq, unfinished);
                }
            }
        }

        Flush {
            collected,
            pending: slots.promises.len(),
        }
    }

    /// Number of promises that have not reached a terminal state.
    pub fn pending(&self) -> usize {
        self.lock().unfinished()
    }

    /// Number of promises ever created by this registry.
    pub fn submitted_total(&self) -> u64 {
        self.lock().next_seq
    }

    /// Current state of an uncollected promise.
    pub fn state_of(&self, id: PromiseId) -> Option<PromiseState> {
        self.lock()
            .promises
            .values()
            .find(|p| p.id == id)
            .map(|p| p.state.clone())
    }
}

fn lock_slots(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    // Every transition is a single assignment, so a poisoned map is still consistent.
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_promise(
    slots: Arc<Mutex<Slots>>,
    label: String,
    seq: u64,
    id: PromiseId,
    executor: Arc<dyn Executor>,
    command: Command,
    timeout: Option<Duration>,
) {
    lock_slots(&slots).transition(seq, PromiseState::Running);

    let kind = command.kind.clone();
    // Run on its own task so a panicking executor only fails its own promise.
    let mut execution = tokio::spawn(async move { executor.execute(&command).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut execution).await {
            Ok(joined) => joined,
            Err(_) => {
                execution.abort();
                warn!(registry = %label, %id, %kind, "Execution timed out");
                let ms = limit.as_millis() as u64;
                lock_slots(&slots).transition(seq, PromiseState::Failed(ExecutorError::TimedOut(ms)));
                return;
            }
        },
        None => execution.await,
    };

    let state = match joined {
        Ok(Ok(value)) => PromiseState::Completed(value),
        Ok(Err(err)) => PromiseState::Failed(err),
        Err(join_err) if join_err.is_panic() => PromiseState::Failed(ExecutorError::Panicked),
        Err(_) => PromiseState::Failed(ExecutorError::failed("execution cancelled")),
    };

    match &state {
        PromiseState::Failed(err) => debug!(registry = %label, %id, %kind, "Promise failed: {}", err),
        _ => debug!(registry = %label, %id, %kind, "Promise completed"),
    }
    lock_slots(&slots).transition(seq, state);
}
