use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::InputProvider;
use crate::kernel::time::TickPacer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub text: String,
    pub observed_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// Registered, listener not started yet.
    Idle,
    Live,
    Faulted(String),
    /// Listener returned cleanly and was not restarted.
    Finished,
}

#[derive(Debug)]
pub(crate) struct SourceChannels {
    latest: watch::Sender<Option<Reading>>,
    status: watch::Sender<SourceStatus>,
}

/// Creates the paired writer/reader for one source.
pub fn source(name: &str, triggers_vocalization: bool, pacer: Option<Arc<TickPacer>>) -> (InputBuffer, InputHandle) {
    let (latest, latest_rx) = watch::channel(None);
    let (status, status_rx) = watch::channel(SourceStatus::Idle);
    let channels = Arc::new(SourceChannels { latest, status });

    let handle = InputHandle {
        name: name.to_string(),
        triggers_vocalization,
        channels: channels.clone(),
        latest: latest_rx,
        status: status_rx,
    };
    let buffer = InputBuffer {
        channels,
        pacer,
    };
    (buffer, handle)
}

/// Single-writer side of a source's latest-value buffer.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    channels: Arc<SourceChannels>,
    pacer: Option<Arc<TickPacer>>,
}

impl InputBuffer {
    /// Replaces the latest reading.
    pub fn publish(&self, text: impl Into<String>) {
        self.channels.latest.send_replace(Some(Reading {
            text: text.into(),
            observed_at: Instant::now(),
        }));
    }

    /// Replaces the latest reading and asks the pacer to skip its next wait.
    pub fn publish_urgent(&self, text: impl Into<String>) {
        self.publish(text);
        if let Some(pacer) = &self.pacer {
            pacer.force_immediate();
        }
    }

    /// Drops the latest reading so the source reports nothing until it observes again.
    pub fn clear(&self) {
        self.channels.latest.send_replace(None);
    }

    pub(crate) fn set_status(&self, status: SourceStatus) {
        self.channels.status.send_replace(status);
    }
}

/// Reader side of a source. Cheap to clone.
///
/// A triggering source's reading is an event, not a state: fusing it consumes
/// it, so one utterance triggers one cycle.
#[derive(Debug, Clone)]
pub struct InputHandle {
    name: String,
    triggers_vocalization: bool,
    channels: Arc<SourceChannels>,
    latest: watch::Receiver<Option<Reading>>,
    status: watch::Receiver<SourceStatus>,
}

impl InputHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latest(&self) -> Option<Reading> {
        self.latest.borrow().clone()
    }

    /// Removes and returns the latest reading.
    pub fn take(&self) -> Option<Reading> {
        let mut taken = None;
        self.channels.latest.send_if_modified(|latest| {
            taken = latest.take();
            taken.is_some()
        });
        taken
    }

    pub fn status(&self) -> SourceStatus {
        self.status.borrow().clone()
    }

    /// Time since the last reading, or `None` if there never was one.
    pub fn staleness(&self) -> Option<Duration> {
        self.latest
            .borrow()
            .as_ref()
            .map(|r| Instant::now().saturating_duration_since(r.observed_at))
    }
}

impl InputProvider for InputHandle {
    fn formatted_latest_snapshot(&self) -> String {
        let reading = if self.triggers_vocalization {
            self.take()
        } else {
            self.latest()
        };
        match reading {
            Some(reading) => format!("{} INPUT\n// START\n{}\n// END", self.name, reading.text),
            None => String::new(),
        }
    }

    fn triggers_vocalization(&self) -> bool {
        self.triggers_vocalization
    }
}
