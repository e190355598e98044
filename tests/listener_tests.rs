use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use cortex::inputs::{buffer, InputBuffer, InputHandle, InputListener, InputProvider, ListenerSupervisor, SourceStatus};
use cortex::kernel::time::TickPacer;

/// Publishes one reading and returns.
struct OneShot {
    name: &'static str,
    text: &'static str,
}

#[async_trait]
impl InputListener for OneShot {
    fn name(&self) -> &str {
        self.name
    }

    async fn listen(&self, buffer: InputBuffer) -> anyhow::Result<()> {
        buffer.publish(self.text);
        Ok(())
    }
}

/// Publishes a heartbeat forever.
struct Heartbeat;

#[async_trait]
impl InputListener for Heartbeat {
    fn name(&self) -> &str {
        "Heartbeat"
    }

    async fn listen(&self, buffer: InputBuffer) -> anyhow::Result<()> {
        let mut beat = 0u64;
        loop {
            beat += 1;
            buffer.publish(format!("beat {}", beat));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Fails every time it is started, counting the attempts.
#[derive(Default)]
struct Broken {
    starts: AtomicUsize,
}

#[async_trait]
impl InputListener for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    async fn listen(&self, _buffer: InputBuffer) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        bail!("sensor unplugged")
    }
}

struct Panicky;

#[async_trait]
impl InputListener for Panicky {
    fn name(&self) -> &str {
        "Panicky"
    }

    async fn listen(&self, _buffer: InputBuffer) -> anyhow::Result<()> {
        panic!("driver crashed");
    }
}

/// Never publishes, never returns.
struct Silent;

#[async_trait]
impl InputListener for Silent {
    fn name(&self) -> &str {
        "Silent"
    }

    async fn listen(&self, _buffer: InputBuffer) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

async fn wait_for_status(handle: &InputHandle, expected: SourceStatus) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while handle.status() != expected {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} never reached {:?}, last {:?}", handle.name(), expected, handle.status()));
}

#[tokio::test]
async fn test_finished_listener_keeps_its_reading() {
    let mut supervisor = ListenerSupervisor::new(Arc::new(TickPacer::new()), None);
    let handle = supervisor.spawn(Arc::new(OneShot {
        name: "Camera",
        text: "a chair",
    }));

    wait_for_status(&handle, SourceStatus::Finished).await;

    assert_eq!(handle.formatted_latest_snapshot(), "Camera INPUT\n// START\na chair\n// END");
    assert!(!handle.triggers_vocalization());
    supervisor.join().await;
}

#[tokio::test]
async fn test_faulty_listener_is_isolated() {
    let mut supervisor = ListenerSupervisor::new(Arc::new(TickPacer::new()), None);
    let healthy = supervisor.spawn(Arc::new(Heartbeat));
    let broken = supervisor.spawn(Arc::new(Broken::default()));

    wait_for_status(&broken, SourceStatus::Faulted("sensor unplugged".to_string())).await;
    assert_eq!(broken.formatted_latest_snapshot(), "", "A faulted source contributes nothing");

    let before = healthy.latest().expect("heartbeat published").text;
    tokio::time::sleep(Duration::from_millis(30)).await;
    let after = healthy.latest().expect("heartbeat published").text;

    assert_eq!(healthy.status(), SourceStatus::Live);
    assert_ne!(before, after, "Healthy source keeps updating");
    assert_eq!(supervisor.handles().len(), 2);

    supervisor.join().await;
}

#[tokio::test]
async fn test_panicking_listener_is_contained() {
    let mut supervisor = ListenerSupervisor::new(Arc::new(TickPacer::new()), None);
    let handle = supervisor.spawn(Arc::new(Panicky));

    wait_for_status(&handle, SourceStatus::Faulted("listener panicked".to_string())).await;
    supervisor.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_faulted_listener_restarts_after_delay() {
    let broken = Arc::new(Broken::default());
    let mut supervisor = ListenerSupervisor::new(Arc::new(TickPacer::new()), Some(Duration::from_millis(100)));
    supervisor.spawn(broken.clone());

    tokio::time::sleep(Duration::from_millis(250)).await;
    // Started at 0, 100 and 200ms.
    assert!(broken.starts.load(Ordering::SeqCst) >= 3);

    supervisor.join().await;
    let stopped_at = broken.starts.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(broken.starts.load(Ordering::SeqCst), stopped_at, "No restarts after shutdown");
}

#[tokio::test]
async fn test_shutdown_stops_pending_listener() {
    let mut supervisor = ListenerSupervisor::new(Arc::new(TickPacer::new()), None);
    let handle = supervisor.spawn(Arc::new(Silent));
    wait_for_status(&handle, SourceStatus::Live).await;

    let token = supervisor.token();
    tokio::time::timeout(Duration::from_secs(5), supervisor.join())
        .await
        .expect("join must not hang on a listener that never returns");
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_urgent_publish_forces_next_cycle() {
    let pacer = Arc::new(TickPacer::new());
    let (buffer, handle) = buffer::source("Voice", true, Some(pacer.clone()));

    buffer.publish("background chatter");
    assert!(!pacer.is_forced());

    buffer.publish_urgent("hello robot");
    assert!(pacer.is_forced());
    assert!(handle.triggers_vocalization());
    assert_eq!(handle.formatted_latest_snapshot(), "Voice INPUT\n// START\nhello robot\n// END");

    // Reading a triggering source consumes the utterance.
    assert_eq!(handle.formatted_latest_snapshot(), "");
    assert!(handle.latest().is_none());
}

#[tokio::test]
async fn test_plain_source_keeps_reading_across_snapshots() {
    let (buffer, handle) = buffer::source("Camera", false, None);
    buffer.publish("a chair");

    let first = handle.formatted_latest_snapshot();
    assert_eq!(first, "Camera INPUT\n// START\na chair\n// END");
    assert_eq!(handle.formatted_latest_snapshot(), first, "Latest value stays until replaced");
}

#[tokio::test(start_paused = true)]
async fn test_latest_reading_replaces_and_ages() {
    let (buffer, handle) = buffer::source("Lidar", false, None);
    assert!(handle.staleness().is_none());
    assert_eq!(handle.status(), SourceStatus::Idle);

    buffer.publish("obstacle at 2m");
    buffer.publish("clear");
    assert_eq!(handle.latest().map(|r| r.text), Some("clear".to_string()));

    tokio::time::advance(Duration::from_millis(300)).await;
    let age = handle.staleness().expect("reading present");
    assert!(age >= Duration::from_millis(300));

    buffer.clear();
    assert!(handle.latest().is_none());
    assert_eq!(handle.formatted_latest_snapshot(), "");
}
