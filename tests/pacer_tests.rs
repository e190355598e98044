use std::sync::Arc;
use std::time::Duration;

use cortex::kernel::time::{period_for, Tick, TickPacer};
use tokio::time::Instant;

#[test]
fn test_tick_advances_monotonically() {
    let tick = Tick::new();
    assert_eq!(tick.frame, 0);
    assert_eq!(tick.next().next().frame, 2);
    assert!(tick.next() > tick);
}

#[test]
fn test_period_from_hertz() {
    assert_eq!(period_for(2.0), Duration::from_millis(500));
    assert_eq!(period_for(0.5), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_force_immediate_skips_exactly_one_wait() {
    let pacer = TickPacer::new();
    pacer.force_immediate();
    assert!(pacer.is_forced());

    let start = Instant::now();
    let skipped = pacer.wait(Duration::from_secs(5)).await;
    assert!(skipped, "Forced wait should report the skip");
    assert_eq!(start.elapsed(), Duration::ZERO, "Forced wait must not block");
    assert!(!pacer.is_forced(), "Override must be cleared after one use");

    let start = Instant::now();
    let skipped = pacer.wait(Duration::from_secs(5)).await;
    assert!(!skipped);
    assert!(start.elapsed() >= Duration::from_secs(5), "Subsequent wait must block normally");
}

#[tokio::test(start_paused = true)]
async fn test_force_immediate_is_idempotent() {
    let pacer = TickPacer::new();
    pacer.force_immediate();
    pacer.force_immediate();
    pacer.force_immediate();

    assert!(pacer.wait(Duration::from_secs(1)).await);

    let start = Instant::now();
    assert!(!pacer.wait(Duration::from_secs(1)).await, "Repeated forces collapse into one skip");
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_force_during_wait_wakes_it() {
    let pacer = Arc::new(TickPacer::new());

    let forcer = pacer.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        forcer.force_immediate();
    });

    let start = Instant::now();
    let skipped = pacer.wait(Duration::from_secs(10)).await;
    assert!(skipped);
    assert!(start.elapsed() < Duration::from_secs(10), "Override should cut the pending wait short");
    assert!(!pacer.is_forced(), "Override consumed by the woken wait");
}

#[tokio::test(start_paused = true)]
async fn test_wait_is_anchored_on_cycle_start() {
    let pacer = TickPacer::new();
    let period = Duration::from_millis(1000);

    // Simulate 300ms of cycle processing before pacing.
    let cycle_start = Instant::now();
    tokio::time::sleep(Duration::from_millis(300)).await;

    pacer.wait_from(cycle_start, period).await;
    let elapsed = cycle_start.elapsed();
    assert!(elapsed >= period, "Wait must reach the deadline");
    assert!(elapsed < period + Duration::from_millis(5), "Processing time is absorbed, not added: {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_overrun_cycle_does_not_wait() {
    let pacer = TickPacer::new();
    let cycle_start = Instant::now();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let before = Instant::now();
    let skipped = pacer.wait_from(cycle_start, Duration::from_millis(1000)).await;
    assert!(!skipped, "An overrun is not an override");
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_no_cumulative_drift() {
    let pacer = TickPacer::new();
    let period = Duration::from_millis(100);
    let origin = Instant::now();

    for _ in 0..10 {
        let cycle_start = Instant::now();
        tokio::time::sleep(Duration::from_millis(30)).await;
        pacer.wait_from(cycle_start, period).await;
    }

    let elapsed = origin.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1020), "Ten cycles drifted to {:?}", elapsed);
}
