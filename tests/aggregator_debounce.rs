// tests/aggregator_debounce.rs

mod common;
use crate::common::init_tracing;

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use buildwatch::engine::RuntimeEvent;
use buildwatch::shutdown::{self, Shutdown};
use buildwatch::types::ChangeKind;
use buildwatch::watch::{ChangeAggregator, ChangeBatch, RawChange};

const WINDOW: Duration = Duration::from_millis(200);

async fn next_batch(rx: &mut mpsc::Receiver<RuntimeEvent>) -> ChangeBatch {
    match rx.recv().await {
        Some(RuntimeEvent::ChangesSealed(batch)) => batch,
        other => panic!("expected ChangesSealed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn burst_on_one_path_becomes_one_batch() {
    init_tracing();
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (rt_tx, mut rt_rx) = mpsc::channel(8);
    let handle = ChangeAggregator::new(WINDOW).spawn(raw_rx, rt_tx, Shutdown::never());

    for _ in 0..5 {
        raw_tx
            .send(RawChange::new("/p/a.scss", ChangeKind::Modified))
            .unwrap();
    }
    let sent_at = Instant::now();

    let batch = next_batch(&mut rt_rx).await;
    assert!(sent_at.elapsed() >= WINDOW);
    assert!(batch.is_sealed());
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.event_count(), 5);
    assert_eq!(batch.kind_of(Path::new("/p/a.scss")), Some(ChangeKind::Modified));

    drop(raw_tx);
    assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn each_change_rearms_the_quiet_period() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (rt_tx, mut rt_rx) = mpsc::channel(8);
    let _handle = ChangeAggregator::new(WINDOW).spawn(raw_rx, rt_tx, Shutdown::never());

    raw_tx.send(RawChange::new("/p/a.js", ChangeKind::Added)).unwrap();
    sleep(Duration::from_millis(150)).await;
    raw_tx.send(RawChange::new("/p/b.js", ChangeKind::Modified)).unwrap();
    sleep(Duration::from_millis(150)).await;
    raw_tx.send(RawChange::new("/p/a.js", ChangeKind::Removed)).unwrap();
    let last = Instant::now();

    // 300ms after the first change, but the window keeps moving.
    assert!(rt_rx.try_recv().is_err());

    let batch = next_batch(&mut rt_rx).await;
    assert!(last.elapsed() >= WINDOW);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.event_count(), 3);
    assert_eq!(batch.kind_of(Path::new("/p/a.js")), Some(ChangeKind::Removed));
}

#[tokio::test(start_paused = true)]
async fn changes_separated_by_the_window_form_separate_batches() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (rt_tx, mut rt_rx) = mpsc::channel(8);
    let handle = ChangeAggregator::new(WINDOW).spawn(raw_rx, rt_tx, Shutdown::never());

    raw_tx.send(RawChange::new("/p/one.css", ChangeKind::Modified)).unwrap();
    let first = next_batch(&mut rt_rx).await;

    sleep(Duration::from_millis(500)).await;
    raw_tx.send(RawChange::new("/p/two.css", ChangeKind::Modified)).unwrap();
    let second = next_batch(&mut rt_rx).await;

    assert_eq!(first.paths().collect::<Vec<_>>(), vec![Path::new("/p/one.css")]);
    assert_eq!(second.paths().collect::<Vec<_>>(), vec![Path::new("/p/two.css")]);

    drop(raw_tx);
    assert_eq!(handle.await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_idle_stops_the_aggregator() {
    let (_raw_tx, raw_rx) = mpsc::unbounded_channel::<RawChange>();
    let (rt_tx, mut rt_rx) = mpsc::channel(8);
    let (trigger, shutdown) = shutdown::channel();
    let handle = ChangeAggregator::new(WINDOW).spawn(raw_rx, rt_tx, shutdown);

    trigger.trigger();

    assert_eq!(handle.await.unwrap(), 0);
    assert!(rt_rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn closing_the_raw_channel_flushes_the_open_batch() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (rt_tx, mut rt_rx) = mpsc::channel(8);
    let handle = ChangeAggregator::new(WINDOW).spawn(raw_rx, rt_tx, Shutdown::never());

    raw_tx.send(RawChange::new("/p/x.html", ChangeKind::Added)).unwrap();
    drop(raw_tx);

    let batch = next_batch(&mut rt_rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test]
async fn dropped_runtime_stops_the_aggregator() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (rt_tx, rt_rx) = mpsc::channel(1);
    drop(rt_rx);
    let handle = ChangeAggregator::new(Duration::from_millis(10)).spawn(raw_rx, rt_tx, Shutdown::never());

    raw_tx.send(RawChange::new("/p/x.html", ChangeKind::Added)).unwrap();

    let emitted = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("aggregator should stop")
        .unwrap();
    assert_eq!(emitted, 0);
}

#[test]
fn merge_keeps_the_latest_kind_and_sums_events() {
    let mut a = ChangeBatch::from_changes([
        RawChange::new("/p/a", ChangeKind::Added),
        RawChange::new("/p/b", ChangeKind::Modified),
    ]);
    let b = ChangeBatch::from_changes([RawChange::new("/p/a", ChangeKind::Removed)]);
    a.merge(b);

    assert_eq!(a.len(), 2);
    assert_eq!(a.event_count(), 3);
    assert_eq!(a.kind_of(Path::new("/p/a")), Some(ChangeKind::Removed));
    assert!(!a.is_full());

    a.merge(ChangeBatch::full());
    assert!(a.is_full());

    let full = ChangeBatch::full();
    assert_eq!(full.len(), 0);
    assert!(!full.is_empty());
}
