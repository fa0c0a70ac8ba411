//! Behaviour of the protocol components against in-memory fakes

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::domain::state::ResourceState;
use tranche_core::domain::work_item::WorkItem;
use tranche_protocol::remote::{BatchSink, PageSource, StateSource};
use tranche_protocol::{
    ChunkedSubmitter, PageWalker, PollOutcome, PollPhase, PollerConfig, ProtocolError,
    StatePoller,
};

// =============================================================================
// Fakes
// =============================================================================

struct Spec(usize);

impl WorkItem for Spec {
    fn id(&self) -> &str {
        "spec"
    }
}

#[derive(Default)]
struct CountingSink {
    batch_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl BatchSink<Spec> for CountingSink {
    type Ack = usize;

    async fn submit(&self, batch: &[Spec]) -> anyhow::Result<Vec<usize>> {
        self.batch_sizes.lock().unwrap().push(batch.len());
        Ok(batch.iter().map(|spec| spec.0).collect())
    }
}

/// Always answers with the same cursor
struct StuckListing {
    calls: AtomicUsize,
}

#[async_trait]
impl PageSource<u32> for StuckListing {
    async fn fetch_next(&self, cursor: &Cursor) -> anyhow::Result<Page<u32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Page::new(vec![7], Some(cursor.to_string())))
    }
}

/// Reports `Resizing` until `steady_after` fetches, each fetch taking `latency`
struct SlowPool {
    latency: Duration,
    steady_after: usize,
    calls: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowPool {
    fn new(latency: Duration, steady_after: usize) -> Self {
        Self {
            latency,
            steady_after,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateSource<&'static str> for SlowPool {
    async fn fetch_state(&self, identifier: &str) -> anyhow::Result<ResourceState<&'static str>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            calls.len()
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let state = if call >= self.steady_after {
            "Steady"
        } else {
            "Resizing"
        };
        Ok(ResourceState::new(identifier, state))
    }
}

// =============================================================================
// ChunkedSubmitter
// =============================================================================

#[tokio::test]
async fn submit_call_count_is_ceiling_of_items_over_batch_size() {
    for (items, batch_size) in [(0, 100), (1, 100), (99, 100), (100, 100), (101, 100), (250, 100), (7, 3)] {
        let sink = CountingSink::default();
        let submitter = ChunkedSubmitter::new(&sink, batch_size).unwrap();
        let input: Vec<Spec> = (0..items).map(Spec).collect();

        let acks = submitter.submit_all(&input).await.unwrap();

        let sizes = sink.batch_sizes.into_inner().unwrap();
        assert_eq!(sizes.len(), items.div_ceil(batch_size), "{} items", items);
        assert!(sizes.iter().all(|size| *size <= batch_size));
        assert_eq!(acks, (0..items).collect::<Vec<_>>());
    }
}

// =============================================================================
// PageWalker
// =============================================================================

#[tokio::test]
async fn stuck_server_is_detected_on_second_attempt() {
    let source = StuckListing {
        calls: AtomicUsize::new(0),
    };
    let first = Page::new(vec![1, 2], Some("x".to_string()));

    let err = PageWalker::new(&source, first)
        .collect_all()
        .await
        .unwrap_err();

    match err {
        ProtocolError::StalledCursor { cursor } => assert_eq!(cursor.as_str(), "x"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// StatePoller
// =============================================================================

#[tokio::test(start_paused = true)]
async fn first_fetch_waits_one_interval() {
    let source = SlowPool::new(Duration::ZERO, 1);
    let poller = StatePoller::new(
        &source,
        PollerConfig::new(Duration::from_secs(8), Duration::from_secs(10)),
    );
    let started = Instant::now();

    poller
        .wait("pool-a", &"Steady", &CancellationToken::new())
        .await
        .unwrap();

    let times = source.call_times();
    assert_eq!(times[0] - started, Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn slow_fetches_never_overlap() {
    let source = SlowPool::new(Duration::from_secs(20), 3);
    let poller = StatePoller::new(
        &source,
        PollerConfig::new(Duration::from_secs(8), Duration::from_secs(10)),
    );

    let outcome = poller
        .wait("pool-a", &"Steady", &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.settled().is_some());
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);

    // Three polls plus the post-settle refresh, each starting after the previous one finished
    let times = source.call_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(20));
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_stops_fetching_and_skips_follow_up() {
    let source = SlowPool::new(Duration::ZERO, usize::MAX);
    let poller = StatePoller::new(
        &source,
        PollerConfig::new(Duration::from_secs(8), Duration::from_secs(10)),
    );
    let cancel = CancellationToken::new();
    let followed_up = AtomicBool::new(false);

    let wait = poller.wait_then("pool-a", &"Steady", &cancel, |_| async {
        followed_up.store(true, Ordering::SeqCst);
        Ok(())
    });
    let canceller = async {
        sleep(Duration::from_secs(20)).await;
        cancel.cancel();
    };

    let (outcome, ()) = tokio::join!(wait, canceller);

    assert_eq!(outcome.unwrap(), PollOutcome::Cancelled);
    assert!(!followed_up.load(Ordering::SeqCst));
    assert_eq!(poller.phase(), PollPhase::Cancelled);

    // Polls at 8s and 16s only
    let fetched = source.call_times().len();
    assert_eq!(fetched, 2);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(source.call_times().len(), fetched);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_settle_delay_skips_follow_up() {
    let source = SlowPool::new(Duration::ZERO, 1);
    let poller = StatePoller::new(
        &source,
        PollerConfig::new(Duration::from_secs(8), Duration::from_secs(10)),
    );
    let cancel = CancellationToken::new();
    let followed_up = AtomicBool::new(false);

    let wait = poller.wait_then("pool-a", &"Steady", &cancel, |_| async {
        followed_up.store(true, Ordering::SeqCst);
        Ok(())
    });
    // Reached at 8s, settling until 18s
    let canceller = async {
        sleep(Duration::from_secs(13)).await;
        cancel.cancel();
    };

    let (outcome, ()) = tokio::join!(wait, canceller);

    assert!(outcome.unwrap().is_cancelled());
    assert!(!followed_up.load(Ordering::SeqCst));
    assert_eq!(source.call_times().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn follow_up_failure_is_reported() {
    let source = SlowPool::new(Duration::ZERO, 1);
    let poller = StatePoller::new(
        &source,
        PollerConfig::new(Duration::from_secs(1), Duration::from_secs(1)),
    );

    let err = poller
        .wait_then("pool-a", &"Steady", &CancellationToken::new(), |_| async {
            Err::<(), _>(anyhow::anyhow!("delete rejected"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProtocolError::FollowUpFailed { .. }));
}
