//! # PubSub: the coordinator owning both lanes.
//!
//! [`PubSub`] is the single access point: it owns the two listener
//! registries, the worker queue's send half, the [`AffinityGate`], and the
//! worker task handle. Producers publish through it, consumers register
//! listeners through it, and whoever constructed it tears it down through
//! [`PubSub::shutdown`].
//!
//! ## Key responsibilities
//! - route `publish` to the worker queue after an O(1) membership check
//! - route `publish_on_affinity` through the coalescing gate
//! - expose subscribe/unsubscribe (single- and multi-topic) for both lanes
//! - stop the worker task within a configurable grace on shutdown
//!
//! See `core/mod.rs` for the system-level wiring diagram.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::Config;
use crate::core::affinity::AffinityGate;
use crate::core::builder::PubSubBuilder;
use crate::core::scheduler::AffinityScheduler;
use crate::error::BusError;
use crate::events::Event;
use crate::listeners::{AffinitySubscribe, Subscribe, TopicRegistry};

/// Two-lane in-process publish/subscribe bus.
///
/// Construct via [`PubSub::builder`]; construction spawns the worker drain
/// task, so it must happen inside a tokio runtime. The instance is shared
/// behind an [`Arc`] and every method takes `&self`.
pub struct PubSub {
    cfg: Config,
    workers: Arc<TopicRegistry<dyn Subscribe>>,
    affinity: Arc<TopicRegistry<dyn AffinitySubscribe>>,
    worker_tx: mpsc::UnboundedSender<Event>,
    gate: Arc<AffinityGate>,
    token: CancellationToken,
    /// Taken by the first `shutdown` call.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PubSub {
    /// Starts building a bus around the given affinity scheduler.
    pub fn builder(scheduler: Arc<dyn AffinityScheduler>) -> PubSubBuilder {
        PubSubBuilder::new(scheduler)
    }

    pub(super) fn new_internal(
        cfg: Config,
        workers: Arc<TopicRegistry<dyn Subscribe>>,
        affinity: Arc<TopicRegistry<dyn AffinitySubscribe>>,
        worker_tx: mpsc::UnboundedSender<Event>,
        gate: Arc<AffinityGate>,
        token: CancellationToken,
        worker: JoinHandle<()>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            workers,
            affinity,
            worker_tx,
            gate,
            token,
            worker: Mutex::new(Some(worker)),
        })
    }

    // ---------------------------
    // Worker lane
    // ---------------------------

    /// Registers a worker-lane listener for one topic. Idempotent.
    pub fn subscribe(&self, topic: &str, listener: Arc<dyn Subscribe>) {
        self.workers.insert(topic, &listener);
    }

    /// Registers a worker-lane listener for each of several topics.
    pub fn subscribe_many(&self, listener: Arc<dyn Subscribe>, topics: &[&str]) {
        for topic in topics {
            self.workers.insert(topic, &listener);
        }
    }

    /// Removes a worker-lane listener from one topic. Absent = no-op.
    pub fn unsubscribe(&self, topic: &str, listener: &Arc<dyn Subscribe>) {
        self.workers.remove(topic, listener);
    }

    /// Removes a worker-lane listener from each of several topics.
    pub fn unsubscribe_many(&self, listener: &Arc<dyn Subscribe>, topics: &[&str]) {
        for topic in topics {
            self.workers.remove(topic, listener);
        }
    }

    /// Publishes an event to the worker lane.
    ///
    /// Returns `true` when the event was enqueued: some worker listener was
    /// registered for its topic at check time and the bus is still running.
    /// Returns `false` otherwise; a `false` outcome is routine, not an
    /// error. The membership check is best-effort - a listener removed
    /// between check and drain simply means the event is discarded at drain
    /// time.
    pub fn publish(&self, event: Event) -> bool {
        if !self.workers.contains(event.topic()) {
            trace!(topic = event.topic(), seq = event.seq, "no worker listeners, rejecting");
            return false;
        }
        trace!(topic = event.topic(), seq = event.seq, "enqueueing on worker lane");
        self.worker_tx.send(event).is_ok()
    }

    // ---------------------------
    // Affinity lane
    // ---------------------------

    /// Registers an affinity-lane listener for one topic. Idempotent.
    pub fn subscribe_affinity(&self, topic: &str, listener: Arc<dyn AffinitySubscribe>) {
        self.affinity.insert(topic, &listener);
    }

    /// Registers an affinity-lane listener for each of several topics.
    pub fn subscribe_affinity_many(&self, listener: Arc<dyn AffinitySubscribe>, topics: &[&str]) {
        for topic in topics {
            self.affinity.insert(topic, &listener);
        }
    }

    /// Removes an affinity-lane listener from one topic. Absent = no-op.
    pub fn unsubscribe_affinity(&self, topic: &str, listener: &Arc<dyn AffinitySubscribe>) {
        self.affinity.remove(topic, listener);
    }

    /// Removes an affinity-lane listener from each of several topics.
    pub fn unsubscribe_affinity_many(
        &self,
        listener: &Arc<dyn AffinitySubscribe>,
        topics: &[&str],
    ) {
        for topic in topics {
            self.affinity.remove(topic, listener);
        }
    }

    /// Publishes an event to the affinity lane.
    ///
    /// Returns `false` (without enqueueing) when no affinity listener is
    /// registered for the topic at check time. Otherwise the event is queued
    /// and at most one drain request is outstanding at any moment: the
    /// publish that flips the lane from idle to busy schedules the drain,
    /// and every other publish rides on it.
    pub fn publish_on_affinity(&self, event: Event) -> bool {
        if !self.affinity.contains(event.topic()) {
            trace!(topic = event.topic(), seq = event.seq, "no affinity listeners, rejecting");
            return false;
        }
        self.gate.submit(event);
        true
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Stops the worker task, waiting up to [`Config::grace`].
    ///
    /// Idempotent: later calls return `Ok(())` without waiting. The affinity
    /// lane needs no teardown of its own - it only runs while the host's
    /// scheduler runs a drain job. After shutdown, `publish` returns `false`
    /// for every event.
    pub async fn shutdown(&self) -> Result<(), BusError> {
        self.token.cancel();

        let handle = {
            let mut worker = self.worker.lock().expect("worker handle mutex poisoned");
            worker.take()
        };
        let Some(handle) = handle else {
            return Ok(());
        };

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, handle).await {
            Ok(_) => Ok(()),
            Err(_) => Err(BusError::GraceExceeded { grace }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::{Job, SchedulerFn};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    /// Worker-lane listener forwarding each delivered seq to the test.
    struct Probe {
        tx: mpsc::UnboundedSender<u64>,
    }

    impl Probe {
        fn pair() -> (Arc<Probe>, mpsc::UnboundedReceiver<u64>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Probe { tx }), rx)
        }
    }

    #[async_trait]
    impl Subscribe for Probe {
        async fn on_event(&self, event: &Event) {
            let _ = self.tx.send(event.seq);
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("listener blew up");
        }
    }

    /// Scheduler fake: records requests, runs jobs only when told to.
    struct ManualScheduler {
        jobs: Mutex<Vec<Job>>,
        requests: AtomicUsize,
    }

    impl ManualScheduler {
        fn arc() -> Arc<Self> {
            Arc::new(Self {
                jobs: Mutex::new(Vec::new()),
                requests: AtomicUsize::new(0),
            })
        }

        fn requests(&self) -> usize {
            self.requests.load(AtomicOrdering::SeqCst)
        }

        fn run_pending(&self) {
            let jobs: Vec<Job> = std::mem::take(&mut *self.jobs.lock().unwrap());
            for job in jobs {
                job();
            }
        }
    }

    impl AffinityScheduler for ManualScheduler {
        fn schedule(&self, job: Job) {
            self.requests.fetch_add(1, AtomicOrdering::SeqCst);
            self.jobs.lock().unwrap().push(job);
        }
    }

    /// Affinity listener recording delivered seqs.
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    impl Recorder {
        fn arc() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl AffinitySubscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.seq);
        }
    }

    fn inline_bus() -> Arc<PubSub> {
        PubSub::builder(SchedulerFn::arc(|job: Job| job())).build()
    }

    async fn recv_within(rx: &mut mpsc::UnboundedReceiver<u64>, ms: u64) -> Option<u64> {
        tokio::time::timeout(Duration::from_millis(ms), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_publish_without_listener_returns_false() {
        let bus = inline_bus();
        assert!(!bus.publish(Event::new("nobody-home", ())));

        // A listener on the other lane does not satisfy the worker lane.
        bus.subscribe_affinity("tick", Recorder::arc());
        assert!(!bus.publish(Event::new("tick", ())));

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_delivers_to_every_listener_exactly_once() {
        let bus = inline_bus();
        let (first, mut rx_first) = Probe::pair();
        let (second, mut rx_second) = Probe::pair();

        bus.subscribe("tick", first);
        bus.subscribe("tick", second);

        let event = Event::new("tick", 7u32);
        let seq = event.seq;
        assert!(bus.publish(event));

        assert_eq!(recv_within(&mut rx_first, 2_000).await, Some(seq));
        assert_eq!(recv_within(&mut rx_second, 2_000).await, Some(seq));
        assert_eq!(recv_within(&mut rx_first, 100).await, None);
        assert_eq!(recv_within(&mut rx_second, 100).await, None);

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_lane_is_fifo() {
        let bus = inline_bus();
        let (probe, mut rx) = Probe::pair();
        bus.subscribe("tick", probe);

        let events: Vec<Event> = (0..3).map(|n| Event::new("tick", n)).collect();
        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        for event in events {
            assert!(bus.publish(event));
        }

        for want in expected {
            assert_eq!(recv_within(&mut rx, 2_000).await, Some(want));
        }

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_double_subscribe_delivers_once() {
        let bus = inline_bus();
        let (probe, mut rx) = Probe::pair();

        bus.subscribe("tick", Arc::clone(&probe) as Arc<dyn Subscribe>);
        bus.subscribe("tick", probe);

        assert!(bus.publish(Event::new("tick", ())));
        assert!(recv_within(&mut rx, 2_000).await.is_some());
        assert_eq!(recv_within(&mut rx, 100).await, None);

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_routing() {
        let bus = inline_bus();
        let (probe, _rx) = Probe::pair();
        let listener = probe as Arc<dyn Subscribe>;

        bus.subscribe("tick", Arc::clone(&listener));
        assert!(bus.publish(Event::new("tick", ())));

        bus.unsubscribe("tick", &listener);
        assert!(!bus.publish(Event::new("tick", ())));

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_many_and_unsubscribe_many() {
        let bus = inline_bus();
        let (probe, mut rx) = Probe::pair();
        let listener = probe as Arc<dyn Subscribe>;

        bus.subscribe_many(Arc::clone(&listener), &["tick", "tock"]);
        assert!(bus.publish(Event::new("tick", ())));
        assert!(bus.publish(Event::new("tock", ())));
        assert!(recv_within(&mut rx, 2_000).await.is_some());
        assert!(recv_within(&mut rx, 2_000).await.is_some());

        bus.unsubscribe_many(&listener, &["tick", "tock"]);
        assert!(!bus.publish(Event::new("tick", ())));
        assert!(!bus.publish(Event::new("tock", ())));

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_block_others() {
        let bus = inline_bus();
        let (probe, mut rx) = Probe::pair();

        // Registered first, so it runs first and panics first.
        bus.subscribe("tick", Arc::new(Panicker) as Arc<dyn Subscribe>);
        bus.subscribe("tick", probe);

        assert!(bus.publish(Event::new("tick", ())));
        assert!(recv_within(&mut rx, 2_000).await.is_some());

        // Lane survived the panic.
        assert!(bus.publish(Event::new("tick", ())));
        assert!(recv_within(&mut rx, 2_000).await.is_some());

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_affinity_burst_coalesces_and_delivers_in_order() {
        let scheduler = ManualScheduler::arc();
        let bus = PubSub::builder(Arc::clone(&scheduler) as Arc<dyn AffinityScheduler>).build();

        let recorder = Recorder::arc();
        bus.subscribe_affinity("tick", Arc::clone(&recorder) as Arc<dyn AffinitySubscribe>);

        assert!(!bus.publish_on_affinity(Event::new("untracked", ())));

        let events: Vec<Event> = (0..3).map(|n| Event::new("tick", n)).collect();
        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        for event in events {
            assert!(bus.publish_on_affinity(event));
        }

        // Three publishes before the host ran anything: one request.
        assert_eq!(scheduler.requests(), 1);
        scheduler.run_pending();
        assert_eq!(*recorder.seen.lock().unwrap(), expected);

        bus.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_the_worker_lane() {
        let bus = inline_bus();
        let (probe, _rx) = Probe::pair();
        bus.subscribe("tick", probe);

        bus.shutdown().await.unwrap();
        // Second call is a no-op.
        bus.shutdown().await.unwrap();

        // Listener still registered, but the lane is gone.
        assert!(!bus.publish(Event::new("tick", ())));
    }

    #[tokio::test]
    async fn test_shutdown_grace_exceeded_by_stuck_listener() {
        struct Stuck {
            entered: mpsc::UnboundedSender<u64>,
        }

        #[async_trait]
        impl Subscribe for Stuck {
            async fn on_event(&self, event: &Event) {
                let _ = self.entered.send(event.seq);
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }

        let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
        let bus = PubSub::builder(SchedulerFn::arc(|job: Job| job()))
            .config(Config {
                grace: Duration::from_millis(50),
                ..Config::default()
            })
            .build();

        bus.subscribe("tick", Arc::new(Stuck { entered: entered_tx }) as Arc<dyn Subscribe>);
        assert!(bus.publish(Event::new("tick", ())));

        // Wait until the callback is definitely in flight.
        assert!(recv_within(&mut entered_rx, 2_000).await.is_some());

        let err = bus.shutdown().await.unwrap_err();
        assert_eq!(err.as_label(), "bus_grace_exceeded");
    }
}
