//! # Custom worker-lane listener
//!
//! Shows how to implement a custom listener to count deliveries per topic,
//! and how the publish result reports whether anyone was listening.
//!
//! ## Run
//! ```bash
//! cargo run --example metrics
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    time::Duration,
};

use dualbus::{Event, Job, PubSub, SchedulerFn, Subscribe};

struct Metrics {
    ticks: AtomicU64,
    tocks: AtomicU64,
}

impl Metrics {
    fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            tocks: AtomicU64::new(0),
        }
    }

    fn print_stats(&self) {
        println!();
        println!("Deliveries:");
        println!(" ├─► tick: {}", self.ticks.load(Ordering::Relaxed));
        println!(" └─► tock: {}", self.tocks.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for Metrics {
    async fn on_event(&self, event: &Event) {
        match event.topic() {
            "tick" => {
                self.ticks.fetch_add(1, Ordering::Relaxed);
            }
            "tock" => {
                self.tocks.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // This demo only uses the worker lane; affinity drains run inline.
    let bus = PubSub::builder(SchedulerFn::arc(|job: Job| job())).build();

    let metrics = Arc::new(Metrics::new());
    bus.subscribe_many(Arc::clone(&metrics) as Arc<dyn Subscribe>, &["tick", "tock"]);

    for n in 0..5u32 {
        bus.publish(Event::new("tick", n));
        if n % 2 == 0 {
            bus.publish(Event::new("tock", n));
        }
    }

    // Nobody listens on this topic: the bus says so and drops the event.
    let accepted = bus.publish(Event::new("untracked", 0u32));
    println!("[producer] publish to untracked topic accepted={accepted}");

    // Let the worker task drain before reading the counters.
    tokio::time::sleep(Duration::from_millis(200)).await;
    metrics.print_stats();

    bus.shutdown().await?;
    Ok(())
}
