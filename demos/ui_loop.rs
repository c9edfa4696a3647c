//! # Coalesced affinity delivery
//!
//! Models a host with a designated "UI" context: scheduling requests land on
//! a channel, and the host drains that channel when it gets around to it.
//! Three back-to-back publishes arrive before the host runs anything, so
//! exactly one drain request is issued - and that single drain delivers all
//! three events in publish order.
//!
//! ## Run
//! ```bash
//! cargo run --example ui_loop
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

use dualbus::{AffinitySubscribe, Event, Job, PubSub, SchedulerFn};

struct TickView;

impl AffinitySubscribe for TickView {
    fn on_event(&self, event: &Event) {
        println!(
            "[ui] {} #{} payload={:?}",
            event.topic(),
            event.seq,
            event.payload_ref::<u32>()
        );
    }

    fn name(&self) -> &'static str {
        "tick_view"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Scheduling requests queue here until the "UI loop" below drains them.
    let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<Job>();
    let scheduler = SchedulerFn::arc(move |job: Job| {
        let _ = jobs_tx.send(job);
    });

    let bus = PubSub::builder(scheduler).build();
    bus.subscribe_affinity("tick", Arc::new(TickView));

    for n in 0..3u32 {
        let accepted = bus.publish_on_affinity(Event::new("tick", n));
        println!("[producer] published tick {n} accepted={accepted}");
    }

    // The "UI loop": run whatever the bus scheduled. Three publishes while
    // idle → busy happened once → one request.
    let mut requests = 0;
    while let Ok(job) = jobs_rx.try_recv() {
        requests += 1;
        job();
    }
    println!("[ui] ran {requests} drain request(s) for 3 publishes");

    bus.shutdown().await?;
    Ok(())
}
