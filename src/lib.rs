//! # dualbus
//!
//! **Dualbus** is a two-lane in-process publish/subscribe bus for Rust.
//!
//! Producers and consumers inside one process are decoupled through
//! topic-keyed events with two delivery contracts for the same envelope:
//!
//! - **worker lane**: callbacks run on a dedicated background task;
//! - **affinity lane**: callbacks run on a single host-designated context
//!   (a UI thread, a game loop), reached through coalesced scheduling
//!   requests: many publishes, at most one outstanding request.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  producer threads                 PubSub                     consumers
//!  ────────────────   ┌────────────────────────────────┐   ──────────────
//!  publish(ev) ─────► │ workers registry ─ membership?  │
//!                     │   └─► [worker queue] ─────────► │ worker task
//!                     │                                 │   └─► Subscribe::on_event
//!  publish_on_ ─────► │ affinity registry ─ membership? │
//!  affinity(ev)       │   └─► [affinity queue]          │
//!                     │        busy: false ─► true ────►│ AffinityScheduler
//!                     │        (one request per         │   └─► drain on the
//!                     │         idle→busy transition)   │       designated context
//!                     └────────────────────────────────┘       └─► AffinitySubscribe::on_event
//! ```
//!
//! ### Delivery contract
//! - An event is enqueued only if its topic has a listener in the matching
//!   lane at publish time; `publish`/`publish_on_affinity` report that as a
//!   plain `bool`, not an error.
//! - Each queue is unbounded FIFO; ordering holds per queue, never across
//!   lanes or topics.
//! - Listener sets are identity-deduplicated and safe to mutate while a
//!   dispatch iterates a snapshot; a removal becomes visible to the next
//!   iteration.
//! - A panicking listener is caught and logged; neither lane stops.
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                 |
//! |-----------------|----------------------------------------------------------|------------------------------------|
//! | **Envelope**    | Immutable topic + opaque payload unit.                   | [`Event`], [`Payload`]             |
//! | **Worker lane** | Async listeners on a dedicated background task.          | [`Subscribe`]                      |
//! | **Affinity lane**| Sync listeners on the host-designated context.          | [`AffinitySubscribe`]              |
//! | **Scheduling**  | Host seam for the designated context.                    | [`AffinityScheduler`], [`SchedulerFn`] |
//! | **Coordination**| Construction, publish/subscribe surface, shutdown.       | [`PubSub`], [`PubSubBuilder`], [`Config`] |
//! | **Errors**      | Lifecycle-only error type.                               | [`BusError`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use dualbus::{Event, Job, PubSub, SchedulerFn, Subscribe};
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Printer {
//!     async fn on_event(&self, event: &Event) {
//!         println!("got {} #{}", event.topic(), event.seq);
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Demo scheduler: runs affinity drains inline on the publishing
//!     // thread. Real hosts forward the job to their event loop instead.
//!     let scheduler = SchedulerFn::arc(|job: Job| job());
//!     let bus = PubSub::builder(scheduler).build();
//!
//!     bus.subscribe("tick", Arc::new(Printer));
//!     bus.publish(Event::new("tick", 1u32));
//!
//!     bus.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod listeners;

pub mod global;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{AffinityScheduler, Job, PubSub, PubSubBuilder, SchedulerFn};
pub use error::BusError;
pub use events::{Event, Payload};
pub use listeners::{AffinitySubscribe, Subscribe, TopicRegistry};

// Optional: expose a simple built-in logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
