//! Core runtime: coordinator, delivery lanes, and the scheduler seam.
//!
//! ## Wiring
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │  PubSub (coordinator)                        │
//!   publish ───────► │  workers: TopicRegistry<dyn Subscribe>       │
//!   publish_on_ ───► │  affinity: TopicRegistry<dyn AffinitySub.>   │
//!   affinity         │  worker_tx ──► [unbounded worker queue]      │
//!                    │  gate: AffinityGate                          │
//!                    └───────┬───────────────────────┬──────────────┘
//!                            │                       │
//!                            ▼                       ▼
//!                  worker task (tokio)       AffinityGate.submit()
//!                  recv → snapshot →           push → CAS idle→busy
//!                  fan-out (async)             └─ won? schedule(drain)
//!                            │                       │
//!                            ▼                       ▼ (host-designated context)
//!                  Subscribe::on_event       drain: pop → snapshot →
//!                                            AffinitySubscribe::on_event
//!                                            … until empty → idle
//! ```
//!
//! - `bus` owns the public API surface;
//! - `worker` is the background drain loop;
//! - `affinity` holds the coalescing gate;
//! - `scheduler` is the seam to the host's designated context;
//! - `builder` wires everything at construction.

mod affinity;
mod builder;
mod bus;
mod scheduler;
mod worker;

pub use builder::PubSubBuilder;
pub use bus::PubSub;
pub use scheduler::{AffinityScheduler, Job, SchedulerFn};
