//! Listener traits and the per-lane topic registries.
//!
//! ## Contents
//! - [`Subscribe`] worker-lane listener contract (async callbacks)
//! - [`AffinitySubscribe`] affinity-lane listener contract (sync callbacks)
//! - [`TopicRegistry`] concurrent topic → listener-set mapping
//! - [`LogWriter`] stdout demo listener (feature = `logging`)

mod registry;
mod subscribe;

pub use registry::TopicRegistry;
pub use subscribe::{AffinitySubscribe, Subscribe};

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
