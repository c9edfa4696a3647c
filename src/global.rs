//! Process-wide access to a designated bus instance.
//!
//! Construction stays explicit - whoever owns startup builds the bus via
//! [`PubSub::builder`] and decides whether to install it here. After
//! [`init`], any module can reach the shared instance through [`get`] or
//! [`instance`] without threading an `Arc` through every call site.
//!
//! # Example
//!
//! ```ignore
//! // At startup, once:
//! let bus = PubSub::builder(scheduler).build();
//! dualbus::global::init(bus)?;
//!
//! // In any module:
//! dualbus::global::instance().publish(Event::new("tick", 1u32));
//! ```

use std::sync::{Arc, OnceLock};

use crate::core::PubSub;
use crate::error::BusError;

/// The designated process-wide instance.
static BUS: OnceLock<Arc<PubSub>> = OnceLock::new();

/// Installs `bus` as the process-wide instance.
///
/// Safe to race: exactly one caller wins. Every later call returns
/// [`BusError::AlreadyInitialized`] and leaves the installed instance
/// untouched.
pub fn init(bus: Arc<PubSub>) -> Result<(), BusError> {
    BUS.set(bus).map_err(|_| BusError::AlreadyInitialized)
}

/// Returns the process-wide instance, if one was installed.
pub fn get() -> Option<Arc<PubSub>> {
    BUS.get().cloned()
}

/// Returns the process-wide instance.
///
/// # Panics
///
/// Panics if [`init`] has not been called. Prefer [`get`] where an
/// uninitialized bus is a recoverable situation.
pub fn instance() -> Arc<PubSub> {
    get().expect("global bus not initialized - call global::init() first")
}
