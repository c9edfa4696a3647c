//! Error types used by the bus.
//!
//! Normal operation reports outcomes through booleans, not errors:
//! publishing to a topic nobody listens to returns `false`, and redundant
//! subscribe/unsubscribe calls are silent no-ops. [`BusError`] covers only
//! lifecycle edges - installing the global instance twice, or a shutdown
//! that outlives its grace period.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by bus lifecycle operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The process-wide bus was already installed by an earlier `init`.
    #[error("global bus already initialized")]
    AlreadyInitialized,

    /// Shutdown grace period was exceeded; the worker task is detached and
    /// left to finish its in-flight callback on its own.
    #[error("shutdown grace {grace:?} exceeded; worker still draining")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dualbus::BusError;
    ///
    /// assert_eq!(BusError::AlreadyInitialized.as_label(), "bus_already_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::AlreadyInitialized => "bus_already_initialized",
            BusError::GraceExceeded { .. } => "bus_grace_exceeded",
        }
    }
}
