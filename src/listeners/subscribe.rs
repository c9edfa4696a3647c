//! # Listener traits for the two delivery lanes.
//!
//! `Subscribe` is the extension point for worker-lane listeners: callbacks
//! run on the bus's dedicated background task and may be async. `AffinitySubscribe`
//! is its counterpart for the affinity lane: callbacks run synchronously on
//! the single host-designated context (for example a UI thread) and should
//! return quickly to keep that context responsive.
//!
//! ## Contract
//! - A listener may be registered for many topics; it receives one callback
//!   per delivered event.
//! - Registering the same listener handle twice for a topic is a no-op, as
//!   is removing a handle that was never registered.
//! - Callbacks must not assume a particular thread identity beyond the lane
//!   contract: worker-lane callbacks never run on the publisher's thread or
//!   the affinity context; affinity-lane callbacks always run on the
//!   designated context.
//! - A panicking callback is caught and logged; it does not stop delivery to
//!   other listeners and does not terminate either drain loop.
//!
//! ## Example (skeleton)
//! ```rust
//! // use dualbus::{Event, Subscribe};
//! //
//! // struct Audit;
//! // #[async_trait::async_trait]
//! // impl Subscribe for Audit {
//! //     async fn on_event(&self, event: &Event) {
//! //         // write audit record...
//! //     }
//! //     fn name(&self) -> &'static str { "audit" }
//! // }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for worker-lane listeners.
///
/// Called from the bus's dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits);
/// delivery to a topic's listeners is sequential, so a slow listener delays
/// the ones after it and every event behind this one.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this listener.
    ///
    /// # Parameters
    /// - `event`: Reference to the event (does not transfer ownership)
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Contract for affinity-lane listeners.
///
/// Called synchronously on the host-designated context while a drain is in
/// progress. Keep callbacks short: everything queued behind the current
/// event waits until this callback returns.
pub trait AffinitySubscribe: Send + Sync + 'static {
    /// Handle a single event for this listener.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
