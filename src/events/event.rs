//! # Event envelope flowing through the bus.
//!
//! [`Event`] is an immutable, topic-tagged unit of data. The topic is the
//! dispatch key; the payload is an opaque shared reference that the bus
//! carries but never inspects; consumers downcast it on arrival via
//! [`Event::payload_ref`].
//!
//! ## Ordering
//! Each event gets a process-global, monotonically increasing sequence
//! number (`seq`) at construction. `seq` reflects construction order, not
//! delivery order; within one queue, delivery is FIFO.
//!
//! ## Example
//! ```rust
//! use dualbus::Event;
//!
//! let ev = Event::new("sensor/temperature", 21.5f64);
//!
//! assert_eq!(ev.topic(), "sensor/temperature");
//! assert_eq!(ev.payload_ref::<f64>(), Some(&21.5));
//! assert_eq!(ev.payload_ref::<String>(), None);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque shared payload reference.
///
/// The bus treats the payload as a black box; only listeners give it
/// meaning, typically via [`Event::payload_ref`].
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Immutable topic-tagged unit carried through the bus.
///
/// Cloning is cheap: both the topic and the payload are shared references.
/// Topics are matched verbatim (no pattern syntax, no validation). An empty
/// topic string is legal and dispatches like any other topic.
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp taken at construction.
    pub at: SystemTime,

    topic: Arc<str>,
    payload: Payload,
}

impl Event {
    /// Creates an event, taking ownership of the payload value.
    ///
    /// The payload is wrapped in an [`Arc`] internally. To reuse an
    /// already-shared payload, see [`Event::from_shared`].
    pub fn new(topic: impl Into<Arc<str>>, payload: impl Any + Send + Sync) -> Self {
        Self::from_shared(topic, Arc::new(payload))
    }

    /// Creates an event around an existing shared payload.
    pub fn from_shared(topic: impl Into<Arc<str>>, payload: Payload) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            topic: topic.into(),
            payload,
        }
    }

    /// The dispatch key this event was published under.
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The opaque payload reference.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Downcasts the payload to a concrete type.
    ///
    /// Returns `None` when the payload is of a different type. Note that
    /// [`Event::new`] stores the value it was given, so a payload passed in
    /// as `Arc<T>` downcasts as `Arc<T>`, not `T`.
    #[inline]
    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        (*self.payload).downcast_ref::<T>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("topic", &self.topic)
            .field("at", &self.at)
            .finish_non_exhaustive()
    }
}
