//! # Affinity gate - the coalesced drain for the host-designated context.
//!
//! [`AffinityGate`] owns the affinity queue and the busy flag, and turns any
//! number of publishes into at most one outstanding scheduling request.
//!
//! ## Protocol
//! ```text
//! submit(event):                          drain()  [on designated context]:
//!   lock queue, push, unlock                loop {
//!   CAS busy false→true                       lock queue
//!     ├─ won   → scheduler.schedule(drain)    ├─ event popped → unlock, deliver, loop
//!     └─ lost  → rely on outstanding drain    └─ empty → clear busy INSIDE the
//!                                                 lock, unlock, return
//!                                           }
//! ```
//!
//! ## Rules
//! - The idle→busy transition is a single compare-and-swap; only the winner
//!   issues a scheduling request. Scheduling requests are therefore bounded
//!   by idle→busy transitions, not by publishes.
//! - The busy→idle transition happens only inside the queue's critical
//!   section, after observing the queue empty there. A publisher's push and
//!   the drain's clear are totally ordered by the queue mutex, so a publish
//!   racing the drain's last look either gets its event drained or finds
//!   `busy == false` and schedules a fresh drain. No event is lost to the
//!   coalescing optimization.
//! - A dequeued event whose topic has no listeners at drain time is dropped
//!   and the drain continues with whatever is queued behind it.
//! - Listener panics are caught per callback; the drain keeps going and the
//!   busy flag still converges to idle.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};

use crate::core::scheduler::AffinityScheduler;
use crate::events::Event;
use crate::listeners::{AffinitySubscribe, TopicRegistry};

/// Coalescing front of the affinity lane.
///
/// Shared between every publisher (via `submit`) and the drain jobs it
/// schedules onto the host-designated context.
pub(crate) struct AffinityGate {
    queue: Mutex<VecDeque<Event>>,
    busy: AtomicBool,
    scheduler: Arc<dyn AffinityScheduler>,
    listeners: Arc<TopicRegistry<dyn AffinitySubscribe>>,
    /// Queue depth at which a diagnostic warning is emitted (None = never).
    warn_depth: Option<usize>,
}

impl AffinityGate {
    pub(crate) fn new(
        scheduler: Arc<dyn AffinityScheduler>,
        listeners: Arc<TopicRegistry<dyn AffinitySubscribe>>,
        warn_depth: Option<usize>,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            busy: AtomicBool::new(false),
            scheduler,
            listeners,
            warn_depth,
        })
    }

    /// Enqueues `event` and issues at most one scheduling request.
    ///
    /// Callers have already checked topic membership; the event is queued
    /// unconditionally. If this submit performs the idle→busy transition it
    /// hands a drain job to the scheduler; otherwise the outstanding drain
    /// picks the event up before it declares itself idle.
    pub(crate) fn submit(self: &Arc<Self>, event: Event) {
        let depth = {
            let mut queue = self.queue.lock().expect("affinity queue mutex poisoned");
            queue.push_back(event);
            queue.len()
        };
        if let Some(limit) = self.warn_depth {
            if depth >= limit && depth % limit == 0 {
                warn!(depth, "affinity queue is deep; is the host draining?");
            }
        }

        if self
            .busy
            .compare_exchange(
                false,
                true,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Acquire,
            )
            .is_ok()
        {
            trace!(depth, "requesting affinity drain");
            let gate = Arc::clone(self);
            self.scheduler.schedule(Box::new(move || gate.drain()));
        }
    }

    /// Drains the queue to empty. Runs on the host-designated context.
    pub(crate) fn drain(&self) {
        while let Some(event) = self.pop_or_idle() {
            let handles = self.listeners.snapshot(event.topic());
            if handles.is_empty() {
                // Unsubscribed between enqueue and drain: drop this event,
                // keep draining whatever is queued behind it.
                debug!(
                    topic = event.topic(),
                    seq = event.seq,
                    "no affinity listeners at drain time, discarding"
                );
                continue;
            }
            for handle in &handles {
                let outcome = catch_unwind(AssertUnwindSafe(|| handle.on_event(&event)));
                if outcome.is_err() {
                    warn!(
                        listener = handle.name(),
                        topic = event.topic(),
                        seq = event.seq,
                        "affinity listener panicked"
                    );
                }
            }
        }
    }

    /// Pops the next event, or clears the busy flag and reports idle.
    ///
    /// The clear must happen inside the queue's critical section: that is
    /// the happens-before edge between "queue observed empty" and "flag
    /// cleared" which closes the lost-wakeup window against `submit`.
    fn pop_or_idle(&self) -> Option<Event> {
        let mut queue = self.queue.lock().expect("affinity queue mutex poisoned");
        match queue.pop_front() {
            Some(event) => Some(event),
            None => {
                self.busy.store(false, AtomicOrdering::Release);
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        !self.busy.load(AtomicOrdering::Acquire)
    }
}
