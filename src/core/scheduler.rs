//! # Affinity scheduler capability.
//!
//! The bus does not know how to reach the host's designated execution
//! context (a UI thread, a game loop, an embedded main loop). The host
//! supplies that knowledge as an [`AffinityScheduler`]: a collaborator that
//! can run one unit of work on the designated context at the next
//! opportunity.
//!
//! The scheduler does **not** have to coalesce requests - the bus guarantees
//! at most one outstanding request per idle→busy transition on its own.
//!
//! ## Example
//! ```rust
//! use dualbus::{Job, SchedulerFn};
//!
//! // A scheduler that runs jobs inline on the calling thread. Only suitable
//! // for tests and demos: real hosts forward the job to their event loop.
//! let inline = SchedulerFn::arc(|job: Job| job());
//! ```

use std::sync::Arc;

/// One unit of work to run on the host-designated context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run a [`Job`] on the host-designated execution context.
///
/// Implementations typically hand the job to an event loop (for example by
/// posting it on a channel that the designated thread drains). Each
/// `schedule` call carries exactly one job and the job must be run exactly
/// once; dropping it unrun stalls the affinity lane until the next publish.
pub trait AffinityScheduler: Send + Sync + 'static {
    /// Runs `job` once on the designated context at the next opportunity.
    fn schedule(&self, job: Job);
}

/// Function-backed scheduler implementation.
///
/// Wraps a closure that forwards each job to the designated context.
#[derive(Debug)]
pub struct SchedulerFn<F> {
    f: F,
}

impl<F> SchedulerFn<F>
where
    F: Fn(Job) + Send + Sync + 'static,
{
    /// Creates a new function-backed scheduler.
    ///
    /// Prefer [`SchedulerFn::arc`] when you immediately need an
    /// `Arc<dyn AffinityScheduler>`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the scheduler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> AffinityScheduler for SchedulerFn<F>
where
    F: Fn(Job) + Send + Sync + 'static,
{
    fn schedule(&self, job: Job) {
        (self.f)(job);
    }
}
