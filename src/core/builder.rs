use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::affinity::AffinityGate;
use crate::core::scheduler::AffinityScheduler;
use crate::core::{bus::PubSub, worker};
use crate::listeners::TopicRegistry;

/// Builder for constructing a [`PubSub`] instance.
///
/// The affinity scheduler is the one mandatory collaborator, so it is taken
/// up front; everything else has defaults.
pub struct PubSubBuilder {
    cfg: Config,
    scheduler: Arc<dyn AffinityScheduler>,
}

impl PubSubBuilder {
    /// Creates a new builder around the host's affinity scheduler.
    pub fn new(scheduler: Arc<dyn AffinityScheduler>) -> Self {
        Self {
            cfg: Config::default(),
            scheduler,
        }
    }

    /// Overrides the default configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Builds and returns the bus instance.
    ///
    /// This consumes the builder and wires up all runtime components:
    /// - both listener registries
    /// - the worker queue and its drain task (spawned here, which is why
    ///   `build` must be called inside a tokio runtime)
    /// - the affinity gate around the provided scheduler
    pub fn build(self) -> Arc<PubSub> {
        let workers = Arc::new(TopicRegistry::new());
        let affinity = Arc::new(TopicRegistry::new());
        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let gate = AffinityGate::new(
            self.scheduler,
            Arc::clone(&affinity),
            self.cfg.warn_depth(),
        );
        let handle = worker::spawn(worker_rx, Arc::clone(&workers), token.clone());

        PubSub::new_internal(self.cfg, workers, affinity, worker_tx, gate, token, handle)
    }
}
