//! # Topic registry - type-keyed listener sets.
//!
//! [`TopicRegistry`] maps topic strings to sets of listener handles. Each
//! delivery lane owns an independent registry instance, parameterized by its
//! listener trait object.
//!
//! ## Rules
//! - Sets are deduplicated by handle identity (`Arc::ptr_eq`), so inserting
//!   the same handle twice equals inserting it once.
//! - A topic with no listeners has **no** map entry; [`TopicRegistry::contains`]
//!   is a plain O(1) key lookup, which is what the publish path uses.
//! - [`TopicRegistry::snapshot`] clones the handle list, so dispatch iterates
//!   a stable view while other threads mutate the set. A listener removed
//!   mid-iteration may still see the in-flight event; removal is guaranteed
//!   visible to iterations that start afterwards.
//!
//! Creation of a set for a previously-unseen topic is arbitrated by the
//! map's entry API: two racing first-subscribers converge on one shared set,
//! and steady-state subscribe/unsubscribe touches only that topic's shard.

use std::sync::Arc;

use dashmap::DashMap;

/// Concurrent topic → listener-set mapping for one delivery lane.
pub struct TopicRegistry<L: ?Sized> {
    topics: DashMap<String, Vec<Arc<L>>>,
}

impl<L: ?Sized> TopicRegistry<L> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Adds `handle` to the set for `topic`, creating the set if absent.
    ///
    /// Idempotent: a handle already present (by identity) is not added again.
    pub fn insert(&self, topic: &str, handle: &Arc<L>) {
        let mut set = self.topics.entry(topic.to_string()).or_default();
        if !set.iter().any(|existing| Arc::ptr_eq(existing, handle)) {
            set.push(Arc::clone(handle));
        }
    }

    /// Removes `handle` from the set for `topic` if present.
    ///
    /// Removing an absent handle (or an unknown topic) is a silent no-op.
    /// When the last handle leaves, the topic's entry is dropped so that
    /// [`TopicRegistry::contains`] goes back to reporting `false`.
    pub fn remove(&self, topic: &str, handle: &Arc<L>) {
        let emptied = match self.topics.get_mut(topic) {
            Some(mut set) => {
                set.retain(|existing| !Arc::ptr_eq(existing, handle));
                set.is_empty()
            }
            None => return,
        };
        if emptied {
            // Re-checked under the shard lock: a concurrent insert between
            // the guard drop above and this call keeps the entry alive.
            self.topics.remove_if(topic, |_, set| set.is_empty());
        }
    }

    /// Whether any listener is currently registered for `topic`.
    #[inline]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Returns a point-in-time copy of the handles for `topic`.
    ///
    /// The copy is safe to iterate while other threads mutate the registry.
    pub fn snapshot(&self, topic: &str) -> Vec<Arc<L>> {
        self.topics
            .get(topic)
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    /// Number of topics with at least one listener.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl<L: ?Sized> Default for TopicRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    trait Probe: Send + Sync + 'static {}
    struct Unit;
    impl Probe for Unit {}

    fn handle() -> Arc<dyn Probe> {
        Arc::new(Unit)
    }

    #[test]
    fn test_insert_is_idempotent() {
        let reg: TopicRegistry<dyn Probe> = TopicRegistry::new();
        let h = handle();

        reg.insert("tick", &h);
        reg.insert("tick", &h);

        assert_eq!(reg.snapshot("tick").len(), 1);
    }

    #[test]
    fn test_distinct_handles_coexist() {
        let reg: TopicRegistry<dyn Probe> = TopicRegistry::new();
        let a = handle();
        let b = handle();

        reg.insert("tick", &a);
        reg.insert("tick", &b);

        assert_eq!(reg.snapshot("tick").len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let reg: TopicRegistry<dyn Probe> = TopicRegistry::new();
        let a = handle();
        let never_added = handle();

        reg.remove("missing-topic", &a);
        reg.insert("tick", &a);
        reg.remove("tick", &never_added);

        assert_eq!(reg.snapshot("tick").len(), 1);
    }

    #[test]
    fn test_last_removal_drops_topic_entry() {
        let reg: TopicRegistry<dyn Probe> = TopicRegistry::new();
        let h = handle();

        reg.insert("tick", &h);
        assert!(reg.contains("tick"));

        reg.remove("tick", &h);
        assert!(!reg.contains("tick"));
        assert_eq!(reg.topic_count(), 0);
    }

    #[test]
    fn test_snapshot_is_stable_under_mutation() {
        let reg: TopicRegistry<dyn Probe> = TopicRegistry::new();
        let h = handle();

        reg.insert("tick", &h);
        let view = reg.snapshot("tick");
        reg.remove("tick", &h);

        assert_eq!(view.len(), 1);
        assert!(reg.snapshot("tick").is_empty());
    }

    #[test]
    fn test_concurrent_first_subscribers_share_one_set() {
        let reg: Arc<TopicRegistry<dyn Probe>> = Arc::new(TopicRegistry::new());
        let h = handle();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                let h = Arc::clone(&h);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.insert("race", &h);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(reg.snapshot("race").len(), 1);
    }

    #[test]
    fn test_concurrent_subscribe_unsubscribe_converges() {
        let reg: Arc<TopicRegistry<dyn Probe>> = Arc::new(TopicRegistry::new());
        let keepers: Vec<Arc<dyn Probe>> = (0..4).map(|_| handle()).collect();

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                let keeper = Arc::clone(&keepers[i % 4]);
                thread::spawn(move || {
                    let transient = handle();
                    for _ in 0..100 {
                        reg.insert("mixed", &keeper);
                        reg.insert("mixed", &transient);
                        reg.remove("mixed", &transient);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // Every transient handle was removed by its own thread; the four
        // keepers survive any interleaving exactly once each.
        let survivors = reg.snapshot("mixed");
        assert_eq!(survivors.len(), 4);
        for keeper in &keepers {
            assert!(survivors.iter().any(|s| Arc::ptr_eq(s, keeper)));
        }
    }
}
