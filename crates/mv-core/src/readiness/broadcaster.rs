//! Readiness broadcaster implementation

use super::{MapSnapshot, Milestone, ReadinessState, ReadinessSubscriber};
use crate::handle::MapRef;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Broadcast state stored internally
#[derive(Debug, Default)]
struct BroadcastState {
    handle: Option<MapRef>,
    generation: u64,
    readiness: ReadinessState,
}

/// Holds `{handle, style_loaded, loaded}` for one map host and tells
/// subscribers about every change.
///
/// Mutation is crate-private: only the host and the milestone listeners it
/// registers advance the state.
pub struct ReadinessBroadcaster {
    state: Arc<RwLock<BroadcastState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn ReadinessSubscriber>>>>,
    next_generation: AtomicU64,
}

impl ReadinessBroadcaster {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BroadcastState::default())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Reserve the generation number for a handle about to be created
    pub(crate) fn allocate_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Install a new handle (or none) and reset every milestone
    pub(crate) fn publish_handle(&self, handle: Option<MapRef>) {
        let mut state = self.state.write();
        if let Some(handle) = &handle {
            state.generation = handle.generation();
        }
        state.handle = handle;
        state.readiness = ReadinessState::default();
        drop(state);

        let snapshot = self.snapshot();
        self.for_each_subscriber(|subscriber| subscriber.on_handle_change(&snapshot));
    }

    /// Advance `milestone` for the handle of `generation`.
    ///
    /// Listeners left behind by a replaced handle carry a stale generation
    /// and are ignored. Returns whether the milestone transitioned.
    pub(crate) fn advance(&self, generation: u64, milestone: Milestone) -> bool {
        let mut state = self.state.write();
        if state.handle.is_none() || state.generation != generation {
            tracing::debug!(
                "Ignoring {} from stale map generation {} (current {})",
                milestone,
                generation,
                state.generation
            );
            return false;
        }
        if !state.readiness.advance(milestone) {
            return false;
        }
        drop(state);

        tracing::debug!("Map generation {} reached {}", generation, milestone);
        let snapshot = self.snapshot();
        self.for_each_subscriber(|subscriber| subscriber.on_milestone(&snapshot, milestone));
        true
    }

    /// Get the current context value
    pub fn snapshot(&self) -> MapSnapshot {
        let state = self.state.read();
        MapSnapshot {
            handle: state.handle.clone(),
            generation: state.generation,
            readiness: state.readiness,
        }
    }

    /// Add a subscriber; it is dropped automatically once released elsewhere
    pub fn add_subscriber(&self, subscriber: Arc<dyn ReadinessSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }

    fn for_each_subscriber(&self, mut notify: impl FnMut(&dyn ReadinessSubscriber)) {
        let live: Vec<Arc<dyn ReadinessSubscriber>> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        // Subscribers may read the broadcaster or add subscribers, so no lock is held here
        for subscriber in live {
            notify(subscriber.as_ref());
        }
    }
}

impl Default for ReadinessBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubMap;
    use crate::MapHandle;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ReadinessSubscriber for Recorder {
        fn on_milestone(&self, snapshot: &MapSnapshot, milestone: Milestone) {
            self.events
                .lock()
                .push(format!("{}@{}", milestone, snapshot.generation));
        }

        fn on_handle_change(&self, snapshot: &MapSnapshot) {
            self.events
                .lock()
                .push(format!("handle:{}", snapshot.handle.is_some()));
        }
    }

    #[test]
    fn test_advance_notifies_once() {
        let broadcaster = ReadinessBroadcaster::new();
        let recorder = Arc::new(Recorder::default());
        broadcaster.add_subscriber(recorder.clone());

        let handle = MapHandle::new(StubMap::new(), broadcaster.allocate_generation());
        broadcaster.publish_handle(Some(handle.downgrade()));

        assert!(broadcaster.advance(handle.generation(), Milestone::StyleLoaded));
        assert!(!broadcaster.advance(handle.generation(), Milestone::StyleLoaded));
        assert!(broadcaster.snapshot().style_loaded());

        assert_eq!(
            *recorder.events.lock(),
            vec!["handle:true".to_string(), "style.load@1".to_string()]
        );
    }

    #[test]
    fn test_new_handle_resets_and_ignores_stale_generation() {
        let broadcaster = ReadinessBroadcaster::new();

        let first = MapHandle::new(StubMap::new(), broadcaster.allocate_generation());
        broadcaster.publish_handle(Some(first.downgrade()));
        broadcaster.advance(first.generation(), Milestone::Loaded);
        assert!(broadcaster.snapshot().loaded());

        let second = MapHandle::new(StubMap::new(), broadcaster.allocate_generation());
        broadcaster.publish_handle(Some(second.downgrade()));
        assert!(!broadcaster.snapshot().loaded());

        // A late listener of the first map must not advance the second
        assert!(!broadcaster.advance(first.generation(), Milestone::StyleLoaded));
        assert!(!broadcaster.snapshot().style_loaded());
        assert_eq!(broadcaster.snapshot().generation, second.generation());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let broadcaster = ReadinessBroadcaster::new();
        let recorder = Arc::new(Recorder::default());
        broadcaster.add_subscriber(recorder.clone());
        assert_eq!(broadcaster.subscriber_count(), 1);

        drop(recorder);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
