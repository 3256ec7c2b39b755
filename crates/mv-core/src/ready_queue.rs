use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::host::MapContext;
use crate::readiness::{MapSnapshot, Milestone, ReadinessSubscriber};
use crate::sdk::Callback;

/// Defers callbacks until the map reaches a milestone.
///
/// Callbacks scheduled after the milestone run immediately; earlier ones are
/// queued per milestone and flushed in registration order exactly once.
/// Nothing is deduplicated. Queued callbacks live as long as the queue, so
/// dropping the returned `Arc` discards them.
pub struct ReadyQueue {
    context: MapContext,
    pending: Mutex<AHashMap<Milestone, VecDeque<Callback>>>,
}

impl ReadyQueue {
    /// Create a queue listening to the given host context
    pub fn attach(context: &MapContext) -> Arc<Self> {
        let queue = Arc::new(Self {
            context: context.clone(),
            pending: Mutex::new(AHashMap::new()),
        });
        context.subscribe(queue.clone());
        queue
    }

    /// Run `callback` once `milestone` has been reached
    pub fn schedule(&self, callback: Callback, milestone: Milestone) {
        let mut pending = self.pending.lock();
        if self.context.is_reached(milestone) {
            drop(pending);
            callback();
            return;
        }
        pending.entry(milestone).or_default().push_back(callback);
        tracing::debug!(
            "Queued callback until {} ({} pending)",
            milestone,
            pending[&milestone].len()
        );
    }

    /// `schedule` for the fully-loaded milestone
    pub fn on_ready(&self, callback: Callback) {
        self.schedule(callback, Milestone::Loaded);
    }

    pub fn pending(&self, milestone: Milestone) -> usize {
        self.pending
            .lock()
            .get(&milestone)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn flush(&self, milestone: Milestone) {
        let callbacks = self.pending.lock().remove(&milestone).unwrap_or_default();
        if callbacks.is_empty() {
            return;
        }

        tracing::debug!("Flushing {} callbacks for {}", callbacks.len(), milestone);
        for callback in callbacks {
            callback();
        }
    }
}

impl ReadinessSubscriber for ReadyQueue {
    fn on_milestone(&self, _snapshot: &MapSnapshot, milestone: Milestone) {
        self.flush(milestone);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::host::MapHost;
    use crate::sdk::Surface;
    use crate::testing::StubSdk;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &'static str| -> Callback {
            let sink = sink.clone();
            Box::new(move || sink.lock().push(label))
        };
        (log, make)
    }

    fn lazy_host() -> (Arc<StubSdk>, MapHost) {
        let sdk = Arc::new(StubSdk::default());
        let host = MapHost::new(sdk.clone(), MapConfig::new("key").lazy(), Surface::new("map"));
        host.mount().unwrap();
        (sdk, host)
    }

    #[test]
    fn test_callbacks_flush_in_order_once() {
        let (sdk, host) = lazy_host();
        let queue = ReadyQueue::attach(&host.context());
        let (log, make) = recorder();

        queue.on_ready(make("a"));
        queue.on_ready(make("b"));
        queue.schedule(make("style"), Milestone::StyleLoaded);
        assert_eq!(queue.pending(Milestone::Loaded), 2);
        assert!(log.lock().is_empty());

        host.trigger_init().unwrap();
        let map = sdk.last_map();
        map.fire(Milestone::StyleLoaded);
        assert_eq!(*log.lock(), vec!["style"]);

        map.fire(Milestone::Loaded);
        assert_eq!(*log.lock(), vec!["style", "a", "b"]);
        assert_eq!(queue.pending(Milestone::Loaded), 0);
    }

    #[test]
    fn test_schedule_after_milestone_runs_synchronously() {
        let (sdk, host) = lazy_host();
        host.trigger_init().unwrap();
        sdk.last_map().fire(Milestone::StyleLoaded);

        let queue = ReadyQueue::attach(&host.context());
        let (log, make) = recorder();
        queue.schedule(make("now"), Milestone::StyleLoaded);
        assert_eq!(*log.lock(), vec!["now"]);
        assert_eq!(queue.pending(Milestone::StyleLoaded), 0);

        queue.on_ready(make("later"));
        assert_eq!(queue.pending(Milestone::Loaded), 1);
    }

    #[test]
    fn test_identical_callbacks_are_not_deduplicated() {
        let (sdk, host) = lazy_host();
        let queue = ReadyQueue::attach(&host.context());
        let (log, make) = recorder();

        queue.on_ready(make("same"));
        queue.on_ready(make("same"));
        host.trigger_init().unwrap();
        sdk.last_map().fire(Milestone::Loaded);

        assert_eq!(*log.lock(), vec!["same", "same"]);
    }

    #[test]
    fn test_dropped_queue_discards_callbacks() {
        let (sdk, host) = lazy_host();
        let queue = ReadyQueue::attach(&host.context());
        let (log, make) = recorder();

        queue.on_ready(make("gone"));
        drop(queue);
        host.trigger_init().unwrap();
        sdk.last_map().fire(Milestone::Loaded);

        assert!(log.lock().is_empty());
    }
}
