use std::fmt;

use crate::error::SdkError;
use crate::handle::MapRef;
use crate::ids::ListenerId;
use crate::sdk::EventHandler;

/// A named map event listener that is removed when dropped
pub struct MapEventSubscription {
    map: MapRef,
    listener: ListenerId,
    event_type: String,
}

impl MapEventSubscription {
    pub fn subscribe(
        map: &MapRef,
        event_type: impl Into<String>,
        handler: EventHandler,
    ) -> Result<Self, SdkError> {
        let event_type = event_type.into();
        let listener = map.on(&event_type, handler)?;
        tracing::debug!("Listening to map '{}' events ({})", event_type, listener);
        Ok(Self {
            map: map.clone(),
            listener,
            event_type,
        })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Generation of the map this listener is attached to
    pub fn generation(&self) -> u64 {
        self.map.generation()
    }
}

impl Drop for MapEventSubscription {
    fn drop(&mut self) {
        // A removed map took its listeners with it
        if self.map.is_alive() {
            self.map.off(self.listener);
            tracing::debug!("Stopped listening to map '{}' events", self.event_type);
        }
    }
}

impl fmt::Debug for MapEventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEventSubscription")
            .field("event_type", &self.event_type)
            .field("listener", &self.listener)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::MapHandle;
    use crate::sdk::MapEvent;
    use crate::testing::StubMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_subscription_unsubscribes_on_drop() {
        let map = StubMap::new();
        let handle = MapHandle::new(map.clone(), 1);
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();

        let subscription = MapEventSubscription::subscribe(
            &handle.downgrade(),
            "click",
            Arc::new(move |_: &MapEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
        assert_eq!(subscription.event_type(), "click");

        map.emit(&MapEvent::new("click"));
        map.emit(&MapEvent::new("moveend"));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        drop(subscription);
        assert_eq!(map.listener_count(), 0);
        map.emit(&MapEvent::new("click"));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_to_removed_map_fails() {
        let handle = MapHandle::new(StubMap::new(), 1);
        let map = handle.downgrade();
        drop(handle);

        let err = MapEventSubscription::subscribe(&map, "click", Arc::new(|_: &MapEvent| {}));
        assert!(matches!(err, Err(SdkError::MapRemoved)));
    }
}
