//! Map event hook node

use mv_core::{generate_id, EventHandler, MapEvent, MapEventSubscription, MapRef, Result};
use std::fmt;
use std::sync::Arc;

use crate::node::{DependentNode, HandlerSlot, Lifecycle, NodeContext, NodeKind, NodeState};

/// Props of a map event listener
#[derive(Clone)]
pub struct MapEventProps {
    /// SDK event name, e.g. `click` or `moveend`
    pub event_type: String,
    pub handler: EventHandler,
}

impl MapEventProps {
    pub fn new(
        event_type: impl Into<String>,
        handler: impl Fn(&MapEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for MapEventProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEventProps")
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Listens to a named map event while mounted
pub struct MapEventHook {
    id: String,
    event_type: String,
    handler: HandlerSlot<EventHandler>,
    lifecycle: Lifecycle<MapEventSubscription>,
}

impl MapEventHook {
    pub fn new(props: MapEventProps) -> Self {
        Self {
            id: generate_id("map-event"),
            event_type: props.event_type,
            handler: HandlerSlot::new(Some(props.handler)),
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    fn subscribe(&self, map: &MapRef) -> Result<MapEventSubscription> {
        Ok(MapEventSubscription::subscribe(
            map,
            self.event_type.clone(),
            forwarder(&self.handler),
        )?)
    }

    /// Swap the handler in place; a new event type re-subscribes
    pub fn update(&mut self, props: MapEventProps) -> Result<()> {
        self.handler.replace(Some(props.handler));
        if props.event_type == self.event_type {
            return Ok(());
        }

        self.event_type = props.event_type;
        let map = self.lifecycle.map().cloned();
        if let (Some(map), Some(subscription)) = (map, self.lifecycle.registration_mut()) {
            // Dropping the old subscription detaches it
            *subscription = MapEventSubscription::subscribe(
                &map,
                self.event_type.clone(),
                forwarder(&self.handler),
            )?;
        }
        Ok(())
    }
}

fn forwarder(slot: &HandlerSlot<EventHandler>) -> EventHandler {
    let slot = slot.clone();
    Arc::new(move |event: &MapEvent| {
        if let Some(handler) = slot.get() {
            handler(event);
        }
    })
}

impl DependentNode for MapEventHook {
    fn kind(&self) -> NodeKind {
        NodeKind::MapEvent
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> NodeState {
        self.lifecycle.state()
    }

    fn mount(&mut self) {
        self.lifecycle.mount();
    }

    fn try_register(&mut self, ctx: &NodeContext<'_>) -> Result<bool> {
        match self.lifecycle.state() {
            NodeState::Registered => return Ok(true),
            NodeState::Unmounted => return Ok(false),
            NodeState::Waiting => {}
        }
        let Some(map) = ctx.map() else {
            return Ok(false);
        };

        let subscription = self.subscribe(map)?;
        self.lifecycle.register(map.clone(), subscription);
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        // The subscription detaches itself when dropped
        self.lifecycle.unmount();
        Ok(())
    }

    fn registered_generation(&self) -> Option<u64> {
        self.lifecycle.generation()
    }

    fn invalidate(&mut self) {
        self.lifecycle.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_core::{MapConfig, MapHost, Surface};
    use mv_store::MemorySdk;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_event_type_change_resubscribes() {
        let sdk = MemorySdk::new();
        let host = MapHost::new(sdk.clone(), MapConfig::new("key"), Surface::new("map"));
        host.mount().unwrap();
        let map = sdk.last_map().unwrap();
        let snapshot = host.context().snapshot();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut hook = MapEventHook::new(MapEventProps::new("click", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        hook.mount();
        assert!(hook.try_register(&NodeContext::new(&snapshot)).unwrap());
        assert_eq!(map.listener_count("click"), 1);

        hook.update(MapEventProps::new("dblclick", |_| {})).unwrap();
        assert_eq!(hook.event_type(), "dblclick");
        assert_eq!(map.listener_count("click"), 0);
        assert_eq!(map.listener_count("dblclick"), 1);

        map.fire(&MapEvent::new("dblclick"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        hook.deregister().unwrap();
        assert_eq!(hook.state(), NodeState::Unmounted);
        assert_eq!(map.listener_count("dblclick"), 0);
    }
}
