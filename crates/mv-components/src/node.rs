//! Dependent node abstraction - base trait for every map-bound component

use mv_core::{MapRef, MapSnapshot, MarkerContext, Result, SourceContext};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Kind of map-bound component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Layer,
    Marker,
    Popup,
    Control,
    /// Listener mounted through `use_map_event`
    MapEvent,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Source => "Source",
            NodeKind::Layer => "Layer",
            NodeKind::Marker => "Marker",
            NodeKind::Popup => "Popup",
            NodeKind::Control => "Control",
            NodeKind::MapEvent => "use_map_event",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Unmounted -> Waiting -> Registered -> Unmounted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unmounted,
    /// Mounted, prerequisites not met yet
    Waiting,
    /// Backed by a live SDK object
    Registered,
}

/// Everything a node may read while registering
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub snapshot: &'a MapSnapshot,
    /// Nearest enclosing source
    pub source: Option<&'a SourceContext>,
    /// Nearest enclosing marker
    pub marker: Option<&'a MarkerContext>,
}

impl<'a> NodeContext<'a> {
    pub fn new(snapshot: &'a MapSnapshot) -> Self {
        Self {
            snapshot,
            source: None,
            marker: None,
        }
    }

    pub fn with_source(mut self, source: Option<&'a SourceContext>) -> Self {
        self.source = source;
        self
    }

    pub fn with_marker(mut self, marker: Option<&'a MarkerContext>) -> Self {
        self.marker = marker;
        self
    }

    pub fn map(&self) -> Option<&'a MapRef> {
        self.snapshot.handle.as_ref()
    }
}

/// Base trait for all nodes that mirror themselves into the map
pub trait DependentNode: Send + Sync {
    fn kind(&self) -> NodeKind;

    /// Identifier the SDK knows this node by
    fn id(&self) -> &str;

    fn state(&self) -> NodeState;

    /// Enter the tree; the node waits for its prerequisites afterwards
    fn mount(&mut self);

    /// Register if prerequisites hold.
    ///
    /// Returns `Ok(false)` while waiting and `Ok(true)` once registered.
    /// Errors are final for this mount.
    fn try_register(&mut self, ctx: &NodeContext<'_>) -> Result<bool>;

    /// Remove the SDK object, if any, and leave the tree
    fn deregister(&mut self) -> Result<()>;

    /// Generation of the map handle the node registered against
    fn registered_generation(&self) -> Option<u64>;

    /// Drop a registration whose map was replaced, without calling into it
    fn invalidate(&mut self);
}

/// Registration state machine shared by the node implementations
pub(crate) enum Lifecycle<T> {
    Unmounted,
    Waiting,
    Registered { map: MapRef, registration: T },
}

impl<T> Lifecycle<T> {
    pub(crate) fn state(&self) -> NodeState {
        match self {
            Lifecycle::Unmounted => NodeState::Unmounted,
            Lifecycle::Waiting => NodeState::Waiting,
            Lifecycle::Registered { .. } => NodeState::Registered,
        }
    }

    pub(crate) fn mount(&mut self) {
        if matches!(self, Lifecycle::Unmounted) {
            *self = Lifecycle::Waiting;
        }
    }

    pub(crate) fn register(&mut self, map: MapRef, registration: T) {
        *self = Lifecycle::Registered { map, registration };
    }

    pub(crate) fn registration(&self) -> Option<&T> {
        match self {
            Lifecycle::Registered { registration, .. } => Some(registration),
            _ => None,
        }
    }

    pub(crate) fn registration_mut(&mut self) -> Option<&mut T> {
        match self {
            Lifecycle::Registered { registration, .. } => Some(registration),
            _ => None,
        }
    }

    pub(crate) fn map(&self) -> Option<&MapRef> {
        match self {
            Lifecycle::Registered { map, .. } => Some(map),
            _ => None,
        }
    }

    pub(crate) fn generation(&self) -> Option<u64> {
        self.map().map(MapRef::generation)
    }

    /// Leave the tree, handing back a registration that still needs undoing
    pub(crate) fn unmount(&mut self) -> Option<(MapRef, T)> {
        match std::mem::replace(self, Lifecycle::Unmounted) {
            Lifecycle::Registered { map, registration } => Some((map, registration)),
            _ => None,
        }
    }

    /// Forget the registration and wait again; returns whether one was dropped
    pub(crate) fn invalidate(&mut self) -> bool {
        if matches!(self, Lifecycle::Registered { .. }) {
            *self = Lifecycle::Waiting;
            true
        } else {
            false
        }
    }
}

/// Holds the current handler for an event the SDK delivers.
///
/// SDK listeners are installed once and call through the slot, so replacing
/// the handler on a prop update takes effect without re-subscribing.
pub struct HandlerSlot<H> {
    inner: Arc<RwLock<Option<H>>>,
}

impl<H: Clone> HandlerSlot<H> {
    pub fn new(handler: Option<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(handler)),
        }
    }

    pub fn replace(&self, handler: Option<H>) {
        *self.inner.write() = handler;
    }

    /// Current handler; cloned so it runs without the slot locked
    pub fn get(&self) -> Option<H> {
        self.inner.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl<H> Clone for HandlerSlot<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Skip SDK calls against a map that is already gone
pub(crate) fn live_map(map: MapRef) -> Option<MapRef> {
    if map.is_alive() {
        Some(map)
    } else {
        tracing::debug!(
            "Map generation {} is gone, skipping deregistration",
            map.generation()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut lifecycle: Lifecycle<u32> = Lifecycle::Unmounted;
        assert_eq!(lifecycle.state(), NodeState::Unmounted);

        lifecycle.mount();
        assert_eq!(lifecycle.state(), NodeState::Waiting);
        assert!(!lifecycle.invalidate());
        assert!(lifecycle.unmount().is_none());
        assert_eq!(lifecycle.state(), NodeState::Unmounted);
    }

    #[test]
    fn test_handler_slot_swaps_in_place() {
        let slot: HandlerSlot<Arc<dyn Fn() -> u32 + Send + Sync>> =
            HandlerSlot::new(Some(Arc::new(|| 1)));
        let listener = slot.clone();

        slot.replace(Some(Arc::new(|| 2)));
        assert_eq!(listener.get().map(|handler| handler()), Some(2));

        slot.replace(None);
        assert!(!listener.is_set());
    }
}
