//! Core functionality for the declarative map bindings
//!
//! This crate provides the map-readiness protocol shared by every component:
//! the trait seam towards the external map SDK, the map host that owns one
//! map instance, the readiness broadcaster its descendants read, the
//! ready-callback queue and the context relay used between nested nodes.

pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod geo;
pub mod handle;
pub mod host;
pub mod ids;
pub mod readiness;
pub mod ready_queue;
pub mod relay;
pub mod sdk;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{BuiltinControls, ControlToggle, MapConfig};
pub use dom::{class_names, ClickEvent, ClickHandler, Content, Element};
pub use error::{ConfigError, MapError, Result, SdkError};
pub use events::MapEventSubscription;
pub use geo::{Anchor, ControlPosition, LngLat, LngLatBounds, Offset};
pub use handle::{MapHandle, MapRef};
pub use host::{MapContext, MapHost};
pub use ids::{generate_id, ControlId, ListenerId};
pub use readiness::{
    MapSnapshot, Milestone, ReadinessBroadcaster, ReadinessState, ReadinessSubscriber,
};
pub use ready_queue::ReadyQueue;
pub use relay::{MarkerContext, SourceContext};
pub use sdk::{
    Callback, ControlKind, EventHandler, LayerKind, LayerSpec, MapEvent, MapInstance, MapSdk,
    MarkerEvent, MarkerEventKind, MarkerHandler, MarkerObject, MarkerOptions, PopupObject,
    PopupOptions, SourceSpec, StyleLayer, Surface,
};
