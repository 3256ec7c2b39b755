//! Trait seam towards the external map SDK
//!
//! The bindings never talk to a concrete map library. Everything they need
//! from the drawable object store is expressed by [`MapSdk`] (construction)
//! and [`MapInstance`] (one live map), plus the marker and popup objects a
//! map hands out.

use std::sync::Arc;

use crate::config::MapConfig;
use crate::dom::Element;
use crate::error::SdkError;
use crate::geo::{ControlPosition, LngLat};
use crate::ids::{ControlId, ListenerId};
use crate::readiness::Milestone;

mod spec;

pub use spec::{
    ControlKind, DemEncoding, GeoJsonSource, LayerKind, LayerSpec, MarkerOptions, MediaSource,
    PopupOptions, RasterDemSource, RasterSource, SourceSpec, TileSource, VideoSource,
};

/// One-shot callback
pub type Callback = Box<dyn FnOnce() + Send>;

/// Event emitted by a map, e.g. `click` or `moveend`
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
    pub event_type: String,
    pub lng_lat: Option<LngLat>,
}

impl MapEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            lng_lat: None,
        }
    }

    pub fn at(mut self, lng_lat: LngLat) -> Self {
        self.lng_lat = Some(lng_lat);
        self
    }
}

pub type EventHandler = Arc<dyn Fn(&MapEvent) + Send + Sync>;

/// Events emitted by a draggable marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerEventKind {
    DragStart,
    Drag,
    DragEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerEvent {
    pub kind: MarkerEventKind,
    pub lng_lat: LngLat,
}

pub type MarkerHandler = Arc<dyn Fn(&MarkerEvent) + Send + Sync>;

/// Rendering surface a map is bound to
#[derive(Debug, Clone)]
pub struct Surface {
    pub id: String,
    pub element: Element,
}

impl Surface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element: Element::div().with_class("map"),
        }
    }
}

/// A layer entry of the map's current style
#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub id: String,
    pub source: Option<String>,
}

/// Factory for map instances
pub trait MapSdk: Send + Sync {
    /// Create a map bound to the given surface.
    ///
    /// Fails for invalid credentials or an unusable surface; the host
    /// propagates the error and does not retry.
    fn create_map(
        &self,
        config: &MapConfig,
        surface: &Surface,
    ) -> Result<Arc<dyn MapInstance>, SdkError>;
}

/// One live map instance
pub trait MapInstance: Send + Sync {
    /// Run `callback` the next time `milestone` fires
    fn once(&self, milestone: Milestone, callback: Callback);

    /// Subscribe to a named map event
    fn on(&self, event_type: &str, handler: EventHandler) -> ListenerId;

    fn off(&self, listener: ListenerId);

    fn add_source(&self, id: &str, spec: &SourceSpec) -> Result<(), SdkError>;

    fn remove_source(&self, id: &str) -> Result<(), SdkError>;

    fn has_source(&self, id: &str) -> bool;

    /// Add a layer, optionally inserted before an existing one
    fn add_layer(&self, spec: &LayerSpec, before_id: Option<&str>) -> Result<(), SdkError>;

    fn remove_layer(&self, id: &str) -> Result<(), SdkError>;

    fn has_layer(&self, id: &str) -> bool;

    /// Layers of the current style, bottom to top
    fn style_layers(&self) -> Vec<StyleLayer>;

    fn add_control(
        &self,
        control: &ControlKind,
        position: ControlPosition,
    ) -> Result<ControlId, SdkError>;

    fn remove_control(&self, id: ControlId) -> Result<(), SdkError>;

    /// Construct a marker bound to this map; it is not shown until `add_to`
    fn create_marker(&self, options: &MarkerOptions) -> Result<Box<dyn MarkerObject>, SdkError>;

    /// Construct a popup bound to this map; it is not shown until `add_to`
    fn create_popup(&self, options: &PopupOptions) -> Result<Box<dyn PopupObject>, SdkError>;

    /// Destroy the map and everything attached to it
    fn remove(&self);
}

/// Marker object created by a map
pub trait MarkerObject: Send + Sync {
    fn set_lng_lat(&self, lng_lat: LngLat);

    fn lng_lat(&self) -> LngLat;

    /// Element the marker is drawn with
    fn element(&self) -> Element;

    fn on(&self, kind: MarkerEventKind, handler: MarkerHandler) -> ListenerId;

    fn add_to(&self) -> Result<(), SdkError>;

    fn remove(&self);
}

/// Popup object created by a map
pub trait PopupObject: Send + Sync {
    fn set_lng_lat(&self, lng_lat: LngLat);

    fn lng_lat(&self) -> Option<LngLat>;

    fn set_dom_content(&self, content: Element);

    fn add_to(&self) -> Result<(), SdkError>;

    fn remove(&self);

    fn is_open(&self) -> bool;
}
