//! Owning and non-owning references to a map instance

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::SdkError;
use crate::geo::ControlPosition;
use crate::ids::{ControlId, ListenerId};
use crate::sdk::{
    ControlKind, EventHandler, LayerSpec, MapInstance, MarkerObject, MarkerOptions, PopupObject,
    PopupOptions, SourceSpec, StyleLayer,
};

/// Exclusive ownership of one map instance.
///
/// Only the map host holds one. Dropping the handle destroys the map.
pub struct MapHandle {
    instance: Arc<dyn MapInstance>,
    generation: u64,
}

impl MapHandle {
    pub(crate) fn new(instance: Arc<dyn MapInstance>, generation: u64) -> Self {
        Self {
            instance,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-owning reference for descendants
    pub fn downgrade(&self) -> MapRef {
        MapRef {
            instance: Arc::downgrade(&self.instance),
            generation: self.generation,
        }
    }
}

impl Drop for MapHandle {
    fn drop(&mut self) {
        tracing::debug!("Destroying map instance (generation {})", self.generation);
        self.instance.remove();
    }
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Non-owning reference to a map instance.
///
/// Exposes registration calls only; destroying the map is reserved to the
/// [`MapHandle`]. Calls made after the map is gone fail with
/// [`SdkError::MapRemoved`].
#[derive(Clone)]
pub struct MapRef {
    instance: Weak<dyn MapInstance>,
    generation: u64,
}

impl MapRef {
    /// Handle generation this reference was taken from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_alive(&self) -> bool {
        self.instance.strong_count() > 0
    }

    fn instance(&self) -> Result<Arc<dyn MapInstance>, SdkError> {
        self.instance.upgrade().ok_or(SdkError::MapRemoved)
    }

    pub fn on(&self, event_type: &str, handler: EventHandler) -> Result<ListenerId, SdkError> {
        Ok(self.instance()?.on(event_type, handler))
    }

    pub fn off(&self, listener: ListenerId) {
        if let Ok(instance) = self.instance() {
            instance.off(listener);
        }
    }

    pub fn add_source(&self, id: &str, spec: &SourceSpec) -> Result<(), SdkError> {
        self.instance()?.add_source(id, spec)
    }

    pub fn remove_source(&self, id: &str) -> Result<(), SdkError> {
        self.instance()?.remove_source(id)
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.instance().map(|map| map.has_source(id)).unwrap_or(false)
    }

    pub fn add_layer(&self, spec: &LayerSpec, before_id: Option<&str>) -> Result<(), SdkError> {
        self.instance()?.add_layer(spec, before_id)
    }

    pub fn remove_layer(&self, id: &str) -> Result<(), SdkError> {
        self.instance()?.remove_layer(id)
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.instance().map(|map| map.has_layer(id)).unwrap_or(false)
    }

    pub fn style_layers(&self) -> Vec<StyleLayer> {
        self.instance()
            .map(|map| map.style_layers())
            .unwrap_or_default()
    }

    pub fn add_control(
        &self,
        control: &ControlKind,
        position: ControlPosition,
    ) -> Result<ControlId, SdkError> {
        self.instance()?.add_control(control, position)
    }

    pub fn remove_control(&self, id: ControlId) -> Result<(), SdkError> {
        self.instance()?.remove_control(id)
    }

    pub fn create_marker(&self, options: &MarkerOptions) -> Result<Box<dyn MarkerObject>, SdkError> {
        self.instance()?.create_marker(options)
    }

    pub fn create_popup(&self, options: &PopupOptions) -> Result<Box<dyn PopupObject>, SdkError> {
        self.instance()?.create_popup(options)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRef")
            .field("generation", &self.generation)
            .field("alive", &self.is_alive())
            .finish()
    }
}
