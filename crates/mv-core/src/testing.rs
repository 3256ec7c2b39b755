//! Minimal map stand-ins for unit tests

use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::MapConfig;
use crate::dom::Element;
use crate::error::SdkError;
use crate::geo::{ControlPosition, LngLat};
use crate::ids::{ControlId, ListenerId};
use crate::readiness::Milestone;
use crate::sdk::{
    Callback, ControlKind, EventHandler, LayerSpec, MapEvent, MapInstance, MapSdk, MarkerEventKind,
    MarkerHandler, MarkerObject, MarkerOptions, PopupObject, PopupOptions, SourceSpec, StyleLayer,
    Surface,
};

/// Map that accepts everything and fires milestones on request
#[derive(Default)]
pub(crate) struct StubMap {
    once: Mutex<AHashMap<Milestone, Vec<Callback>>>,
    listeners: Mutex<Vec<(ListenerId, String, EventHandler)>>,
    pub(crate) removed: AtomicBool,
    /// Style already cached: its milestone fires as soon as someone listens
    style_cached: AtomicBool,
}

impl StubMap {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fire(&self, milestone: Milestone) {
        let callbacks = self.once.lock().remove(&milestone).unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }

    pub(crate) fn emit(&self, event: &MapEvent) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|(_, event_type, _)| *event_type == event.event_type)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl MapInstance for StubMap {
    fn once(&self, milestone: Milestone, callback: Callback) {
        if milestone == Milestone::StyleLoaded && self.style_cached.load(Ordering::SeqCst) {
            callback();
            return;
        }
        self.once.lock().entry(milestone).or_default().push(callback);
    }

    fn on(&self, event_type: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .lock()
            .push((id, event_type.to_string(), handler));
        id
    }

    fn off(&self, listener: ListenerId) {
        self.listeners.lock().retain(|(id, _, _)| *id != listener);
    }

    fn add_source(&self, _id: &str, _spec: &SourceSpec) -> Result<(), SdkError> {
        Ok(())
    }

    fn remove_source(&self, _id: &str) -> Result<(), SdkError> {
        Ok(())
    }

    fn has_source(&self, _id: &str) -> bool {
        false
    }

    fn add_layer(&self, _spec: &LayerSpec, _before_id: Option<&str>) -> Result<(), SdkError> {
        Ok(())
    }

    fn remove_layer(&self, _id: &str) -> Result<(), SdkError> {
        Ok(())
    }

    fn has_layer(&self, _id: &str) -> bool {
        false
    }

    fn style_layers(&self) -> Vec<StyleLayer> {
        Vec::new()
    }

    fn add_control(
        &self,
        _control: &ControlKind,
        _position: ControlPosition,
    ) -> Result<ControlId, SdkError> {
        Ok(ControlId::next())
    }

    fn remove_control(&self, _id: ControlId) -> Result<(), SdkError> {
        Ok(())
    }

    fn create_marker(&self, _options: &MarkerOptions) -> Result<Box<dyn MarkerObject>, SdkError> {
        Ok(Box::new(StubObject::default()))
    }

    fn create_popup(&self, _options: &PopupOptions) -> Result<Box<dyn PopupObject>, SdkError> {
        Ok(Box::new(StubObject::default()))
    }

    fn remove(&self) {
        self.removed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct StubObject {
    lng_lat: Mutex<Option<LngLat>>,
}

impl MarkerObject for StubObject {
    fn set_lng_lat(&self, lng_lat: LngLat) {
        *self.lng_lat.lock() = Some(lng_lat);
    }

    fn lng_lat(&self) -> LngLat {
        self.lng_lat.lock().unwrap_or(LngLat::new(0.0, 0.0))
    }

    fn element(&self) -> Element {
        Element::div()
    }

    fn on(&self, _kind: MarkerEventKind, _handler: MarkerHandler) -> ListenerId {
        ListenerId::next()
    }

    fn add_to(&self) -> Result<(), SdkError> {
        Ok(())
    }

    fn remove(&self) {}
}

impl PopupObject for StubObject {
    fn set_lng_lat(&self, lng_lat: LngLat) {
        *self.lng_lat.lock() = Some(lng_lat);
    }

    fn lng_lat(&self) -> Option<LngLat> {
        *self.lng_lat.lock()
    }

    fn set_dom_content(&self, _content: Element) {}

    fn add_to(&self) -> Result<(), SdkError> {
        Ok(())
    }

    fn remove(&self) {}

    fn is_open(&self) -> bool {
        true
    }
}

/// SDK handing out [`StubMap`]s, optionally failing construction
#[derive(Default)]
pub(crate) struct StubSdk {
    pub(crate) maps: Mutex<Vec<Arc<StubMap>>>,
    pub(crate) created: AtomicUsize,
    pub(crate) fail: AtomicBool,
    pub(crate) style_cached: AtomicBool,
}

impl StubSdk {
    pub(crate) fn last_map(&self) -> Arc<StubMap> {
        Arc::clone(self.maps.lock().last().expect("no map created"))
    }
}

impl MapSdk for StubSdk {
    fn create_map(
        &self,
        _config: &MapConfig,
        _surface: &Surface,
    ) -> Result<Arc<dyn MapInstance>, SdkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SdkError::Construction("invalid api key".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let map = StubMap::new();
        map.style_cached
            .store(self.style_cached.load(Ordering::SeqCst), Ordering::SeqCst);
        self.maps.lock().push(Arc::clone(&map));
        Ok(map)
    }
}
