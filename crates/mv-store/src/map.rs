//! In-memory map instance

use ahash::AHashMap;
use indexmap::IndexMap;
use mv_core::{
    Callback, ControlId, ControlKind, ControlPosition, EventHandler, LayerSpec, ListenerId,
    MapConfig, MapEvent, MapInstance, MarkerObject, MarkerOptions, Milestone, PopupObject,
    PopupOptions, SdkError, SourceSpec, StyleLayer,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::journal::{Call, Journal};
use crate::objects::{MemoryMarker, MemoryPopup};

/// A control attached to the map
#[derive(Debug, Clone)]
pub struct AttachedControl {
    pub id: ControlId,
    pub kind: ControlKind,
    pub position: ControlPosition,
}

#[derive(Default)]
struct MapState {
    style_loaded: bool,
    loaded: bool,
    sources: AHashMap<String, SourceSpec>,
    /// Style layers, bottom to top
    layers: IndexMap<String, LayerSpec>,
    controls: IndexMap<ControlId, AttachedControl>,
    once: AHashMap<Milestone, Vec<Callback>>,
    listeners: Vec<(ListenerId, String, EventHandler)>,
    markers: Vec<MemoryMarker>,
    popups: Vec<MemoryPopup>,
}

/// Map that keeps its style in memory and enforces the SDK's rules on it.
///
/// Milestones never fire on their own: tests and the demo drive them with
/// [`MemoryMap::emit_style_load`] and [`MemoryMap::emit_load`].
pub struct MemoryMap {
    config: MapConfig,
    surface_id: String,
    state: Mutex<MapState>,
    removed: Arc<AtomicBool>,
    next_object: AtomicU64,
    journal: Journal,
}

impl MemoryMap {
    pub(crate) fn new(config: MapConfig, surface_id: String) -> Self {
        Self {
            config,
            surface_id,
            state: Mutex::new(MapState::default()),
            removed: Arc::new(AtomicBool::new(false)),
            next_object: AtomicU64::new(1),
            journal: Journal::default(),
        }
    }

    /// Attach the controls the configuration enables at construction
    pub(crate) fn install_builtin_controls(&self) {
        let builtins = &self.config.controls;
        let candidates = [
            (
                builtins.navigation,
                ControlKind::Navigation {
                    show_compass: true,
                    show_zoom: true,
                    visualize_pitch: false,
                },
            ),
            (builtins.terrain, ControlKind::Terrain),
            (builtins.geolocate, ControlKind::Geolocate),
            (builtins.scale, ControlKind::Scale),
            (builtins.fullscreen, ControlKind::Fullscreen),
        ];

        let mut state = self.state.lock();
        for (toggle, kind) in candidates {
            if let Some(position) = toggle.position() {
                let id = ControlId::next();
                state.controls.insert(id, AttachedControl { id, kind, position });
            }
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn is_style_loaded(&self) -> bool {
        self.state.lock().style_loaded
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    /// Finish loading the style, firing `style.load` listeners
    pub fn emit_style_load(&self) {
        if self.is_removed() {
            return;
        }
        let callbacks = {
            let mut state = self.state.lock();
            if state.style_loaded {
                return;
            }
            state.style_loaded = true;
            state.once.remove(&Milestone::StyleLoaded).unwrap_or_default()
        };

        tracing::debug!("Map on '{}' finished loading its style", self.surface_id);
        for callback in callbacks {
            callback();
        }
        self.fire(&MapEvent::new(Milestone::StyleLoaded.as_str()));
    }

    /// Finish the first render, loading the style first if needed
    pub fn emit_load(&self) {
        if self.is_removed() {
            return;
        }
        self.emit_style_load();
        let callbacks = {
            let mut state = self.state.lock();
            if state.loaded {
                return;
            }
            state.loaded = true;
            state.once.remove(&Milestone::Loaded).unwrap_or_default()
        };

        tracing::debug!("Map on '{}' finished loading", self.surface_id);
        for callback in callbacks {
            callback();
        }
        self.fire(&MapEvent::new(Milestone::Loaded.as_str()));
    }

    /// Deliver a named event to its listeners
    pub fn fire(&self, event: &MapEvent) {
        let handlers: Vec<EventHandler> = self
            .state
            .lock()
            .listeners
            .iter()
            .filter(|(_, event_type, _)| *event_type == event.event_type)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().sources.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn source(&self, id: &str) -> Option<SourceSpec> {
        self.state.lock().sources.get(id).cloned()
    }

    /// Layer ids, bottom to top
    pub fn layer_ids(&self) -> Vec<String> {
        self.state.lock().layers.keys().cloned().collect()
    }

    pub fn layer(&self, id: &str) -> Option<LayerSpec> {
        self.state.lock().layers.get(id).cloned()
    }

    pub fn controls(&self) -> Vec<AttachedControl> {
        self.state.lock().controls.values().cloned().collect()
    }

    pub fn markers(&self) -> Vec<MemoryMarker> {
        self.state.lock().markers.clone()
    }

    pub fn popups(&self) -> Vec<MemoryPopup> {
        self.state.lock().popups.clone()
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|(_, registered, _)| registered == event_type)
            .count()
    }

    fn ensure_alive(&self) -> Result<(), SdkError> {
        if self.is_removed() {
            Err(SdkError::MapRemoved)
        } else {
            Ok(())
        }
    }

    fn next_object_id(&self) -> u64 {
        self.next_object.fetch_add(1, Ordering::Relaxed)
    }
}

fn validate_source(id: &str, spec: &SourceSpec) -> Result<(), SdkError> {
    let tiles = match spec {
        SourceSpec::Vector(tiles) => Some(tiles),
        SourceSpec::Raster(raster) => Some(&raster.tiles),
        SourceSpec::RasterDem(dem) => Some(&dem.tiles),
        _ => None,
    };
    match tiles {
        Some(tiles) if !tiles.has_endpoint() => Err(SdkError::InvalidSpec(format!(
            "{} source `{}` needs a url or tiles",
            spec.type_name(),
            id
        ))),
        _ => Ok(()),
    }
}

impl MapInstance for MemoryMap {
    fn once(&self, milestone: Milestone, callback: Callback) {
        if self.is_removed() {
            return;
        }
        self.state
            .lock()
            .once
            .entry(milestone)
            .or_default()
            .push(callback);
    }

    fn on(&self, event_type: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId::next();
        self.state
            .lock()
            .listeners
            .push((id, event_type.to_string(), handler));
        self.journal.record(Call::On(event_type.to_string()));
        id
    }

    fn off(&self, listener: ListenerId) {
        let mut state = self.state.lock();
        if let Some(index) = state.listeners.iter().position(|(id, _, _)| *id == listener) {
            let (_, event_type, _) = state.listeners.remove(index);
            drop(state);
            self.journal.record(Call::Off(event_type));
        }
    }

    fn add_source(&self, id: &str, spec: &SourceSpec) -> Result<(), SdkError> {
        self.ensure_alive()?;
        let mut state = self.state.lock();
        if !state.style_loaded {
            return Err(SdkError::StyleNotLoaded);
        }
        if state.sources.contains_key(id) {
            return Err(SdkError::DuplicateSource(id.to_string()));
        }
        validate_source(id, spec)?;

        state.sources.insert(id.to_string(), spec.clone());
        drop(state);
        self.journal.record(Call::AddSource(id.to_string()));
        Ok(())
    }

    fn remove_source(&self, id: &str) -> Result<(), SdkError> {
        self.ensure_alive()?;
        let mut state = self.state.lock();
        if !state.sources.contains_key(id) {
            return Err(SdkError::UnknownSource(id.to_string()));
        }
        if let Some(layer) = state
            .layers
            .values()
            .find(|layer| layer.source.as_deref() == Some(id))
        {
            return Err(SdkError::SourceInUse {
                source_id: id.to_string(),
                layer: layer.id.clone(),
            });
        }

        state.sources.remove(id);
        drop(state);
        self.journal.record(Call::RemoveSource(id.to_string()));
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.state.lock().sources.contains_key(id)
    }

    fn add_layer(&self, spec: &LayerSpec, before_id: Option<&str>) -> Result<(), SdkError> {
        self.ensure_alive()?;
        let mut state = self.state.lock();
        if !state.style_loaded {
            return Err(SdkError::StyleNotLoaded);
        }
        if state.layers.contains_key(&spec.id) {
            return Err(SdkError::DuplicateLayer(spec.id.clone()));
        }
        match &spec.source {
            Some(source) if !state.sources.contains_key(source) => {
                return Err(SdkError::MissingSource {
                    layer: spec.id.clone(),
                    source_id: source.clone(),
                });
            }
            None if spec.kind.requires_source() => {
                return Err(SdkError::InvalidSpec(format!(
                    "{} layer `{}` needs a source",
                    spec.kind.as_str(),
                    spec.id
                )));
            }
            _ => {}
        }

        match before_id {
            Some(before) => {
                let index = state
                    .layers
                    .get_index_of(before)
                    .ok_or_else(|| SdkError::UnknownBeforeLayer(before.to_string()))?;
                state.layers.shift_insert(index, spec.id.clone(), spec.clone());
            }
            None => {
                state.layers.insert(spec.id.clone(), spec.clone());
            }
        }
        drop(state);

        self.journal.record(Call::AddLayer {
            id: spec.id.clone(),
            before: before_id.map(str::to_string),
        });
        Ok(())
    }

    fn remove_layer(&self, id: &str) -> Result<(), SdkError> {
        self.ensure_alive()?;
        if self.state.lock().layers.shift_remove(id).is_none() {
            return Err(SdkError::UnknownLayer(id.to_string()));
        }
        self.journal.record(Call::RemoveLayer(id.to_string()));
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.state.lock().layers.contains_key(id)
    }

    fn style_layers(&self) -> Vec<StyleLayer> {
        self.state
            .lock()
            .layers
            .values()
            .map(|layer| StyleLayer {
                id: layer.id.clone(),
                source: layer.source.clone(),
            })
            .collect()
    }

    fn add_control(
        &self,
        control: &ControlKind,
        position: ControlPosition,
    ) -> Result<ControlId, SdkError> {
        self.ensure_alive()?;
        let id = ControlId::next();
        self.state.lock().controls.insert(
            id,
            AttachedControl {
                id,
                kind: control.clone(),
                position,
            },
        );
        self.journal.record(Call::AddControl {
            name: control.name(),
            position,
        });
        Ok(id)
    }

    fn remove_control(&self, id: ControlId) -> Result<(), SdkError> {
        self.ensure_alive()?;
        let removed = self
            .state
            .lock()
            .controls
            .shift_remove(&id)
            .ok_or(SdkError::UnknownControl(id.get()))?;
        self.journal.record(Call::RemoveControl(removed.kind.name()));
        Ok(())
    }

    fn create_marker(&self, options: &MarkerOptions) -> Result<Box<dyn MarkerObject>, SdkError> {
        self.ensure_alive()?;
        let marker = MemoryMarker::new(
            self.next_object_id(),
            options,
            Arc::clone(&self.removed),
            self.journal.clone(),
        );
        self.state.lock().markers.push(marker.clone());
        Ok(Box::new(marker))
    }

    fn create_popup(&self, options: &PopupOptions) -> Result<Box<dyn PopupObject>, SdkError> {
        self.ensure_alive()?;
        let popup = MemoryPopup::new(
            self.next_object_id(),
            options,
            Arc::clone(&self.removed),
            self.journal.clone(),
        );
        self.state.lock().popups.push(popup.clone());
        Ok(Box::new(popup))
    }

    fn remove(&self) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.lock();
        state.sources.clear();
        state.layers.clear();
        state.controls.clear();
        state.once.clear();
        state.listeners.clear();
        drop(state);

        tracing::debug!("Map on '{}' removed", self.surface_id);
        self.journal.record(Call::RemoveMap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_core::LayerKind;
    use serde_json::json;

    fn loaded_map() -> MemoryMap {
        let map = MemoryMap::new(MapConfig::new("key"), "map".to_string());
        map.emit_style_load();
        map
    }

    fn layer(id: &str, source: Option<&str>) -> LayerSpec {
        LayerSpec {
            id: id.to_string(),
            kind: LayerKind::Fill,
            source: source.map(str::to_string),
            source_layer: None,
            paint: Default::default(),
            layout: Default::default(),
            filter: None,
            min_zoom: None,
            max_zoom: None,
        }
    }

    #[test]
    fn test_style_must_load_first() {
        let map = MemoryMap::new(MapConfig::new("key"), "map".to_string());
        let spec = SourceSpec::geojson(json!({"type": "FeatureCollection", "features": []}));
        assert_eq!(map.add_source("s1", &spec), Err(SdkError::StyleNotLoaded));

        map.emit_style_load();
        map.add_source("s1", &spec).unwrap();
        assert_eq!(
            map.add_source("s1", &spec),
            Err(SdkError::DuplicateSource("s1".to_string()))
        );
    }

    #[test]
    fn test_layer_constraints() {
        let map = loaded_map();
        assert!(matches!(
            map.add_layer(&layer("l1", Some("s1")), None),
            Err(SdkError::MissingSource { .. })
        ));
        assert!(matches!(
            map.add_layer(&layer("l1", None), None),
            Err(SdkError::InvalidSpec(_))
        ));

        map.add_source("s1", &SourceSpec::geojson(json!(null))).unwrap();
        map.add_layer(&layer("l1", Some("s1")), None).unwrap();
        assert_eq!(
            map.add_layer(&layer("l1", Some("s1")), None),
            Err(SdkError::DuplicateLayer("l1".to_string()))
        );
        assert!(matches!(
            map.remove_source("s1"),
            Err(SdkError::SourceInUse { .. })
        ));

        map.remove_layer("l1").unwrap();
        map.remove_source("s1").unwrap();
        assert_eq!(
            map.remove_layer("l1"),
            Err(SdkError::UnknownLayer("l1".to_string()))
        );
    }

    #[test]
    fn test_layers_insert_before() {
        let map = loaded_map();
        map.add_source("s1", &SourceSpec::geojson(json!(null))).unwrap();
        map.add_layer(&layer("top", Some("s1")), None).unwrap();
        map.add_layer(&layer("below", Some("s1")), Some("top")).unwrap();
        assert_eq!(map.layer_ids(), vec!["below", "top"]);

        assert_eq!(
            map.add_layer(&layer("x", Some("s1")), Some("nope")),
            Err(SdkError::UnknownBeforeLayer("nope".to_string()))
        );
    }

    #[test]
    fn test_tile_source_needs_endpoint() {
        let map = loaded_map();
        let spec = SourceSpec::Vector(Default::default());
        assert!(matches!(
            map.add_source("tiles", &spec),
            Err(SdkError::InvalidSpec(_))
        ));
        map.add_source("tiles", &SourceSpec::vector("https://tiles.example/v.json"))
            .unwrap();
    }

    #[test]
    fn test_emit_load_fires_style_load_first() {
        let map = MemoryMap::new(MapConfig::new("key"), "map".to_string());
        let order = Arc::new(Mutex::new(Vec::new()));
        for milestone in [Milestone::Loaded, Milestone::StyleLoaded] {
            let order = order.clone();
            map.once(milestone, Box::new(move || order.lock().push(milestone)));
        }

        map.emit_load();
        map.emit_load();
        assert_eq!(*order.lock(), vec![Milestone::StyleLoaded, Milestone::Loaded]);
        assert!(map.is_loaded());
    }

    #[test]
    fn test_removed_map_rejects_calls() {
        let map = loaded_map();
        map.remove();
        assert!(map.is_removed());
        assert_eq!(
            map.add_source("s", &SourceSpec::geojson(json!(null))),
            Err(SdkError::MapRemoved)
        );
        assert_eq!(map.journal().calls(), vec![Call::RemoveMap]);
    }

    #[test]
    fn test_unknown_control_removal() {
        let map = loaded_map();
        let id = map.add_control(&ControlKind::Scale, ControlPosition::BottomLeft).unwrap();
        map.remove_control(id).unwrap();
        assert_eq!(
            map.remove_control(id),
            Err(SdkError::UnknownControl(id.get()))
        );
    }
}
