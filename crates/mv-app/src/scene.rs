//! Scene files: a map configuration plus the components to mount on it

use anyhow::{Context, Result};
use mv_components::{
    ControlProps, LayerProps, MarkerProps, NodeId, PopupProps, SourceProps, ViewTree,
};
use mv_core::{
    Content, ControlKind, ControlPosition, LayerKind, LngLat, MapConfig, MapHost, MapSdk,
    SourceSpec, Surface,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

const BUILTIN_SCENE: &str = include_str!("../../../demos/scene.json");

/// Everything the demo mounts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub name: String,
    /// Id of the rendering surface
    pub surface: String,
    pub map: MapConfig,
    pub sources: Vec<SceneSource>,
    /// Layers declared at the top level; they name their source explicitly
    pub layers: Vec<SceneLayer>,
    pub markers: Vec<SceneMarker>,
    pub controls: Vec<SceneControl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSource {
    pub id: String,
    pub spec: SourceSpec,
    /// Nested layers inherit the source id
    #[serde(default)]
    pub layers: Vec<SceneLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_layer: Option<String>,
    #[serde(default)]
    pub paint: Map<String, Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub before_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMarker {
    pub lng_lat: LngLat,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub draggable: bool,
    /// Popup text shown at the marker
    #[serde(default)]
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneControlKind {
    Navigation,
    Scale,
    Fullscreen,
    Geolocate,
    Terrain,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SceneControl {
    pub kind: SceneControlKind,
    #[serde(default)]
    pub position: ControlPosition,
}

impl SceneConfig {
    /// Load a scene from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid scene file {}", path.display()))
    }

    /// The scene shipped with the demo
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCENE).context("Invalid built-in scene")
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Mount the scene under a new map host; returns the host's node
    pub fn mount(&self, tree: &mut ViewTree, sdk: Arc<dyn MapSdk>) -> Result<NodeId> {
        let surface = if self.surface.is_empty() { "map" } else { &self.surface };
        let host = MapHost::new(sdk, self.map.clone(), Surface::new(surface));
        let host = tree.mount(None, host)?;

        for source in &self.sources {
            let node = tree.mount(
                Some(host),
                SourceProps::new(source.spec.clone()).with_id(source.id.clone()),
            )?;
            for layer in &source.layers {
                tree.mount(Some(node), layer.props())?;
            }
        }
        for layer in &self.layers {
            tree.mount(Some(host), layer.props())?;
        }
        for marker in &self.markers {
            let node = tree.mount(Some(host), marker.props())?;
            if let Some(text) = &marker.popup {
                tree.mount(Some(node), PopupProps::new().with_content(Content::text(text.clone())))?;
            }
        }
        for control in &self.controls {
            tree.mount(
                Some(host),
                ControlProps::new(control.kind.into()).at(control.position),
            )?;
        }

        tracing::info!(
            "Mounted scene '{}': {} sources, {} markers, {} controls",
            self.name,
            self.sources.len(),
            self.markers.len(),
            self.controls.len()
        );
        Ok(host)
    }
}

impl SceneLayer {
    fn props(&self) -> LayerProps {
        let mut props = LayerProps::new(self.kind);
        props.id = self.id.clone();
        props.source = self.source.clone();
        props.source_layer = self.source_layer.clone();
        props.paint = self.paint.clone();
        props.layout = self.layout.clone();
        props.filter = self.filter.clone();
        props.before_id = self.before_id.clone();
        props
    }
}

impl SceneMarker {
    fn props(&self) -> MarkerProps {
        let mut props = MarkerProps::new(self.lng_lat);
        props.class_name = self.class_name.clone();
        props.color = self.color.clone();
        if self.draggable {
            props = props.draggable().on_drag_end(|event| {
                tracing::info!("Marker dropped at {}", event.lng_lat);
            });
        }
        props
    }
}

impl From<SceneControlKind> for ControlKind {
    fn from(kind: SceneControlKind) -> Self {
        match kind {
            SceneControlKind::Navigation => ControlKind::Navigation {
                show_compass: true,
                show_zoom: true,
                visualize_pitch: false,
            },
            SceneControlKind::Scale => ControlKind::Scale,
            SceneControlKind::Fullscreen => ControlKind::Fullscreen,
            SceneControlKind::Geolocate => ControlKind::Geolocate,
            SceneControlKind::Terrain => ControlKind::Terrain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_components::NodeState;
    use mv_store::MemorySdk;

    #[test]
    fn test_builtin_scene_parses() {
        let scene = SceneConfig::builtin().unwrap();
        assert!(!scene.sources.is_empty());
        assert!(scene.map.validate().is_ok());
    }

    #[test]
    fn test_partial_scene_uses_defaults() {
        let scene = SceneConfig::parse(
            r#"{
                "map": { "apiKey": "key" },
                "sources": [{
                    "id": "parks",
                    "spec": { "type": "geojson", "data": null },
                    "layers": [{ "type": "fill" }]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.map.style, MapConfig::default().style);
        assert_eq!(scene.sources[0].layers[0].kind, LayerKind::Fill);
        assert!(scene.markers.is_empty());
    }

    #[test]
    fn test_mount_registers_scene() {
        let scene = SceneConfig::builtin().unwrap();
        let sdk = MemorySdk::new();
        let mut tree = ViewTree::new();
        let host = scene.mount(&mut tree, sdk.clone()).unwrap();
        tree.flush().unwrap();
        if !tree.host(host).unwrap().is_initialized() {
            tree.host(host).unwrap().trigger_init().unwrap();
        }

        let map = sdk.last_map().unwrap();
        map.emit_load();
        tree.flush().unwrap();
        assert_eq!(map.source_ids().len(), scene.sources.len());
        assert!(tree
            .children(host)
            .into_iter()
            .all(|node| tree.state(node) == Some(NodeState::Registered)));

        tree.unmount(host).unwrap();
        assert!(map.is_removed());
    }
}
