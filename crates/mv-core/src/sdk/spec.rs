//! Typed option bags forwarded to the map SDK

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dom::Element;
use crate::geo::{Anchor, LngLat, Offset};

/// Source specification, one variant per SDK source type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceSpec {
    Geojson(GeoJsonSource),
    Vector(TileSource),
    Raster(RasterSource),
    RasterDem(RasterDemSource),
    Image(MediaSource),
    Video(VideoSource),
}

impl SourceSpec {
    /// GeoJSON source with default clustering options
    pub fn geojson(data: Value) -> Self {
        SourceSpec::Geojson(GeoJsonSource {
            data,
            ..Default::default()
        })
    }

    /// Vector tile source backed by a TileJSON url
    pub fn vector(url: impl Into<String>) -> Self {
        SourceSpec::Vector(TileSource {
            url: Some(url.into()),
            ..Default::default()
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SourceSpec::Geojson(_) => "geojson",
            SourceSpec::Vector(_) => "vector",
            SourceSpec::Raster(_) => "raster",
            SourceSpec::RasterDem(_) => "raster-dem",
            SourceSpec::Image(_) => "image",
            SourceSpec::Video(_) => "video",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoJsonSource {
    /// Inline GeoJSON or a url string
    pub data: Value,
    pub cluster: bool,
    pub cluster_radius: Option<u32>,
    pub cluster_max_zoom: Option<f64>,
    #[serde(rename = "maxzoom")]
    pub max_zoom: Option<f64>,
    pub generate_id: bool,
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileSource {
    pub url: Option<String>,
    pub tiles: Vec<String>,
    #[serde(rename = "minzoom")]
    pub min_zoom: Option<f64>,
    #[serde(rename = "maxzoom")]
    pub max_zoom: Option<f64>,
    pub bounds: Option<[f64; 4]>,
    pub attribution: Option<String>,
}

impl TileSource {
    /// Tile sources need a TileJSON url or at least one tile template
    pub fn has_endpoint(&self) -> bool {
        self.url.is_some() || !self.tiles.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterSource {
    #[serde(flatten)]
    pub tiles: TileSource,
    pub tile_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemEncoding {
    Mapbox,
    Terrarium,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterDemSource {
    #[serde(flatten)]
    pub tiles: TileSource,
    pub tile_size: Option<u32>,
    pub encoding: Option<DemEncoding>,
}

/// Georeferenced image: corners clockwise from top-left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    pub coordinates: [LngLat; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub urls: Vec<String>,
    pub coordinates: [LngLat; 4],
}

/// Layer type; every type except `background` draws from a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Fill,
    Line,
    Symbol,
    Circle,
    Heatmap,
    FillExtrusion,
    Raster,
    Hillshade,
    Background,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Symbol => "symbol",
            LayerKind::Circle => "circle",
            LayerKind::Heatmap => "heatmap",
            LayerKind::FillExtrusion => "fill-extrusion",
            LayerKind::Raster => "raster",
            LayerKind::Hillshade => "hillshade",
            LayerKind::Background => "background",
        }
    }

    pub fn requires_source(&self) -> bool {
        !matches!(self, LayerKind::Background)
    }
}

/// A fully resolved layer as the SDK receives it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, rename = "minzoom", skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, rename = "maxzoom", skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

/// Options for constructing a marker
#[derive(Debug, Clone, Default)]
pub struct MarkerOptions {
    pub anchor: Anchor,
    pub class_name: Option<String>,
    pub click_tolerance: Option<f64>,
    pub color: Option<String>,
    pub draggable: bool,
    pub offset: Option<Offset>,
    /// Materialized content replacing the default pin
    pub element: Option<Element>,
}

/// Options for constructing a popup
#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub class_name: Option<String>,
    pub close_button: bool,
    pub close_on_click: bool,
    pub close_on_move: bool,
    pub focus_after_open: bool,
    pub anchor: Anchor,
    pub offset: Offset,
    pub max_width: Option<String>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            class_name: None,
            close_button: true,
            close_on_click: true,
            close_on_move: true,
            focus_after_open: true,
            anchor: Anchor::Bottom,
            offset: Offset::default(),
            max_width: None,
        }
    }
}

/// Control attached through `add_control`
#[derive(Debug, Clone)]
pub enum ControlKind {
    Navigation {
        show_compass: bool,
        show_zoom: bool,
        visualize_pitch: bool,
    },
    Scale,
    Fullscreen,
    Geolocate,
    Terrain,
    /// User-built control; the SDK takes ownership of the container
    Custom(Element),
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Navigation { .. } => "navigation",
            ControlKind::Scale => "scale",
            ControlKind::Fullscreen => "fullscreen",
            ControlKind::Geolocate => "geolocate",
            ControlKind::Terrain => "terrain",
            ControlKind::Custom(_) => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_spec_tagging() {
        let spec: SourceSpec = serde_json::from_value(json!({
            "type": "raster-dem",
            "url": "https://tiles.example/terrain.json",
            "tileSize": 512,
            "encoding": "terrarium"
        }))
        .unwrap();

        match &spec {
            SourceSpec::RasterDem(dem) => {
                assert!(dem.tiles.has_endpoint());
                assert_eq!(dem.tile_size, Some(512));
                assert_eq!(dem.encoding, Some(DemEncoding::Terrarium));
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(spec.type_name(), "raster-dem");

        let geojson = SourceSpec::geojson(json!({"type": "FeatureCollection", "features": []}));
        assert_eq!(serde_json::to_value(&geojson).unwrap()["type"], "geojson");
    }

    #[test]
    fn test_layer_spec_wire_names() {
        let mut paint = Map::new();
        paint.insert("fill-color".into(), json!("#088"));
        let spec = LayerSpec {
            id: "parks".into(),
            kind: LayerKind::FillExtrusion,
            source: Some("s1".into()),
            source_layer: Some("landuse".into()),
            paint,
            layout: Map::new(),
            filter: None,
            min_zoom: Some(10.0),
            max_zoom: None,
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "fill-extrusion");
        assert_eq!(value["source-layer"], "landuse");
        assert_eq!(value["minzoom"], 10.0);
        assert!(value.get("layout").is_none());
        assert!(!LayerKind::Background.requires_source());
    }
}
