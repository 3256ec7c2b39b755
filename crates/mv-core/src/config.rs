//! Map host configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geo::{ControlPosition, LngLat, LngLatBounds};

/// Built-in control switch: off, on at its default corner, or at a given corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlToggle {
    Enabled(bool),
    At(ControlPosition),
}

impl ControlToggle {
    /// Corner the control is shown at, if it is shown at all
    pub fn position(&self) -> Option<ControlPosition> {
        match self {
            ControlToggle::Enabled(true) => Some(ControlPosition::default()),
            ControlToggle::Enabled(false) => None,
            ControlToggle::At(position) => Some(*position),
        }
    }
}

/// Controls the SDK creates on its own when the map is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuiltinControls {
    pub attribution: bool,
    pub navigation: ControlToggle,
    pub terrain: ControlToggle,
    pub geolocate: ControlToggle,
    pub scale: ControlToggle,
    pub fullscreen: ControlToggle,
    pub minimap: ControlToggle,
}

impl Default for BuiltinControls {
    fn default() -> Self {
        Self {
            attribution: false,
            navigation: ControlToggle::Enabled(true),
            terrain: ControlToggle::Enabled(false),
            geolocate: ControlToggle::Enabled(true),
            scale: ControlToggle::Enabled(false),
            fullscreen: ControlToggle::Enabled(false),
            minimap: ControlToggle::Enabled(false),
        }
    }
}

/// Configuration for a map host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Credentials for the tile provider
    pub api_key: String,

    /// Style reference, e.g. `satellite` or a style url
    pub style: String,

    pub language: Option<String>,
    pub center: LngLat,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub bounds: Option<LngLatBounds>,

    /// Sync the camera with the url hash
    pub hash: bool,

    pub terrain: bool,
    pub terrain_exaggeration: f64,
    pub geolocate: bool,
    pub controls: BuiltinControls,
    pub maptiler_logo: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_pitch: f64,
    pub pitch_with_rotate: bool,

    /// When false the map is only created once initialization is triggered
    pub initialize: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            style: "satellite".to_string(),
            language: None,
            center: LngLat::new(139.753, 35.6844),
            zoom: 14.0,
            bearing: 0.0,
            pitch: 0.0,
            bounds: None,
            hash: false,
            terrain: false,
            terrain_exaggeration: 1.0,
            geolocate: false,
            controls: BuiltinControls::default(),
            maptiler_logo: false,
            min_zoom: 0.0,
            max_zoom: 22.0,
            min_pitch: 0.0,
            pitch_with_rotate: true,
            initialize: true,
        }
    }
}

impl MapConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Defer map creation until initialization is triggered
    pub fn lazy(mut self) -> Self {
        self.initialize = false;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_view(mut self, center: LngLat, zoom: f64) -> Self {
        self.center = center;
        self.zoom = zoom;
        self
    }

    pub fn is_lazy(&self) -> bool {
        !self.initialize
    }

    /// Check ranges before the SDK sees them
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidMapConfig(format!(
                "minZoom {} is greater than maxZoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom < self.min_zoom || self.zoom > self.max_zoom {
            return Err(ConfigError::InvalidMapConfig(format!(
                "zoom {} is outside [{}, {}]",
                self.zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.pitch < self.min_pitch {
            return Err(ConfigError::InvalidMapConfig(format!(
                "pitch {} is below minPitch {}",
                self.pitch, self.min_pitch
            )));
        }
        if self.terrain_exaggeration <= 0.0 {
            return Err(ConfigError::InvalidMapConfig(
                "terrainExaggeration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_json() {
        let config: MapConfig = serde_json::from_str(
            r#"{ "apiKey": "k", "zoom": 3, "controls": { "scale": "bottom-left", "navigation": false } }"#,
        )
        .unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.zoom, 3.0);
        assert_eq!(config.style, "satellite");
        assert_eq!(config.center, LngLat::new(139.753, 35.6844));
        assert!(!config.is_lazy());
        assert_eq!(config.controls.scale.position(), Some(ControlPosition::BottomLeft));
        assert_eq!(config.controls.navigation.position(), None);
        assert_eq!(config.controls.geolocate.position(), Some(ControlPosition::TopRight));
    }

    #[test]
    fn test_validate_zoom_range() {
        let mut config = MapConfig::new("k");
        assert!(config.validate().is_ok());

        config.min_zoom = 10.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMapConfig(_))
        ));
    }

    #[test]
    fn test_lazy_builder() {
        let config = MapConfig::new("k").lazy().with_style("streets");
        assert!(config.is_lazy());
        assert_eq!(config.style, "streets");
    }
}
