//! Geographic and placement value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A longitude/latitude pair, serialized as `[lng, lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lng, self.lat)
    }
}

/// South-west / north-east corners, serialized as `[[w, s], [e, n]]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[LngLat; 2]", into = "[LngLat; 2]")]
pub struct LngLatBounds {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

impl LngLatBounds {
    pub fn new(south_west: LngLat, north_east: LngLat) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    pub fn contains(&self, point: LngLat) -> bool {
        point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
            && point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
    }
}

impl From<[LngLat; 2]> for LngLatBounds {
    fn from([south_west, north_east]: [LngLat; 2]) -> Self {
        Self::new(south_west, north_east)
    }
}

impl From<LngLatBounds> for [LngLat; 2] {
    fn from(value: LngLatBounds) -> Self {
        [value.south_west, value.north_east]
    }
}

/// Which part of a marker or popup sits on its coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    Center,
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Map corner a control is docked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ControlPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPosition::TopLeft => "top-left",
            ControlPosition::TopRight => "top-right",
            ControlPosition::BottomLeft => "bottom-left",
            ControlPosition::BottomRight => "bottom-right",
        }
    }
}

/// Pixel offset applied to a popup, either uniform or per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Offset {
    Uniform(f64),
    Point([f64; 2]),
}

impl Default for Offset {
    fn default() -> Self {
        Offset::Uniform(40.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lng_lat_serializes_as_pair() {
        let point = LngLat::new(139.753, 35.6844);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, "[139.753,35.6844]");

        let back: LngLat = serde_json::from_str("[-73.98, 40.75]").unwrap();
        assert_eq!(back, LngLat::new(-73.98, 40.75));
    }

    #[test]
    fn test_bounds_contains() {
        let bounds: LngLatBounds = serde_json::from_str("[[-74.3, 40.5], [-73.7, 40.9]]").unwrap();
        assert!(bounds.contains(LngLat::new(-73.98, 40.75)));
        assert!(!bounds.contains(LngLat::new(2.35, 48.85)));
    }

    #[test]
    fn test_placement_names() {
        let anchor: Anchor = serde_json::from_str("\"top-left\"").unwrap();
        assert_eq!(anchor, Anchor::TopLeft);
        assert_eq!(ControlPosition::default().as_str(), "top-right");

        let offset: Offset = serde_json::from_str("[0, -12]").unwrap();
        assert_eq!(offset, Offset::Point([0.0, -12.0]));
    }
}
