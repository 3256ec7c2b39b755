//! Values nested components inherit from their ancestors
//!
//! A source exposes its id so layers declared inside it need not repeat it;
//! a marker exposes its coordinate for popups declared inside it. Explicit
//! props always win, and values are read once at registration.

use crate::error::ConfigError;
use crate::geo::LngLat;
use crate::sdk::LayerKind;

/// Published by a source to its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub id: String,
}

/// Published by a marker to its descendants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerContext {
    pub coordinate: LngLat,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Resolve the source a layer draws from.
///
/// Background layers draw from nothing and resolve to `None`; every other
/// kind needs an explicit or inherited source.
pub fn resolve_source(
    layer_id: &str,
    kind: LayerKind,
    explicit: Option<&str>,
    inherited: Option<&SourceContext>,
) -> Result<Option<String>, ConfigError> {
    if !kind.requires_source() {
        return Ok(None);
    }

    non_empty(explicit)
        .or_else(|| non_empty(inherited.map(|source| source.id.as_str())))
        .map(|id| Some(id.to_string()))
        .ok_or_else(|| ConfigError::MissingSource {
            id: layer_id.to_string(),
            kind: kind.as_str(),
        })
}

/// Resolve where a popup is anchored
pub fn resolve_coordinate(
    popup_id: &str,
    explicit: Option<LngLat>,
    inherited: Option<&MarkerContext>,
) -> Result<LngLat, ConfigError> {
    explicit
        .or_else(|| inherited.map(|marker| marker.coordinate))
        .ok_or_else(|| ConfigError::MissingCoordinate {
            id: popup_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> SourceContext {
        SourceContext { id: id.to_string() }
    }

    #[test]
    fn test_explicit_source_wins() {
        let resolved =
            resolve_source("l1", LayerKind::Fill, Some("explicit"), Some(&source("parent")));
        assert_eq!(resolved.unwrap().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_source_inherited_from_ancestor() {
        let resolved = resolve_source("l1", LayerKind::Line, Some(""), Some(&source("parent")));
        assert_eq!(resolved.unwrap().as_deref(), Some("parent"));
    }

    #[test]
    fn test_missing_source_is_config_error() {
        let err = resolve_source("l1", LayerKind::Circle, None, None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingSource {
                id: "l1".to_string(),
                kind: "circle",
            }
        );
    }

    #[test]
    fn test_background_needs_no_source() {
        let resolved = resolve_source("bg", LayerKind::Background, None, None);
        assert_eq!(resolved.unwrap(), None);
    }

    #[test]
    fn test_coordinate_resolution() {
        let marker = MarkerContext {
            coordinate: LngLat::new(1.0, 2.0),
        };
        assert_eq!(
            resolve_coordinate("p", None, Some(&marker)).unwrap(),
            LngLat::new(1.0, 2.0)
        );
        assert_eq!(
            resolve_coordinate("p", Some(LngLat::new(3.0, 4.0)), Some(&marker)).unwrap(),
            LngLat::new(3.0, 4.0)
        );
        assert!(matches!(
            resolve_coordinate("p", None, None),
            Err(ConfigError::MissingCoordinate { .. })
        ));
    }
}
