//! In-memory map factory

use mv_core::{MapConfig, MapInstance, MapSdk, SdkError, Surface};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::map::MemoryMap;

/// Creates [`MemoryMap`]s and keeps every one of them for inspection
#[derive(Default)]
pub struct MemorySdk {
    maps: Mutex<Vec<Arc<MemoryMap>>>,
    fail_next: Mutex<Option<String>>,
}

impl MemorySdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `create_map` fail with `reason`
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    pub fn maps(&self) -> Vec<Arc<MemoryMap>> {
        self.maps.lock().clone()
    }

    pub fn last_map(&self) -> Option<Arc<MemoryMap>> {
        self.maps.lock().last().cloned()
    }

    pub fn map_count(&self) -> usize {
        self.maps.lock().len()
    }
}

impl MapSdk for MemorySdk {
    fn create_map(
        &self,
        config: &MapConfig,
        surface: &Surface,
    ) -> Result<Arc<dyn MapInstance>, SdkError> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(SdkError::Construction(reason));
        }
        if config.api_key.trim().is_empty() {
            return Err(SdkError::Construction("missing api key".to_string()));
        }

        let map = Arc::new(MemoryMap::new(config.clone(), surface.id.clone()));
        map.install_builtin_controls();
        self.maps.lock().push(Arc::clone(&map));
        tracing::debug!(
            "Created in-memory map #{} on '{}'",
            self.map_count(),
            surface.id
        );
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_core::{BuiltinControls, ControlKind, ControlPosition, ControlToggle};

    #[test]
    fn test_missing_api_key_fails() {
        let sdk = MemorySdk::new();
        let result = sdk.create_map(&MapConfig::default(), &Surface::new("map"));
        assert!(matches!(result, Err(SdkError::Construction(_))));
        assert_eq!(sdk.map_count(), 0);
    }

    #[test]
    fn test_fail_next_only_once() {
        let sdk = MemorySdk::new();
        sdk.fail_next("network down");
        let config = MapConfig::new("key");
        assert!(sdk.create_map(&config, &Surface::new("map")).is_err());
        assert!(sdk.create_map(&config, &Surface::new("map")).is_ok());
    }

    #[test]
    fn test_builtin_controls_follow_config() {
        let sdk = MemorySdk::new();
        let mut config = MapConfig::new("key");
        config.controls = BuiltinControls {
            geolocate: ControlToggle::Enabled(false),
            scale: ControlToggle::At(ControlPosition::BottomLeft),
            ..Default::default()
        };
        sdk.create_map(&config, &Surface::new("map")).unwrap();

        let controls = sdk.last_map().unwrap().controls();
        let names: Vec<_> = controls.iter().map(|control| control.kind.name()).collect();
        assert_eq!(names, vec!["navigation", "scale"]);
        assert!(matches!(controls[0].kind, ControlKind::Navigation { .. }));
        assert_eq!(controls[1].position, ControlPosition::BottomLeft);
    }
}
