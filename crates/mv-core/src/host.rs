//! Map host: owner of one map instance and its readiness

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::config::MapConfig;
use crate::error::Result;
use crate::handle::MapHandle;
use crate::readiness::{MapSnapshot, Milestone, ReadinessBroadcaster, ReadinessSubscriber};
use crate::sdk::{MapSdk, Surface};

/// Lifecycle flags of the host itself
#[derive(Debug, Default, Clone, Copy)]
struct HostPhase {
    mounted: bool,
    init_requested: bool,
}

struct HostInner {
    sdk: Arc<dyn MapSdk>,
    config: MapConfig,
    surface: Surface,
    handle: Mutex<Option<MapHandle>>,
    phase: Mutex<HostPhase>,
    broadcaster: Arc<ReadinessBroadcaster>,
}

impl HostInner {
    /// Create the map unless one exists; returns whether a map was created
    fn create_handle(&self) -> Result<bool> {
        let mut slot = self.handle.lock();
        if slot.is_some() {
            return Ok(false);
        }

        self.config.validate()?;
        let instance = self.sdk.create_map(&self.config, &self.surface)?;
        let handle = MapHandle::new(Arc::clone(&instance), self.broadcaster.allocate_generation());
        let generation = handle.generation();
        let map_ref = handle.downgrade();
        *slot = Some(handle);
        drop(slot);

        // Subscribers may call back into the host, so the slot lock is released first.
        // The generation must be current before any listener can fire.
        self.broadcaster.publish_handle(Some(map_ref));
        for milestone in Milestone::ALL {
            let broadcaster = Arc::downgrade(&self.broadcaster);
            instance.once(
                milestone,
                Box::new(move || {
                    if let Some(broadcaster) = broadcaster.upgrade() {
                        broadcaster.advance(generation, milestone);
                    }
                }),
            );
        }
        tracing::info!(
            "Created map on surface '{}' (generation {}, style '{}')",
            self.surface.id,
            generation,
            self.config.style
        );
        Ok(true)
    }

    fn release_handle(&self) -> bool {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => {
                self.broadcaster.publish_handle(None);
                tracing::info!(
                    "Released map on surface '{}' (generation {})",
                    self.surface.id,
                    handle.generation()
                );
                drop(handle);
                true
            }
            None => false,
        }
    }

    fn trigger_init(&self) -> Result<bool> {
        let mounted = {
            let mut phase = self.phase.lock();
            phase.init_requested = true;
            phase.mounted
        };
        if mounted {
            self.create_handle()
        } else {
            Ok(false)
        }
    }
}

/// Owns the lifecycle of one external map instance.
///
/// On mount it creates the map, unless the configuration asks for lazy
/// initialization, in which case creation waits for [`MapHost::trigger_init`].
/// Descendants only ever see the read-only [`MapContext`].
#[derive(Clone)]
pub struct MapHost {
    inner: Arc<HostInner>,
}

impl MapHost {
    pub fn new(sdk: Arc<dyn MapSdk>, config: MapConfig, surface: Surface) -> Self {
        Self {
            inner: Arc::new(HostInner {
                sdk,
                config,
                surface,
                handle: Mutex::new(None),
                phase: Mutex::new(HostPhase::default()),
                broadcaster: Arc::new(ReadinessBroadcaster::new()),
            }),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.inner.config
    }

    pub fn surface(&self) -> &Surface {
        &self.inner.surface
    }

    /// First effective mount; repeated calls are no-ops
    pub fn mount(&self) -> Result<()> {
        let should_create = {
            let mut phase = self.inner.phase.lock();
            if phase.mounted {
                return Ok(());
            }
            phase.mounted = true;
            !self.inner.config.is_lazy() || phase.init_requested
        };

        if should_create {
            self.inner.create_handle()?;
        } else {
            tracing::debug!(
                "Deferring map creation on surface '{}' until triggered",
                self.inner.surface.id
            );
        }
        Ok(())
    }

    /// Request map creation; a no-op while a map exists
    pub fn trigger_init(&self) -> Result<bool> {
        self.inner.trigger_init()
    }

    /// Tear the current map down while staying mounted.
    ///
    /// Milestones reset; a later [`MapHost::trigger_init`] creates a fresh map.
    pub fn deinit(&self) -> bool {
        self.inner.phase.lock().init_requested = false;
        self.inner.release_handle()
    }

    /// Subtree removal: release the map and forget the mount
    pub fn unmount(&self) {
        self.inner.release_handle();
        *self.inner.phase.lock() = HostPhase::default();
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.phase.lock().mounted
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.handle.lock().is_some()
    }

    /// Whether both values refer to the same host
    pub fn ptr_eq(&self, other: &MapHost) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read-only context for descendants
    pub fn context(&self) -> MapContext {
        MapContext {
            broadcaster: Arc::clone(&self.inner.broadcaster),
            host: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for MapHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHost")
            .field("surface", &self.inner.surface.id)
            .field("phase", &*self.inner.phase.lock())
            .field("snapshot", &self.inner.broadcaster.snapshot())
            .finish()
    }
}

/// What descendants of a map host can see: `{handle, style_loaded, loaded,
/// trigger_init}`. There is no way to advance readiness through it.
#[derive(Clone)]
pub struct MapContext {
    broadcaster: Arc<ReadinessBroadcaster>,
    host: Weak<HostInner>,
}

impl MapContext {
    pub fn snapshot(&self) -> MapSnapshot {
        self.broadcaster.snapshot()
    }

    pub fn is_reached(&self, milestone: Milestone) -> bool {
        self.snapshot().is_reached(milestone)
    }

    /// Ask the host to create its map; returns whether a map was created
    pub fn trigger_init(&self) -> Result<bool> {
        match self.host.upgrade() {
            Some(host) => host.trigger_init(),
            None => Ok(false),
        }
    }

    pub fn subscribe(&self, subscriber: Arc<dyn ReadinessSubscriber>) {
        self.broadcaster.add_subscriber(subscriber);
    }
}

impl fmt::Debug for MapContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapContext")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
