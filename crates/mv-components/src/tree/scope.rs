//! Hooks available to code running at a tree node

use mv_core::{ConfigError, MapContext, MarkerContext, ReadyQueue, Result, SourceContext};
use std::sync::Arc;

use super::NodeId;

/// Context resolved for one node: nearest host, source and marker, the node
/// itself included
#[derive(Debug, Clone)]
pub struct Scope {
    pub(crate) node: NodeId,
    pub(crate) host: Option<MapContext>,
    pub(crate) source: Option<SourceContext>,
    pub(crate) marker: Option<MarkerContext>,
}

impl Scope {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The enclosing map host's context; fails outside a host subtree
    pub fn use_map(&self) -> Result<MapContext> {
        self.host.clone().ok_or_else(|| {
            ConfigError::OutsideMapHost {
                component: "use_map",
            }
            .into()
        })
    }

    /// Queue for callbacks that must wait for a milestone.
    ///
    /// Pending callbacks are dropped together with the returned queue.
    pub fn use_on_map_ready(&self) -> Result<Arc<ReadyQueue>> {
        let context = self.host.as_ref().ok_or(ConfigError::OutsideMapHost {
            component: "use_on_map_ready",
        })?;
        Ok(ReadyQueue::attach(context))
    }

    pub fn source(&self) -> Option<&SourceContext> {
        self.source.as_ref()
    }

    pub fn marker(&self) -> Option<&MarkerContext> {
        self.marker.as_ref()
    }
}
