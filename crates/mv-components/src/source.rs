//! Source component

use mv_core::{generate_id, MapRef, Result, SourceContext, SourceSpec};
use serde_json::Value;

use crate::node::{live_map, DependentNode, Lifecycle, NodeContext, NodeKind, NodeState};

/// Props of a [`Source`]
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProps {
    /// Generated when missing
    pub id: Option<String>,
    pub spec: SourceSpec,
}

impl SourceProps {
    pub fn new(spec: SourceSpec) -> Self {
        Self { id: None, spec }
    }

    pub fn geojson(data: Value) -> Self {
        Self::new(SourceSpec::geojson(data))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Adds a source once the style is loaded and exposes its id to nested layers.
///
/// On removal every style layer still drawing from the source is removed
/// first, so the SDK never sees a source pulled out from under a layer.
pub struct Source {
    id: String,
    props: SourceProps,
    lifecycle: Lifecycle<()>,
}

impl Source {
    pub fn new(props: SourceProps) -> Self {
        let id = props
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_id("source"));
        Self {
            id,
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &SourceProps {
        &self.props
    }

    /// Context handed to descendants
    pub fn context(&self) -> SourceContext {
        SourceContext {
            id: self.id.clone(),
        }
    }

    pub fn update(&mut self, props: SourceProps) {
        if props.spec != self.props.spec || props.id != self.props.id {
            tracing::warn!(
                "Source '{}' props changed; remount it for the map to pick them up",
                self.id
            );
        }
        self.props = props;
    }
}

/// Remove every style layer that draws from `source_id`
pub fn remove_layers_by_source(map: &MapRef, source_id: &str) -> Result<usize> {
    let mut removed = 0;
    for layer in map.style_layers() {
        if layer.source.as_deref() == Some(source_id) {
            map.remove_layer(&layer.id)?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl DependentNode for Source {
    fn kind(&self) -> NodeKind {
        NodeKind::Source
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> NodeState {
        self.lifecycle.state()
    }

    fn mount(&mut self) {
        self.lifecycle.mount();
    }

    fn try_register(&mut self, ctx: &NodeContext<'_>) -> Result<bool> {
        match self.lifecycle.state() {
            NodeState::Registered => return Ok(true),
            NodeState::Unmounted => return Ok(false),
            NodeState::Waiting => {}
        }
        let Some(map) = ctx.map() else {
            return Ok(false);
        };
        if !ctx.snapshot.style_loaded() {
            return Ok(false);
        }

        map.add_source(&self.id, &self.props.spec)?;
        tracing::debug!(
            "Registered {} source '{}'",
            self.props.spec.type_name(),
            self.id
        );
        self.lifecycle.register(map.clone(), ());
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        let Some(map) = self.lifecycle.unmount().and_then(|(map, ())| live_map(map)) else {
            return Ok(());
        };

        let layers = remove_layers_by_source(&map, &self.id)?;
        map.remove_source(&self.id)?;
        tracing::debug!(
            "Removed source '{}' and {} dependent layers",
            self.id,
            layers
        );
        Ok(())
    }

    fn registered_generation(&self) -> Option<u64> {
        self.lifecycle.generation()
    }

    fn invalidate(&mut self) {
        self.lifecycle.invalidate();
    }
}
