//! Layer component

use mv_core::relay::resolve_source;
use mv_core::{generate_id, LayerKind, LayerSpec, Result};
use serde_json::{Map, Value};

use crate::node::{live_map, DependentNode, Lifecycle, NodeContext, NodeKind, NodeState};

/// Props of a [`Layer`]; `source` falls back to the enclosing source
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProps {
    pub id: Option<String>,
    pub kind: LayerKind,
    pub source: Option<String>,
    pub source_layer: Option<String>,
    pub paint: Map<String, Value>,
    pub layout: Map<String, Value>,
    pub filter: Option<Value>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    /// Insert below this layer instead of on top
    pub before_id: Option<String>,
}

impl LayerProps {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            id: None,
            kind,
            source: None,
            source_layer: None,
            paint: Map::new(),
            layout: Map::new(),
            filter: None,
            min_zoom: None,
            max_zoom: None,
            before_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn with_paint(mut self, property: impl Into<String>, value: Value) -> Self {
        self.paint.insert(property.into(), value);
        self
    }

    pub fn with_layout(mut self, property: impl Into<String>, value: Value) -> Self {
        self.layout.insert(property.into(), value);
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn before(mut self, layer_id: impl Into<String>) -> Self {
        self.before_id = Some(layer_id.into());
        self
    }
}

pub struct Layer {
    id: String,
    props: LayerProps,
    lifecycle: Lifecycle<()>,
}

impl Layer {
    pub fn new(props: LayerProps) -> Self {
        let id = props
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_id("layer"));
        Self {
            id,
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &LayerProps {
        &self.props
    }

    pub fn update(&mut self, props: LayerProps) {
        if props != self.props {
            tracing::warn!(
                "Layer '{}' props changed; remount it for the map to pick them up",
                self.id
            );
        }
        self.props = props;
    }

    fn spec(&self, source: Option<String>) -> LayerSpec {
        LayerSpec {
            id: self.id.clone(),
            kind: self.props.kind,
            source,
            source_layer: self.props.source_layer.clone(),
            paint: self.props.paint.clone(),
            layout: self.props.layout.clone(),
            filter: self.props.filter.clone(),
            min_zoom: self.props.min_zoom,
            max_zoom: self.props.max_zoom,
        }
    }
}

impl DependentNode for Layer {
    fn kind(&self) -> NodeKind {
        NodeKind::Layer
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

        // A missing source is a declaration error whether or not a map exists yet
        let source = resolve_source(
            &self.id,
            self.props.kind,
            self.props.source.as_deref(),
            ctx.source,
        )?;

        let Some(map) = ctx.map() else {
            return Ok(false);
        };
        if !ctx.snapshot.style_loaded() {
            return Ok(false);
        }
        if let Some(source) = &source {
            if !map.has_source(source) {
                tracing::debug!("Layer '{}' waiting for source '{}'", self.id, source);
                return Ok(false);
            }
        }

        map.add_layer(&self.spec(source), self.props.before_id.as_deref())?;
        tracing::debug!("Registered {} layer '{}'", self.props.kind.as_str(), self.id);
        self.lifecycle.register(map.clone(), ());
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        let Some(map) = self.lifecycle.unmount().and_then(|(map, ())| live_map(map)) else {
            return Ok(());
        };

        // Its source may already have taken it down
        if map.has_layer(&self.id) {
            map.remove_layer(&self.id)?;
            tracing::debug!("Removed layer '{}'", self.id);
        }
        Ok(())
    }

    fn registered_generation(&self) -> Option<u64> {
        self.lifecycle.generation()
    }

    fn invalidate(&mut self) {
        self.lifecycle.invalidate();
    }
}
