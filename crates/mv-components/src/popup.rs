//! Popup component

use mv_core::relay::resolve_coordinate;
use mv_core::{
    generate_id, Anchor, Content, LngLat, Offset, PopupObject, PopupOptions, Result,
};

use crate::node::{live_map, DependentNode, Lifecycle, NodeContext, NodeKind, NodeState};

/// Props of a [`Popup`]
#[derive(Debug, Clone)]
pub struct PopupProps {
    /// Falls back to the enclosing marker's coordinate
    pub lng_lat: Option<LngLat>,
    pub options: PopupOptions,
    pub content: Option<Content>,
    /// Hidden popups stay registered but are taken off the map
    pub visible: bool,
}

impl Default for PopupProps {
    fn default() -> Self {
        Self {
            lng_lat: None,
            options: PopupOptions::default(),
            content: None,
            visible: true,
        }
    }
}

impl PopupProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, lng_lat: impl Into<LngLat>) -> Self {
        self.lng_lat = Some(lng_lat.into());
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.options.class_name = Some(class_name.into());
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.options.anchor = anchor;
        self
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.options.offset = offset;
        self
    }

    pub fn with_max_width(mut self, max_width: impl Into<String>) -> Self {
        self.options.max_width = Some(max_width.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

pub struct Popup {
    id: String,
    props: PopupProps,
    lifecycle: Lifecycle<Box<dyn PopupObject>>,
}

impl Popup {
    pub fn new(props: PopupProps) -> Self {
        Self {
            id: generate_id("popup"),
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &PopupProps {
        &self.props
    }

    /// Coordinate the popup is currently shown at
    pub fn lng_lat(&self) -> Option<LngLat> {
        self.lifecycle.registration().and_then(|popup| popup.lng_lat())
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle
            .registration()
            .map(|popup| popup.is_open())
            .unwrap_or(false)
    }

    /// Apply new props: coordinate and visibility change in place
    pub fn update(&mut self, props: PopupProps) -> Result<()> {
        if props.options != self.props.options {
            tracing::warn!(
                "Popup '{}' options changed; remount it for the map to pick them up",
                self.id
            );
        }

        let visible = props.visible;
        let moved_to = props.lng_lat.filter(|lng_lat| Some(*lng_lat) != self.props.lng_lat);
        let toggled = visible != self.props.visible;
        self.props = props;

        let Some(popup) = self.lifecycle.registration() else {
            return Ok(());
        };
        if let Some(lng_lat) = moved_to {
            popup.set_lng_lat(lng_lat);
        }
        if toggled {
            if visible {
                popup.add_to()?;
            } else {
                popup.remove();
            }
            tracing::debug!("Popup '{}' visible: {}", self.id, visible);
        }
        Ok(())
    }
}

impl DependentNode for Popup {
    fn kind(&self) -> NodeKind {
        NodeKind::Popup
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

        let coordinate = resolve_coordinate(&self.id, self.props.lng_lat, ctx.marker)?;
        let Some(map) = ctx.map() else {
            return Ok(false);
        };

        let popup = map.create_popup(&self.props.options)?;
        popup.set_lng_lat(coordinate);
        if let Some(content) = &self.props.content {
            popup.set_dom_content(content.materialize());
        }
        if self.props.visible {
            popup.add_to()?;
        }

        tracing::debug!("Registered popup '{}' at {}", self.id, coordinate);
        self.lifecycle.register(map.clone(), popup);
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        if let Some((map, popup)) = self.lifecycle.unmount() {
            if live_map(map).is_some() {
                popup.remove();
                tracing::debug!("Removed popup '{}'", self.id);
            }
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
