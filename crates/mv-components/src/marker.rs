//! Marker component

use mv_core::{
    generate_id, Anchor, ClickEvent, ClickHandler, Content, Element, ListenerId, LngLat,
    MarkerContext, MarkerEvent, MarkerEventKind, MarkerHandler, MarkerObject, MarkerOptions,
    Offset, Result,
};
use std::fmt;
use std::sync::Arc;

use crate::node::{
    live_map, DependentNode, HandlerSlot, Lifecycle, NodeContext, NodeKind, NodeState,
};

/// Props of a [`Marker`]
#[derive(Clone)]
pub struct MarkerProps {
    pub lng_lat: LngLat,
    pub anchor: Anchor,
    pub class_name: Option<String>,
    pub click_tolerance: Option<f64>,
    pub color: Option<String>,
    pub draggable: bool,
    pub offset: Option<Offset>,
    /// Replaces the default pin; materialized once at registration
    pub content: Option<Content>,
    pub on_click: Option<ClickHandler>,
    pub on_drag: Option<MarkerHandler>,
    pub on_drag_end: Option<MarkerHandler>,
}

impl MarkerProps {
    pub fn new(lng_lat: impl Into<LngLat>) -> Self {
        Self {
            lng_lat: lng_lat.into(),
            anchor: Anchor::Bottom,
            class_name: None,
            click_tolerance: None,
            color: None,
            draggable: false,
            offset: None,
            content: None,
            on_click: None,
            on_drag: None,
            on_drag_end: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn on_click(mut self, handler: impl Fn(&ClickEvent) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }

    pub fn on_drag(mut self, handler: impl Fn(&MarkerEvent) + Send + Sync + 'static) -> Self {
        self.on_drag = Some(Arc::new(handler));
        self
    }

    pub fn on_drag_end(mut self, handler: impl Fn(&MarkerEvent) + Send + Sync + 'static) -> Self {
        self.on_drag_end = Some(Arc::new(handler));
        self
    }

    fn options(&self) -> MarkerOptions {
        MarkerOptions {
            anchor: self.anchor,
            class_name: self.class_name.clone(),
            click_tolerance: self.click_tolerance,
            color: self.color.clone(),
            draggable: self.draggable,
            offset: self.offset,
            element: self.content.as_ref().map(Content::materialize),
        }
    }

    /// Whether anything beyond coordinate and handlers differs
    fn options_differ(&self, other: &MarkerProps) -> bool {
        self.anchor != other.anchor
            || self.class_name != other.class_name
            || self.click_tolerance != other.click_tolerance
            || self.color != other.color
            || self.draggable != other.draggable
            || self.offset != other.offset
    }
}

impl fmt::Debug for MarkerProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerProps")
            .field("lng_lat", &self.lng_lat)
            .field("anchor", &self.anchor)
            .field("class_name", &self.class_name)
            .field("color", &self.color)
            .field("draggable", &self.draggable)
            .field("content", &self.content.is_some())
            .finish()
    }
}

struct MarkerRegistration {
    object: Box<dyn MarkerObject>,
    element: Element,
    click_listener: ListenerId,
}

/// A marker pinned to a coordinate, exposing that coordinate to nested popups
pub struct Marker {
    id: String,
    props: MarkerProps,
    on_click: HandlerSlot<ClickHandler>,
    on_drag: HandlerSlot<MarkerHandler>,
    on_drag_end: HandlerSlot<MarkerHandler>,
    lifecycle: Lifecycle<MarkerRegistration>,
}

impl Marker {
    pub fn new(props: MarkerProps) -> Self {
        Self {
            id: generate_id("marker"),
            on_click: HandlerSlot::new(props.on_click.clone()),
            on_drag: HandlerSlot::new(props.on_drag.clone()),
            on_drag_end: HandlerSlot::new(props.on_drag_end.clone()),
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &MarkerProps {
        &self.props
    }

    pub fn context(&self) -> MarkerContext {
        MarkerContext {
            coordinate: self.props.lng_lat,
        }
    }

    /// Element the SDK draws, once registered
    pub fn element(&self) -> Option<Element> {
        self.lifecycle
            .registration()
            .map(|registration| registration.element.clone())
    }

    /// Apply new props: coordinate moves in place and handlers swap live
    pub fn update(&mut self, props: MarkerProps) {
        if props.options_differ(&self.props) {
            tracing::warn!(
                "Marker '{}' options changed; remount it for the map to pick them up",
                self.id
            );
        }
        if props.lng_lat != self.props.lng_lat {
            if let Some(registration) = self.lifecycle.registration() {
                registration.object.set_lng_lat(props.lng_lat);
            }
        }

        self.on_click.replace(props.on_click.clone());
        self.on_drag.replace(props.on_drag.clone());
        self.on_drag_end.replace(props.on_drag_end.clone());
        self.props = props;
    }

    fn forward_drag(object: &dyn MarkerObject, kind: MarkerEventKind, slot: &HandlerSlot<MarkerHandler>) {
        let slot = slot.clone();
        object.on(
            kind,
            Arc::new(move |event: &MarkerEvent| {
                if let Some(handler) = slot.get() {
                    handler(event);
                }
            }),
        );
    }
}

impl DependentNode for Marker {
    fn kind(&self) -> NodeKind {
        NodeKind::Marker
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

        let object = map.create_marker(&self.props.options())?;
        object.set_lng_lat(self.props.lng_lat);
        object.add_to()?;

        // Markers have no click event of their own; listen on the element
        let element = object.element();
        let slot = self.on_click.clone();
        let click_listener = element.add_click_listener(Arc::new(move |event: &ClickEvent| {
            if let Some(handler) = slot.get() {
                handler(event);
            }
        }));
        Self::forward_drag(object.as_ref(), MarkerEventKind::Drag, &self.on_drag);
        Self::forward_drag(object.as_ref(), MarkerEventKind::DragEnd, &self.on_drag_end);

        tracing::debug!("Registered marker '{}' at {}", self.id, self.props.lng_lat);
        self.lifecycle.register(
            map.clone(),
            MarkerRegistration {
                object,
                element,
                click_listener,
            },
        );
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        let Some((map, registration)) = self.lifecycle.unmount() else {
            return Ok(());
        };
        registration
            .element
            .remove_click_listener(registration.click_listener);
        if live_map(map).is_some() {
            registration.object.remove();
            tracing::debug!("Removed marker '{}'", self.id);
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
