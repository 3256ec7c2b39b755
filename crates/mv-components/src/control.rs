//! Built-in and custom map controls

use mv_core::{
    class_names, generate_id, ClickEvent, ClickHandler, Content, ControlId, ControlKind,
    ControlPosition, Element, ListenerId, Result,
};
use std::fmt;
use std::sync::Arc;

use crate::node::{
    live_map, DependentNode, HandlerSlot, Lifecycle, NodeContext, NodeKind, NodeState,
};

/// Class every custom control container carries
pub const CUSTOM_CONTROL_CLASS: &str = "mv-ctrl-clickable";

/// Props of a built-in [`Control`]
#[derive(Debug, Clone)]
pub struct ControlProps {
    pub kind: ControlKind,
    pub position: ControlPosition,
}

impl ControlProps {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            position: ControlPosition::default(),
        }
    }

    /// Zoom buttons and compass, pitch not visualized
    pub fn navigation() -> Self {
        Self::new(ControlKind::Navigation {
            show_compass: true,
            show_zoom: true,
            visualize_pitch: false,
        })
    }

    pub fn at(mut self, position: ControlPosition) -> Self {
        self.position = position;
        self
    }
}

pub struct Control {
    id: String,
    props: ControlProps,
    lifecycle: Lifecycle<ControlId>,
}

impl Control {
    pub fn new(props: ControlProps) -> Self {
        Self {
            id: generate_id(props.kind.name()),
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &ControlProps {
        &self.props
    }

    pub fn update(&mut self, props: ControlProps) {
        if props.kind.name() != self.props.kind.name() || props.position != self.props.position {
            tracing::warn!(
                "Control '{}' props changed; remount it for the map to pick them up",
                self.id
            );
        }
        self.props = props;
    }
}

impl DependentNode for Control {
    fn kind(&self) -> NodeKind {
        NodeKind::Control
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

        let control = map.add_control(&self.props.kind, self.props.position)?;
        tracing::debug!(
            "Registered {} control at {}",
            self.props.kind.name(),
            self.props.position.as_str()
        );
        self.lifecycle.register(map.clone(), control);
        Ok(true)
    }

    fn deregister(&mut self) -> Result<()> {
        if let Some((map, control)) = self.lifecycle.unmount() {
            if let Some(map) = live_map(map) {
                map.remove_control(control)?;
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

/// Props of a [`CustomControl`]
#[derive(Clone, Default)]
pub struct CustomControlProps {
    pub content: Option<Content>,
    pub class_name: Option<String>,
    pub position: ControlPosition,
    pub on_click: Option<ClickHandler>,
}

impl CustomControlProps {
    pub fn new(content: Content) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn at(mut self, position: ControlPosition) -> Self {
        self.position = position;
        self
    }

    pub fn on_click(mut self, handler: impl Fn(&ClickEvent) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for CustomControlProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomControlProps")
            .field("class_name", &self.class_name)
            .field("position", &self.position)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

struct CustomRegistration {
    control: ControlId,
    container: Element,
    click_listener: ListenerId,
}

/// Control whose container is built from arbitrary content
pub struct CustomControl {
    id: String,
    props: CustomControlProps,
    on_click: HandlerSlot<ClickHandler>,
    lifecycle: Lifecycle<CustomRegistration>,
}

impl CustomControl {
    pub fn new(props: CustomControlProps) -> Self {
        Self {
            id: generate_id("custom-control"),
            on_click: HandlerSlot::new(props.on_click.clone()),
            props,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    pub fn props(&self) -> &CustomControlProps {
        &self.props
    }

    /// Container handed to the map, once registered
    pub fn container(&self) -> Option<Element> {
        self.lifecycle
            .registration()
            .map(|registration| registration.container.clone())
    }

    pub fn update(&mut self, props: CustomControlProps) {
        if props.class_name != self.props.class_name || props.position != self.props.position {
            tracing::warn!(
                "Custom control '{}' props changed; remount it for the map to pick them up",
                self.id
            );
        }
        self.on_click.replace(props.on_click.clone());
        self.props = props;
    }
}

impl DependentNode for CustomControl {
    fn kind(&self) -> NodeKind {
        NodeKind::Control
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

        let container = self
            .props
            .content
            .as_ref()
            .map(Content::materialize)
            .unwrap_or_else(Element::div);
        container.set_class_name(class_names([
            Some(CUSTOM_CONTROL_CLASS),
            self.props.class_name.as_deref(),
        ]));
        let slot = self.on_click.clone();
        let click_listener = container.add_click_listener(Arc::new(move |event: &ClickEvent| {
            if let Some(handler) = slot.get() {
                handler(event);
            }
        }));

        let control = match map.add_control(&ControlKind::Custom(container.clone()), self.props.position) {
            Ok(control) => control,
            Err(err) => {
                container.remove_click_listener(click_listener);
                return Err(err.into());
            }
        };
        tracing::debug!(
            "Registered custom control '{}' at {}",
            self.id,
            self.props.position.as_str()
        );
        self.lifecycle.register(
            map.clone(),
            CustomRegistration {
                control,
                container,
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
            .container
            .remove_click_listener(registration.click_listener);
        if let Some(map) = live_map(map) {
            map.remove_control(registration.control)?;
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
