//! Closed set of components a view tree can hold

use mv_core::{MapHost, Result};

use crate::control::{Control, ControlProps, CustomControl, CustomControlProps};
use crate::hooks::{MapEventHook, MapEventProps};
use crate::layer::{Layer, LayerProps};
use crate::marker::{Marker, MarkerProps};
use crate::node::{DependentNode, NodeState};
use crate::popup::{Popup, PopupProps};
use crate::source::{Source, SourceProps};

/// What to mount, or what to update a mounted node with
#[derive(Debug, Clone)]
pub enum Props {
    Host(MapHost),
    Source(SourceProps),
    Layer(LayerProps),
    Marker(MarkerProps),
    Popup(PopupProps),
    Control(ControlProps),
    CustomControl(CustomControlProps),
    MapEvent(MapEventProps),
    /// Plain container without map semantics
    Group,
}

impl Props {
    pub fn name(&self) -> &'static str {
        match self {
            Props::Host(_) => "MapHost",
            Props::Source(_) => "Source",
            Props::Layer(_) => "Layer",
            Props::Marker(_) => "Marker",
            Props::Popup(_) => "Popup",
            Props::Control(_) => "Control",
            Props::CustomControl(_) => "CustomControl",
            Props::MapEvent(_) => "MapEvent",
            Props::Group => "Group",
        }
    }
}

macro_rules! impl_props_from {
    ($($variant:ident => $t:ty),*) => {
        $(
            impl From<$t> for Props {
                fn from(props: $t) -> Self {
                    Props::$variant(props)
                }
            }
        )*
    }
}

impl_props_from!(
    Host => MapHost,
    Source => SourceProps,
    Layer => LayerProps,
    Marker => MarkerProps,
    Popup => PopupProps,
    Control => ControlProps,
    CustomControl => CustomControlProps,
    MapEvent => MapEventProps
);

/// A mounted component
pub(crate) enum Component {
    Host(MapHost),
    Source(Source),
    Layer(Layer),
    Marker(Marker),
    Popup(Popup),
    Control(Control),
    CustomControl(CustomControl),
    MapEvent(MapEventHook),
    Group,
}

impl Component {
    pub(crate) fn build(props: Props) -> Self {
        let mut component = match props {
            Props::Host(host) => Component::Host(host),
            Props::Source(props) => Component::Source(Source::new(props)),
            Props::Layer(props) => Component::Layer(Layer::new(props)),
            Props::Marker(props) => Component::Marker(Marker::new(props)),
            Props::Popup(props) => Component::Popup(Popup::new(props)),
            Props::Control(props) => Component::Control(Control::new(props)),
            Props::CustomControl(props) => Component::CustomControl(CustomControl::new(props)),
            Props::MapEvent(props) => Component::MapEvent(MapEventHook::new(props)),
            Props::Group => Component::Group,
        };
        if let Some(node) = component.dependent_mut() {
            node.mount();
        }
        component
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Component::Host(_) => "MapHost",
            Component::Source(_) => "Source",
            Component::Layer(_) => "Layer",
            Component::Marker(_) => "Marker",
            Component::Popup(_) => "Popup",
            Component::Control(_) => "Control",
            Component::CustomControl(_) => "CustomControl",
            Component::MapEvent(_) => "MapEvent",
            Component::Group => "Group",
        }
    }

    pub(crate) fn dependent(&self) -> Option<&dyn DependentNode> {
        match self {
            Component::Source(node) => Some(node),
            Component::Layer(node) => Some(node),
            Component::Marker(node) => Some(node),
            Component::Popup(node) => Some(node),
            Component::Control(node) => Some(node),
            Component::CustomControl(node) => Some(node),
            Component::MapEvent(node) => Some(node),
            Component::Host(_) | Component::Group => None,
        }
    }

    pub(crate) fn dependent_mut(&mut self) -> Option<&mut dyn DependentNode> {
        match self {
            Component::Source(node) => Some(node),
            Component::Layer(node) => Some(node),
            Component::Marker(node) => Some(node),
            Component::Popup(node) => Some(node),
            Component::Control(node) => Some(node),
            Component::CustomControl(node) => Some(node),
            Component::MapEvent(node) => Some(node),
            Component::Host(_) | Component::Group => None,
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        match self {
            Component::Host(host) if host.is_initialized() => NodeState::Registered,
            Component::Host(host) if host.is_mounted() => NodeState::Waiting,
            Component::Host(_) => NodeState::Unmounted,
            Component::Group => NodeState::Registered,
            other => other
                .dependent()
                .map(|node| node.state())
                .unwrap_or(NodeState::Unmounted),
        }
    }

    /// Apply props of the same kind
    pub(crate) fn update(&mut self, props: Props) -> Result<()> {
        match (self, props) {
            (Component::Host(host), Props::Host(replacement)) => {
                if !host.ptr_eq(&replacement) {
                    tracing::warn!("A map host cannot be swapped in place; remount it instead");
                }
                Ok(())
            }
            (Component::Source(node), Props::Source(props)) => {
                node.update(props);
                Ok(())
            }
            (Component::Layer(node), Props::Layer(props)) => {
                node.update(props);
                Ok(())
            }
            (Component::Marker(node), Props::Marker(props)) => {
                node.update(props);
                Ok(())
            }
            (Component::Popup(node), Props::Popup(props)) => node.update(props),
            (Component::Control(node), Props::Control(props)) => {
                node.update(props);
                Ok(())
            }
            (Component::CustomControl(node), Props::CustomControl(props)) => {
                node.update(props);
                Ok(())
            }
            (Component::MapEvent(node), Props::MapEvent(props)) => node.update(props),
            (Component::Group, Props::Group) => Ok(()),
            (existing, replacement) => Err(mv_core::MapError::ComponentMismatch {
                existing: existing.name(),
                replacement: replacement.name(),
            }),
        }
    }
}
