//! Retained view tree driving the map-bound components
//!
//! Stands in for the host UI framework. Components are mounted under a
//! parent, their effects run on [`ViewTree::flush`] with parents before
//! children, and [`ViewTree::unmount`] tears a subtree down children first.
//! Every flush re-checks waiting nodes, so a node registers on the first
//! flush after its prerequisites hold.

mod component;
mod scope;

pub use component::Props;
pub use scope::Scope;

use ahash::AHashMap;
use mv_core::{
    ConfigError, MapContext, MapError, MapEvent, MapHost, MapRef, MapSnapshot, MarkerContext,
    Milestone, ReadinessSubscriber, Result, SourceContext,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::control::CustomControl;
use crate::hooks::MapEventProps;
use crate::marker::Marker;
use crate::node::{NodeContext, NodeState};
use crate::popup::Popup;
use component::Component;

/// Identifier of a mounted node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

struct Entry {
    component: Component,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Registration failed; not retried until remounted
    failed: bool,
}

/// Set whenever a host's readiness changes
#[derive(Default)]
struct DirtyFlag(AtomicBool);

impl ReadinessSubscriber for DirtyFlag {
    fn on_milestone(&self, _snapshot: &MapSnapshot, _milestone: Milestone) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn on_handle_change(&self, _snapshot: &MapSnapshot) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Context flowing from ancestors to descendants during an effect pass
#[derive(Clone, Default)]
struct Inherited {
    host: Option<MapContext>,
    source: Option<SourceContext>,
    marker: Option<MarkerContext>,
}

impl Inherited {
    fn below(&self, component: &Component) -> Self {
        let mut next = self.clone();
        match component {
            Component::Host(host) => next.host = Some(host.context()),
            Component::Source(source) => next.source = Some(source.context()),
            Component::Marker(marker) => next.marker = Some(marker.context()),
            _ => {}
        }
        next
    }
}

/// The view tree
pub struct ViewTree {
    nodes: AHashMap<NodeId, Entry>,
    roots: Vec<NodeId>,
    next_id: u64,
    dirty: Arc<DirtyFlag>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self {
            nodes: AHashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            dirty: Arc::new(DirtyFlag::default()),
        }
    }

    /// Insert a component; its effects run on the next flush
    pub fn mount(&mut self, parent: Option<NodeId>, props: impl Into<Props>) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return Err(MapError::NodeNotMounted(parent.get()));
            }
        }

        let component = Component::build(props.into());
        if let Component::Host(host) = &component {
            host.context().subscribe(self.dirty.clone());
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        tracing::debug!("Mounted {} as {}", component.name(), id);
        self.nodes.insert(
            id,
            Entry {
                component,
                parent,
                children: Vec::new(),
                failed: false,
            },
        );
        match parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        self.dirty.0.store(true, Ordering::SeqCst);
        Ok(id)
    }

    /// Listen to a named map event for as long as `at` stays mounted
    pub fn use_map_event(
        &mut self,
        at: NodeId,
        event_type: impl Into<String>,
        handler: impl Fn(&MapEvent) + Send + Sync + 'static,
    ) -> Result<NodeId> {
        self.scope(at)?.host.ok_or(ConfigError::OutsideMapHost {
            component: "use_map_event",
        })?;
        self.mount(Some(at), MapEventProps::new(event_type, handler))
    }

    /// Hand new props to a mounted component of the same kind
    pub fn update(&mut self, id: NodeId, props: impl Into<Props>) -> Result<()> {
        let entry = self
            .nodes
            .get_mut(&id)
            .ok_or(MapError::NodeNotMounted(id.get()))?;
        entry.component.update(props.into())?;
        if entry.failed {
            tracing::warn!(
                "{} {} failed to register earlier; new props apply after a remount",
                entry.component.name(),
                id
            );
        }
        self.dirty.0.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Remove a subtree, children before parents.
    ///
    /// Every node is torn down even if an earlier one fails; the first error
    /// is returned.
    pub fn unmount(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(MapError::NodeNotMounted(id.get()))?
            .parent;

        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);

        let mut first_error = None;
        for node_id in order {
            let Some(mut entry) = self.nodes.remove(&node_id) else {
                continue;
            };
            if let Err(err) = teardown(&mut entry.component) {
                tracing::warn!("Tearing down {} {} failed: {}", entry.component.name(), node_id, err);
                first_error.get_or_insert(err);
            } else {
                tracing::debug!("Unmounted {} {}", entry.component.name(), node_id);
            }
        }

        match parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run effects until no node makes progress.
    ///
    /// A failing node does not stop its siblings; every other node still
    /// gets its effects and the first error is returned.
    pub fn flush(&mut self) -> Result<()> {
        self.dirty.0.store(false, Ordering::SeqCst);
        let mut first_error = None;
        let mut passes = 0;
        while self.effect_pass(&mut first_error) {
            passes += 1;
        }
        if passes > 0 {
            tracing::trace!("Flush settled after {} productive passes", passes);
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Whether something changed since the last flush
    pub fn is_dirty(&self) -> bool {
        self.dirty.0.load(Ordering::SeqCst)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.nodes.get(&id).map(|entry| entry.component.state())
    }

    pub fn has_failed(&self, id: NodeId) -> bool {
        self.nodes.get(&id).map(|entry| entry.failed).unwrap_or(false)
    }

    /// Hooks and inherited context for code running at `id`
    pub fn scope(&self, id: NodeId) -> Result<Scope> {
        if !self.nodes.contains_key(&id) {
            return Err(MapError::NodeNotMounted(id.get()));
        }

        let mut scope = Scope {
            node: id,
            host: None,
            source: None,
            marker: None,
        };
        let mut cursor = Some(id);
        while let Some(entry) = cursor.and_then(|current| self.nodes.get(&current)) {
            match &entry.component {
                Component::Host(host) if scope.host.is_none() => scope.host = Some(host.context()),
                Component::Source(source) if scope.source.is_none() => {
                    scope.source = Some(source.context())
                }
                Component::Marker(marker) if scope.marker.is_none() => {
                    scope.marker = Some(marker.context())
                }
                _ => {}
            }
            cursor = entry.parent;
        }
        Ok(scope)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|entry| entry.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn host(&self, id: NodeId) -> Option<&MapHost> {
        match self.nodes.get(&id).map(|entry| &entry.component) {
            Some(Component::Host(host)) => Some(host),
            _ => None,
        }
    }

    pub fn marker(&self, id: NodeId) -> Option<&Marker> {
        match self.nodes.get(&id).map(|entry| &entry.component) {
            Some(Component::Marker(marker)) => Some(marker),
            _ => None,
        }
    }

    pub fn popup(&self, id: NodeId) -> Option<&Popup> {
        match self.nodes.get(&id).map(|entry| &entry.component) {
            Some(Component::Popup(popup)) => Some(popup),
            _ => None,
        }
    }

    pub fn custom_control(&self, id: NodeId) -> Option<&CustomControl> {
        match self.nodes.get(&id).map(|entry| &entry.component) {
            Some(Component::CustomControl(control)) => Some(control),
            _ => None,
        }
    }

    fn collect_post_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        if let Some(entry) = self.nodes.get(&id) {
            for child in &entry.children {
                self.collect_post_order(*child, order);
            }
            order.push(id);
        }
    }

    /// One pre-order pass over the tree; returns whether anything progressed
    fn effect_pass(&mut self, first_error: &mut Option<MapError>) -> bool {
        let mut progressed = false;
        let mut stack: Vec<(NodeId, Inherited)> = self
            .roots
            .iter()
            .rev()
            .map(|id| (*id, Inherited::default()))
            .collect();

        while let Some((id, inherited)) = stack.pop() {
            let Some(entry) = self.nodes.get_mut(&id) else {
                continue;
            };

            if !entry.failed {
                match run_effect(&mut entry.component, &inherited) {
                    Ok(changed) => progressed |= changed,
                    Err(err) => {
                        entry.failed = true;
                        tracing::warn!("{} {} failed to register: {}", entry.component.name(), id, err);
                        first_error.get_or_insert(err);
                    }
                }
            }

            let below = inherited.below(&entry.component);
            for child in entry.children.iter().rev() {
                stack.push((*child, below.clone()));
            }
        }
        progressed
    }
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

fn run_effect(component: &mut Component, inherited: &Inherited) -> Result<bool> {
    if let Component::Host(host) = component {
        if host.is_mounted() {
            return Ok(false);
        }
        host.mount()?;
        return Ok(true);
    }
    let Some(node) = component.dependent_mut() else {
        return Ok(false);
    };
    let Some(host) = &inherited.host else {
        return Err(ConfigError::OutsideMapHost {
            component: node.kind().as_str(),
        }
        .into());
    };

    let snapshot = host.snapshot();
    let mut progressed = false;
    if let Some(generation) = node.registered_generation() {
        if snapshot.handle.as_ref().map(MapRef::generation) != Some(generation) {
            tracing::debug!(
                "{} '{}' registered against replaced map generation {}",
                node.kind(),
                node.id(),
                generation
            );
            node.invalidate();
            progressed = true;
        }
    }

    if node.state() == NodeState::Waiting {
        let ctx = NodeContext::new(&snapshot)
            .with_source(inherited.source.as_ref())
            .with_marker(inherited.marker.as_ref());
        progressed |= node.try_register(&ctx)?;
    }
    Ok(progressed)
}

fn teardown(component: &mut Component) -> Result<()> {
    match component {
        Component::Host(host) => {
            host.unmount();
            Ok(())
        }
        other => match other.dependent_mut() {
            Some(node) => node.deregister(),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerProps;
    use crate::source::SourceProps;
    use mv_core::{LayerKind, MapConfig, Surface};
    use mv_store::MemorySdk;
    use serde_json::json;

    fn lazy_host(sdk: &Arc<MemorySdk>) -> MapHost {
        MapHost::new(sdk.clone(), MapConfig::new("key").lazy(), Surface::new("map"))
    }

    #[test]
    fn test_dependent_outside_host_is_config_error() {
        let mut tree = ViewTree::new();
        let source = tree
            .mount(None, SourceProps::geojson(json!(null)).with_id("s1"))
            .unwrap();

        let err = tree.flush().unwrap_err();
        assert_eq!(
            err,
            MapError::Config(ConfigError::OutsideMapHost {
                component: "Source"
            })
        );
        assert!(tree.has_failed(source));

        // Failed nodes are not retried
        tree.flush().unwrap();
    }

    #[test]
    fn test_update_requires_same_component() {
        let sdk = MemorySdk::new();
        let mut tree = ViewTree::new();
        let host = tree.mount(None, lazy_host(&sdk)).unwrap();
        let layer = tree
            .mount(Some(host), LayerProps::new(LayerKind::Background))
            .unwrap();

        let err = tree
            .update(layer, SourceProps::geojson(json!(null)))
            .unwrap_err();
        assert_eq!(
            err,
            MapError::ComponentMismatch {
                existing: "Layer",
                replacement: "Source"
            }
        );
    }

    #[test]
    fn test_unknown_nodes_are_rejected() {
        let mut tree = ViewTree::new();
        let missing = NodeId(42);
        assert_eq!(
            tree.mount(Some(missing), Props::Group).unwrap_err(),
            MapError::NodeNotMounted(42)
        );
        assert_eq!(tree.unmount(missing).unwrap_err(), MapError::NodeNotMounted(42));
        assert!(tree.state(missing).is_none());
    }

    #[test]
    fn test_scope_resolves_nearest_contexts() {
        let sdk = MemorySdk::new();
        let mut tree = ViewTree::new();
        let host = tree.mount(None, lazy_host(&sdk)).unwrap();
        let group = tree.mount(Some(host), Props::Group).unwrap();
        let source = tree
            .mount(Some(group), SourceProps::geojson(json!(null)).with_id("outer"))
            .unwrap();
        let layer = tree
            .mount(Some(source), LayerProps::new(LayerKind::Fill))
            .unwrap();

        let scope = tree.scope(layer).unwrap();
        assert!(scope.use_map().is_ok());
        assert_eq!(scope.source().map(|source| source.id.as_str()), Some("outer"));
        assert!(scope.marker().is_none());

        let orphan = tree.mount(None, Props::Group).unwrap();
        let err = tree.scope(orphan).unwrap().use_map().unwrap_err();
        assert!(err.is_config());
        assert!(tree.use_map_event(orphan, "click", |_| {}).is_err());
    }

    #[test]
    fn test_readiness_marks_tree_dirty() {
        let sdk = MemorySdk::new();
        let mut tree = ViewTree::new();
        let host = tree.mount(None, lazy_host(&sdk)).unwrap();
        tree.flush().unwrap();
        assert!(!tree.is_dirty());

        tree.host(host).unwrap().trigger_init().unwrap();
        assert!(tree.is_dirty());
        tree.flush().unwrap();

        sdk.last_map().unwrap().emit_style_load();
        assert!(tree.is_dirty());
    }
}
