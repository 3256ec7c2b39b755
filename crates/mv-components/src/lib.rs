//! Declarative map components
//!
//! Sources, layers, markers, popups and controls that mirror themselves into
//! a map owned by an enclosing [`mv_core::MapHost`]. Each component waits for
//! the readiness milestone it needs, registers exactly once per map, and
//! removes what it added when its subtree goes away.
//!
//! The [`tree::ViewTree`] hosts the components and runs their effects.

pub mod control;
pub mod hooks;
pub mod layer;
pub mod marker;
pub mod node;
pub mod popup;
pub mod source;
pub mod tree;

// Re-export commonly used types
pub use control::{Control, ControlProps, CustomControl, CustomControlProps, CUSTOM_CONTROL_CLASS};
pub use hooks::{MapEventHook, MapEventProps};
pub use layer::{Layer, LayerProps};
pub use marker::{Marker, MarkerProps};
pub use node::{DependentNode, HandlerSlot, NodeContext, NodeKind, NodeState};
pub use popup::{Popup, PopupProps};
pub use source::{remove_layers_by_source, Source, SourceProps};
pub use tree::{NodeId, Props, Scope, ViewTree};
