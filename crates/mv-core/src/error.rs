//! Error types shared by the map bindings

use thiserror::Error;

/// Errors caused by how components were declared.
///
/// These are raised at registration time and never retried; the caller has
/// to fix the declaration and remount.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{component} can only be used inside a map host")]
    OutsideMapHost { component: &'static str },

    #[error("popup `{id}` needs a coordinate or an enclosing marker")]
    MissingCoordinate { id: String },

    #[error("{kind} layer `{id}` needs a source or an enclosing source")]
    MissingSource { id: String, kind: &'static str },

    #[error("unknown readiness milestone `{0}`")]
    UnknownMilestone(String),

    #[error("invalid map configuration: {0}")]
    InvalidMapConfig(String),
}

/// Errors reported by the external map SDK.
///
/// The bindings pass these through without translation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdkError {
    #[error("map could not be created: {0}")]
    Construction(String),

    #[error("style is not done loading")]
    StyleNotLoaded,

    #[error("there is already a source with id `{0}`")]
    DuplicateSource(String),

    #[error("there is already a layer with id `{0}`")]
    DuplicateLayer(String),

    #[error("layer `{layer}` references missing source `{source_id}`")]
    MissingSource { layer: String, source_id: String },

    #[error("source `{source_id}` cannot be removed while layer `{layer}` is using it")]
    SourceInUse { source_id: String, layer: String },

    #[error("source `{0}` does not exist in the map's style")]
    UnknownSource(String),

    #[error("layer `{0}` does not exist in the map's style")]
    UnknownLayer(String),

    #[error("layer `{0}` given as insertion point does not exist")]
    UnknownBeforeLayer(String),

    #[error("control {0} is not attached to the map")]
    UnknownControl(u64),

    #[error("invalid style specification: {0}")]
    InvalidSpec(String),

    #[error("map has been removed")]
    MapRemoved,
}

/// Top-level error for every fallible binding operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("node {0} is not mounted")]
    NodeNotMounted(u64),

    #[error("cannot update a {existing} node with {replacement} props")]
    ComponentMismatch {
        existing: &'static str,
        replacement: &'static str,
    },
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;

impl MapError {
    /// Whether this error stems from a component declaration
    pub fn is_config(&self) -> bool {
        matches!(self, MapError::Config(_))
    }
}
