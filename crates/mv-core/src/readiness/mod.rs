use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::handle::MapRef;

mod broadcaster;
mod subscriber;

pub use broadcaster::ReadinessBroadcaster;
pub use subscriber::ReadinessSubscriber;

/// Asynchronous readiness transitions of a map instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Milestone {
    /// Style assets parsed; sources and layers may be added
    #[serde(rename = "style.load")]
    StyleLoaded,
    /// Initial render complete
    #[serde(rename = "load")]
    Loaded,
}

impl Milestone {
    pub const ALL: [Milestone; 2] = [Milestone::StyleLoaded, Milestone::Loaded];

    /// Event name the SDK uses for this milestone
    pub fn as_str(&self) -> &'static str {
        match self {
            Milestone::StyleLoaded => "style.load",
            Milestone::Loaded => "load",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Milestone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style.load" => Ok(Milestone::StyleLoaded),
            "load" => Ok(Milestone::Loaded),
            other => Err(ConfigError::UnknownMilestone(other.to_string())),
        }
    }
}

/// Milestones reached by the current map handle.
///
/// A milestone never goes back to false for one handle; a new handle starts
/// from the default state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessState {
    pub style_loaded: bool,
    pub loaded: bool,
}

impl ReadinessState {
    pub fn is_reached(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::StyleLoaded => self.style_loaded,
            Milestone::Loaded => self.loaded,
        }
    }

    /// Mark `milestone` reached; returns whether this was a transition
    pub(crate) fn advance(&mut self, milestone: Milestone) -> bool {
        let flag = match milestone {
            Milestone::StyleLoaded => &mut self.style_loaded,
            Milestone::Loaded => &mut self.loaded,
        };
        let transitioned = !*flag;
        *flag = true;
        transitioned
    }
}

/// Context value read by descendants of a map host
#[derive(Debug, Clone, Default)]
pub struct MapSnapshot {
    /// Current map, if one has been created
    pub handle: Option<MapRef>,

    /// Incremented every time a new handle is created
    pub generation: u64,

    pub readiness: ReadinessState,
}

impl MapSnapshot {
    pub fn style_loaded(&self) -> bool {
        self.readiness.style_loaded
    }

    pub fn loaded(&self) -> bool {
        self.readiness.loaded
    }

    /// A milestone only counts while a map exists
    pub fn is_reached(&self, milestone: Milestone) -> bool {
        self.handle.is_some() && self.readiness.is_reached(milestone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        let mut state = ReadinessState::default();
        assert!(state.advance(Milestone::StyleLoaded));
        assert!(!state.advance(Milestone::StyleLoaded));
        assert!(state.is_reached(Milestone::StyleLoaded));
        assert!(!state.is_reached(Milestone::Loaded));
    }

    #[test]
    fn test_milestone_names() {
        assert_eq!("style.load".parse::<Milestone>().unwrap(), Milestone::StyleLoaded);
        assert_eq!(Milestone::Loaded.to_string(), "load");
        assert!(matches!(
            "idle".parse::<Milestone>(),
            Err(ConfigError::UnknownMilestone(_))
        ));
    }

    #[test]
    fn test_snapshot_without_handle_reaches_nothing() {
        let snapshot = MapSnapshot {
            handle: None,
            generation: 3,
            readiness: ReadinessState {
                style_loaded: true,
                loaded: true,
            },
        };
        assert!(!snapshot.is_reached(Milestone::Loaded));
    }
}
