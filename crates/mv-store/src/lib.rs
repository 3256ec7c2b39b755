//! In-memory drawable object store
//!
//! Implements the map SDK traits without rendering anything: style layers,
//! sources, controls, markers and popups are kept in memory, the SDK's
//! ordering rules are enforced, and every mutating call is journaled.
//! Milestones are driven explicitly, which makes the store suitable for
//! tests and for the headless demo.

pub mod journal;
pub mod map;
pub mod objects;
pub mod sdk;

// Re-exports
pub use journal::{Call, Journal};
pub use map::{AttachedControl, MemoryMap};
pub use objects::{MemoryMarker, MemoryPopup};
pub use sdk::MemorySdk;
