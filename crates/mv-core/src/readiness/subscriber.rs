//! Readiness subscriber trait

use super::{MapSnapshot, Milestone};

/// Trait for components that react to map readiness changes
pub trait ReadinessSubscriber: Send + Sync {
    /// Called once when `milestone` becomes true for the current handle
    fn on_milestone(&self, snapshot: &MapSnapshot, milestone: Milestone);

    /// Called when a handle is created or released
    fn on_handle_change(&self, _snapshot: &MapSnapshot) {}
}
