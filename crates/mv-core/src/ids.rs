//! Identifier generation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Generate an identifier for a node declared without one, e.g. `source-3f2a...`
pub fn generate_id(kind: &str) -> String {
    format!("{}-{}", kind, Uuid::new_v4().simple())
}

macro_rules! counter_id {
    ($($(#[$meta:meta])* $name:ident),*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u64);

            impl $name {
                /// Allocate the next identifier
                pub fn next() -> Self {
                    static NEXT: AtomicU64 = AtomicU64::new(1);
                    Self(NEXT.fetch_add(1, Ordering::Relaxed))
                }

                pub fn get(&self) -> u64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "#{}", self.0)
                }
            }
        )*
    }
}

counter_id!(
    /// Handle to an event listener attached to a map, marker or element
    ListenerId,
    /// Handle to a control attached to a map
    ControlId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id("source");
        let b = generate_id("source");
        assert!(a.starts_with("source-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_counter_ids_increase() {
        let first = ListenerId::next();
        let second = ListenerId::next();
        assert!(second > first);
    }
}
