//! Record of the calls a map received

use mv_core::ControlPosition;
use parking_lot::Mutex;
use std::sync::Arc;

/// One mutating call against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddSource(String),
    RemoveSource(String),
    AddLayer { id: String, before: Option<String> },
    RemoveLayer(String),
    AddControl { name: &'static str, position: ControlPosition },
    RemoveControl(&'static str),
    AddMarker(u64),
    MoveMarker(u64),
    RemoveMarker(u64),
    AddPopup(u64),
    MovePopup(u64),
    RemovePopup(u64),
    On(String),
    Off(String),
    RemoveMap,
}

/// Shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub(crate) fn record(&self, call: Call) {
        tracing::trace!("store call: {:?}", call);
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Position of the first call equal to `call`
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.lock().iter().position(|recorded| recorded == call)
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}
