//! Markers and popups handed out by a [`MemoryMap`](crate::MemoryMap)
//!
//! Both types are cheap handles over shared state: the map keeps a clone of
//! every object it creates so tests can inspect and drive them after the
//! bindings took ownership of theirs.

use mv_core::{
    class_names, Element, ListenerId, LngLat, MarkerEvent, MarkerEventKind, MarkerHandler, MarkerObject,
    MarkerOptions, PopupObject, PopupOptions, SdkError,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::journal::{Call, Journal};

struct MarkerState {
    id: u64,
    options: MarkerOptions,
    element: Element,
    lng_lat: Mutex<LngLat>,
    attached: AtomicBool,
    handlers: Mutex<Vec<(ListenerId, MarkerEventKind, MarkerHandler)>>,
    map_removed: Arc<AtomicBool>,
    journal: Journal,
}

/// In-memory marker
#[derive(Clone)]
pub struct MemoryMarker {
    state: Arc<MarkerState>,
}

impl MemoryMarker {
    pub(crate) fn new(
        id: u64,
        options: &MarkerOptions,
        map_removed: Arc<AtomicBool>,
        journal: Journal,
    ) -> Self {
        let element = options
            .element
            .clone()
            .unwrap_or_else(|| Element::div().with_class("mv-marker"));
        if options.class_name.is_some() {
            let current = element.class_name();
            element.set_class_name(class_names([
                current.as_deref(),
                options.class_name.as_deref(),
            ]));
        }

        Self {
            state: Arc::new(MarkerState {
                id,
                options: options.clone(),
                element,
                lng_lat: Mutex::new(LngLat::new(0.0, 0.0)),
                attached: AtomicBool::new(false),
                handlers: Mutex::new(Vec::new()),
                map_removed,
                journal,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn options(&self) -> &MarkerOptions {
        &self.state.options
    }

    pub fn is_attached(&self) -> bool {
        self.state.attached.load(Ordering::SeqCst) && !self.state.map_removed.load(Ordering::SeqCst)
    }

    pub fn handler_count(&self) -> usize {
        self.state.handlers.lock().len()
    }

    /// Simulate a user dragging the marker to `target`
    pub fn drag_to(&self, target: LngLat) {
        self.emit(MarkerEventKind::DragStart);
        *self.state.lng_lat.lock() = target;
        self.emit(MarkerEventKind::Drag);
        self.emit(MarkerEventKind::DragEnd);
    }

    fn emit(&self, kind: MarkerEventKind) {
        let event = MarkerEvent {
            kind,
            lng_lat: *self.state.lng_lat.lock(),
        };
        let handlers: Vec<MarkerHandler> = self
            .state
            .handlers
            .lock()
            .iter()
            .filter(|(_, registered, _)| *registered == kind)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }
}

impl MarkerObject for MemoryMarker {
    fn set_lng_lat(&self, lng_lat: LngLat) {
        *self.state.lng_lat.lock() = lng_lat;
        if self.is_attached() {
            self.state.journal.record(Call::MoveMarker(self.state.id));
        }
    }

    fn lng_lat(&self) -> LngLat {
        *self.state.lng_lat.lock()
    }

    fn element(&self) -> Element {
        self.state.element.clone()
    }

    fn on(&self, kind: MarkerEventKind, handler: MarkerHandler) -> ListenerId {
        let id = ListenerId::next();
        self.state.handlers.lock().push((id, kind, handler));
        id
    }

    fn add_to(&self) -> Result<(), SdkError> {
        if self.state.map_removed.load(Ordering::SeqCst) {
            return Err(SdkError::MapRemoved);
        }
        if !self.state.attached.swap(true, Ordering::SeqCst) {
            self.state.journal.record(Call::AddMarker(self.state.id));
        }
        Ok(())
    }

    fn remove(&self) {
        if self.state.attached.swap(false, Ordering::SeqCst) {
            self.state.journal.record(Call::RemoveMarker(self.state.id));
        }
    }
}

struct PopupState {
    id: u64,
    options: PopupOptions,
    lng_lat: Mutex<Option<LngLat>>,
    content: Mutex<Option<Element>>,
    open: AtomicBool,
    map_removed: Arc<AtomicBool>,
    journal: Journal,
}

/// In-memory popup
#[derive(Clone)]
pub struct MemoryPopup {
    state: Arc<PopupState>,
}

impl MemoryPopup {
    pub(crate) fn new(
        id: u64,
        options: &PopupOptions,
        map_removed: Arc<AtomicBool>,
        journal: Journal,
    ) -> Self {
        Self {
            state: Arc::new(PopupState {
                id,
                options: options.clone(),
                lng_lat: Mutex::new(None),
                content: Mutex::new(None),
                open: AtomicBool::new(false),
                map_removed,
                journal,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn options(&self) -> &PopupOptions {
        &self.state.options
    }

    pub fn content(&self) -> Option<Element> {
        self.state.content.lock().clone()
    }
}

impl PopupObject for MemoryPopup {
    fn set_lng_lat(&self, lng_lat: LngLat) {
        *self.state.lng_lat.lock() = Some(lng_lat);
        if self.is_open() {
            self.state.journal.record(Call::MovePopup(self.state.id));
        }
    }

    fn lng_lat(&self) -> Option<LngLat> {
        *self.state.lng_lat.lock()
    }

    fn set_dom_content(&self, content: Element) {
        *self.state.content.lock() = Some(content);
    }

    fn add_to(&self) -> Result<(), SdkError> {
        if self.state.map_removed.load(Ordering::SeqCst) {
            return Err(SdkError::MapRemoved);
        }
        if self.state.lng_lat.lock().is_none() {
            return Err(SdkError::InvalidSpec(format!(
                "popup {} has no coordinate",
                self.state.id
            )));
        }
        if !self.state.open.swap(true, Ordering::SeqCst) {
            self.state.journal.record(Call::AddPopup(self.state.id));
        }
        Ok(())
    }

    fn remove(&self) {
        if self.state.open.swap(false, Ordering::SeqCst) {
            self.state.journal.record(Call::RemovePopup(self.state.id));
        }
    }

    fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst) && !self.state.map_removed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(options: &MarkerOptions) -> (MemoryMarker, Journal) {
        let journal = Journal::default();
        let marker = MemoryMarker::new(1, options, Arc::new(AtomicBool::new(false)), journal.clone());
        (marker, journal)
    }

    #[test]
    fn test_marker_drag_reports_new_position() {
        let (marker, _) = marker(&MarkerOptions {
            draggable: true,
            ..Default::default()
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        marker.on(
            MarkerEventKind::DragEnd,
            Arc::new(move |event: &MarkerEvent| sink.lock().push(event.lng_lat)),
        );

        marker.drag_to(LngLat::new(5.0, 6.0));
        assert_eq!(*seen.lock(), vec![LngLat::new(5.0, 6.0)]);
    }

    #[test]
    fn test_marker_class_is_appended() {
        let (marker, _) = marker(&MarkerOptions {
            class_name: Some("pin".to_string()),
            element: Some(Element::div().with_class("custom")),
            ..Default::default()
        });
        assert_eq!(marker.element().class_name().as_deref(), Some("custom pin"));
    }

    #[test]
    fn test_marker_add_and_remove_are_journaled_once() {
        let (marker, journal) = marker(&MarkerOptions::default());
        marker.add_to().unwrap();
        marker.add_to().unwrap();
        marker.remove();
        marker.remove();
        assert_eq!(journal.calls(), vec![Call::AddMarker(1), Call::RemoveMarker(1)]);
    }

    #[test]
    fn test_popup_needs_coordinate() {
        let journal = Journal::default();
        let popup = MemoryPopup::new(
            7,
            &PopupOptions::default(),
            Arc::new(AtomicBool::new(false)),
            journal.clone(),
        );
        assert!(matches!(popup.add_to(), Err(SdkError::InvalidSpec(_))));

        popup.set_lng_lat(LngLat::new(1.0, 1.0));
        popup.add_to().unwrap();
        assert!(popup.is_open());
        assert_eq!(journal.calls(), vec![Call::AddPopup(7)]);
    }

    #[test]
    fn test_objects_fail_after_map_removal() {
        let removed = Arc::new(AtomicBool::new(true));
        let marker = MemoryMarker::new(2, &MarkerOptions::default(), removed, Journal::default());
        assert_eq!(marker.add_to(), Err(SdkError::MapRemoved));
    }
}
