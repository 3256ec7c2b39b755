//! Plain element trees handed over to the map SDK
//!
//! Markers, popups and custom controls accept arbitrary nested content. That
//! content is materialized once, at registration time, into an [`Element`]
//! subtree whose ownership passes to the SDK object. Later content changes
//! are not reflected without a remount.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::ids::ListenerId;

/// Click delivered to an element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClickEvent {
    pub x: f64,
    pub y: f64,
}

pub type ClickHandler = Arc<dyn Fn(&ClickEvent) + Send + Sync>;

struct ElementData {
    tag: String,
    class_name: Option<String>,
    text: Option<String>,
    children: Vec<Element>,
    click_listeners: Vec<(ListenerId, ClickHandler)>,
}

/// A shared, mutable element node
#[derive(Clone)]
pub struct Element {
    inner: Arc<RwLock<ElementData>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ElementData {
                tag: tag.into(),
                class_name: None,
                text: None,
                children: Vec::new(),
                click_listeners: Vec::new(),
            })),
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn with_class(self, class_name: impl Into<String>) -> Self {
        self.set_class_name(Some(class_name.into()));
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.inner.write().text = Some(text.into());
        self
    }

    pub fn with_child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    pub fn tag(&self) -> String {
        self.inner.read().tag.clone()
    }

    pub fn class_name(&self) -> Option<String> {
        self.inner.read().class_name.clone()
    }

    pub fn set_class_name(&self, class_name: Option<String>) {
        self.inner.write().class_name = class_name;
    }

    pub fn append_child(&self, child: Element) {
        self.inner.write().children.push(child);
    }

    pub fn children(&self) -> Vec<Element> {
        self.inner.read().children.clone()
    }

    /// Concatenated text of this element and all descendants
    pub fn text_content(&self) -> String {
        let data = self.inner.read();
        let mut text = data.text.clone().unwrap_or_default();
        for child in &data.children {
            text.push_str(&child.text_content());
        }
        text
    }

    pub fn add_click_listener(&self, handler: ClickHandler) -> ListenerId {
        let id = ListenerId::next();
        self.inner.write().click_listeners.push((id, handler));
        id
    }

    pub fn remove_click_listener(&self, id: ListenerId) {
        self.inner.write().click_listeners.retain(|(listener, _)| *listener != id);
    }

    pub fn click_listener_count(&self) -> usize {
        self.inner.read().click_listeners.len()
    }

    /// Dispatch a click to every listener
    pub fn click(&self, event: &ClickEvent) {
        // Listeners may touch this element, so run them unlocked
        let listeners: Vec<ClickHandler> = self
            .inner
            .read()
            .click_listeners
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Whether both values refer to the same node
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.read();
        f.debug_struct("Element")
            .field("tag", &data.tag)
            .field("class_name", &data.class_name)
            .field("text", &data.text)
            .field("children", &data.children)
            .field("click_listeners", &data.click_listeners.len())
            .finish()
    }
}

/// Render function producing nested content
#[derive(Clone)]
pub struct Content(Arc<dyn Fn() -> Element + Send + Sync>);

impl Content {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn() -> Element + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    /// Content consisting of a single text block
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move || Element::div().with_text(text.clone()))
    }

    /// Build a fresh element tree wrapped in a container `div`
    pub fn materialize(&self) -> Element {
        Element::div().with_child((self.0)())
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Content(..)")
    }
}

/// Join the present, non-empty class fragments with spaces
pub fn class_names<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let joined = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_materialize_builds_fresh_tree() {
        let content = Content::new(|| {
            Element::new("span")
                .with_text("Shibuya ")
                .with_child(Element::new("b").with_text("crossing"))
        });

        let first = content.materialize();
        let second = content.materialize();
        assert_eq!(first.text_content(), "Shibuya crossing");
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn test_click_dispatch_and_removal() {
        let element = Element::div();
        let clicks = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&clicks);
        let id = element.add_click_listener(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        element.click(&ClickEvent::default());
        element.remove_click_listener(id);
        element.click(&ClickEvent::default());

        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(element.click_listener_count(), 0);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(
            class_names([Some("ctrl"), None, Some(" "), Some("dark")]),
            Some("ctrl dark".to_string())
        );
        assert_eq!(class_names([None, Some("")]), None);
    }
}
