//! Scripted in-memory document used by tests.
//!
//! A [`FakePage`] is a list of screens; each screen is a flat list of
//! [`FakeNode`]s tagged with the selectors that should match them. Clicks
//! can switch screens, which is how wizard steps and result pages are
//! simulated.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{BrowserError, ElementRef, Page, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Screen(usize),
    NextScreen,
    /// Changes the current URL, as a redirect after a form post would.
    Navigate(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    SessionLost,
    Other,
}

impl Failure {
    fn to_error(self) -> BrowserError {
        match self {
            Failure::Timeout => BrowserError::Timeout("scripted".into()),
            Failure::SessionLost => BrowserError::SessionLost("scripted".into()),
            Failure::Other => BrowserError::WebDriver {
                error: "unknown error".into(),
                message: "scripted failure".into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub id: String,
    pub selectors: Vec<Selector>,
    pub parent: Option<String>,
    pub text: String,
    pub label: String,
    pub attrs: HashMap<String, String>,
    pub value: String,
    pub enabled: bool,
    pub on_click: Effect,
    pub click_failure: Option<Failure>,
    /// Keystroke input is swallowed; only direct assignment sticks.
    pub rejects_typing: bool,
    /// Hidden until the page has been scrolled this many times.
    pub revealed_after: usize,
}

impl FakeNode {
    pub fn new(id: &str, selector: Selector) -> Self {
        Self {
            id: id.to_string(),
            selectors: vec![selector],
            parent: None,
            text: String::new(),
            label: String::new(),
            attrs: HashMap::new(),
            value: String::new(),
            enabled: true,
            on_click: Effect::None,
            click_failure: None,
            rejects_typing: false,
            revealed_after: 0,
        }
    }

    pub fn within(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn fails_click(mut self, failure: Failure) -> Self {
        self.click_failure = Some(failure);
        self
    }

    pub fn rejects_typing(mut self) -> Self {
        self.rejects_typing = true;
        self
    }

    pub fn revealed_after(mut self, scrolls: usize) -> Self {
        self.revealed_after = scrolls;
        self
    }
}

#[derive(Default)]
pub struct FakePage {
    screens: Vec<Vec<FakeNode>>,
    current: Cell<usize>,
    scrolls: Cell<usize>,
    url: RefCell<String>,
    values: RefCell<HashMap<String, String>>,
    clicks: RefCell<Vec<String>>,
    visited: RefCell<Vec<String>>,
    fills: RefCell<Vec<(String, String)>>,
}

impl FakePage {
    pub fn new(screens: Vec<Vec<FakeNode>>) -> Self {
        Self {
            screens,
            ..Default::default()
        }
    }

    pub fn single(nodes: Vec<FakeNode>) -> Self {
        Self::new(vec![nodes])
    }

    pub fn screen(&self) -> usize {
        self.current.get()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    pub fn click_count(&self, id: &str) -> usize {
        self.clicks.borrow().iter().filter(|c| *c == id).count()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.fills.borrow().clone()
    }

    pub fn value_of(&self, id: &str) -> Option<String> {
        self.values.borrow().get(id).cloned()
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.get()
    }

    fn visible(&self) -> impl Iterator<Item = &FakeNode> {
        let scrolls = self.scrolls.get();
        self.screens
            .get(self.current.get())
            .into_iter()
            .flatten()
            .filter(move |n| n.revealed_after <= scrolls)
    }

    fn node(&self, el: &ElementRef) -> Result<&FakeNode, BrowserError> {
        self.visible()
            .find(|n| n.id == el.0)
            .ok_or(BrowserError::StaleElement)
    }

    fn stored_value(&self, node: &FakeNode) -> String {
        self.values
            .borrow()
            .get(&node.id)
            .cloned()
            .unwrap_or_else(|| node.value.clone())
    }
}

impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.visited.borrow_mut().push(url.to_string());
        *self.url.borrow_mut() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.url.borrow().clone())
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> Result<Vec<ElementRef>, BrowserError> {
        Ok(self
            .visible()
            .filter(|n| n.selectors.contains(selector))
            .filter(|n| match scope {
                Some(s) => n.parent.as_deref() == Some(s.0.as_str()),
                None => true,
            })
            .map(|n| ElementRef(n.id.clone()))
            .collect())
    }

    async fn text(&self, el: &ElementRef) -> Result<String, BrowserError> {
        Ok(self.node(el)?.text.clone())
    }

    async fn attribute(
        &self,
        el: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(self.node(el)?.attrs.get(name).cloned())
    }

    async fn value(&self, el: &ElementRef) -> Result<String, BrowserError> {
        let node = self.node(el)?;
        Ok(self.stored_value(node))
    }

    async fn label_text(&self, el: &ElementRef) -> Result<String, BrowserError> {
        Ok(self.node(el)?.label.clone())
    }

    async fn click(&self, el: &ElementRef) -> Result<(), BrowserError> {
        let node = self.node(el)?;
        if let Some(failure) = node.click_failure {
            return Err(failure.to_error());
        }
        self.clicks.borrow_mut().push(node.id.clone());
        match node.on_click {
            Effect::None => {}
            Effect::Screen(i) => self.current.set(i),
            Effect::NextScreen => self.current.set(self.current.get() + 1),
            Effect::Navigate(url) => *self.url.borrow_mut() = url.to_string(),
        }
        Ok(())
    }

    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), BrowserError> {
        let node = self.node(el)?;
        self.fills
            .borrow_mut()
            .push((node.id.clone(), text.to_string()));
        let stored = if node.rejects_typing && !text.is_empty() {
            String::new()
        } else {
            text.to_string()
        };
        self.values.borrow_mut().insert(node.id.clone(), stored);
        Ok(())
    }

    async fn force_value(&self, el: &ElementRef, value: &str) -> Result<(), BrowserError> {
        let node = self.node(el)?;
        self.values
            .borrow_mut()
            .insert(node.id.clone(), value.to_string());
        Ok(())
    }

    async fn upload(&self, el: &ElementRef, path: &str) -> Result<(), BrowserError> {
        let node = self.node(el)?;
        self.values
            .borrow_mut()
            .insert(node.id.clone(), path.to_string());
        Ok(())
    }

    async fn select_option(
        &self,
        select: &ElementRef,
        option: &ElementRef,
    ) -> Result<(), BrowserError> {
        let select = self.node(select)?;
        let option = self.node(option)?;
        let value = option
            .attrs
            .get("value")
            .cloned()
            .unwrap_or_else(|| option.text.clone());
        self.values.borrow_mut().insert(select.id.clone(), value);
        Ok(())
    }

    async fn is_enabled(&self, el: &ElementRef) -> Result<bool, BrowserError> {
        Ok(self.node(el)?.enabled)
    }

    async fn scroll_into_view(&self, el: &ElementRef) -> Result<(), BrowserError> {
        self.node(el).map(|_| ())
    }

    async fn scroll_to_bottom(&self, _container: Option<&ElementRef>) -> Result<(), BrowserError> {
        self.scrolls.set(self.scrolls.get() + 1);
        Ok(())
    }

    async fn scroll_by(&self, _dy: i64) -> Result<(), BrowserError> {
        self.scrolls.set(self.scrolls.get() + 1);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        Ok(b"\x89PNG fake".to_vec())
    }
}
