//! Boundary to the authenticated browsing context.
//!
//! Everything above this module talks to the external UI through the
//! [`Page`] trait and never keeps an [`ElementRef`] across a loop
//! iteration: the UI regenerates its nodes asynchronously, so callers read
//! current state, decide, act, and re-read.

pub mod error;
#[cfg(test)]
pub mod fake;
pub mod types;
pub mod webdriver;

use std::time::Duration;

use tokio::time::{Instant, sleep};

pub use error::BrowserError;
pub use webdriver::WebDriverPage;

/// Opaque handle to a node in the live document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// A single way of locating elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector, evaluated relative to the scope element when one is given.
    Css(&'static str),
    /// Element of `tag` whose normalised text contains `text`.
    Text {
        tag: &'static str,
        text: &'static str,
    },
}

impl Selector {
    /// Location strategy and value as understood by a W3C WebDriver remote end.
    pub fn to_wire(&self) -> (&'static str, String) {
        match self {
            Selector::Css(css) => ("css selector", (*css).to_string()),
            Selector::Text { tag, text } => (
                "xpath",
                format!(".//{tag}[contains(normalize-space(.), '{text}')]"),
            ),
        }
    }
}

/// Ordered selector-fallback chain: the first strategy that yields a
/// result wins. Chains are plain data so new layouts only append entries.
#[derive(Debug, Clone, Copy)]
pub struct Locator {
    pub name: &'static str,
    pub selectors: &'static [Selector],
}

impl Locator {
    pub const fn new(name: &'static str, selectors: &'static [Selector]) -> Self {
        Self { name, selectors }
    }

    /// First element matched by the first strategy that matches anything.
    pub async fn first<P: Page>(
        &self,
        page: &P,
        scope: Option<&ElementRef>,
    ) -> Result<Option<ElementRef>, BrowserError> {
        for selector in self.selectors {
            if let Some(el) = page.find_all(scope, selector).await?.into_iter().next() {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    /// Every element matched by the first strategy that matches anything.
    pub async fn all<P: Page>(
        &self,
        page: &P,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, BrowserError> {
        for selector in self.selectors {
            let found = page.find_all(scope, selector).await?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    /// Trimmed text of the first strategy whose element has non-empty text.
    pub async fn text<P: Page>(
        &self,
        page: &P,
        scope: Option<&ElementRef>,
    ) -> Result<Option<String>, BrowserError> {
        for selector in self.selectors {
            if let Some(el) = page.find_all(scope, selector).await?.into_iter().next() {
                let text = page.text(&el).await?;
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(Some(text.to_string()));
                }
            }
        }
        Ok(None)
    }

    /// Non-empty attribute value from the first strategy that provides one.
    pub async fn attribute<P: Page>(
        &self,
        page: &P,
        scope: Option<&ElementRef>,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        for selector in self.selectors {
            if let Some(el) = page.find_all(scope, selector).await?.into_iter().next()
                && let Some(value) = page.attribute(&el, name).await?
                && !value.trim().is_empty()
            {
                return Ok(Some(value.trim().to_string()));
            }
        }
        Ok(None)
    }

    /// Polls until the locator matches or `timeout` elapses.
    pub async fn wait<P: Page>(
        &self,
        page: &P,
        scope: Option<&ElementRef>,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Option<ElementRef>, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(el) = self.first(page, scope).await? {
                return Ok(Some(el));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(poll).await;
        }
    }
}

/// The operations the crate needs from a live page.
///
/// Implemented over W3C WebDriver by [`WebDriverPage`]; tests use a
/// scripted in-memory document.
#[allow(async_fn_in_trait)]
pub trait Page {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// All elements matching `selector`, searched under `scope` when given.
    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> Result<Vec<ElementRef>, BrowserError>;

    async fn text(&self, el: &ElementRef) -> Result<String, BrowserError>;

    async fn attribute(&self, el: &ElementRef, name: &str)
    -> Result<Option<String>, BrowserError>;

    /// Current `value` property of a form control.
    async fn value(&self, el: &ElementRef) -> Result<String, BrowserError>;

    /// Text of the nearest enclosing label (or container) of a form control.
    async fn label_text(&self, el: &ElementRef) -> Result<String, BrowserError>;

    async fn click(&self, el: &ElementRef) -> Result<(), BrowserError>;

    /// Clears the control and types `text` into it.
    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), BrowserError>;

    /// Assigns `value` directly and dispatches `input`/`change` events,
    /// bypassing keystroke handling.
    async fn force_value(&self, el: &ElementRef, value: &str) -> Result<(), BrowserError>;

    /// Hands a local file to a file input.
    async fn upload(&self, el: &ElementRef, path: &str) -> Result<(), BrowserError>;

    /// Selects `option` inside the `select` control.
    async fn select_option(
        &self,
        select: &ElementRef,
        option: &ElementRef,
    ) -> Result<(), BrowserError>;

    async fn is_enabled(&self, el: &ElementRef) -> Result<bool, BrowserError>;

    async fn scroll_into_view(&self, el: &ElementRef) -> Result<(), BrowserError>;

    /// Scrolls `container` (or the window) to its current bottom.
    async fn scroll_to_bottom(&self, container: Option<&ElementRef>) -> Result<(), BrowserError>;

    /// Scrolls the window by a fixed vertical distance.
    async fn scroll_by(&self, dy: i64) -> Result<(), BrowserError>;

    /// PNG of the current viewport (W3C `GET /screenshot`).
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;
}
