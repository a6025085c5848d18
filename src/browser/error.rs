//! Error types for the browsing-context boundary.
//!
//! [`BrowserError`] classifies every failure the [`Page`](super::Page)
//! implementation can raise. The transition engine and the discovery
//! pipeline branch on the variant: timeouts become recorded outcomes,
//! a lost session aborts the current keyword, everything else is
//! recorded against the item and the run moves on.

use thiserror::Error;

/// Failures surfaced by a [`Page`](super::Page).
#[derive(Debug, Error)]
pub enum BrowserError {
    /// A navigation, script or bounded wait ran past its ceiling.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The browsing context is gone (window closed, session deleted).
    /// Not recoverable within the current keyword.
    #[error("browser session lost: {0}")]
    SessionLost(String),

    /// A previously located element is no longer attached to the page.
    #[error("stale element reference")]
    StaleElement,

    /// The element the caller insisted on could not be located.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Any other error reported by the WebDriver remote end.
    #[error("webdriver error `{error}`: {message}")]
    WebDriver { error: String, message: String },

    /// The remote end answered with something that is not a WebDriver payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying HTTP failure (DNS, connection refused, reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl BrowserError {
    /// Maps a W3C WebDriver error code onto a variant.
    pub fn from_wire(error: &str, message: &str) -> Self {
        match error {
            "timeout" | "script timeout" => BrowserError::Timeout(message.to_string()),
            "invalid session id" | "no such window" | "session not created" => {
                BrowserError::SessionLost(message.to_string())
            }
            "stale element reference" => BrowserError::StaleElement,
            "no such element" => BrowserError::NoSuchElement(message.to_string()),
            _ => BrowserError::WebDriver {
                error: error.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// True for failures that mean the browsing context itself is unusable.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, BrowserError::SessionLost(_))
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            BrowserError::Timeout(_) => true,
            BrowserError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_map_to_variants() {
        assert!(BrowserError::from_wire("timeout", "page load").is_timeout());
        assert!(BrowserError::from_wire("script timeout", "x").is_timeout());
        assert!(BrowserError::from_wire("invalid session id", "gone").is_session_lost());
        assert!(BrowserError::from_wire("no such window", "closed").is_session_lost());
        assert!(matches!(
            BrowserError::from_wire("stale element reference", "detached"),
            BrowserError::StaleElement
        ));
        assert!(matches!(
            BrowserError::from_wire("element not interactable", "hidden"),
            BrowserError::WebDriver { .. }
        ));
    }

    #[test]
    fn webdriver_error_display() {
        let err = BrowserError::from_wire("element click intercepted", "overlay");
        assert_eq!(
            err.to_string(),
            "webdriver error `element click intercepted`: overlay"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BrowserError>();
    }
}
