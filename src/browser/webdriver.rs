//! [`Page`] over the W3C WebDriver HTTP protocol (chromedriver, geckodriver).

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::error::BrowserError;
use super::types::{
    Envelope, FindRequest, NewSession, NewSessionRequest, ScriptRequest, WireError, element_arg,
    element_id,
};
use super::{ElementRef, Page, Selector};

const LABEL_SCRIPT: &str = "const el = arguments[0]; \
    const host = el.closest('label') || el.closest('div'); \
    return (host ? host.innerText : '') || el.getAttribute('aria-label') || '';";

const FORCE_VALUE_SCRIPT: &str = "const el = arguments[0]; \
    el.value = arguments[1]; \
    el.dispatchEvent(new Event('input', { bubbles: true })); \
    el.dispatchEvent(new Event('change', { bubbles: true }));";

const SCROLL_INTO_VIEW_SCRIPT: &str = "arguments[0].scrollIntoView({ block: 'center' });";

const SCROLL_BOTTOM_SCRIPT: &str = "const el = arguments[0]; \
    if (el) { el.scrollTo(0, el.scrollHeight); } \
    else { window.scrollTo(0, document.body.scrollHeight); }";

const SCROLL_BY_SCRIPT: &str = "window.scrollBy(0, arguments[0]);";

/// A WebDriver session bound to one browser window.
pub struct WebDriverPage {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverPage {
    /// Opens a new Chrome session on the remote end at `base_url`.
    pub async fn connect(base_url: &str, headless: bool) -> Result<Self, BrowserError> {
        let client = build_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let response = client
            .post(format!("{base_url}/session"))
            .json(&NewSessionRequest::chrome(headless))
            .send()
            .await?;
        let session: NewSession = decode(response).await?;
        debug!(session_id = %session.session_id, "webdriver session created");
        Ok(Self {
            client,
            base_url,
            session_id: session.session_id,
        })
    }

    /// Attaches to an already running session.
    #[cfg(test)]
    pub fn attach(base_url: &str, session_id: String) -> Result<Self, BrowserError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ends the session and closes the browser window.
    pub async fn quit(&self) -> Result<(), BrowserError> {
        let _: Value = self.send(Method::DELETE, "", None).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, BrowserError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        decode(response).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, BrowserError> {
        let body = serde_json::to_value(ScriptRequest {
            script: script.to_string(),
            args,
        })
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        self.send(Method::POST, "/execute/sync", Some(body)).await
    }
}

fn build_client() -> Result<Client, BrowserError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?;
    Ok(client)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BrowserError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return match serde_json::from_str::<Envelope<WireError>>(&body) {
            Ok(env) => Err(BrowserError::from_wire(&env.value.error, &env.value.message)),
            Err(_) => Err(BrowserError::Protocol(format!("HTTP {status}: {body}"))),
        };
    }

    serde_json::from_str::<Envelope<T>>(&body)
        .map(|env| env.value)
        .map_err(|e| BrowserError::Protocol(format!("unexpected response body: {e}")))
}

impl Page for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let _: Value = self
            .send(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.send(Method::GET, "/url", None).await
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> Result<Vec<ElementRef>, BrowserError> {
        let (using, value) = selector.to_wire();
        let body = serde_json::to_value(FindRequest { using, value })
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        let path = match scope {
            Some(el) => format!("/element/{}/elements", el.0),
            None => "/elements".to_string(),
        };
        let found: Vec<Value> = self.send(Method::POST, &path, Some(body)).await?;
        Ok(found
            .iter()
            .filter_map(element_id)
            .map(ElementRef)
            .collect())
    }

    async fn text(&self, el: &ElementRef) -> Result<String, BrowserError> {
        self.send(Method::GET, &format!("/element/{}/text", el.0), None)
            .await
    }

    async fn attribute(
        &self,
        el: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.send(
            Method::GET,
            &format!("/element/{}/attribute/{name}", el.0),
            None,
        )
        .await
    }

    async fn value(&self, el: &ElementRef) -> Result<String, BrowserError> {
        let value: Value = self
            .send(Method::GET, &format!("/element/{}/property/value", el.0), None)
            .await?;
        Ok(match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    async fn label_text(&self, el: &ElementRef) -> Result<String, BrowserError> {
        let value = self.execute(LABEL_SCRIPT, vec![element_arg(&el.0)]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&self, el: &ElementRef) -> Result<(), BrowserError> {
        let _: Value = self
            .send(
                Method::POST,
                &format!("/element/{}/click", el.0),
                Some(json!({})),
            )
            .await?;
        Ok(())
    }

    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), BrowserError> {
        let _: Value = self
            .send(
                Method::POST,
                &format!("/element/{}/clear", el.0),
                Some(json!({})),
            )
            .await?;
        if text.is_empty() {
            return Ok(());
        }
        let _: Value = self
            .send(
                Method::POST,
                &format!("/element/{}/value", el.0),
                Some(json!({ "text": text })),
            )
            .await?;
        Ok(())
    }

    async fn force_value(&self, el: &ElementRef, value: &str) -> Result<(), BrowserError> {
        self.execute(
            FORCE_VALUE_SCRIPT,
            vec![element_arg(&el.0), Value::String(value.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn upload(&self, el: &ElementRef, path: &str) -> Result<(), BrowserError> {
        let _: Value = self
            .send(
                Method::POST,
                &format!("/element/{}/value", el.0),
                Some(json!({ "text": path })),
            )
            .await?;
        Ok(())
    }

    async fn select_option(
        &self,
        _select: &ElementRef,
        option: &ElementRef,
    ) -> Result<(), BrowserError> {
        self.click(option).await
    }

    async fn is_enabled(&self, el: &ElementRef) -> Result<bool, BrowserError> {
        self.send(Method::GET, &format!("/element/{}/enabled", el.0), None)
            .await
    }

    async fn scroll_into_view(&self, el: &ElementRef) -> Result<(), BrowserError> {
        self.execute(SCROLL_INTO_VIEW_SCRIPT, vec![element_arg(&el.0)])
            .await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self, container: Option<&ElementRef>) -> Result<(), BrowserError> {
        let arg = container
            .map(|el| element_arg(&el.0))
            .unwrap_or(Value::Null);
        self.execute(SCROLL_BOTTOM_SCRIPT, vec![arg]).await?;
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> Result<(), BrowserError> {
        self.execute(SCROLL_BY_SCRIPT, vec![json!(dy)]).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        let encoded: String = self.send(Method::GET, "/screenshot", None).await?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| BrowserError::Protocol(format!("screenshot is not base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn attached(server: &MockServer) -> WebDriverPage {
        WebDriverPage::attach(&server.uri(), "s1".to_string()).unwrap()
    }

    #[tokio::test]
    async fn connect_creates_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"value": {"sessionId": "abc", "capabilities": {}}})),
            )
            .mount(&server)
            .await;

        let page = WebDriverPage::connect(&server.uri(), true).await.unwrap();
        assert_eq!(page.session_id(), "abc");
    }

    #[tokio::test]
    async fn find_all_returns_element_refs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session/s1/elements"))
            .and(body_partial_json(
                json!({"using": "css selector", "value": "div.job-card-container"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    { "element-6066-11e4-a52e-4f735466cecf": "e1" },
                    { "element-6066-11e4-a52e-4f735466cecf": "e2" }
                ]
            })))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let found = page
            .find_all(None, &Selector::Css("div.job-card-container"))
            .await
            .unwrap();
        assert_eq!(
            found,
            vec![ElementRef("e1".into()), ElementRef("e2".into())]
        );
    }

    #[tokio::test]
    async fn scoped_find_uses_element_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element/card/elements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let found = page
            .find_all(Some(&ElementRef("card".into())), &Selector::Css("a"))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn stale_element_maps_to_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element/gone/click"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {"error": "stale element reference", "message": "detached", "stacktrace": ""}
            })))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let err = page.click(&ElementRef("gone".into())).await.unwrap_err();
        assert!(matches!(err, BrowserError::StaleElement));
    }

    #[tokio::test]
    async fn invalid_session_is_session_lost() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {"error": "invalid session id", "message": "session deleted"}
            })))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let err = page.current_url().await.unwrap_err();
        assert!(err.is_session_lost());
    }

    #[tokio::test]
    async fn non_webdriver_error_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let err = page.current_url().await.unwrap_err();
        assert!(matches!(err, BrowserError::Protocol(_)));
    }

    #[tokio::test]
    async fn null_value_property_reads_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/in/property/value"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        assert_eq!(page.value(&ElementRef("in".into())).await.unwrap(), "");
    }

    #[tokio::test]
    async fn screenshot_is_base64_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session/s1/screenshot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "iVBORw=="})))
            .mount(&server)
            .await;

        let page = attached(&server).await;
        let png = page.screenshot().await.unwrap();
        assert_eq!(&png[..3], &[0x89, b'P', b'N']);
    }
}
