//! W3C WebDriver client
//!
//! Talks to chromedriver, geckodriver, msedgedriver or a Selenium server over
//! the W3C WebDriver HTTP protocol.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::{Browser, BrowserFactory, BrowserKind, DEFAULT_POLL_INTERVAL};
use crate::error::{E2eError, E2eResult};

/// Key of a web element reference in W3C responses
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Configuration for WebDriver sessions
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// WebDriver endpoint, e.g. `http://127.0.0.1:4444`
    pub server_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4444".to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl WebDriverConfig {
    /// New-session payload for the configured browser
    pub fn capabilities(&self) -> Value {
        let size = format!("--window-size={},{}", self.window_width, self.window_height);
        let always_match = match self.browser {
            BrowserKind::Chrome | BrowserKind::Edge => {
                let mut args = vec![
                    size,
                    "--disable-notifications".to_string(),
                    "--remote-allow-origins=*".to_string(),
                ];
                if self.headless {
                    args.push("--headless=new".to_string());
                }
                let options_key = if self.browser == BrowserKind::Edge {
                    "ms:edgeOptions"
                } else {
                    "goog:chromeOptions"
                };
                json!({
                    "browserName": self.browser.as_str(),
                    options_key: { "args": args },
                })
            }
            BrowserKind::Firefox => {
                let args: Vec<&str> = if self.headless { vec!["-headless"] } else { vec![] };
                json!({
                    "browserName": self.browser.as_str(),
                    "moz:firefoxOptions": { "args": args },
                })
            }
        };
        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// A live WebDriver session
pub struct WebDriverBrowser {
    client: reqwest::Client,
    server_url: String,
    session_id: String,
    poll_interval: Duration,
}

impl WebDriverBrowser {
    /// Start a new session
    pub async fn connect(config: &WebDriverConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let server_url = config.server_url.trim_end_matches('/').to_string();

        info!("Starting {} session at {}", config.browser.as_str(), server_url);
        let response = client
            .post(format!("{}/session", server_url))
            .json(&config.capabilities())
            .send()
            .await?;
        let value = read_value(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| E2eError::SessionNotStarted(value.to_string()))?
            .to_string();

        let browser = Self {
            client,
            server_url,
            session_id,
            poll_interval: config.poll_interval,
        };

        if config.browser == BrowserKind::Firefox {
            browser
                .command(
                    Method::POST,
                    "/window/rect",
                    Some(json!({ "width": config.window_width, "height": config.window_height })),
                )
                .await?;
        }

        debug!("WebDriver session {} started", browser.session_id);
        Ok(browser)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> E2eResult<Value> {
        let url = format!("{}/session/{}{}", self.server_url, self.session_id, path);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        read_value(response).await
    }

    /// Element reference for a CSS selector, `None` if absent
    async fn find_element(&self, selector: &str) -> E2eResult<Option<String>> {
        let result = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await;

        match result {
            Ok(value) => Ok(value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(str::to_string)),
            Err(E2eError::WebDriver { error, .. }) if error == "no such element" => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate_to(&self, url: &str) -> E2eResult<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let element = self
            .find_element(selector)
            .await?
            .ok_or_else(|| E2eError::ElementNotFound(selector.to_string()))?;
        self.command(Method::POST, &format!("/element/{}/click", element), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        let Some(element) = self.find_element(selector).await? else {
            return Ok(false);
        };
        match self
            .command(Method::GET, &format!("/element/{}/displayed", element), None)
            .await
        {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            // The element was replaced between lookup and query
            Err(E2eError::WebDriver { error, .. }) if error == "stale element reference" => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn current_url(&self) -> E2eResult<String> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn page_title(&self) -> E2eResult<String> {
        let value = self.command(Method::GET, "/title", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| E2eError::Browser("screenshot response was not a string".to_string()))?;
        Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
    }

    async fn quit(&self) -> E2eResult<()> {
        let url = format!("{}/session/{}", self.server_url, self.session_id);
        match self.client.delete(url).send().await {
            Ok(_) => {
                debug!("WebDriver session {} closed", self.session_id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to close session {}: {}", self.session_id, e);
                Err(e.into())
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Starts a fresh WebDriver session per scenario
pub struct WebDriverFactory {
    config: WebDriverConfig,
}

impl WebDriverFactory {
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserFactory for WebDriverFactory {
    async fn launch(&self) -> E2eResult<Box<dyn Browser>> {
        let browser = WebDriverBrowser::connect(&self.config).await?;
        Ok(Box::new(browser))
    }
}

/// Unwrap the `value` member, mapping W3C error payloads to [`E2eError::WebDriver`]
async fn read_value(response: reqwest::Response) -> E2eResult<Value> {
    let status = response.status();
    let body: Value = response.json().await?;
    parse_response(status, body)
}

fn parse_response(status: StatusCode, mut body: Value) -> E2eResult<Value> {
    let value = body
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(E2eError::WebDriver { error, message })
}
