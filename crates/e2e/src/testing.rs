//! Scripted in-memory browser for harness tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::browser::{Browser, BrowserFactory};
use crate::error::{E2eError, E2eResult};

/// Bytes returned by [`ScriptedBrowser::screenshot`]
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nscripted";

#[derive(Debug, Clone, Default)]
struct Page {
    title: String,
    visible: HashSet<String>,
}

/// What happens when a selector is clicked
#[derive(Debug, Clone, Default)]
pub struct ClickEffect {
    pub navigate_to: Option<String>,
    pub reveal: Vec<String>,
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, Page>,
    url: String,
    title: String,
    visible: HashSet<String>,
    clicks: HashMap<String, ClickEffect>,
    broken: HashMap<String, String>,
    navigation_delay: Duration,
    calls: Vec<String>,
    quit: bool,
}

/// A fake [`Browser`] driven by a small script of pages and click effects.
/// Clones share state, so a test can keep one handle while the runner owns
/// another.
#[derive(Debug, Clone)]
pub struct ScriptedBrowser {
    state: Arc<Mutex<State>>,
    poll_interval: Duration,
}

impl Default for ScriptedBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Register a page: navigating to `url` shows `title` and `visible`
    pub fn with_page(self, url: &str, title: &str, visible: &[&str]) -> Self {
        self.state.lock().pages.insert(
            url.to_string(),
            Page {
                title: title.to_string(),
                visible: visible.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn on_click(self, selector: &str, effect: ClickEffect) -> Self {
        self.state
            .lock()
            .clicks
            .insert(selector.to_string(), effect);
        self
    }

    /// Clicking `selector` fails with `message`
    pub fn broken_click(self, selector: &str, message: &str) -> Self {
        self.state
            .lock()
            .broken
            .insert(selector.to_string(), message.to_string());
        self
    }

    /// Every navigation takes at least this long
    pub fn navigation_delay(self, delay: Duration) -> Self {
        self.state.lock().navigation_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn is_quit(&self) -> bool {
        self.state.lock().quit
    }

    fn show(state: &mut State, url: &str) {
        state.url = url.to_string();
        match state.pages.get(url) {
            Some(page) => {
                state.title = page.title.clone();
                state.visible = page.visible.clone();
            }
            None => {
                state.title.clear();
                state.visible.clear();
            }
        }
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate_to(&self, url: &str) -> E2eResult<()> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(format!("navigate:{}", url));
            state.navigation_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Self::show(&mut self.state.lock(), url);
        Ok(())
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let effect = {
            let mut state = self.state.lock();
            state.calls.push(format!("click:{}", selector));
            if let Some(message) = state.broken.get(selector) {
                return Err(E2eError::Browser(message.clone()));
            }
            if !state.visible.contains(selector) {
                return Err(E2eError::ElementNotFound(selector.to_string()));
            }
            state.clicks.get(selector).cloned().unwrap_or_default()
        };

        if !effect.delay.is_zero() {
            tokio::time::sleep(effect.delay).await;
        }

        let mut state = self.state.lock();
        if let Some(url) = &effect.navigate_to {
            Self::show(&mut state, url);
        }
        state.visible.extend(effect.reveal);
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        Ok(self.state.lock().visible.contains(selector))
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn page_title(&self) -> E2eResult<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.state.lock().calls.push("screenshot".to_string());
        Ok(FAKE_PNG.to_vec())
    }

    async fn quit(&self) -> E2eResult<()> {
        let mut state = self.state.lock();
        state.calls.push("quit".to_string());
        state.quit = true;
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[async_trait]
impl BrowserFactory for ScriptedBrowser {
    async fn launch(&self) -> E2eResult<Box<dyn Browser>> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_click_reveals_and_navigates() {
        let browser = ScriptedBrowser::new()
            .with_page("https://app.test/home", "Home", &["#menu-reports"])
            .with_page("https://app.test/reports", "Reports", &["#reports-table"])
            .on_click(
                "#menu-reports",
                ClickEffect {
                    navigate_to: Some("https://app.test/reports".into()),
                    ..Default::default()
                },
            );

        browser.navigate_to("https://app.test/home").await.unwrap();
        assert_eq!(browser.page_title().await.unwrap(), "Home");

        browser.click("#menu-reports").await.unwrap();
        assert_eq!(browser.current_url().await.unwrap(), "https://app.test/reports");
        assert!(browser.is_visible("#reports-table").await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_until_visible_times_out_with_false() {
        let browser = ScriptedBrowser::new();
        let visible = browser
            .wait_until_visible("#never", Duration::from_millis(30))
            .await
            .unwrap();
        assert!(!visible);
    }

    #[tokio::test]
    async fn test_click_on_missing_element_errors() {
        let browser = ScriptedBrowser::new();
        assert!(matches!(
            browser.click("#missing").await,
            Err(E2eError::ElementNotFound(_))
        ));
    }
}
