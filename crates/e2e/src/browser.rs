//! Browser collaborator
//!
//! The harness never touches the DOM directly. Everything goes through the
//! [`Browser`] trait so that scenarios can run against a real WebDriver
//! session or against a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::E2eResult;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate_to(&self, url: &str) -> E2eResult<()>;

    async fn click(&self, selector: &str) -> E2eResult<()>;

    /// `Ok(false)` when the element is absent or hidden
    async fn is_visible(&self, selector: &str) -> E2eResult<bool>;

    async fn current_url(&self) -> E2eResult<String>;

    async fn page_title(&self) -> E2eResult<String>;

    /// PNG bytes of the current viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    async fn quit(&self) -> E2eResult<()>;

    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Poll until `selector` is visible. A timeout is `Ok(false)`, not an
    /// error.
    async fn wait_until_visible(&self, selector: &str, timeout: Duration) -> E2eResult<bool> {
        let start = Instant::now();
        loop {
            if self.is_visible(selector).await? {
                return Ok(true);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval().min(timeout - elapsed)).await;
        }
    }
}

/// Launches one browser per scenario
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    async fn launch(&self) -> E2eResult<Box<dyn Browser>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
    Edge,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "MicrosoftEdge",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            "edge" | "microsoftedge" => Ok(BrowserKind::Edge),
            other => Err(format!("unsupported browser: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_kind_parse() {
        assert_eq!("Chromium".parse::<BrowserKind>(), Ok(BrowserKind::Chrome));
        assert_eq!("firefox".parse::<BrowserKind>(), Ok(BrowserKind::Firefox));
        assert!("safari".parse::<BrowserKind>().is_err());
        assert_eq!(BrowserKind::Edge.as_str(), "MicrosoftEdge");
    }
}
