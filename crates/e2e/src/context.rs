//! Per-scenario context
//!
//! Built once at scenario start and passed to every step. Holds the browser
//! session, the evidence sink, the resolved thresholds, the shared navigation
//! timer and a scratch map for values handed from one step to the next.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use stepwatch_common::evidence::{EvidenceSink, MIME_PNG};
use stepwatch_common::{NavigationTimer, StepOutcome, ThresholdConfig};

use crate::browser::Browser;
use crate::error::{E2eError, E2eResult};

pub struct ScenarioContext {
    name: String,
    browser: Box<dyn Browser>,
    evidence: Arc<dyn EvidenceSink>,
    thresholds: ThresholdConfig,
    timer: NavigationTimer,
    base_url: String,
    check_timeout: Duration,
    values: HashMap<String, Value>,
}

impl ScenarioContext {
    pub fn new(
        name: impl Into<String>,
        browser: Box<dyn Browser>,
        evidence: Arc<dyn EvidenceSink>,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            name: name.into(),
            browser,
            evidence,
            thresholds,
            timer: NavigationTimer::new(),
            base_url: String::new(),
            check_timeout: Duration::from_secs(5),
            values: HashMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    pub fn evidence(&self) -> &dyn EvidenceSink {
        self.evidence.as_ref()
    }

    /// Shared handle to the sink, for use while the context is borrowed mutably
    pub fn evidence_handle(&self) -> Arc<dyn EvidenceSink> {
        self.evidence.clone()
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn timer(&self) -> &NavigationTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut NavigationTimer {
        &mut self.timer
    }

    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    /// Absolute URLs pass through; anything else is joined to the base URL
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || self.base_url.is_empty() {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    /// Swap in a new browser session, closing the old one
    pub async fn replace_browser(&mut self, browser: Box<dyn Browser>) {
        let old = std::mem::replace(&mut self.browser, browser);
        if let Err(e) = old.quit().await {
            warn!("Failed to quit previous browser for '{}': {}", self.name, e);
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.values.get(key).unwrap_or(default)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Take a screenshot and attach it. Never fails; problems are logged.
    pub async fn capture_screenshot(&self, name: &str) {
        match self.browser.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = self.evidence.attach_bytes(name, MIME_PNG, &bytes) {
                    warn!("Failed to attach screenshot '{}': {}", name, e);
                }
            }
            Err(e) => warn!("Failed to capture screenshot for '{}': {}", name, e),
        }
    }

    /// Turn a collaborator fault into a single failed outcome with evidence
    pub async fn handle_fault(&self, context: &str, err: &E2eError) -> StepOutcome {
        error!("Exception during {}: {}", context, err);
        self.capture_screenshot(&format!("Error_{}", context)).await;
        StepOutcome::failed(format!("Validation error during: {}: {}", context, err))
    }

    /// Close the browser and drop scenario state
    pub async fn teardown(mut self) -> E2eResult<()> {
        self.values.clear();
        if self.timer.overwrites() > 0 {
            warn!(
                "Scenario '{}' overwrote a running timer {} time(s)",
                self.name,
                self.timer.overwrites()
            );
        }
        self.browser.quit().await?;
        info!("Scenario '{}' torn down", self.name);
        Ok(())
    }
}
