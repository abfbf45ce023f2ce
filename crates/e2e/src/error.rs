//! Error types for the scenario harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("WebDriver error: {error} - {message}")]
    WebDriver { error: String, message: String },

    #[error("WebDriver session not started: {0}")]
    SessionNotStarted(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Scenario spec parse error: {0}")]
    SpecParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Screenshot decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Common(#[from] stepwatch_common::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
