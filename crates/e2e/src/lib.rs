//! Stepwatch browser harness
//!
//! Drives declarative YAML scenarios through a browser and holds every timed
//! step to an SLA:
//! - Loads [`ScenarioSpec`]s from a directory
//! - Launches one [`Browser`] per scenario (W3C WebDriver or scripted)
//! - Times navigate/click steps with the scenario's shared navigation timer
//! - Classifies each load time and aggregates failures per step
//! - Attaches timings, failure lines and screenshots as evidence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │    ├── BrowserFactory::launch() -> Box<dyn Browser>         │
//! │    ├── ScenarioContext { browser, timer, evidence, ... }    │
//! │    ├── execute_step(step) -> StepOutcome                    │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioSpec (YAML)                                        │
//! │    ├── name, description, tags                              │
//! │    └── steps: [TestStep]                                    │
//! │          ├── navigate { url, ready_selector, sla, checks }  │
//! │          ├── click { selector, ready_selector, sla, ... }   │
//! │          ├── verify { checks }                              │
//! │          ├── screenshot { name }                            │
//! │          └── skip { reason }                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod context;
pub mod error;
pub mod runner;
pub mod spec;
pub mod testing;
pub mod webdriver;

pub use browser::{Browser, BrowserFactory, BrowserKind};
pub use context::ScenarioContext;
pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, ScenarioResult, ScenarioRunner, StepResult, SuiteResult};
pub use spec::{Check, OnBreach, ScenarioSpec, SlaSpec, TestStep, Timing};
pub use webdriver::{WebDriverBrowser, WebDriverConfig, WebDriverFactory};
