//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use stepwatch_common::{Profile, SlaBands, ThresholdConfig};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// Which thresholds a timed step is held to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlaSpec {
    /// A named profile from the threshold config
    Profile(Profile),

    /// An inline warn/fail pair
    Custom { warn_ms: u64, fail_ms: u64 },
}

impl Default for SlaSpec {
    fn default() -> Self {
        SlaSpec::Profile(Profile::Nav)
    }
}

impl SlaSpec {
    pub fn bands(&self, config: &ThresholdConfig) -> SlaBands {
        match self {
            SlaSpec::Profile(profile) => config.bands(*profile),
            SlaSpec::Custom { warn_ms, fail_ms } => {
                SlaBands::empty().warn("warn", *warn_ms).fail("fail", *fail_ms)
            }
        }
    }
}

/// What to do with a FAIL classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnBreach {
    /// Record it and keep checking; the step fails at the end
    #[default]
    Soft,
    /// Fail the step immediately
    Hard,
}

/// A functional check run after the step's action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Visible(String),
    TitleContains(String),
    UrlContains(String),
}

/// Timing options shared by navigate and click
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timing {
    /// Label used in timing messages
    #[serde(default)]
    pub label: Option<String>,

    /// Element whose visibility marks the page as ready
    #[serde(default)]
    pub ready_selector: Option<String>,

    #[serde(default)]
    pub sla: SlaSpec,

    #[serde(default)]
    pub on_breach: OnBreach,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base) and time it
    Navigate {
        url: String,
        #[serde(flatten)]
        timing: Timing,
        #[serde(default)]
        checks: Vec<Check>,
    },

    /// Click an element and time the response
    Click {
        selector: String,
        #[serde(flatten)]
        timing: Timing,
        #[serde(default)]
        checks: Vec<Check>,
    },

    /// Run functional checks only
    Verify {
        #[serde(default)]
        label: Option<String>,
        checks: Vec<Check>,
    },

    /// Attach a screenshot
    Screenshot { name: String },

    /// Stop the scenario here and report it as skipped
    Skip { reason: String },
}

impl TestStep {
    /// Label for timing messages and evidence
    pub fn label(&self) -> String {
        match self {
            TestStep::Navigate { url, timing, .. } => {
                timing.label.clone().unwrap_or_else(|| url.clone())
            }
            TestStep::Click { selector, timing, .. } => {
                timing.label.clone().unwrap_or_else(|| selector.clone())
            }
            TestStep::Verify { label, .. } => label.clone().unwrap_or_else(|| "verify".to_string()),
            TestStep::Screenshot { name } => name.clone(),
            TestStep::Skip { .. } => "skip".to_string(),
        }
    }

    /// Short name for results
    pub fn step_name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Verify { .. } => format!("verify:{}", self.label()),
            TestStep::Screenshot { name } => format!("screenshot:{}", name),
            TestStep::Skip { reason } => {
                format!("skip:{}", reason.chars().take(30).collect::<String>())
            }
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Non-fatal problems: timed steps without a ready selector measure only
    /// the action itself, which usually means a misspelled key.
    pub fn lint(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                TestStep::Navigate { timing, .. } | TestStep::Click { timing, .. }
                    if timing.ready_selector.is_none() =>
                {
                    Some(format!(
                        "{}: step '{}' has no ready_selector; only the action is timed",
                        self.name,
                        step.label()
                    ))
                }
                _ => None,
            })
            .collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario name is empty".to_string()));
        }
        for step in &self.steps {
            let sla = match step {
                TestStep::Navigate { timing, .. } | TestStep::Click { timing, .. } => &timing.sla,
                _ => continue,
            };
            if let SlaSpec::Custom { warn_ms, fail_ms } = sla {
                if fail_ms < warn_ms {
                    return Err(E2eError::SpecParse(format!(
                        "{}: step '{}' has fail_ms {} below warn_ms {}",
                        self.name,
                        step.label(),
                        fail_ms,
                        warn_ms
                    )));
                }
            }
        }
        for problem in self.lint() {
            warn!("{}", problem);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_navigation_spec() {
        let yaml = r#"
name: left-menu-access
description: Every left menu item loads within SLA
tags:
  - smoke
  - navigation
steps:
  - action: navigate
    url: /home
    label: Home
    ready_selector: '[data-testid="home-header"]'
  - action: click
    selector: '#menu-compliance'
    label: Compliance
    ready_selector: '#compliance-header'
    sla: { warn_ms: 10000, fail_ms: 20000 }
    on_breach: hard
    checks:
      - visible: '#compliance-table'
      - title_contains: Compliance
  - action: verify
    checks:
      - url_contains: /compliance
  - action: screenshot
    name: Compliance_Page_Navigation_Verified
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "left-menu-access");
        assert_eq!(spec.steps.len(), 4);

        match &spec.steps[0] {
            TestStep::Navigate { timing, checks, .. } => {
                assert_eq!(timing.sla, SlaSpec::Profile(Profile::Nav));
                assert_eq!(timing.on_breach, OnBreach::Soft);
                assert!(checks.is_empty());
            }
            other => panic!("unexpected step {:?}", other),
        }

        match &spec.steps[1] {
            TestStep::Click { timing, checks, .. } => {
                assert_eq!(timing.sla, SlaSpec::Custom { warn_ms: 10000, fail_ms: 20000 });
                assert_eq!(timing.on_breach, OnBreach::Hard);
                assert_eq!(checks[0], Check::Visible("#compliance-table".into()));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(spec.steps[1].label(), "Compliance");
        assert_eq!(spec.steps[2].step_name(), "verify:verify");
    }

    #[test]
    fn test_parse_profile_names() {
        let yaml = r#"
name: get-started
steps:
  - action: click
    selector: '#get-started'
    sla: get_started
  - action: navigate
    url: /login
    sla: login
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        let config = ThresholdConfig::default();
        match &spec.steps[0] {
            TestStep::Click { timing, .. } => {
                assert_eq!(timing.sla, SlaSpec::Profile(Profile::GetStarted));
                assert_eq!(timing.sla.bands(&config).bands().len(), 3);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(spec.steps[0].label(), "#get-started");
    }

    #[test]
    fn test_lint_flags_timed_steps_without_ready_selector() {
        let yaml = r#"
name: typo
steps:
  - action: navigate
    url: /home
    ready_selector: '#home-header'
  - action: click
    selector: '#menu-reports'
    label: Reports
    ready_selectr: '#reports-header'
  - action: verify
    checks:
      - url_contains: /reports
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        let problems = spec.lint();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("'Reports' has no ready_selector"));
    }

    #[test]
    fn test_rejects_inverted_inline_sla() {
        let yaml = r#"
name: broken
steps:
  - action: navigate
    url: /home
    sla: { warn_ms: 20000, fail_ms: 10000 }
"#;
        assert!(matches!(
            ScenarioSpec::from_yaml(yaml),
            Err(E2eError::SpecParse(_))
        ));
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "name: b\ntags: [smoke]\nsteps: []\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.yml"), "name: a\nsteps: []\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let specs = ScenarioSpec::load_all(dir.path()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(ScenarioSpec::filter_by_tag(&specs, "smoke").len(), 1);
    }
}
