//! Scenario runner
//!
//! Runs scenarios step by step against a browser launched per scenario. Each
//! step gets a fresh [`SoftAssertions`] log, is timed with the scenario's
//! shared [`NavigationTimer`](stepwatch_common::NavigationTimer), and returns
//! a [`StepOutcome`]. A failed step stops the scenario; the remaining steps
//! are reported as skipped.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use stepwatch_common::evidence::{attach_lines, attach_or_warn, EvidenceSink};
use stepwatch_common::timer::{duration_millis, format_seconds};
use stepwatch_common::{
    Classification, DirectorySink, LoadTimeReporter, SoftAssertions, StepOutcome, ThresholdConfig,
};

use crate::browser::BrowserFactory;
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::spec::{Check, OnBreach, ScenarioSpec, TestStep, Timing};

/// Result of running a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
    pub timing: Option<Classification>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
}

impl ScenarioResult {
    pub fn success(&self) -> bool {
        !self.outcome.is_failed()
    }
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub base_url: String,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub thresholds: ThresholdConfig,
    /// Timeout for functional checks and for ready waits without a fail band
    pub check_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            specs_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            thresholds: ThresholdConfig::default(),
            check_timeout: Duration::from_secs(5),
        }
    }
}

impl RunnerConfig {
    pub fn evidence_dir(&self) -> PathBuf {
        self.output_dir.join("evidence")
    }
}

/// Main scenario runner
pub struct ScenarioRunner {
    config: RunnerConfig,
    factory: Box<dyn BrowserFactory>,
    evidence: Arc<dyn EvidenceSink>,
}

impl ScenarioRunner {
    /// Runner writing evidence under `<output_dir>/evidence`
    pub fn new(config: RunnerConfig, factory: Box<dyn BrowserFactory>) -> E2eResult<Self> {
        let sink = DirectorySink::new(config.evidence_dir())?;
        sink.clear()?;
        Ok(Self::with_sink(config, factory, Arc::new(sink)))
    }

    pub fn with_sink(
        config: RunnerConfig,
        factory: Box<dyn BrowserFactory>,
        evidence: Arc<dyn EvidenceSink>,
    ) -> Self {
        Self {
            config,
            factory,
            evidence,
        }
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        Ok(self.run_specs(std::slice::from_ref(&spec)).await)
    }

    /// Run a list of scenarios
    pub async fn run_specs(&self, specs: &[ScenarioSpec]) -> SuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());
        let (mut passed, mut failed, mut skipped) = (0, 0, 0);

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = self.run_scenario(spec).await;
            match &result.outcome {
                StepOutcome::Completed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                }
                StepOutcome::Skipped(reason) => {
                    skipped += 1;
                    info!("- {} skipped: {}", result.name, reason);
                }
                StepOutcome::Failed(errors) => {
                    failed += 1;
                    error!("✗ {} - {}", result.name, errors.join("; "));
                }
            }
            results.push(result);
        }

        let duration_ms = duration_millis(start.elapsed());
        info!(
            "Scenario Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        SuiteResult {
            total: specs.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run one scenario in its own browser session
    pub async fn run_scenario(&self, spec: &ScenarioSpec) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let browser = match self.factory.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                error!("Failed to launch browser for '{}': {}", spec.name, e);
                return ScenarioResult {
                    name: spec.name.clone(),
                    outcome: StepOutcome::failed(format!("Browser launch failed: {}", e)),
                    duration_ms: duration_millis(start.elapsed()),
                    steps: vec![],
                };
            }
        };

        let mut ctx = ScenarioContext::new(
            spec.name.clone(),
            browser,
            self.evidence.clone(),
            self.config.thresholds.clone(),
        )
        .with_base_url(self.config.base_url.clone())
        .with_check_timeout(self.config.check_timeout);

        let mut steps = Vec::with_capacity(spec.steps.len());
        let mut outcome = StepOutcome::Completed;

        for step in &spec.steps {
            if !outcome.is_completed() {
                steps.push(StepResult {
                    step_name: step.step_name(),
                    outcome: StepOutcome::skipped("previous step did not complete"),
                    duration_ms: 0,
                    timing: None,
                });
                continue;
            }

            let step_start = Instant::now();
            let (step_outcome, timing) = execute_step(&mut ctx, step).await;
            debug!("Step {} -> {}", step.step_name(), step_outcome);

            outcome = match &step_outcome {
                StepOutcome::Completed => StepOutcome::Completed,
                StepOutcome::Skipped(reason) => StepOutcome::skipped(reason.clone()),
                StepOutcome::Failed(errors) => {
                    StepOutcome::failed(format!("{}: {}", step.step_name(), errors.join("; ")))
                }
            };
            steps.push(StepResult {
                step_name: step.step_name(),
                outcome: step_outcome,
                duration_ms: duration_millis(step_start.elapsed()),
                timing,
            });
        }

        if let Err(e) = ctx.teardown().await {
            warn!("Teardown of '{}' failed: {}", spec.name, e);
        }

        ScenarioResult {
            name: spec.name.clone(),
            outcome,
            duration_ms: duration_millis(start.elapsed()),
            steps,
        }
    }

    /// Write results to `<output_dir>/test-results.json`
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Execute one step against the scenario context
pub async fn execute_step(
    ctx: &mut ScenarioContext,
    step: &TestStep,
) -> (StepOutcome, Option<Classification>) {
    match step {
        TestStep::Navigate { url, timing, checks } => {
            let url = ctx.resolve_url(url);
            timed_step(ctx, &step.label(), timing, checks, Action::Navigate(&url)).await
        }
        TestStep::Click {
            selector,
            timing,
            checks,
        } => timed_step(ctx, &step.label(), timing, checks, Action::Click(selector)).await,
        TestStep::Verify { checks, .. } => {
            let label = step.label();
            let mut soft = SoftAssertions::new();
            if let Err(e) = run_checks(ctx, checks, &mut soft).await {
                return (ctx.handle_fault(&label, &e).await, None);
            }
            (finish_step(ctx, &label, soft).await, None)
        }
        TestStep::Screenshot { name } => {
            ctx.capture_screenshot(name).await;
            (StepOutcome::Completed, None)
        }
        TestStep::Skip { reason } => {
            info!("Skipping remainder of '{}': {}", ctx.name(), reason);
            (StepOutcome::skipped(reason.clone()), None)
        }
    }
}

enum Action<'a> {
    Navigate(&'a str),
    Click(&'a str),
}

async fn timed_step(
    ctx: &mut ScenarioContext,
    label: &str,
    timing: &Timing,
    checks: &[Check],
    action: Action<'_>,
) -> (StepOutcome, Option<Classification>) {
    let bands = timing.sla.bands(ctx.thresholds());
    let wait_timeout = bands
        .fail_threshold()
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.check_timeout());
    let mut soft = SoftAssertions::new();

    // Start before the action so the measurement covers action → render
    let fallback_start = Instant::now();
    ctx.timer_mut().start(label);

    let acted = match action {
        Action::Navigate(url) => ctx.browser().navigate_to(url).await,
        Action::Click(selector) => ctx.browser().click(selector).await,
    };
    if let Err(e) = acted {
        ctx.timer_mut().stop_duration();
        return (ctx.handle_fault(label, &e).await, None);
    }

    let ready = match &timing.ready_selector {
        Some(selector) => match ctx.browser().wait_until_visible(selector, wait_timeout).await {
            Ok(ready) => ready,
            Err(e) => {
                ctx.timer_mut().stop_duration();
                return (ctx.handle_fault(label, &e).await, None);
            }
        },
        None => true,
    };

    let evidence = ctx.evidence_handle();
    let classification = LoadTimeReporter::new(evidence.as_ref()).stop_and_report(
        ctx.timer_mut(),
        label,
        fallback_start,
        &bands,
    );

    if ready {
        if classification.is_fail() {
            match timing.on_breach {
                OnBreach::Hard => {
                    let summary = classification.summary();
                    ctx.capture_screenshot(&format!("Failure_{}", label)).await;
                    return (StepOutcome::failed(summary), Some(classification));
                }
                OnBreach::Soft => {
                    soft.record(&classification);
                }
            }
        }
    } else {
        let message = format!(
            "Unable to load {} within {} s (actual: {} s).",
            label,
            wait_timeout.as_secs(),
            format_seconds(classification.elapsed_ms)
        );
        error!("{}", message);
        attach_or_warn(ctx.evidence(), "Access Failure", &message);
        soft.fail(message);
    }

    if let Err(e) = run_checks(ctx, checks, &mut soft).await {
        return (ctx.handle_fault(label, &e).await, Some(classification));
    }

    (finish_step(ctx, label, soft).await, Some(classification))
}

async fn run_checks(
    ctx: &ScenarioContext,
    checks: &[Check],
    soft: &mut SoftAssertions,
) -> E2eResult<()> {
    for check in checks {
        match check {
            Check::Visible(selector) => {
                let visible = ctx
                    .browser()
                    .wait_until_visible(selector, ctx.check_timeout())
                    .await?;
                soft.check(visible, format!("Expected element not visible: {}", selector));
            }
            Check::TitleContains(text) => {
                let title = ctx.browser().page_title().await?;
                soft.check(
                    title.contains(text.as_str()),
                    format!("Page title '{}' does not contain '{}'", title, text),
                );
            }
            Check::UrlContains(text) => {
                let url = ctx.browser().current_url().await?;
                soft.check(
                    url.contains(text.as_str()),
                    format!("URL '{}' does not contain '{}'", url, text),
                );
            }
        }
    }
    Ok(())
}

/// Flush the step's soft log, attaching evidence when anything failed
async fn finish_step(ctx: &ScenarioContext, label: &str, soft: SoftAssertions) -> StepOutcome {
    if !soft.is_empty() {
        let title = format!("Failures ({})", label);
        if let Err(e) = attach_lines(ctx.evidence(), &title, soft.messages()) {
            warn!("Failed to attach '{}': {}", title, e);
        }
        ctx.capture_screenshot(&format!("Failure_{}", label)).await;
    }
    soft.finish()
}
