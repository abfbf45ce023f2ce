//! Run Command

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use stepwatch_common::{StepOutcome, ThresholdConfig};
use stepwatch_e2e::{
    BrowserKind, RunnerConfig, ScenarioResult, ScenarioRunner, SuiteResult, WebDriverConfig,
    WebDriverFactory,
};

use crate::output::{print_error, print_list, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to scenario specs directory
    #[arg(short, long, default_value = "scenarios")]
    pub specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Application base URL that relative step URLs are joined to
    #[arg(long, env = "STEPWATCH_BASE_URL", default_value = "http://127.0.0.1:8080")]
    pub base_url: String,

    /// WebDriver endpoint
    #[arg(long, env = "STEPWATCH_WEBDRIVER", default_value = "http://127.0.0.1:4444")]
    pub webdriver: String,

    /// Browser to use (chrome, firefox, edge)
    #[arg(long, default_value = "chrome")]
    pub browser: BrowserKind,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// TOML threshold file
    #[arg(long, env = "STEPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Properties file with threshold overrides
    #[arg(long)]
    pub properties: Option<PathBuf>,

    /// Timeout for functional checks, in milliseconds
    #[arg(long, default_value = "5000")]
    pub check_timeout_ms: u64,

    /// Output directory for results and evidence
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,
}

/// Scenario result display wrapper
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub status: String,
    pub steps: usize,
    pub duration_ms: u64,
    pub detail: String,
}

impl From<&ScenarioResult> for ScenarioDisplay {
    fn from(result: &ScenarioResult) -> Self {
        let (status, detail) = match &result.outcome {
            StepOutcome::Completed => ("passed", String::new()),
            StepOutcome::Skipped(reason) => ("skipped", reason.clone()),
            StepOutcome::Failed(errors) => ("failed", errors.join("; ")),
        };
        Self {
            name: result.name.clone(),
            status: status.to_string(),
            steps: result.steps.len(),
            duration_ms: result.duration_ms,
            detail,
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Status", "Steps", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        let status = match self.status.as_str() {
            "passed" => "✓ passed",
            "failed" => "✗ failed",
            _ => "- skipped",
        };
        vec![
            self.name.clone(),
            status.to_string(),
            self.steps.to_string(),
            format!("{}ms", self.duration_ms),
            self.detail.clone(),
        ]
    }
}

/// Run the selected scenarios. Returns whether every scenario passed or was skipped.
pub async fn execute(args: RunArgs, format: OutputFormat) -> Result<bool> {
    let thresholds = ThresholdConfig::resolve(args.config.as_deref(), args.properties.as_deref())
        .context("Failed to resolve thresholds")?;

    let webdriver = WebDriverConfig {
        server_url: args.webdriver.clone(),
        browser: args.browser,
        headless: !args.headed,
        ..Default::default()
    };
    let config = RunnerConfig {
        base_url: args.base_url.clone(),
        specs_dir: args.specs.clone(),
        output_dir: args.output.clone(),
        thresholds,
        check_timeout: Duration::from_millis(args.check_timeout_ms),
    };

    let runner = ScenarioRunner::new(config, Box::new(WebDriverFactory::new(webdriver)))?;

    let results = if let Some(name) = &args.name {
        runner.run_named(name).await?
    } else if let Some(tag) = &args.tag {
        runner.run_tagged(tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;
    report(&results, format);
    Ok(results.failed == 0)
}

fn report(results: &SuiteResult, format: OutputFormat) {
    let rows: Vec<ScenarioDisplay> = results.results.iter().map(ScenarioDisplay::from).collect();
    print_list(&rows, format);

    let summary = format!(
        "{} passed, {} failed, {} skipped ({} ms)",
        results.passed, results.failed, results.skipped, results.duration_ms
    );
    if results.failed > 0 {
        print_error(&summary);
    } else if results.total == 0 {
        print_warning("No scenarios matched");
    } else {
        print_success(&summary);
    }
}
