//! Scenario runs against the demo specs with a scripted browser

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stepwatch_common::{MemorySink, SlaLevel, StepOutcome};
use stepwatch_e2e::testing::{ClickEffect, ScriptedBrowser};
use stepwatch_e2e::{E2eError, RunnerConfig, ScenarioRunner};

fn specs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/specs")
}

fn app() -> ScriptedBrowser {
    let navigate = |url: &str| ClickEffect {
        navigate_to: Some(url.to_string()),
        ..Default::default()
    };
    ScriptedBrowser::new()
        .with_page("https://app.test/login", "Login", &["#login-form", "#get-started"])
        .with_page("https://app.test/onboarding", "Get Started", &["#onboarding-header"])
        .with_page(
            "https://app.test/home",
            "Zolvit 360 | Home",
            &["#home-header", "#menu-compliance", "#menu-reports"],
        )
        .with_page(
            "https://app.test/compliance",
            "Compliance",
            &["#compliance-header", "#compliance-table", "#menu-reports"],
        )
        .with_page("https://app.test/reports", "Reports", &["#reports-header"])
        .on_click("#get-started", navigate("https://app.test/onboarding"))
        .on_click("#menu-compliance", navigate("https://app.test/compliance"))
        .on_click("#menu-reports", navigate("https://app.test/reports"))
}

fn runner(browser: &ScriptedBrowser, sink: Arc<MemorySink>) -> ScenarioRunner {
    let config = RunnerConfig {
        base_url: "https://app.test".into(),
        specs_dir: specs_dir(),
        check_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    ScenarioRunner::with_sink(config, Box::new(browser.clone()), sink)
}

#[tokio::test]
async fn demo_suite_passes_within_sla() {
    let browser = app();
    let sink = Arc::new(MemorySink::new());
    let suite = runner(&browser, sink.clone()).run_all().await.unwrap();

    assert_eq!(suite.total, 3);
    assert_eq!(suite.passed, 2, "{:#?}", suite.results);
    assert_eq!(suite.skipped, 1);
    assert_eq!(suite.failed, 0);

    let names = sink.names();
    assert!(names.iter().any(|n| n == "Load Time (Get Started)"));
    assert!(names.iter().any(|n| n == "Reports_Page_Navigation_Verified"));
    assert!(!names.iter().any(|n| n.starts_with("Load Time Failure")));
}

#[tokio::test]
async fn every_timed_step_is_classified_ok() {
    let browser = app();
    let sink = Arc::new(MemorySink::new());
    let suite = runner(&browser, sink)
        .run_named("left-menu-access")
        .await
        .unwrap();

    let scenario = &suite.results[0];
    let timed: Vec<_> = scenario.steps.iter().filter_map(|s| s.timing.as_ref()).collect();
    assert_eq!(timed.len(), 3);
    assert!(timed.iter().all(|c| c.level == SlaLevel::Ok));
    assert_eq!(timed[1].label, "Compliance");
}

#[tokio::test]
async fn tag_filter_selects_matching_scenarios() {
    let browser = app();
    let sink = Arc::new(MemorySink::new());
    let suite = runner(&browser, sink).run_tagged("onboarding").await.unwrap();

    assert_eq!(suite.total, 1);
    assert_eq!(suite.results[0].name, "get-started");
    assert_eq!(suite.results[0].outcome, StepOutcome::Completed);
}

#[tokio::test]
async fn missing_element_fails_with_error_evidence() {
    // Reports link is gone from the compliance page
    let browser = app().with_page(
        "https://app.test/compliance",
        "Compliance",
        &["#compliance-header", "#compliance-table"],
    );
    let sink = Arc::new(MemorySink::new());
    let suite = runner(&browser, sink.clone())
        .run_named("left-menu-access")
        .await
        .unwrap();

    assert_eq!(suite.failed, 1);
    let steps = &suite.results[0].steps;
    assert!(steps[2].outcome.errors()[0].contains("Element not found: #menu-reports"));
    assert!(steps[3].outcome.is_skipped());
    assert!(sink.names().iter().any(|n| n == "Error_Reports"));
    assert!(browser.is_quit());
}

#[tokio::test]
async fn unknown_scenario_name_is_an_error() {
    let browser = app();
    let sink = Arc::new(MemorySink::new());
    let result = runner(&browser, sink).run_named("does-not-exist").await;
    assert!(matches!(result, Err(E2eError::ScenarioNotFound(_))));
}
