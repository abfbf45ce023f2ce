//! Load-time reporting
//!
//! Glue between the timer, the classifier and the evidence sink: resolve how
//! long an operation took, attach the raw timing, classify it and attach a
//! warning or failure line when a threshold was crossed.

use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::evidence::{attach_or_warn, EvidenceSink};
use crate::sla::{Classification, SlaBands, SlaLevel};
use crate::timer::{duration_millis, format_seconds, resolve_elapsed, NavigationTimer};

pub struct LoadTimeReporter<'a> {
    sink: &'a dyn EvidenceSink,
}

impl<'a> LoadTimeReporter<'a> {
    pub fn new(sink: &'a dyn EvidenceSink) -> Self {
        Self { sink }
    }

    /// Attach, log and classify an already-measured duration
    pub fn report(&self, label: &str, elapsed: Duration, bands: &SlaBands) -> Classification {
        let elapsed_ms = duration_millis(elapsed);
        attach_or_warn(
            self.sink,
            &format!("Load Time ({})", label),
            &format!("{} seconds", format_seconds(elapsed_ms)),
        );

        let classification = bands.classify(elapsed_ms, label);
        let summary = classification.summary();
        match classification.level {
            SlaLevel::Fail => {
                error!("{}", summary);
                attach_or_warn(self.sink, "Load Time Failure", &summary);
            }
            SlaLevel::Warn => {
                warn!("{}", summary);
                attach_or_warn(self.sink, &warning_title(&classification), &summary);
            }
            SlaLevel::Ok => info!("{}", summary),
        }
        classification
    }

    /// Stop the shared timer and report. When the timer was not running,
    /// the elapsed time is measured from `fallback_start` instead.
    pub fn stop_and_report(
        &self,
        timer: &mut NavigationTimer,
        label: &str,
        fallback_start: Instant,
        bands: &SlaBands,
    ) -> Classification {
        let elapsed = resolve_elapsed(timer.stop_duration(), fallback_start);
        self.report(label, elapsed, bands)
    }
}

fn warning_title(classification: &Classification) -> String {
    match &classification.band {
        Some(band) if band.name != "warn" => {
            format!("Load Time Warning ({}s)", band.threshold_ms / 1000)
        }
        _ => "Load Time Warning".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MemorySink;
    use std::thread::sleep;

    fn nav() -> SlaBands {
        SlaBands::empty().warn("warn", 8000).fail("fail", 15000)
    }

    fn fast() -> SlaBands {
        SlaBands::empty().warn("warn", 30).fail("fail", 10_000)
    }

    #[test]
    fn test_ok_only_attaches_raw_timing() {
        let sink = MemorySink::new();
        let c = LoadTimeReporter::new(&sink).report("Home", Duration::from_millis(5000), &nav());

        assert!(c.is_ok());
        assert_eq!(sink.names(), vec!["Load Time (Home)"]);
        assert_eq!(sink.text_of("Load Time (Home)").unwrap(), "5.00 seconds");
    }

    #[test]
    fn test_warn_and_fail_attach_messages() {
        let sink = MemorySink::new();
        let reporter = LoadTimeReporter::new(&sink);

        let c = reporter.report("Home", Duration::from_millis(9000), &nav());
        assert!(c.is_warn());
        assert_eq!(
            sink.text_of("Load Time Warning").unwrap(),
            "Home took 9.00 s — more than 8 s."
        );

        let c = reporter.report("Home", Duration::from_millis(16000), &nav());
        assert!(c.is_fail());
        assert!(sink
            .text_of("Load Time Failure")
            .unwrap()
            .ends_with("Failing (SLA 15s)."));
    }

    #[test]
    fn test_multi_band_warning_title() {
        let sink = MemorySink::new();
        let bands = SlaBands::empty()
            .warn("warn1", 60_000)
            .warn("warn2", 90_000)
            .fail("fail", 150_000);
        LoadTimeReporter::new(&sink).report("Get Started", Duration::from_millis(95_000), &bands);
        assert!(sink.text_of("Load Time Warning (90s)").is_some());
    }

    #[test]
    fn test_stop_and_report_uses_fallback_when_timer_idle() {
        let sink = MemorySink::new();
        let mut timer = NavigationTimer::new();
        let fallback = Instant::now();
        sleep(Duration::from_millis(60));

        let c = LoadTimeReporter::new(&sink).stop_and_report(&mut timer, "Compliances", fallback, &fast());
        assert!(c.is_warn());
        assert!(c.elapsed_ms >= 60);
    }

    #[test]
    fn test_stop_and_report_prefers_running_timer() {
        let sink = MemorySink::new();
        let mut timer = NavigationTimer::new();
        let fallback = Instant::now();
        sleep(Duration::from_millis(60));
        timer.start("Compliances");

        let c = LoadTimeReporter::new(&sink).stop_and_report(&mut timer, "Compliances", fallback, &fast());
        assert!(c.is_ok());
        assert!(!timer.is_running());
    }
}
