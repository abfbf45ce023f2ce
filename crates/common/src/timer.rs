//! Navigation timing
//!
//! Measures how long a user-facing action took, from the click that starts it
//! to the readiness check that confirms it. Two call patterns are supported:
//!
//! - the shared single-slot [`NavigationTimer`], where `start` and
//!   `stop_duration` are called from different places in a step;
//! - an explicit [`TimingHandle`] returned by `start`, which owns its own
//!   start instant and cannot be clobbered by a later `start`.
//!
//! Nothing here returns an error or panics. A timer that was never started
//! reports [`Duration::ZERO`], and callers fall back to their own instant via
//! [`resolve_elapsed`].

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A named, monotonic timing context
#[derive(Debug, Clone)]
pub struct TimingContext {
    label: String,
    started_at: Instant,
    stopped_at: Option<Instant>,
}

impl TimingContext {
    fn started(label: String, started_at: Instant) -> Self {
        Self {
            label,
            started_at,
            stopped_at: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Instant> {
        self.stopped_at
    }

    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// Elapsed time so far, or the final duration once stopped
    pub fn elapsed(&self) -> Duration {
        match self.stopped_at {
            Some(stopped) => stopped.saturating_duration_since(self.started_at),
            None => self.started_at.elapsed(),
        }
    }

    /// Stop the context. Stopping twice keeps the first stop time.
    pub fn stop(&mut self) -> Duration {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(Instant::now());
        }
        self.elapsed()
    }
}

/// Token returned by [`NavigationTimer::start`]
#[derive(Debug)]
pub struct TimingHandle {
    context: TimingContext,
}

impl TimingHandle {
    /// Start a standalone handle that is not tied to any shared slot
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            context: TimingContext::started(label.into(), Instant::now()),
        }
    }

    pub fn label(&self) -> &str {
        self.context.label()
    }

    pub fn started_at(&self) -> Instant {
        self.context.started_at()
    }

    pub fn elapsed(&self) -> Duration {
        self.context.elapsed()
    }

    /// Stop and consume the handle
    pub fn stop(mut self) -> Duration {
        let elapsed = self.context.stop();
        debug!("{} stopped after {} ms", self.context.label, duration_millis(elapsed));
        elapsed
    }
}

/// Single-slot timer shared across the calls of one scenario.
///
/// Starting while a context is active replaces it. The replacement is logged
/// and counted so that overlapping timed sections are visible rather than
/// silently lost.
#[derive(Debug, Default)]
pub struct NavigationTimer {
    active: Option<TimingContext>,
    overwrites: u64,
}

impl NavigationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current instant against `label` and return a handle
    /// carrying the same start instant.
    pub fn start(&mut self, label: impl Into<String>) -> TimingHandle {
        let label = label.into();
        let now = Instant::now();

        let previous = self
            .active
            .replace(TimingContext::started(label.clone(), now));
        if let Some(previous) = previous {
            self.overwrites += 1;
            warn!(
                "Timer for '{}' started while '{}' was still running ({} ms); the earlier context is discarded",
                label,
                previous.label,
                duration_millis(previous.elapsed())
            );
        }

        TimingHandle {
            context: TimingContext::started(label, now),
        }
    }

    /// Elapsed time since the most recent `start`, clearing the slot.
    /// Returns [`Duration::ZERO`] when nothing is running.
    pub fn stop_duration(&mut self) -> Duration {
        match self.active.take() {
            Some(mut context) => context.stop(),
            None => Duration::ZERO,
        }
    }

    pub fn active_label(&self) -> Option<&str> {
        self.active.as_ref().map(TimingContext::label)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Number of times a running context was replaced by a new `start`
    pub fn overwrites(&self) -> u64 {
        self.overwrites
    }
}

/// Milliseconds elapsed since `start`
pub fn elapsed_millis_since(start: Instant) -> u64 {
    duration_millis(start.elapsed())
}

/// Prefer the timer's value; fall back to the caller's own delta when the
/// timer reports zero (never started, or already stopped elsewhere).
pub fn resolve_elapsed(timer: Duration, fallback_start: Instant) -> Duration {
    if timer.is_zero() {
        fallback_start.elapsed()
    } else {
        timer
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Seconds with two decimals, for display only
pub fn format_seconds(millis: u64) -> String {
    format!("{:.2}", millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_stop_without_start_is_zero() {
        let mut timer = NavigationTimer::new();
        assert_eq!(timer.stop_duration(), Duration::ZERO);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stop_duration_measures_elapsed() {
        let mut timer = NavigationTimer::new();
        timer.start("Compliance");
        sleep(Duration::from_millis(2300));
        let elapsed = duration_millis(timer.stop_duration());

        assert!(elapsed >= 2300, "elapsed {} ms", elapsed);
        assert!(elapsed < 2300 + 500, "elapsed {} ms", elapsed);
    }

    #[test]
    fn test_stop_clears_the_slot() {
        let mut timer = NavigationTimer::new();
        timer.start("Home");
        assert_eq!(timer.active_label(), Some("Home"));

        timer.stop_duration();
        assert_eq!(timer.active_label(), None);
        assert_eq!(timer.stop_duration(), Duration::ZERO);
    }

    #[test]
    fn test_restart_overwrites_and_is_counted() {
        let mut timer = NavigationTimer::new();
        timer.start("Archive");
        sleep(Duration::from_millis(40));
        timer.start("Archive → Toast");

        assert_eq!(timer.overwrites(), 1);
        assert_eq!(timer.active_label(), Some("Archive → Toast"));

        // Measured from the second start, not the first
        let elapsed = duration_millis(timer.stop_duration());
        assert!(elapsed < 40, "elapsed {} ms", elapsed);
    }

    #[test]
    fn test_handles_do_not_clobber_each_other() {
        let mut timer = NavigationTimer::new();
        let outer = timer.start("Reports");
        sleep(Duration::from_millis(30));
        let inner = timer.start("Reports → Download");

        let inner_elapsed = inner.stop();
        let outer_elapsed = outer.stop();
        assert!(outer_elapsed >= Duration::from_millis(30));
        assert!(outer_elapsed > inner_elapsed);
    }

    #[test]
    fn test_context_stop_is_sticky() {
        let mut ctx = TimingContext::started("FAQs".to_string(), Instant::now());
        let first = ctx.stop();
        sleep(Duration::from_millis(10));
        assert_eq!(ctx.stop(), first);
        assert!(!ctx.is_running());
    }

    #[test]
    fn test_resolve_elapsed_falls_back_on_zero() {
        let fallback = Instant::now();
        sleep(Duration::from_millis(30));
        assert!(resolve_elapsed(Duration::ZERO, fallback) >= Duration::from_millis(30));
        assert_eq!(
            resolve_elapsed(Duration::from_millis(7), fallback),
            Duration::from_millis(7)
        );
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(9000), "9.00");
        assert_eq!(format_seconds(2346), "2.35");
        assert_eq!(format_seconds(0), "0.00");
    }
}
