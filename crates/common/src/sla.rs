//! SLA classification of elapsed times
//!
//! Every timed operation (page navigation, panel load, button response,
//! multi-page fetch loops) is classified the same way: the elapsed
//! milliseconds are compared against an ordered set of thresholds and the
//! result is one of [`SlaLevel::Ok`], [`SlaLevel::Warn`] or
//! [`SlaLevel::Fail`], plus a human-readable message.
//!
//! Comparisons are on raw integer milliseconds; seconds only appear in
//! messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::timer::format_seconds;

/// Outcome level of a classification, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaLevel {
    Ok,
    Warn,
    Fail,
}

impl std::fmt::Display for SlaLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SlaLevel::Ok => "OK",
            SlaLevel::Warn => "WARN",
            SlaLevel::Fail => "FAIL",
        };
        write!(f, "{}", s)
    }
}

/// Warn/fail pair for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaThresholds {
    warn_ms: u64,
    fail_ms: u64,
}

impl SlaThresholds {
    /// Build a threshold pair, rejecting `fail_ms < warn_ms`
    pub fn new(warn_ms: u64, fail_ms: u64) -> Result<Self> {
        if fail_ms < warn_ms {
            return Err(Error::InvalidThresholds {
                profile: "custom".to_string(),
                warn_ms,
                fail_ms,
            });
        }
        Ok(Self { warn_ms, fail_ms })
    }

    pub fn warn_ms(&self) -> u64 {
        self.warn_ms
    }

    pub fn fail_ms(&self) -> u64 {
        self.fail_ms
    }

    pub fn bands(&self) -> SlaBands {
        SlaBands::empty()
            .warn("warn", self.warn_ms)
            .fail("fail", self.fail_ms)
    }

    pub fn classify(&self, elapsed_ms: u64, label: &str) -> Classification {
        self.bands().classify(elapsed_ms, label)
    }
}

/// A single threshold with the level it escalates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub threshold_ms: u64,
    pub level: SlaLevel,
}

/// Ordered set of thresholds.
///
/// Bands are kept sorted by threshold. The winning band for an elapsed time is
/// the most severe band it has reached, and among equally severe bands the one
/// with the highest threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaBands {
    bands: Vec<Band>,
}

impl SlaBands {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a non-fatal band
    pub fn warn(self, name: impl Into<String>, threshold_ms: u64) -> Self {
        self.with_band(Band {
            name: name.into(),
            threshold_ms,
            level: SlaLevel::Warn,
        })
    }

    /// Add a failing band
    pub fn fail(self, name: impl Into<String>, threshold_ms: u64) -> Self {
        self.with_band(Band {
            name: name.into(),
            threshold_ms,
            level: SlaLevel::Fail,
        })
    }

    fn with_band(mut self, band: Band) -> Self {
        self.bands.push(band);
        self.bands
            .sort_by_key(|b| (b.threshold_ms, b.level));
        self
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Bands already reached at `elapsed_ms`, lowest threshold first
    pub fn crossed(&self, elapsed_ms: u64) -> impl Iterator<Item = &Band> {
        self.bands
            .iter()
            .filter(move |b| elapsed_ms >= b.threshold_ms)
    }

    /// Lowest threshold that has not been reached yet
    pub fn next_threshold(&self, elapsed_ms: u64) -> Option<u64> {
        self.bands
            .iter()
            .map(|b| b.threshold_ms)
            .find(|&t| elapsed_ms < t)
    }

    /// Highest threshold that fails, if any
    pub fn fail_threshold(&self) -> Option<u64> {
        self.bands
            .iter()
            .rev()
            .find(|b| b.level == SlaLevel::Fail)
            .map(|b| b.threshold_ms)
    }

    pub fn progress(&self, elapsed_ms: u64) -> BandProgress {
        BandProgress {
            elapsed_ms,
            crossed: self.crossed(elapsed_ms).map(|b| b.name.clone()).collect(),
        }
    }

    pub fn classify(&self, elapsed_ms: u64, label: &str) -> Classification {
        let winner = self
            .crossed(elapsed_ms)
            .max_by_key(|b| (b.level, b.threshold_ms));

        let secs = format_seconds(elapsed_ms);
        match winner {
            None => Classification {
                label: label.to_string(),
                level: SlaLevel::Ok,
                elapsed_ms,
                band: None,
                next_threshold_ms: self.next_threshold(elapsed_ms),
                message: None,
            },
            Some(band) => {
                let limit = band.threshold_ms / 1000;
                let message = match band.level {
                    SlaLevel::Fail => format!(
                        "{} took {} s — more than {} s. Failing (SLA {}s).",
                        label, secs, limit, limit
                    ),
                    _ => format!("{} took {} s — more than {} s.", label, secs, limit),
                };
                Classification {
                    label: label.to_string(),
                    level: band.level,
                    elapsed_ms,
                    band: Some(band.clone()),
                    next_threshold_ms: self.next_threshold(elapsed_ms),
                    message: Some(message),
                }
            }
        }
    }
}

/// Which bands a wait has already gone past
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandProgress {
    pub elapsed_ms: u64,
    pub crossed: Vec<String>,
}

impl BandProgress {
    pub fn has_crossed(&self, band: &str) -> bool {
        self.crossed.iter().any(|b| b == band)
    }
}

/// Result of classifying one timed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub level: SlaLevel,
    pub elapsed_ms: u64,
    /// Band that decided the level; `None` when within all thresholds
    pub band: Option<Band>,
    pub next_threshold_ms: Option<u64>,
    /// Present for WARN and FAIL
    pub message: Option<String>,
}

impl Classification {
    pub fn is_ok(&self) -> bool {
        self.level == SlaLevel::Ok
    }

    pub fn is_warn(&self) -> bool {
        self.level == SlaLevel::Warn
    }

    pub fn is_fail(&self) -> bool {
        self.level == SlaLevel::Fail
    }

    pub fn band_name(&self) -> Option<&str> {
        self.band.as_ref().map(|b| b.name.as_str())
    }

    pub fn elapsed_seconds(&self) -> String {
        format_seconds(self.elapsed_ms)
    }

    /// One line suitable for logs, for every level
    pub fn summary(&self) -> String {
        match (&self.message, self.next_threshold_ms) {
            (Some(message), _) => message.clone(),
            (None, Some(limit)) => format!(
                "{} completed in {} s (≤ {} s).",
                self.label,
                self.elapsed_seconds(),
                limit / 1000
            ),
            (None, None) => format!("{} completed in {} s.", self.label, self.elapsed_seconds()),
        }
    }

    /// Hard-failure style: FAIL becomes an error, WARN and OK pass through
    pub fn into_result(self) -> std::result::Result<Self, SlaBreach> {
        match (self.level, &self.band) {
            (SlaLevel::Fail, Some(band)) => Err(SlaBreach {
                label: self.label.clone(),
                elapsed_ms: self.elapsed_ms,
                threshold_ms: band.threshold_ms,
                message: self.summary(),
            }),
            _ => Ok(self),
        }
    }
}

/// A FAIL classification raised as an error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SlaBreach {
    pub label: String,
    pub elapsed_ms: u64,
    pub threshold_ms: u64,
    pub message: String,
}

/// Classify against a single warn/fail pair
pub fn classify(elapsed_ms: u64, warn_ms: u64, fail_ms: u64, label: &str) -> Classification {
    SlaBands::empty()
        .warn("warn", warn_ms)
        .fail("fail", fail_ms)
        .classify(elapsed_ms, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_started() -> SlaBands {
        SlaBands::empty()
            .warn("warn1", 60_000)
            .warn("warn2", 90_000)
            .fail("fail", 150_000)
    }

    #[test]
    fn test_home_within_sla() {
        let c = classify(5000, 8000, 15000, "Home");
        assert_eq!(c.level, SlaLevel::Ok);
        assert!(c.message.is_none());
        assert_eq!(c.summary(), "Home completed in 5.00 s (≤ 8 s).");
    }

    #[test]
    fn test_home_warn() {
        let c = classify(9000, 8000, 15000, "Home");
        assert_eq!(c.level, SlaLevel::Warn);
        let msg = c.message.unwrap();
        assert!(msg.contains("more than 8 s"), "{}", msg);
        assert_eq!(msg, "Home took 9.00 s — more than 8 s.");
    }

    #[test]
    fn test_home_fail() {
        let c = classify(16000, 8000, 15000, "Home");
        assert_eq!(c.level, SlaLevel::Fail);
        let msg = c.message.unwrap();
        assert!(msg.contains("more than 15 s"), "{}", msg);
        assert_eq!(msg, "Home took 16.00 s — more than 15 s. Failing (SLA 15s).");
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(classify(7999, 8000, 15000, "x").level, SlaLevel::Ok);
        assert_eq!(classify(8000, 8000, 15000, "x").level, SlaLevel::Warn);
        assert_eq!(classify(14999, 8000, 15000, "x").level, SlaLevel::Warn);
        assert_eq!(classify(15000, 8000, 15000, "x").level, SlaLevel::Fail);
    }

    #[test]
    fn test_ranges_over_a_grid() {
        let (warn, fail) = (10_000u64, 60_000u64);
        for elapsed in (0..80_000).step_by(250) {
            let c = classify(elapsed, warn, fail, "Reports");
            let expected = if elapsed >= fail {
                SlaLevel::Fail
            } else if elapsed >= warn {
                SlaLevel::Warn
            } else {
                SlaLevel::Ok
            };
            assert_eq!(c.level, expected, "elapsed {}", elapsed);
        }
    }

    #[test]
    fn test_equal_warn_and_fail_fails() {
        let c = classify(10_000, 10_000, 10_000, "Login");
        assert_eq!(c.level, SlaLevel::Fail);
    }

    #[test]
    fn test_multi_band_get_started() {
        let bands = get_started();

        let c = bands.classify(95_000, "Get Started → Mandatory Compliances");
        assert_eq!(c.level, SlaLevel::Warn);
        assert_eq!(c.band_name(), Some("warn2"));
        assert!(c.message.as_deref().unwrap().contains("more than 90 s"));

        let c = bands.classify(61_000, "Get Started");
        assert_eq!(c.band_name(), Some("warn1"));

        let c = bands.classify(151_000, "Get Started");
        assert_eq!(c.level, SlaLevel::Fail);
        assert_eq!(c.band_name(), Some("fail"));
        assert!(c.message.as_deref().unwrap().contains("Failing (SLA 150s)"));
    }

    #[test]
    fn test_band_insertion_order_does_not_matter() {
        let shuffled = SlaBands::empty()
            .fail("fail", 150_000)
            .warn("warn2", 90_000)
            .warn("warn1", 60_000);
        assert_eq!(shuffled, get_started());
    }

    #[test]
    fn test_progress_reports_crossed_bands() {
        let progress = get_started().progress(100_000);
        assert!(progress.has_crossed("warn1"));
        assert!(progress.has_crossed("warn2"));
        assert!(!progress.has_crossed("fail"));
    }

    #[test]
    fn test_next_and_fail_threshold() {
        let bands = get_started();
        assert_eq!(bands.next_threshold(70_000), Some(90_000));
        assert_eq!(bands.next_threshold(200_000), None);
        assert_eq!(bands.fail_threshold(), Some(150_000));
        assert_eq!(SlaBands::empty().fail_threshold(), None);
    }

    #[test]
    fn test_into_result_only_rejects_fail() {
        assert!(classify(9000, 8000, 15000, "Home").into_result().is_ok());
        let breach = classify(16000, 8000, 15000, "Home")
            .into_result()
            .unwrap_err();
        assert_eq!(breach.threshold_ms, 15000);
        assert!(breach.to_string().contains("Failing (SLA 15s)"));
    }

    #[test]
    fn test_thresholds_reject_inverted_pair() {
        assert!(SlaThresholds::new(20_000, 10_000).is_err());
        let t = SlaThresholds::new(10_000, 20_000).unwrap();
        assert_eq!(t.classify(12_000, "FAQs").level, SlaLevel::Warn);
    }

    #[test]
    fn test_empty_bands_always_ok() {
        let c = SlaBands::empty().classify(u64::MAX, "anything");
        assert!(c.is_ok());
        assert_eq!(c.summary(), format!("anything completed in {} s.", c.elapsed_seconds()));
    }
}
