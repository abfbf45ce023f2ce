//! Soft assertions
//!
//! A step may run several independent checks (counts match, panel visible,
//! load time within SLA). [`SoftAssertions`] records every failure instead of
//! stopping at the first one, and reports them together at the end of the
//! step. One collector is created per step invocation.

use std::fmt::Debug;
use thiserror::Error;
use tracing::debug;

use crate::outcome::StepOutcome;
use crate::sla::Classification;

/// Every failure recorded during one step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The following asserts failed:\n\t{}", .failures.join(",\n\t"))]
pub struct SoftAssertionError {
    pub failures: Vec<String>,
}

/// Deferred failure log for one step
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<String>,
}

impl SoftAssertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("soft failure recorded: {}", message);
        self.failures.push(message);
    }

    /// Record `message` unless `condition` holds. Returns `condition`.
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.fail(message);
        }
        condition
    }

    /// Record a mismatch between `actual` and `expected`
    pub fn check_eq<T>(&mut self, actual: T, expected: T, message: &str) -> bool
    where
        T: PartialEq + Debug,
    {
        let equal = actual == expected;
        if !equal {
            self.fail(format!(
                "{} expected [{:?}] but found [{:?}]",
                message, expected, actual
            ));
        }
        equal
    }

    /// Record a FAIL classification. WARN and OK are never recorded.
    pub fn record(&mut self, classification: &Classification) -> bool {
        if !classification.is_fail() {
            return false;
        }
        self.fail(classification.summary());
        true
    }

    pub fn extend<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.fail(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.failures
    }

    /// Drain the log. Errors with every recorded message, in order, if any
    /// were recorded; calling again afterwards is a no-op.
    pub fn assert_all(&mut self) -> Result<(), SoftAssertionError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(SoftAssertionError {
            failures: std::mem::take(&mut self.failures),
        })
    }

    /// Convert the recorded entries into a step outcome
    pub fn finish(self) -> StepOutcome {
        StepOutcome::from_errors(self.failures)
    }
}
