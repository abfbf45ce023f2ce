//! Step outcome

use serde::{Deserialize, Serialize};

/// What a step function reports back to the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Skipped(String),
    Failed(Vec<String>),
}

impl StepOutcome {
    /// `Completed` for no errors, `Failed` otherwise
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            StepOutcome::Completed
        } else {
            StepOutcome::Failed(errors)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        StepOutcome::Failed(vec![error.into()])
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped(reason.into())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            StepOutcome::Failed(errors) => errors,
            _ => &[],
        }
    }

    /// Combine with a later outcome from the same step. Failures accumulate,
    /// and a skip only survives when nothing failed.
    pub fn merge(self, other: StepOutcome) -> StepOutcome {
        match (self, other) {
            (StepOutcome::Failed(mut a), StepOutcome::Failed(b)) => {
                a.extend(b);
                StepOutcome::Failed(a)
            }
            (failed @ StepOutcome::Failed(_), _) | (_, failed @ StepOutcome::Failed(_)) => failed,
            (skipped @ StepOutcome::Skipped(_), _) | (_, skipped @ StepOutcome::Skipped(_)) => skipped,
            _ => StepOutcome::Completed,
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Completed => write!(f, "completed"),
            StepOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            StepOutcome::Failed(errors) => write!(f, "failed: {}", errors.join("; ")),
        }
    }
}
