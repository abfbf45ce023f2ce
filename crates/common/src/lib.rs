//! stepwatch common library
//!
//! Navigation timing, SLA classification and soft-assertion aggregation for
//! browser acceptance tests, plus the configuration and evidence plumbing they
//! share.

pub mod config;
pub mod error;
pub mod evidence;
pub mod outcome;
pub mod pagination;
pub mod report;
pub mod sla;
pub mod soft;
pub mod timer;

// Re-export commonly used types
pub use config::{Profile, ThresholdConfig};
pub use error::{Error, Result};
pub use evidence::{DirectorySink, EvidenceSink, MemorySink, NoopSink};
pub use outcome::StepOutcome;
pub use pagination::{PageNavigationObserver, PageTimings};
pub use report::LoadTimeReporter;
pub use sla::{classify, Classification, SlaBands, SlaBreach, SlaLevel, SlaThresholds};
pub use soft::{SoftAssertionError, SoftAssertions};
pub use timer::{elapsed_millis_since, resolve_elapsed, NavigationTimer, TimingHandle};

/// stepwatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
