//! Classify Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use stepwatch_common::{Classification, SlaThresholds};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Measured duration in milliseconds
    #[arg(long)]
    pub elapsed_ms: u64,

    /// Warning threshold in milliseconds
    #[arg(long, default_value = "10000")]
    pub warn_ms: u64,

    /// Failure threshold in milliseconds
    #[arg(long, default_value = "60000")]
    pub fail_ms: u64,

    /// Label used in the message
    #[arg(long, default_value = "Page")]
    pub label: String,
}

/// Classification display wrapper for serialization
#[derive(Serialize)]
pub struct ClassificationDisplay {
    pub label: String,
    pub level: String,
    pub elapsed_seconds: String,
    pub band: Option<String>,
    pub message: String,
}

impl From<Classification> for ClassificationDisplay {
    fn from(c: Classification) -> Self {
        Self {
            label: c.label.clone(),
            level: c.level.to_string(),
            elapsed_seconds: c.elapsed_seconds(),
            band: c.band_name().map(str::to_string),
            message: c.summary(),
        }
    }
}

impl TableDisplay for ClassificationDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Label", "Level", "Elapsed (s)", "Band", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.level.clone(),
            self.elapsed_seconds.clone(),
            self.band.clone().unwrap_or_else(|| "-".to_string()),
            self.message.clone(),
        ]
    }
}

pub fn classify(args: &ClassifyArgs) -> Result<ClassificationDisplay> {
    let thresholds = SlaThresholds::new(args.warn_ms, args.fail_ms)?;
    Ok(thresholds.classify(args.elapsed_ms, &args.label).into())
}

pub fn execute(args: ClassifyArgs, format: OutputFormat) -> Result<()> {
    let display = classify(&args)?;
    print_item(&display, format);
    Ok(())
}
