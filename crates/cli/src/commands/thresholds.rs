//! Thresholds Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use stepwatch_common::{Profile, ThresholdConfig};

use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

const PROFILES: [(&str, Profile); 3] = [
    ("login", Profile::Login),
    ("nav", Profile::Nav),
    ("get_started", Profile::GetStarted),
];

#[derive(Args, Debug, Default)]
pub struct ThresholdsArgs {
    /// TOML threshold file
    #[arg(long, env = "STEPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Properties file with threshold.<profile>.<band>.ms keys
    #[arg(long)]
    pub properties: Option<PathBuf>,

    /// Write the resolved thresholds to this TOML file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// One band of one profile
#[derive(Serialize, Debug)]
pub struct BandDisplay {
    pub profile: String,
    pub band: String,
    pub level: String,
    pub threshold_ms: u64,
}

impl TableDisplay for BandDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Profile", "Band", "Level", "Threshold"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.profile.clone(),
            self.band.clone(),
            self.level.clone(),
            format!("{} ms", self.threshold_ms),
        ]
    }
}

pub fn band_rows(config: &ThresholdConfig) -> Vec<BandDisplay> {
    PROFILES
        .iter()
        .flat_map(|(name, profile)| {
            config
                .bands(*profile)
                .bands()
                .iter()
                .map(|band| BandDisplay {
                    profile: name.to_string(),
                    band: band.name.clone(),
                    level: band.level.to_string(),
                    threshold_ms: band.threshold_ms,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn execute(args: ThresholdsArgs, format: OutputFormat) -> Result<()> {
    let config = ThresholdConfig::resolve(args.config.as_deref(), args.properties.as_deref())?;
    print_list(&band_rows(&config), format);

    if let Some(path) = args.save {
        config.save(&path)?;
        print_success(&format!("Thresholds written to {}", path.display()));
    }
    Ok(())
}
