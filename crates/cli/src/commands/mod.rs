//! CLI Commands

pub mod classify;
pub mod run;
pub mod thresholds;
