//! Stepwatch CLI
//!
//! Command-line interface for classifying load times, inspecting resolved
//! thresholds and running browser scenarios.

pub mod commands;
pub mod output;
