//! CLI library components for the neuropsych harvester.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
