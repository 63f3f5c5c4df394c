//! Shared plumbing for the detkit binaries.

pub mod cli;
pub mod config;
pub mod export;
pub mod inspect;
pub mod logging;
pub mod registry;
pub mod train;

/// Banner rule used by every report.
pub const RULE: &str = "============================================================";
