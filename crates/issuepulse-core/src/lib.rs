//! Core types, configuration, and error handling for issuepulse.
//!
//! This crate provides the shared foundation used by the store and analytics
//! crates:
//! - [`PulseError`] — unified error type using `thiserror`
//! - [`PulseConfig`] — configuration loaded from `.issuepulse.toml`
//! - Domain types: [`Issue`], [`Event`], [`EventKind`], [`IssueState`],
//!   [`Category`], [`OutputFormat`]
//! - Time windows: [`TimeWindow`], [`WindowPreset`]

mod config;
mod error;
mod types;
mod window;

pub use config::{AnalysisConfig, DataConfig, PulseConfig, DATA_ENV_VAR};
pub use error::PulseError;
pub use types::{Category, Event, EventKind, Issue, IssueState, OutputFormat};
pub use window::{TimeWindow, WindowPreset};

/// A convenience `Result` type for issuepulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
