//! Record store: loads a static JSON issue export into typed records.
//!
//! Parses the export once at the boundary into [`issuepulse_core::Issue`]
//! values so every downstream analysis can rely on their shape. Malformed
//! records are dropped and tallied, never silently ignored and never fatal.

mod loader;

pub use loader::{load_issues, parse_issues, LoadStats};
