//! Issue analytics: activity scoring, categorization, cross-area impact,
//! contributor ranking, and resolution-time trends.
//!
//! Every analysis takes an immutable view of the loaded issue collection
//! (plus a resolved time window where relevant) and returns a fresh,
//! serializable report with text and markdown renderings. Analyses can be
//! invoked in any order or repeatedly without interference; none of them
//! performs I/O.

pub mod activity;
pub mod categories;
pub mod classify;
pub mod contributors;
pub mod impact;
pub mod resolution;
