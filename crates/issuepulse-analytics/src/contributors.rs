//! Contributor activity ranking.
//!
//! Tallies per-user issue creation, closing, and commenting actions across
//! the whole collection and ranks contributors by total activity.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use issuepulse_core::{EventKind, Issue};

/// Activity counts for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorActivity {
    /// User identifier.
    pub user: String,
    /// Issues this user opened.
    pub created: usize,
    /// `closed` events this user performed.
    pub closed: usize,
    /// `commented` events this user performed.
    pub commented: usize,
    /// Sum of the three counts.
    pub total: usize,
}

/// Contributors ranked by total activity.
///
/// Users with zero recorded activity never appear; ties are broken by user
/// identifier ascending.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::contributors::rank_contributors;
///
/// let report = rank_contributors(&[]);
/// assert!(report.ranked.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorReport {
    /// Contributors, most active first.
    pub ranked: Vec<ContributorActivity>,
}

/// Rank contributors by created + closed + commented counts.
pub fn rank_contributors(issues: &[Issue]) -> ContributorReport {
    #[derive(Default)]
    struct Tally {
        created: usize,
        closed: usize,
        commented: usize,
    }

    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for issue in issues {
        if !issue.creator.is_empty() {
            tallies.entry(issue.creator.clone()).or_default().created += 1;
        }
        for event in &issue.events {
            if event.actor.is_empty() {
                continue;
            }
            match event.kind {
                EventKind::Closed => {
                    tallies.entry(event.actor.clone()).or_default().closed += 1;
                }
                EventKind::Commented => {
                    tallies.entry(event.actor.clone()).or_default().commented += 1;
                }
                _ => {}
            }
        }
    }

    let mut ranked: Vec<ContributorActivity> = tallies
        .into_iter()
        .map(|(user, tally)| ContributorActivity {
            user,
            created: tally.created,
            closed: tally.closed,
            commented: tally.commented,
            total: tally.created + tally.closed + tally.commented,
        })
        .filter(|c| c.total > 0)
        .collect();

    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user.cmp(&b.user)));

    ContributorReport { ranked }
}

impl fmt::Display for ContributorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top Contributors")?;
        writeln!(f, "{:-<64}", "")?;
        if self.ranked.is_empty() {
            return writeln!(f, "  No contributor activity recorded.");
        }
        writeln!(
            f,
            "{:<24} {:>8} {:>8} {:>10} {:>7}",
            "User", "Created", "Closed", "Comments", "Total"
        )?;
        for entry in &self.ranked {
            writeln!(
                f,
                "{:<24} {:>8} {:>8} {:>10} {:>7}",
                entry.user, entry.created, entry.closed, entry.commented, entry.total,
            )?;
        }
        Ok(())
    }
}

impl ContributorReport {
    /// Render the report as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Top Contributors\n\n");
        if self.ranked.is_empty() {
            out.push_str("No contributor activity recorded.\n");
            return out;
        }
        out.push_str("| User | Created | Closed | Comments | Total |\n");
        out.push_str("|------|---------|--------|----------|-------|\n");
        for entry in &self.ranked {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                entry.user, entry.created, entry.closed, entry.commented, entry.total,
            ));
        }
        out
    }
}
