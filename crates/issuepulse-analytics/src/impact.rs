//! Cross-area impact analysis.
//!
//! Finds issues carrying two or more distinct `area/` labels, ranks them by
//! how many areas they touch, and tabulates how often each area appears in
//! those multi-area issues, with a monthly creation timeline.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use issuepulse_core::{Issue, IssueState, TimeWindow};

use crate::classify;

/// An issue touching two or more areas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAreaIssue {
    /// Issue number.
    pub id: u64,
    /// Issue title.
    pub title: String,
    /// Open/closed state.
    pub state: IssueState,
    /// User who opened the issue.
    pub creator: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Distinct area labels, first-seen order.
    pub area_labels: Vec<String>,
    /// Number of distinct areas.
    pub area_count: usize,
}

/// How many multi-area issues an area appears in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaFrequency {
    /// Area label.
    pub area: String,
    /// Multi-area issues containing it.
    pub issues: usize,
}

/// One month's count of newly created multi-area issues.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCount {
    /// Month in `YYYY-MM` form.
    pub period: String,
    /// Multi-area issues created in that month.
    pub count: usize,
}

/// Distribution of areas-per-issue among multi-area issues.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCountBucket {
    /// Distinct area count.
    pub areas: usize,
    /// Issues with exactly that many areas.
    pub issues: usize,
}

/// Aggregate statistics over the multi-area set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    /// Issues with at least two distinct areas.
    pub impacted_issues: usize,
    /// Distinct areas appearing across multi-area issues.
    pub total_areas: usize,
    /// Mean distinct-area count per impacted issue.
    pub avg_areas_per_issue: f64,
    /// Largest distinct-area count observed.
    pub max_area_count: usize,
}

/// Open/closed split of the multi-area set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactStates {
    /// Open multi-area issues.
    pub open: usize,
    /// Closed multi-area issues.
    pub closed: usize,
}

/// Multi-area impact for a window.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::impact::analyze_impact;
/// use issuepulse_core::TimeWindow;
///
/// let report = analyze_impact(&[], TimeWindow::all_time());
/// assert!(report.ranked.is_empty());
/// assert_eq!(report.summary.max_area_count, 0);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Multi-area issues, widest impact first, ties by id ascending.
    pub ranked: Vec<MultiAreaIssue>,
    /// Per-area appearance counts, sorted count descending then area name.
    pub area_frequency: Vec<AreaFrequency>,
    /// Aggregate statistics.
    pub summary: ImpactSummary,
    /// Monthly creation counts, ascending, zero-filled across the observed span.
    pub timeline: Vec<PeriodCount>,
    /// Areas-per-issue histogram, ascending by area count.
    pub histogram: Vec<AreaCountBucket>,
    /// Open/closed split of the multi-area set.
    pub states: ImpactStates,
}

/// Analyze multi-area impact for issues created inside `window`.
///
/// Only issues with two or more distinct area labels are ranked or counted;
/// an area appearing solely in single-area issues never shows up in
/// `area_frequency`.
pub fn analyze_impact(issues: &[Issue], window: TimeWindow) -> ImpactReport {
    let mut ranked: Vec<MultiAreaIssue> = Vec::new();
    let mut frequency: HashMap<String, usize> = HashMap::new();

    for issue in issues {
        if !window.contains(issue.created_at) {
            continue;
        }
        let areas = classify::area_labels(&issue.labels);
        if areas.len() < 2 {
            continue;
        }
        for area in &areas {
            *frequency.entry(area.clone()).or_default() += 1;
        }
        ranked.push(MultiAreaIssue {
            id: issue.id,
            title: issue.title.clone(),
            state: issue.state,
            creator: issue.creator.clone(),
            created_at: issue.created_at,
            area_count: areas.len(),
            area_labels: areas,
        });
    }

    ranked.sort_by(|a, b| {
        b.area_count
            .cmp(&a.area_count)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut area_frequency: Vec<AreaFrequency> = frequency
        .into_iter()
        .map(|(area, issues)| AreaFrequency { area, issues })
        .collect();
    area_frequency.sort_by(|a, b| b.issues.cmp(&a.issues).then_with(|| a.area.cmp(&b.area)));

    let impacted = ranked.len();
    let total_area_count: usize = ranked.iter().map(|i| i.area_count).sum();
    let summary = ImpactSummary {
        impacted_issues: impacted,
        total_areas: area_frequency.len(),
        avg_areas_per_issue: if impacted > 0 {
            total_area_count as f64 / impacted as f64
        } else {
            0.0
        },
        max_area_count: ranked.first().map(|i| i.area_count).unwrap_or(0),
    };

    let timeline = monthly_timeline(&ranked);
    let histogram = area_histogram(&ranked);
    let states = ImpactStates {
        open: ranked.iter().filter(|i| i.state == IssueState::Open).count(),
        closed: ranked
            .iter()
            .filter(|i| i.state == IssueState::Closed)
            .count(),
    };

    ImpactReport {
        ranked,
        area_frequency,
        summary,
        timeline,
        histogram,
        states,
    }
}

/// Monthly counts across the observed span, zero-filled so a chart axis is
/// continuous even when some months saw no multi-area issues.
fn monthly_timeline(ranked: &[MultiAreaIssue]) -> Vec<PeriodCount> {
    if ranked.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<(i32, u32), usize> = HashMap::new();
    for issue in ranked {
        let key = (issue.created_at.year(), issue.created_at.month());
        *counts.entry(key).or_default() += 1;
    }

    let first = counts.keys().min().copied().unwrap_or((0, 1));
    let last = counts.keys().max().copied().unwrap_or((0, 1));

    let mut timeline = Vec::new();
    let mut cursor = first;
    loop {
        timeline.push(PeriodCount {
            period: format!("{:04}-{:02}", cursor.0, cursor.1),
            count: counts.get(&cursor).copied().unwrap_or(0),
        });
        if cursor == last {
            break;
        }
        cursor = if cursor.1 == 12 {
            (cursor.0 + 1, 1)
        } else {
            (cursor.0, cursor.1 + 1)
        };
    }
    timeline
}

fn area_histogram(ranked: &[MultiAreaIssue]) -> Vec<AreaCountBucket> {
    let mut buckets: HashMap<usize, usize> = HashMap::new();
    for issue in ranked {
        *buckets.entry(issue.area_count).or_default() += 1;
    }
    let mut histogram: Vec<AreaCountBucket> = buckets
        .into_iter()
        .map(|(areas, issues)| AreaCountBucket { areas, issues })
        .collect();
    histogram.sort_by_key(|b| b.areas);
    histogram
}

impl fmt::Display for ImpactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Multi-Area Impact")?;
        writeln!(f, "{:-<72}", "")?;
        writeln!(f, "  Impacted issues:     {}", self.summary.impacted_issues)?;
        writeln!(f, "  Distinct areas:      {}", self.summary.total_areas)?;
        writeln!(
            f,
            "  Avg areas per issue: {:.2}",
            self.summary.avg_areas_per_issue
        )?;
        writeln!(f, "  Max areas on one:    {}", self.summary.max_area_count)?;
        writeln!(
            f,
            "  State split:         {} open / {} closed",
            self.states.open, self.states.closed
        )?;

        if self.ranked.is_empty() {
            writeln!(f, "\n  No multi-area issues in the selected window.")?;
            return Ok(());
        }

        writeln!(f, "\nWidest impact:")?;
        for issue in &self.ranked {
            writeln!(
                f,
                "  #{:<7} {} areas  [{}]  {}",
                issue.id,
                issue.area_count,
                issue.area_labels.join(", "),
                issue.title,
            )?;
        }

        writeln!(f, "\nMost impacted areas:")?;
        for freq in &self.area_frequency {
            writeln!(f, "  {:<24} {}", freq.area, freq.issues)?;
        }

        writeln!(f, "\nTimeline (issues created per month):")?;
        for period in &self.timeline {
            writeln!(f, "  {}  {}", period.period, period.count)?;
        }
        Ok(())
    }
}

impl ImpactReport {
    /// Render the report as markdown tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use issuepulse_analytics::impact::analyze_impact;
    /// use issuepulse_core::TimeWindow;
    ///
    /// let report = analyze_impact(&[], TimeWindow::all_time());
    /// assert!(report.to_markdown().contains("# Multi-Area Impact"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Multi-Area Impact\n\n");
        out.push_str(&format!(
            "**Impacted issues:** {} | **Distinct areas:** {} | **Avg areas/issue:** {:.2}\n\n",
            self.summary.impacted_issues, self.summary.total_areas, self.summary.avg_areas_per_issue
        ));

        if self.ranked.is_empty() {
            out.push_str("No multi-area issues in the selected window.\n");
            return out;
        }

        out.push_str("| Issue | Areas | Labels | State | Title |\n");
        out.push_str("|-------|-------|--------|-------|-------|\n");
        for issue in &self.ranked {
            out.push_str(&format!(
                "| #{} | {} | {} | {} | {} |\n",
                issue.id,
                issue.area_count,
                issue.area_labels.join(", "),
                issue.state,
                issue.title,
            ));
        }

        out.push_str("\n## Area Frequency\n\n");
        out.push_str("| Area | Issues |\n");
        out.push_str("|------|--------|\n");
        for freq in &self.area_frequency {
            out.push_str(&format!("| {} | {} |\n", freq.area, freq.issues));
        }
        out
    }
}
