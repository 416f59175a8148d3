//! Cross-event activity scoring.
//!
//! Scores each issue by summing per-event-kind counts normalized against the
//! population maximum for the selected window. The score rewards breadth of
//! engagement over a single dominant signal and is bounded by the number of
//! tracked event kinds.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use issuepulse_core::{Category, EventKind, Issue, IssueState, TimeWindow};

use crate::classify;

/// Optional restrictions on the ranked output.
///
/// Filters narrow which issues are reported; normalization always runs over
/// the full windowed population first, so scores stay population-relative.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilters {
    /// Only report issues in these categories.
    pub categories: Option<Vec<Category>>,
    /// Only report issues whose raw labels contain one of these substrings
    /// (case-insensitive).
    pub label_needles: Option<Vec<String>>,
}

/// One normalized scoring term for a single event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindTerm {
    /// Event kind this term covers.
    pub kind: EventKind,
    /// Raw in-window event count.
    pub count: u32,
    /// `count / max_count(kind)` across the windowed population.
    pub normalized: f64,
}

/// Activity summary for one issue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueActivity {
    /// Issue number.
    pub id: u64,
    /// Issue title.
    pub title: String,
    /// Derived category.
    pub category: Category,
    /// Open/closed state.
    pub state: IssueState,
    /// Raw labels.
    pub labels: Vec<String>,
    /// Sum of normalized terms, in `[0, 6]`.
    pub score: f64,
    /// Per-kind breakdown; kinds with zero in-window events are omitted.
    pub terms: Vec<KindTerm>,
}

/// Ranked activity scores for a window.
///
/// `ranked` covers the whole (filtered) population, score descending with
/// ties broken by issue id ascending; callers apply any top-N cutoff.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::activity::{score_activity, ActivityFilters};
/// use issuepulse_core::TimeWindow;
///
/// let report = score_activity(&[], TimeWindow::all_time(), &ActivityFilters::default());
/// assert!(report.ranked.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    /// Window the scores are valid for. Scores from different windows are
    /// not comparable.
    pub window: TimeWindow,
    /// All scored issues, most active first.
    pub ranked: Vec<IssueActivity>,
}

/// Score every issue's in-window activity.
///
/// Per tracked event kind, an issue's count is divided by the maximum count
/// any issue reached in the window (0 when no issue recorded that kind), and
/// the normalized terms are summed. An issue with no in-window events scores
/// exactly 0 but is still reported.
pub fn score_activity(
    issues: &[Issue],
    window: TimeWindow,
    filters: &ActivityFilters,
) -> ActivityReport {
    let counts: Vec<[u32; EventKind::TRACKED.len()]> = issues
        .iter()
        .map(|issue| count_in_window(issue, window))
        .collect();

    let mut max_counts = [0u32; EventKind::TRACKED.len()];
    for row in &counts {
        for (slot, count) in max_counts.iter_mut().zip(row.iter()) {
            if *count > *slot {
                *slot = *count;
            }
        }
    }

    let mut ranked = Vec::with_capacity(issues.len());
    for (issue, row) in issues.iter().zip(&counts) {
        let category = classify::classify(&issue.labels);
        if !matches_filters(issue, category, filters) {
            continue;
        }

        let mut terms = Vec::new();
        let mut score = 0.0;
        for (slot, kind) in EventKind::TRACKED.iter().enumerate() {
            let count = row[slot];
            let normalized = if max_counts[slot] == 0 {
                0.0
            } else {
                f64::from(count) / f64::from(max_counts[slot])
            };
            score += normalized;
            if count > 0 {
                terms.push(KindTerm {
                    kind: *kind,
                    count,
                    normalized,
                });
            }
        }

        ranked.push(IssueActivity {
            id: issue.id,
            title: issue.title.clone(),
            category,
            state: issue.state,
            labels: issue.labels.clone(),
            score,
            terms,
        });
    }

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    ActivityReport { window, ranked }
}

fn count_in_window(issue: &Issue, window: TimeWindow) -> [u32; EventKind::TRACKED.len()] {
    let mut row = [0u32; EventKind::TRACKED.len()];
    for event in &issue.events {
        if !window.contains(event.timestamp) {
            continue;
        }
        if let Some(slot) = EventKind::TRACKED.iter().position(|k| *k == event.kind) {
            row[slot] += 1;
        }
    }
    row
}

fn matches_filters(issue: &Issue, category: Category, filters: &ActivityFilters) -> bool {
    if let Some(categories) = &filters.categories {
        if !categories.contains(&category) {
            return false;
        }
    }
    if let Some(needles) = &filters.label_needles {
        let lowered: Vec<String> = issue.labels.iter().map(|l| l.to_lowercase()).collect();
        let hit = needles.iter().any(|needle| {
            let needle = needle.to_lowercase();
            lowered.iter().any(|label| label.contains(&needle))
        });
        if !hit {
            return false;
        }
    }
    true
}

fn truncated(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

impl fmt::Display for ActivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Most Active Issues")?;
        writeln!(f, "{:-<88}", "")?;
        if self.ranked.is_empty() {
            return writeln!(f, "  No issues matched the selected window.");
        }
        for (rank, entry) in self.ranked.iter().enumerate() {
            let labels = if entry.labels.is_empty() {
                "-".to_string()
            } else {
                entry
                    .labels
                    .iter()
                    .take(4)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writeln!(
                f,
                "{:>3}. #{:<7} {:>5.2}  {:<10} {:<7} {}",
                rank + 1,
                entry.id,
                entry.score,
                entry.category.to_string(),
                entry.state.to_string(),
                truncated(&entry.title, 48),
            )?;
            writeln!(f, "     labels: {labels}")?;
        }
        Ok(())
    }
}

impl ActivityReport {
    /// Render the report as a markdown table.
    ///
    /// # Examples
    ///
    /// ```
    /// use issuepulse_analytics::activity::{score_activity, ActivityFilters};
    /// use issuepulse_core::TimeWindow;
    ///
    /// let report = score_activity(&[], TimeWindow::all_time(), &ActivityFilters::default());
    /// assert!(report.to_markdown().contains("# Most Active Issues"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Most Active Issues\n\n");
        if self.ranked.is_empty() {
            out.push_str("No issues matched the selected window.\n");
            return out;
        }
        out.push_str("| Rank | Issue | Title | Labels | Category | State | Score |\n");
        out.push_str("|------|-------|-------|--------|----------|-------|-------|\n");
        for (rank, entry) in self.ranked.iter().enumerate() {
            out.push_str(&format!(
                "| {} | #{} | {} | {} | {} | {} | {:.2} |\n",
                rank + 1,
                entry.id,
                truncated(&entry.title, 60),
                entry.labels.iter().take(4).cloned().collect::<Vec<_>>().join(", "),
                entry.category,
                entry.state,
                entry.score,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use issuepulse_core::Event;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn make_issue(id: u64, labels: &[&str], events: Vec<(EventKind, i64)>) -> Issue {
        Issue {
            id,
            title: format!("issue {id}"),
            creator: "alice".into(),
            created_at: day(0),
            closed_at: None,
            state: IssueState::Open,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            events: events
                .into_iter()
                .map(|(kind, offset)| Event {
                    kind,
                    timestamp: day(offset),
                    actor: "alice".into(),
                    label: None,
                })
                .collect(),
        }
    }

    fn full_window() -> TimeWindow {
        TimeWindow {
            start: day(0),
            end: day(30),
        }
    }

    fn repeat(kind: EventKind, times: usize, offset: i64) -> Vec<(EventKind, i64)> {
        std::iter::repeat((kind, offset)).take(times).collect()
    }

    #[test]
    fn three_issue_lifecycle_ranks_by_engagement() {
        let mut e1 = vec![(EventKind::Opened, 0)];
        e1.extend(repeat(EventKind::Commented, 5, 1));
        let mut e2 = vec![(EventKind::Opened, 0)];
        e2.extend(repeat(EventKind::Commented, 1, 1));
        let e3 = vec![(EventKind::Opened, 0)];

        let issues = vec![
            make_issue(1, &[], e1),
            make_issue(2, &[], e2),
            make_issue(3, &[], e3),
        ];

        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        let ids: Vec<u64> = report.ranked.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &report.ranked[0];
        assert!((first.score - 2.0).abs() < f64::EPSILON);
        let comment_term = first
            .terms
            .iter()
            .find(|t| t.kind == EventKind::Commented)
            .unwrap();
        assert!((comment_term.normalized - 1.0).abs() < f64::EPSILON);

        assert!((report.ranked[1].score - 1.2).abs() < 1e-9);
        assert!((report.ranked[2].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scores_are_bounded_by_tracked_kind_count() {
        let mut events = Vec::new();
        for kind in EventKind::TRACKED {
            events.extend(repeat(kind, 3, 1));
        }
        let issues = vec![
            make_issue(1, &[], events),
            make_issue(2, &[], vec![(EventKind::Commented, 1)]),
        ];

        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        for entry in &report.ranked {
            assert!(entry.score >= 0.0);
            assert!(entry.score <= EventKind::TRACKED.len() as f64);
        }
        // The issue leading every kind saturates completely.
        assert!((report.ranked[0].score - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_in_window_events_scores_zero_but_is_reported() {
        let issues = vec![
            make_issue(1, &[], vec![(EventKind::Commented, 50)]),
            make_issue(2, &[], vec![(EventKind::Commented, 5)]),
        ];
        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        assert_eq!(report.ranked.len(), 2);
        let out_of_window = report.ranked.iter().find(|e| e.id == 1).unwrap();
        assert_eq!(out_of_window.score, 0.0);
        assert!(out_of_window.terms.is_empty());
    }

    #[test]
    fn max_count_holder_saturates_to_one() {
        let issues = vec![
            make_issue(1, &[], repeat(EventKind::Labeled, 4, 1)),
            make_issue(2, &[], repeat(EventKind::Labeled, 2, 1)),
        ];
        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        let leader = report.ranked.iter().find(|e| e.id == 1).unwrap();
        let term = leader.terms.iter().find(|t| t.kind == EventKind::Labeled).unwrap();
        assert!((term.normalized - 1.0).abs() < f64::EPSILON);

        let follower = report.ranked.iter().find(|e| e.id == 2).unwrap();
        let term = follower.terms.iter().find(|t| t.kind == EventKind::Labeled).unwrap();
        assert!((term.normalized - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn untracked_event_kinds_are_ignored() {
        let issues = vec![make_issue(1, &[], vec![(EventKind::Other, 1)])];
        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        assert_eq!(report.ranked[0].score, 0.0);
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let issues = vec![
            make_issue(9, &[], vec![(EventKind::Commented, 1)]),
            make_issue(3, &[], vec![(EventKind::Commented, 1)]),
            make_issue(7, &[], vec![(EventKind::Commented, 1)]),
        ];
        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        let ids: Vec<u64> = report.ranked.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 7, 9]);
    }

    #[test]
    fn single_issue_population_saturates_its_own_score() {
        // With one issue, every nonzero count is its own maximum.
        let mut events = vec![(EventKind::Opened, 0)];
        events.extend(repeat(EventKind::Commented, 7, 1));
        let issues = vec![make_issue(1, &[], events)];

        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        let entry = &report.ranked[0];
        assert!((entry.score - 2.0).abs() < f64::EPSILON);
        for term in &entry.terms {
            assert!((term.normalized - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn filters_restrict_output_but_not_normalization() {
        let issues = vec![
            make_issue(1, &["kind/bug"], repeat(EventKind::Commented, 4, 1)),
            make_issue(2, &["enhancement"], repeat(EventKind::Commented, 8, 1)),
        ];
        let filters = ActivityFilters {
            categories: Some(vec![Category::Bug]),
            label_needles: None,
        };
        let report = score_activity(&issues, full_window(), &filters);
        assert_eq!(report.ranked.len(), 1);
        assert_eq!(report.ranked[0].id, 1);
        // Normalized against the unfiltered maximum of 8.
        assert!((report.ranked[0].score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn label_filter_matches_substrings_case_insensitively() {
        let issues = vec![
            make_issue(1, &["area/CLI"], vec![(EventKind::Commented, 1)]),
            make_issue(2, &["area/docs"], vec![(EventKind::Commented, 1)]),
        ];
        let filters = ActivityFilters {
            categories: None,
            label_needles: Some(vec!["cli".into()]),
        };
        let report = score_activity(&issues, full_window(), &filters);
        assert_eq!(report.ranked.len(), 1);
        assert_eq!(report.ranked[0].id, 1);
    }

    #[test]
    fn report_serializes_camel_case() {
        let issues = vec![make_issue(1, &["kind/bug"], vec![(EventKind::Commented, 1)])];
        let report = score_activity(&issues, full_window(), &ActivityFilters::default());
        let json = serde_json::to_value(&report).unwrap();
        let entry = &json["ranked"][0];
        assert!(entry.get("score").is_some());
        assert!(entry["terms"][0].get("normalized").is_some());
    }
}
