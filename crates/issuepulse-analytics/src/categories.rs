//! Category share and open/closed distribution.
//!
//! Groups windowed issues by derived category, reporting each category's
//! share of the filtered set and its open/closed split. Also breaks down the
//! Other bucket (top raw labels and label families) so the classification
//! rules can be refined by hand.

use std::collections::HashMap;
use std::fmt;

use chrono::Datelike;
use serde::Serialize;

use issuepulse_core::{Category, Issue, IssueState, TimeWindow};

use crate::classify;

/// Optional restrictions, AND-combined.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilters {
    /// Inclusive year range on the creation timestamp.
    pub year_range: Option<(i32, i32)>,
    /// Only count issues in these categories.
    pub categories: Option<Vec<Category>>,
    /// Only count issues whose raw labels contain one of these substrings
    /// (case-insensitive).
    pub label_needles: Option<Vec<String>>,
}

/// One category's slice of the filtered set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    /// Category.
    pub category: Category,
    /// Issues in this category.
    pub count: usize,
    /// `count / total * 100`; 0 when the filtered set is empty.
    pub percent: f64,
}

/// Open/closed split for one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStates {
    /// Category.
    pub category: Category,
    /// Open issues.
    pub open: usize,
    /// Closed issues.
    pub closed: usize,
}

/// A raw label and how many distinct issues carry it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    /// Raw label string.
    pub label: String,
    /// Distinct issues carrying the label.
    pub issues: usize,
}

/// A label family (prefix before the first `/`) inside the Other bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelFamily {
    /// Family prefix, e.g. `status` for `status/triage`.
    pub family: String,
    /// Distinct issues carrying any label of this family.
    pub issues: usize,
    /// Most frequent sublabels within the family (up to 3).
    pub common_sublabels: Vec<LabelCount>,
}

/// Category distribution for a window and filter set.
///
/// `share` and `states` always list all six categories, zero-filled; the
/// shares of a non-empty set sum to 100 (within floating-point tolerance).
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::categories::{aggregate, CategoryFilters};
/// use issuepulse_core::TimeWindow;
///
/// let report = aggregate(&[], TimeWindow::all_time(), &CategoryFilters::default(), 10);
/// assert_eq!(report.share.len(), 6);
/// assert_eq!(report.total_issues, 0);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    /// Issues in the filtered set.
    pub total_issues: usize,
    /// Percentage share per category, all six reported.
    pub share: Vec<CategoryShare>,
    /// Open/closed counts per category, all six reported.
    pub states: Vec<CategoryStates>,
    /// Top raw labels inside the Other bucket (pre allow-list filters).
    pub other_labels: Vec<LabelCount>,
    /// Top label families inside the Other bucket (pre allow-list filters).
    pub other_families: Vec<LabelFamily>,
}

/// Aggregate category shares and state distribution.
///
/// An issue belongs to the window if its creation timestamp or any of its
/// event timestamps falls inside it. The Other breakdown is computed from
/// the windowed, year-filtered set before the category and label allow-lists
/// are applied, so it always describes the full period.
pub fn aggregate(
    issues: &[Issue],
    window: TimeWindow,
    filters: &CategoryFilters,
    other_top_k: usize,
) -> CategoryReport {
    let windowed: Vec<&Issue> = issues
        .iter()
        .filter(|issue| in_window(issue, window))
        .filter(|issue| year_matches(issue, filters.year_range))
        .collect();

    let other_issues: Vec<&Issue> = windowed
        .iter()
        .copied()
        .filter(|issue| classify::classify(&issue.labels) == Category::Other)
        .collect();
    let (other_labels, other_families) = other_breakdown(&other_issues, other_top_k);

    let filtered: Vec<(&Issue, Category)> = windowed
        .into_iter()
        .map(|issue| (issue, classify::classify(&issue.labels)))
        .filter(|(issue, category)| allow_listed(issue, *category, filters))
        .collect();

    let total = filtered.len();
    let mut counts: HashMap<Category, usize> = HashMap::new();
    let mut open_counts: HashMap<Category, usize> = HashMap::new();
    let mut closed_counts: HashMap<Category, usize> = HashMap::new();
    for (issue, category) in &filtered {
        *counts.entry(*category).or_default() += 1;
        match issue.state {
            IssueState::Open => *open_counts.entry(*category).or_default() += 1,
            IssueState::Closed => *closed_counts.entry(*category).or_default() += 1,
        }
    }

    let share = Category::ALL
        .iter()
        .map(|category| {
            let count = counts.get(category).copied().unwrap_or(0);
            let percent = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            CategoryShare {
                category: *category,
                count,
                percent,
            }
        })
        .collect();

    let states = Category::ALL
        .iter()
        .map(|category| CategoryStates {
            category: *category,
            open: open_counts.get(category).copied().unwrap_or(0),
            closed: closed_counts.get(category).copied().unwrap_or(0),
        })
        .collect();

    CategoryReport {
        total_issues: total,
        share,
        states,
        other_labels,
        other_families,
    }
}

fn in_window(issue: &Issue, window: TimeWindow) -> bool {
    window.contains(issue.created_at)
        || issue
            .events
            .iter()
            .any(|event| window.contains(event.timestamp))
}

fn year_matches(issue: &Issue, year_range: Option<(i32, i32)>) -> bool {
    match year_range {
        Some((start, end)) => {
            let year = issue.created_at.year();
            year >= start && year <= end
        }
        None => true,
    }
}

fn allow_listed(issue: &Issue, category: Category, filters: &CategoryFilters) -> bool {
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

/// Top raw labels and label families among Other-bucket issues.
fn other_breakdown(
    other_issues: &[&Issue],
    top_k: usize,
) -> (Vec<LabelCount>, Vec<LabelFamily>) {
    let mut label_issues: HashMap<String, usize> = HashMap::new();
    let mut family_issues: HashMap<String, usize> = HashMap::new();
    let mut sublabel_issues: HashMap<String, HashMap<String, usize>> = HashMap::new();

    for issue in other_issues {
        let mut seen_labels: Vec<&str> = Vec::new();
        let mut seen_families: Vec<String> = Vec::new();
        for label in &issue.labels {
            if label.is_empty() || seen_labels.contains(&label.as_str()) {
                continue;
            }
            seen_labels.push(label);
            *label_issues.entry(label.clone()).or_default() += 1;

            let (family, sublabel) = match label.split_once('/') {
                Some((family, sublabel)) => (family.to_string(), Some(sublabel.to_string())),
                None => (label.clone(), None),
            };
            if !seen_families.contains(&family) {
                seen_families.push(family.clone());
                *family_issues.entry(family.clone()).or_default() += 1;
            }
            if let Some(sublabel) = sublabel {
                if !sublabel.is_empty() {
                    *sublabel_issues
                        .entry(family)
                        .or_default()
                        .entry(sublabel)
                        .or_default() += 1;
                }
            }
        }
    }

    let mut labels: Vec<LabelCount> = label_issues
        .into_iter()
        .map(|(label, issues)| LabelCount { label, issues })
        .collect();
    labels.sort_by(|a, b| b.issues.cmp(&a.issues).then_with(|| a.label.cmp(&b.label)));
    labels.truncate(top_k);

    let mut families: Vec<LabelFamily> = family_issues
        .into_iter()
        .map(|(family, issues)| {
            let mut subs: Vec<LabelCount> = sublabel_issues
                .get(&family)
                .map(|m| {
                    m.iter()
                        .map(|(label, issues)| LabelCount {
                            label: label.clone(),
                            issues: *issues,
                        })
                        .collect()
                })
                .unwrap_or_default();
            subs.sort_by(|a, b| b.issues.cmp(&a.issues).then_with(|| a.label.cmp(&b.label)));
            subs.truncate(3);
            LabelFamily {
                family,
                issues,
                common_sublabels: subs,
            }
        })
        .collect();
    families.sort_by(|a, b| b.issues.cmp(&a.issues).then_with(|| a.family.cmp(&b.family)));
    families.truncate(top_k);

    (labels, families)
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Category Share (% of issues)")?;
        writeln!(f, "{:-<44}", "")?;
        writeln!(f, "{:<12} {:>7} {:>9}", "Category", "Count", "Percent")?;
        for share in &self.share {
            writeln!(
                f,
                "{:<12} {:>7} {:>8.1}%",
                share.category.to_string(),
                share.count,
                share.percent,
            )?;
        }
        writeln!(f, "{:<12} {:>7}", "Total", self.total_issues)?;

        writeln!(f, "\nOpen vs Closed by Category")?;
        writeln!(f, "{:-<44}", "")?;
        writeln!(f, "{:<12} {:>7} {:>7}", "Category", "Open", "Closed")?;
        for states in &self.states {
            writeln!(
                f,
                "{:<12} {:>7} {:>7}",
                states.category.to_string(),
                states.open,
                states.closed,
            )?;
        }

        if self.other_labels.is_empty() {
            writeln!(f, "\nNo labels found inside 'Other'.")?;
        } else {
            writeln!(f, "\nTop labels found in 'Other':")?;
            writeln!(f, "{:<32} {:>7}", "Label", "Issues")?;
            for label in &self.other_labels {
                writeln!(f, "{:<32} {:>7}", label.label, label.issues)?;
            }

            writeln!(f, "\nTop label families in 'Other':")?;
            writeln!(f, "{:<16} {:>7}  {}", "Family", "Issues", "Common sublabels")?;
            for family in &self.other_families {
                let subs = if family.common_sublabels.is_empty() {
                    "-".to_string()
                } else {
                    family
                        .common_sublabels
                        .iter()
                        .map(|s| format!("{} ({})", s.label, s.issues))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                writeln!(f, "{:<16} {:>7}  {subs}", family.family, family.issues)?;
            }
        }
        Ok(())
    }
}

impl CategoryReport {
    /// Render the report as markdown tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use issuepulse_analytics::categories::{aggregate, CategoryFilters};
    /// use issuepulse_core::TimeWindow;
    ///
    /// let report = aggregate(&[], TimeWindow::all_time(), &CategoryFilters::default(), 10);
    /// assert!(report.to_markdown().contains("# Category Share"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Category Share\n\n");
        out.push_str(&format!("**Total issues:** {}\n\n", self.total_issues));
        out.push_str("| Category | Count | Percent |\n");
        out.push_str("|----------|-------|---------|\n");
        for share in &self.share {
            out.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                share.category, share.count, share.percent
            ));
        }

        out.push_str("\n## Open vs Closed\n\n");
        out.push_str("| Category | Open | Closed |\n");
        out.push_str("|----------|------|--------|\n");
        for states in &self.states {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                states.category, states.open, states.closed
            ));
        }

        if !self.other_labels.is_empty() {
            out.push_str("\n## Inside 'Other'\n\n");
            out.push_str("| Label | Issues |\n");
            out.push_str("|-------|--------|\n");
            for label in &self.other_labels {
                out.push_str(&format!("| {} | {} |\n", label.label, label.issues));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use issuepulse_core::{Event, EventKind};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn make_issue(id: u64, labels: &[&str], state: IssueState, created: i64) -> Issue {
        Issue {
            id,
            title: format!("issue {id}"),
            creator: "alice".into(),
            created_at: day(created),
            closed_at: matches!(state, IssueState::Closed).then(|| day(created + 10)),
            state,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            events: vec![Event {
                kind: EventKind::Opened,
                timestamp: day(created),
                actor: "alice".into(),
                label: None,
            }],
        }
    }

    fn window() -> TimeWindow {
        TimeWindow {
            start: day(0),
            end: day(365),
        }
    }

    #[test]
    fn ten_issue_share_distribution() {
        let mut issues = Vec::new();
        for id in 0..4 {
            issues.push(make_issue(id, &["kind/bug"], IssueState::Open, 1));
        }
        for id in 4..7 {
            issues.push(make_issue(id, &["enhancement"], IssueState::Open, 1));
        }
        for id in 7..10 {
            issues.push(make_issue(id, &[], IssueState::Open, 1));
        }

        let report = aggregate(&issues, window(), &CategoryFilters::default(), 10);
        assert_eq!(report.total_issues, 10);

        let pct = |category: Category| {
            report
                .share
                .iter()
                .find(|s| s.category == category)
                .unwrap()
                .percent
        };
        assert!((pct(Category::Bug) - 40.0).abs() < 1e-9);
        assert!((pct(Category::Feature) - 30.0).abs() < 1e-9);
        assert!((pct(Category::Other) - 30.0).abs() < 1e-9);
        assert_eq!(pct(Category::Docs), 0.0);

        // Unlabeled issues have no raw label to surface.
        assert!(report.other_labels.is_empty());
        assert!(report.other_families.is_empty());
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let issues = vec![
            make_issue(1, &["kind/bug"], IssueState::Open, 1),
            make_issue(2, &["docs"], IssueState::Closed, 2),
            make_issue(3, &["status/triage"], IssueState::Open, 3),
        ];
        let report = aggregate(&issues, window(), &CategoryFilters::default(), 10);
        let total: f64 = report.share.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_set_reports_all_zero_shares() {
        let report = aggregate(&[], window(), &CategoryFilters::default(), 10);
        assert_eq!(report.total_issues, 0);
        assert_eq!(report.share.len(), 6);
        assert!(report.share.iter().all(|s| s.percent == 0.0));
        assert!(report.states.iter().all(|s| s.open == 0 && s.closed == 0));
    }

    #[test]
    fn state_distribution_counts_open_and_closed() {
        let issues = vec![
            make_issue(1, &["kind/bug"], IssueState::Open, 1),
            make_issue(2, &["kind/bug"], IssueState::Closed, 2),
            make_issue(3, &["kind/bug"], IssueState::Closed, 3),
        ];
        let report = aggregate(&issues, window(), &CategoryFilters::default(), 10);
        let bug = report
            .states
            .iter()
            .find(|s| s.category == Category::Bug)
            .unwrap();
        assert_eq!(bug.open, 1);
        assert_eq!(bug.closed, 2);
    }

    #[test]
    fn window_excludes_issues_with_no_activity_inside() {
        let issues = vec![
            make_issue(1, &["kind/bug"], IssueState::Open, 1),
            make_issue(2, &["kind/bug"], IssueState::Open, 400),
        ];
        let report = aggregate(&issues, window(), &CategoryFilters::default(), 10);
        assert_eq!(report.total_issues, 1);
    }

    #[test]
    fn filters_combine_with_logical_and() {
        let issues = vec![
            make_issue(1, &["kind/bug", "area/cli"], IssueState::Open, 1),
            make_issue(2, &["kind/bug"], IssueState::Open, 1),
            make_issue(3, &["enhancement", "area/cli"], IssueState::Open, 1),
        ];
        let filters = CategoryFilters {
            year_range: None,
            categories: Some(vec![Category::Bug]),
            label_needles: Some(vec!["area/cli".into()]),
        };
        let report = aggregate(&issues, window(), &filters, 10);
        assert_eq!(report.total_issues, 1);
        let bug = report
            .share
            .iter()
            .find(|s| s.category == Category::Bug)
            .unwrap();
        assert_eq!(bug.count, 1);
        assert!((bug.percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn year_range_filters_on_creation_year() {
        let issues = vec![
            make_issue(1, &["kind/bug"], IssueState::Open, 1),
            make_issue(2, &["kind/bug"], IssueState::Open, 370),
        ];
        let wide = TimeWindow {
            start: day(0),
            end: day(800),
        };
        let filters = CategoryFilters {
            year_range: Some((2024, 2024)),
            ..CategoryFilters::default()
        };
        let report = aggregate(&issues, wide, &filters, 10);
        assert_eq!(report.total_issues, 1);
    }

    #[test]
    fn other_breakdown_surfaces_labels_and_families() {
        let issues = vec![
            make_issue(1, &["status/triage", "status/waiting"], IssueState::Open, 1),
            make_issue(2, &["status/triage"], IssueState::Open, 2),
            make_issue(3, &["wontfix"], IssueState::Open, 3),
        ];
        let report = aggregate(&issues, window(), &CategoryFilters::default(), 10);

        assert_eq!(report.other_labels[0].label, "status/triage");
        assert_eq!(report.other_labels[0].issues, 2);

        let status = report
            .other_families
            .iter()
            .find(|fam| fam.family == "status")
            .unwrap();
        assert_eq!(status.issues, 2);
        assert_eq!(status.common_sublabels[0].label, "triage");
        assert_eq!(status.common_sublabels[0].issues, 2);

        let wontfix = report
            .other_families
            .iter()
            .find(|fam| fam.family == "wontfix")
            .unwrap();
        assert!(wontfix.common_sublabels.is_empty());
    }

    #[test]
    fn other_breakdown_ignores_allow_list_filters() {
        let issues = vec![
            make_issue(1, &["status/triage"], IssueState::Open, 1),
            make_issue(2, &["kind/bug"], IssueState::Open, 2),
        ];
        let filters = CategoryFilters {
            year_range: None,
            categories: Some(vec![Category::Bug]),
            label_needles: None,
        };
        let report = aggregate(&issues, window(), &filters, 10);
        assert_eq!(report.total_issues, 1);
        // Breakdown still reflects the full windowed set.
        assert_eq!(report.other_labels.len(), 1);
        assert_eq!(report.other_labels[0].label, "status/triage");
    }

    #[test]
    fn top_k_caps_breakdown_length() {
        let issues: Vec<Issue> = (0..20)
            .map(|id| {
                let label = format!("status/x{id}");
                make_issue(id, &[label.as_str()], IssueState::Open, 1)
            })
            .collect();
        let report = aggregate(&issues, window(), &CategoryFilters::default(), 5);
        assert_eq!(report.other_labels.len(), 5);
    }
}
