//! Resolution-time trend analysis.
//!
//! For every closed issue, measures how long after creation the first
//! `labeled` and `assigned` events happened versus the total time to close,
//! then fits a least-squares trend to each relationship. The fits report
//! correlation only; no causal claim is made.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use issuepulse_core::{EventKind, Issue};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One (event delay, resolution time) observation, both in fractional days.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSample {
    /// Days from creation to the first qualifying event.
    pub days_to_event: f64,
    /// Days from creation to close.
    pub days_to_close: f64,
}

/// Ordinary least-squares fit of days-to-close on days-to-event.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::resolution::LinearFit;
///
/// let fit = LinearFit { slope: -0.5, intercept: 12.0, samples: 30 };
/// assert!(fit.slope < 0.0);
/// ```
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearFit {
    /// Change in days-to-close per day of event delay.
    pub slope: f64,
    /// Fitted days-to-close at zero delay.
    pub intercept: f64,
    /// Observations behind the fit.
    pub samples: usize,
}

/// Resolution-time correlation for the closed portion of the collection.
///
/// A trend is `None` when fewer than 2 samples exist or the x values have no
/// variance — "no data" is distinguishable from a flat trend.
///
/// # Examples
///
/// ```
/// use issuepulse_analytics::resolution::analyze_resolution;
///
/// let report = analyze_resolution(&[]);
/// assert!(report.label_trend.is_none());
/// assert_eq!(report.closed_issues, 0);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// (days to first label, days to close) per qualifying closed issue.
    pub label_samples: Vec<ResolutionSample>,
    /// (days to first assignment, days to close) per qualifying closed issue.
    pub assign_samples: Vec<ResolutionSample>,
    /// Trend of close time over labeling delay.
    pub label_trend: Option<LinearFit>,
    /// Trend of close time over assignment delay.
    pub assign_trend: Option<LinearFit>,
    /// Closed issues that entered the analysis.
    pub closed_issues: usize,
    /// Closed issues excluded for a missing or inconsistent close time.
    pub excluded: usize,
}

/// Analyze resolution-time correlation across all closed issues.
///
/// Open issues are ignored. A closed issue missing `closed_at` (or whose
/// close precedes its creation) is excluded and tallied, never silently
/// dropped. An issue never labeled before closing contributes no label
/// sample; likewise for assignment.
pub fn analyze_resolution(issues: &[Issue]) -> ResolutionReport {
    let mut label_samples = Vec::new();
    let mut assign_samples = Vec::new();
    let mut closed_issues = 0usize;
    let mut excluded = 0usize;

    for issue in issues {
        if !issue.is_closed() {
            continue;
        }
        let Some(closed_at) = issue.closed_at else {
            excluded += 1;
            continue;
        };
        let days_to_close = days_between(issue.created_at, closed_at);
        if days_to_close < 0.0 {
            excluded += 1;
            continue;
        }
        closed_issues += 1;

        if let Some(ts) = first_event(issue, EventKind::Labeled, closed_at) {
            label_samples.push(ResolutionSample {
                days_to_event: days_between(issue.created_at, ts),
                days_to_close,
            });
        }
        if let Some(ts) = first_event(issue, EventKind::Assigned, closed_at) {
            assign_samples.push(ResolutionSample {
                days_to_event: days_between(issue.created_at, ts),
                days_to_close,
            });
        }
    }

    let label_trend = linear_fit(&label_samples);
    let assign_trend = linear_fit(&assign_samples);

    ResolutionReport {
        label_samples,
        assign_samples,
        label_trend,
        assign_trend,
        closed_issues,
        excluded,
    }
}

/// Earliest event of `kind` at or before `closed_at`.
///
/// Events are not guaranteed sorted, so this scans for the minimum timestamp
/// instead of taking the first occurrence.
fn first_event(issue: &Issue, kind: EventKind, closed_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    issue
        .events
        .iter()
        .filter(|event| event.kind == kind)
        .filter(|event| event.timestamp >= issue.created_at && event.timestamp <= closed_at)
        .map(|event| event.timestamp)
        .min()
}

fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Least-squares fit of `days_to_close` on `days_to_event`.
///
/// Returns `None` below 2 samples or when the x values have zero variance.
fn linear_fit(samples: &[ResolutionSample]) -> Option<LinearFit> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let mean_x = samples.iter().map(|s| s.days_to_event).sum::<f64>() / n as f64;
    let mean_y = samples.iter().map(|s| s.days_to_close).sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for sample in samples {
        let dx = sample.days_to_event - mean_x;
        cov += dx * (sample.days_to_close - mean_y);
        var_x += dx * dx;
    }

    if var_x == 0.0 {
        return None;
    }

    let slope = cov / var_x;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        samples: n,
    })
}

fn describe_trend(name: &str, trend: &Option<LinearFit>) -> String {
    match trend {
        None => format!("{name}: undefined (fewer than 2 usable samples)"),
        Some(fit) if fit.slope < 0.0 => format!(
            "{name}: slope {:.3} over {} samples — earlier action correlates with faster resolution",
            fit.slope, fit.samples
        ),
        Some(fit) => format!(
            "{name}: slope {:.3} over {} samples — no correlation claimed",
            fit.slope, fit.samples
        ),
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution Time Trends")?;
        writeln!(f, "{:-<72}", "")?;
        writeln!(f, "  Closed issues analyzed: {}", self.closed_issues)?;
        if self.excluded > 0 {
            writeln!(
                f,
                "  Excluded (missing/inconsistent close time): {}",
                self.excluded
            )?;
        }
        writeln!(
            f,
            "  Label samples: {}   Assignment samples: {}",
            self.label_samples.len(),
            self.assign_samples.len()
        )?;
        writeln!(f, "  {}", describe_trend("Labeling", &self.label_trend))?;
        writeln!(f, "  {}", describe_trend("Assignment", &self.assign_trend))?;
        Ok(())
    }
}

impl ResolutionReport {
    /// Render the report as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use issuepulse_analytics::resolution::analyze_resolution;
    ///
    /// let report = analyze_resolution(&[]);
    /// assert!(report.to_markdown().contains("# Resolution Time Trends"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Resolution Time Trends\n\n");
        out.push_str(&format!(
            "**Closed issues analyzed:** {} | **Excluded:** {}\n\n",
            self.closed_issues, self.excluded
        ));
        out.push_str("| Series | Samples | Slope | Intercept |\n");
        out.push_str("|--------|---------|-------|-----------|\n");
        for (name, samples, trend) in [
            ("Labeling", self.label_samples.len(), &self.label_trend),
            ("Assignment", self.assign_samples.len(), &self.assign_trend),
        ] {
            match trend {
                Some(fit) => out.push_str(&format!(
                    "| {name} | {samples} | {:.3} | {:.3} |\n",
                    fit.slope, fit.intercept
                )),
                None => out.push_str(&format!("| {name} | {samples} | undefined | undefined |\n")),
            }
        }
        out.push('\n');
        out.push_str(&describe_trend("Labeling", &self.label_trend));
        out.push('\n');
        out.push_str(&describe_trend("Assignment", &self.assign_trend));
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use issuepulse_core::{Event, IssueState};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn closed_issue(id: u64, closed_day: i64, events: Vec<(EventKind, i64)>) -> Issue {
        Issue {
            id,
            title: format!("issue {id}"),
            creator: "alice".into(),
            created_at: day(0),
            closed_at: Some(day(closed_day)),
            state: IssueState::Closed,
            labels: vec![],
            events: events
                .into_iter()
                .map(|(kind, offset)| Event {
                    kind,
                    timestamp: day(offset),
                    actor: "bob".into(),
                    label: None,
                })
                .collect(),
        }
    }

    #[test]
    fn samples_measure_first_event_and_close() {
        let issues = vec![closed_issue(
            1,
            10,
            vec![
                (EventKind::Labeled, 4),
                (EventKind::Labeled, 2),
                (EventKind::Assigned, 6),
            ],
        )];
        let report = analyze_resolution(&issues);

        assert_eq!(report.closed_issues, 1);
        assert_eq!(report.label_samples.len(), 1);
        // First label = min timestamp, not first in sequence.
        assert!((report.label_samples[0].days_to_event - 2.0).abs() < 1e-9);
        assert!((report.label_samples[0].days_to_close - 10.0).abs() < 1e-9);
        assert!((report.assign_samples[0].days_to_event - 6.0).abs() < 1e-9);
    }

    #[test]
    fn never_labeled_issue_contributes_no_label_sample() {
        let issues = vec![closed_issue(1, 10, vec![(EventKind::Assigned, 3)])];
        let report = analyze_resolution(&issues);
        assert!(report.label_samples.is_empty());
        assert_eq!(report.assign_samples.len(), 1);
    }

    #[test]
    fn label_after_close_does_not_qualify() {
        let issues = vec![closed_issue(1, 10, vec![(EventKind::Labeled, 12)])];
        let report = analyze_resolution(&issues);
        assert!(report.label_samples.is_empty());
    }

    #[test]
    fn open_issues_are_ignored() {
        let mut issue = closed_issue(1, 10, vec![(EventKind::Labeled, 1)]);
        issue.state = IssueState::Open;
        issue.closed_at = None;
        let report = analyze_resolution(&[issue]);
        assert_eq!(report.closed_issues, 0);
        assert_eq!(report.excluded, 0);
        assert!(report.label_samples.is_empty());
    }

    #[test]
    fn closed_without_close_time_is_excluded_and_tallied() {
        let mut issue = closed_issue(1, 10, vec![(EventKind::Labeled, 1)]);
        issue.closed_at = None;
        let report = analyze_resolution(&[issue]);
        assert_eq!(report.closed_issues, 0);
        assert_eq!(report.excluded, 1);
    }

    #[test]
    fn anti_correlated_delays_fit_a_negative_slope() {
        // Later labeling paired with faster closes.
        let issues = vec![
            closed_issue(1, 20, vec![(EventKind::Labeled, 1)]),
            closed_issue(2, 12, vec![(EventKind::Labeled, 5)]),
            closed_issue(3, 10, vec![(EventKind::Labeled, 9)]),
        ];
        let report = analyze_resolution(&issues);
        let fit = report.label_trend.unwrap();
        assert!(fit.slope < 0.0, "slope was {}", fit.slope);
        assert_eq!(fit.samples, 3);
    }

    #[test]
    fn co_moving_delays_fit_a_positive_slope() {
        let issues = vec![
            closed_issue(1, 5, vec![(EventKind::Labeled, 1)]),
            closed_issue(2, 10, vec![(EventKind::Labeled, 3)]),
            closed_issue(3, 15, vec![(EventKind::Labeled, 6)]),
        ];
        let report = analyze_resolution(&issues);
        let fit = report.label_trend.unwrap();
        assert!(fit.slope > 0.0);
    }

    #[test]
    fn fit_is_exact_on_a_perfect_line() {
        // y = 2x + 3
        let issues = vec![
            closed_issue(1, 5, vec![(EventKind::Assigned, 1)]),
            closed_issue(2, 7, vec![(EventKind::Assigned, 2)]),
            closed_issue(3, 9, vec![(EventKind::Assigned, 3)]),
        ];
        let report = analyze_resolution(&issues);
        let fit = report.assign_trend.unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_samples_leaves_trend_undefined() {
        let issues = vec![closed_issue(1, 10, vec![(EventKind::Labeled, 2)])];
        let report = analyze_resolution(&issues);
        assert_eq!(report.label_samples.len(), 1);
        assert!(report.label_trend.is_none());
    }

    #[test]
    fn zero_variance_in_delays_leaves_trend_undefined() {
        let issues = vec![
            closed_issue(1, 10, vec![(EventKind::Labeled, 2)]),
            closed_issue(2, 20, vec![(EventKind::Labeled, 2)]),
        ];
        let report = analyze_resolution(&issues);
        assert!(report.label_trend.is_none());
    }

    #[test]
    fn trend_serializes_null_when_undefined() {
        let report = analyze_resolution(&[]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["labelTrend"].is_null());
    }
}
