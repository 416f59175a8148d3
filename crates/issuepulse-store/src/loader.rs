use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use issuepulse_core::{Event, EventKind, Issue, IssueState, PulseError};

/// Tallies from a load: how many records survived validation and how many
/// were dropped for missing required fields.
///
/// # Examples
///
/// ```
/// use issuepulse_store::parse_issues;
///
/// let (issues, stats) = parse_issues("[]").unwrap();
/// assert!(issues.is_empty());
/// assert_eq!(stats.skipped_issues, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Issues kept after validation.
    pub issues: usize,
    /// Issues dropped (missing id, creation time, or state).
    pub skipped_issues: usize,
    /// Events dropped (missing type or timestamp).
    pub skipped_events: usize,
}

/// Raw mirror of one exported issue record.
///
/// Field names vary between export tools; serde aliases absorb the common
/// variants so conversion happens in exactly one place.
#[derive(Debug, Deserialize)]
struct RawIssue {
    number: Option<u64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "user")]
    creator: Option<RawUser>,
    #[serde(default, alias = "created_date")]
    created_at: Option<String>,
    #[serde(default, alias = "closed_date")]
    closed_at: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default, alias = "type", alias = "event")]
    event_type: Option<String>,
    #[serde(default, alias = "created_at", alias = "date")]
    event_date: Option<String>,
    #[serde(default, alias = "user")]
    actor: Option<RawUser>,
    #[serde(default)]
    label: Option<RawLabel>,
}

/// A label is either a plain string or an API-style `{ "name": ... }` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Name(String),
    Object { name: Option<String> },
}

impl RawLabel {
    fn into_name(self) -> Option<String> {
        match self {
            RawLabel::Name(name) => Some(name),
            RawLabel::Object { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUser {
    Login(String),
    Object { login: Option<String> },
}

impl RawUser {
    fn into_login(self) -> Option<String> {
        match self {
            RawUser::Login(login) => Some(login),
            RawUser::Object { login } => login,
        }
    }
}

/// Load and validate an issue export from `path`.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if the file does not exist,
/// [`PulseError::Io`] if it cannot be read, or
/// [`PulseError::Serialization`] if it is not a JSON array of issue records.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use issuepulse_store::load_issues;
///
/// let (issues, stats) = load_issues(Path::new("issues.json")).unwrap();
/// println!("{} issues ({} skipped)", issues.len(), stats.skipped_issues);
/// ```
pub fn load_issues(path: &Path) -> Result<(Vec<Issue>, LoadStats), PulseError> {
    if !path.exists() {
        return Err(PulseError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_issues(&content)
}

/// Parse an issue export from a JSON string.
///
/// Per-record anomalies are recovered locally: a record missing a required
/// field (id, creation time, state) is dropped and tallied in
/// [`LoadStats::skipped_issues`]; an event missing its type or timestamp is
/// dropped and tallied in [`LoadStats::skipped_events`]. Only a malformed
/// top-level document is an error.
///
/// # Errors
///
/// Returns [`PulseError::Serialization`] if `json` is not a JSON array of
/// issue records.
pub fn parse_issues(json: &str) -> Result<(Vec<Issue>, LoadStats), PulseError> {
    let raw: Vec<RawIssue> = serde_json::from_str(json)?;

    let mut issues = Vec::with_capacity(raw.len());
    let mut stats = LoadStats::default();

    for record in raw {
        match convert_issue(record, &mut stats) {
            Some(issue) => issues.push(issue),
            None => stats.skipped_issues += 1,
        }
    }

    stats.issues = issues.len();
    Ok((issues, stats))
}

fn convert_issue(raw: RawIssue, stats: &mut LoadStats) -> Option<Issue> {
    let id = issue_id(&raw)?;
    let created_at = parse_timestamp(raw.created_at.as_deref()?)?;
    let state: IssueState = raw.state.as_deref()?.parse().ok()?;
    let closed_at = raw.closed_at.as_deref().and_then(parse_timestamp);

    let labels: Vec<String> = raw
        .labels
        .into_iter()
        .filter_map(RawLabel::into_name)
        .filter(|name| !name.is_empty())
        .collect();

    let mut events = Vec::with_capacity(raw.events.len());
    for raw_event in raw.events {
        let Some(kind_name) = raw_event.event_type.as_deref() else {
            stats.skipped_events += 1;
            continue;
        };
        let Some(timestamp) = raw_event.event_date.as_deref().and_then(parse_timestamp) else {
            stats.skipped_events += 1;
            continue;
        };
        events.push(Event {
            kind: EventKind::from_raw(kind_name),
            timestamp,
            actor: raw_event
                .actor
                .and_then(RawUser::into_login)
                .unwrap_or_default(),
            label: raw_event.label.and_then(RawLabel::into_name),
        });
    }

    Some(Issue {
        id,
        title: raw.title.unwrap_or_default(),
        creator: raw
            .creator
            .and_then(RawUser::into_login)
            .unwrap_or_default(),
        created_at,
        closed_at,
        state,
        labels,
        events,
    })
}

/// Id comes from `number`, falling back to the trailing segment of `url`.
fn issue_id(raw: &RawIssue) -> Option<u64> {
    if let Some(number) = raw.number {
        return Some(number);
    }
    raw.url
        .as_deref()?
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// Accepts RFC 3339 as well as the date-only and space-separated forms seen
/// in hand-rolled exports.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}
