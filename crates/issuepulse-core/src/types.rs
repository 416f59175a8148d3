use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single tracked unit of work with its full event history.
///
/// Issues are immutable snapshots: the store constructs them once at load
/// time and every analysis receives a read-only view.
///
/// # Examples
///
/// ```
/// use issuepulse_core::{Issue, IssueState};
/// use chrono::{TimeZone, Utc};
///
/// let issue = Issue {
///     id: 42,
///     title: "Installer fails on Windows".into(),
///     creator: "alice".into(),
///     created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
///     closed_at: None,
///     state: IssueState::Open,
///     labels: vec!["kind/bug".into(), "area/installer".into()],
///     events: vec![],
/// };
/// assert!(!issue.is_closed());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique issue number.
    pub id: u64,
    /// Issue title.
    pub title: String,
    /// User who opened the issue.
    pub creator: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Close timestamp; present iff `state` is [`IssueState::Closed`].
    pub closed_at: Option<DateTime<Utc>>,
    /// Open/closed state at export time.
    pub state: IssueState,
    /// Raw label strings, possibly empty.
    pub labels: Vec<String>,
    /// Recorded actions on this issue. Not guaranteed to be sorted.
    pub events: Vec<Event>,
}

impl Issue {
    /// Returns `true` if the issue is closed.
    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }
}

/// A timestamped action against an issue, attributed to an actor.
///
/// # Examples
///
/// ```
/// use issuepulse_core::{Event, EventKind};
/// use chrono::{TimeZone, Utc};
///
/// let ev = Event {
///     kind: EventKind::Labeled,
///     timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap(),
///     actor: "bob".into(),
///     label: Some("kind/bug".into()),
/// };
/// assert_eq!(ev.kind, EventKind::Labeled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// User who performed the action.
    pub actor: String,
    /// Label value, set for `labeled` events.
    pub label: Option<String>,
}

/// Kind of a recorded issue event.
///
/// Unrecognized types from the export map to [`EventKind::Other`] rather
/// than failing the load.
///
/// # Examples
///
/// ```
/// use issuepulse_core::EventKind;
///
/// assert_eq!(EventKind::from_raw("commented"), EventKind::Commented);
/// assert_eq!(EventKind::from_raw("cross-referenced"), EventKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Issue was opened.
    Opened,
    /// A comment was posted.
    Commented,
    /// A label was applied.
    Labeled,
    /// A user was assigned.
    Assigned,
    /// Issue was closed.
    Closed,
    /// Issue was referenced from elsewhere.
    Referenced,
    /// Anything else the export recorded.
    #[serde(other)]
    Other,
}

impl EventKind {
    /// The event kinds that contribute to activity scoring.
    pub const TRACKED: [EventKind; 6] = [
        EventKind::Opened,
        EventKind::Commented,
        EventKind::Labeled,
        EventKind::Assigned,
        EventKind::Closed,
        EventKind::Referenced,
    ];

    /// Map a raw event-type string from the export to a kind.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "opened" => EventKind::Opened,
            "commented" => EventKind::Commented,
            "labeled" => EventKind::Labeled,
            "assigned" => EventKind::Assigned,
            "closed" => EventKind::Closed,
            "referenced" => EventKind::Referenced,
            _ => EventKind::Other,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Opened => write!(f, "opened"),
            EventKind::Commented => write!(f, "commented"),
            EventKind::Labeled => write!(f, "labeled"),
            EventKind::Assigned => write!(f, "assigned"),
            EventKind::Closed => write!(f, "closed"),
            EventKind::Referenced => write!(f, "referenced"),
            EventKind::Other => write!(f, "other"),
        }
    }
}

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Still open.
    Open,
    /// Resolved or discarded.
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(IssueState::Open),
            "closed" | "close" => Ok(IssueState::Closed),
            other => Err(format!("unknown issue state: {other}")),
        }
    }
}

/// High-level issue classification derived from labels.
///
/// Exactly one category is assigned per issue; [`Category::Other`] is the
/// catch-all when no rule matches.
///
/// # Examples
///
/// ```
/// use issuepulse_core::Category;
///
/// let c: Category = "bug".parse().unwrap();
/// assert_eq!(c, Category::Bug);
/// assert_eq!(c.to_string(), "Bug");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Defects: crashes, regressions, panics.
    Bug,
    /// New functionality or enhancement requests.
    Feature,
    /// Documentation, guides, questions.
    Docs,
    /// Dependency bumps and lockfile churn.
    Dependency,
    /// CI, build, release, and tooling work.
    Infra,
    /// Everything else.
    Other,
}

impl Category {
    /// All categories in presentation order.
    pub const ALL: [Category; 6] = [
        Category::Bug,
        Category::Feature,
        Category::Docs,
        Category::Dependency,
        Category::Infra,
        Category::Other,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Bug => write!(f, "Bug"),
            Category::Feature => write!(f, "Feature"),
            Category::Docs => write!(f, "Docs"),
            Category::Dependency => write!(f, "Dependency"),
            Category::Infra => write!(f, "Infra"),
            Category::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bug" => Ok(Category::Bug),
            "feature" => Ok(Category::Feature),
            "docs" => Ok(Category::Docs),
            "dependency" => Ok(Category::Dependency),
            "infra" => Ok(Category::Infra),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use issuepulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_kind_from_raw_maps_known_types() {
        assert_eq!(EventKind::from_raw("opened"), EventKind::Opened);
        assert_eq!(EventKind::from_raw("Commented"), EventKind::Commented);
        assert_eq!(EventKind::from_raw("LABELED"), EventKind::Labeled);
        assert_eq!(EventKind::from_raw("assigned"), EventKind::Assigned);
        assert_eq!(EventKind::from_raw("closed"), EventKind::Closed);
        assert_eq!(EventKind::from_raw("referenced"), EventKind::Referenced);
    }

    #[test]
    fn event_kind_from_raw_absorbs_unknown_types() {
        assert_eq!(EventKind::from_raw("milestoned"), EventKind::Other);
        assert_eq!(EventKind::from_raw("cross-referenced"), EventKind::Other);
        assert_eq!(EventKind::from_raw(""), EventKind::Other);
    }

    #[test]
    fn issue_state_from_str() {
        assert_eq!("open".parse::<IssueState>().unwrap(), IssueState::Open);
        assert_eq!("Closed".parse::<IssueState>().unwrap(), IssueState::Closed);
        assert_eq!("close".parse::<IssueState>().unwrap(), IssueState::Closed);
        assert!("merged".parse::<IssueState>().is_err());
    }

    #[test]
    fn category_round_trips_through_str() {
        for cat in Category::ALL {
            let parsed: Category = cat.to_string().parse().unwrap();
            assert_eq!(parsed, cat);
        }
        assert!("question".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Dependency).unwrap();
        assert_eq!(json, "\"dependency\"");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn issue_serializes_camel_case() {
        let issue = Issue {
            id: 1,
            title: "t".into(),
            creator: "alice".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            closed_at: None,
            state: IssueState::Open,
            labels: vec![],
            events: vec![],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn tracked_kinds_are_distinct() {
        let mut kinds = EventKind::TRACKED.to_vec();
        kinds.dedup();
        assert_eq!(kinds.len(), 6);
        assert!(!kinds.contains(&EventKind::Other));
    }
}
