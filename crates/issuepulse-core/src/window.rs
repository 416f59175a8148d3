use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive time window over event or creation timestamps.
///
/// Analyses accept a resolved window; how the caller derived it (preset or
/// explicit bounds) is not their concern.
///
/// # Examples
///
/// ```
/// use issuepulse_core::TimeWindow;
/// use chrono::{TimeZone, Utc};
///
/// let w = TimeWindow {
///     start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     end: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
/// };
/// assert!(w.contains(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
/// assert!(w.contains(w.start));
/// assert!(w.contains(w.end));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The unbounded window covering every representable timestamp.
    pub fn all_time() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Returns `true` if `ts` falls inside the window, bounds included.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Named window presets offered by the CLI.
///
/// Replaces an interactive timeline menu with a pure mapping: the caller
/// resolves a preset once and passes the resulting [`TimeWindow`] to the
/// analyses. Months are approximated as 30 days.
///
/// # Examples
///
/// ```
/// use issuepulse_core::WindowPreset;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
/// let preset: WindowPreset = "6m".parse().unwrap();
/// let window = preset.resolve(now);
/// assert_eq!(window.end, now);
/// assert_eq!((window.end - window.start).num_days(), 180);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPreset {
    /// Last 3 months.
    Last3Months,
    /// Last 6 months.
    Last6Months,
    /// Last 12 months.
    Last12Months,
    /// Last 18 months.
    Last18Months,
    /// Last 24 months.
    Last24Months,
    /// No lower bound.
    #[default]
    AllTime,
}

impl WindowPreset {
    /// Number of 30-day months the preset spans, or `None` for all time.
    fn months(self) -> Option<i64> {
        match self {
            WindowPreset::Last3Months => Some(3),
            WindowPreset::Last6Months => Some(6),
            WindowPreset::Last12Months => Some(12),
            WindowPreset::Last18Months => Some(18),
            WindowPreset::Last24Months => Some(24),
            WindowPreset::AllTime => None,
        }
    }

    /// Resolve the preset to a concrete window ending at `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> TimeWindow {
        match self.months() {
            Some(months) => TimeWindow {
                start: now - Duration::days(months * 30),
                end: now,
            },
            None => TimeWindow::all_time(),
        }
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPreset::Last3Months => write!(f, "last 3 months"),
            WindowPreset::Last6Months => write!(f, "last 6 months"),
            WindowPreset::Last12Months => write!(f, "last 12 months"),
            WindowPreset::Last18Months => write!(f, "last 18 months"),
            WindowPreset::Last24Months => write!(f, "last 24 months"),
            WindowPreset::AllTime => write!(f, "all time"),
        }
    }
}

impl FromStr for WindowPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "3m" => Ok(WindowPreset::Last3Months),
            "6m" => Ok(WindowPreset::Last6Months),
            "12m" => Ok(WindowPreset::Last12Months),
            "18m" => Ok(WindowPreset::Last18Months),
            "24m" => Ok(WindowPreset::Last24Months),
            "all" => Ok(WindowPreset::AllTime),
            other => Err(format!(
                "unknown window preset: {other} (expected 3m, 6m, 12m, 18m, 24m, or all)"
            )),
        }
    }
}
