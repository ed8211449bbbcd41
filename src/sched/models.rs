//! Data models for the recording scheduler

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::sched::error::SchedError;

/// Maximum number of transcoding profiles attached to one entry
pub const MAX_PROFILES: usize = 5;

/// Bounded lengths for the text fields
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_CHANNEL_LEN: usize = 64;
pub const MAX_FILENAME_LEN: usize = 256;

/// Recurrence pattern of a recording request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Monthly,
    MonFri,
    SatSun,
    MonThu,
    TueFri,
    WedFri,
    TueThu,
}

impl RecurrenceKind {
    /// Stable integer code used by the persistence collaborator
    pub fn code(&self) -> u32 {
        match self {
            RecurrenceKind::None => 0,
            RecurrenceKind::Daily => 1,
            RecurrenceKind::Weekly => 2,
            RecurrenceKind::Monthly => 3,
            RecurrenceKind::MonFri => 4,
            RecurrenceKind::SatSun => 5,
            RecurrenceKind::MonThu => 6,
            RecurrenceKind::TueFri => 7,
            RecurrenceKind::WedFri => 8,
            RecurrenceKind::TueThu => 9,
        }
    }

    /// Inverse of [`code`](Self::code); codes outside the enumeration
    /// are a persistence/config defect.
    pub fn from_code(code: u32) -> Result<Self, SchedError> {
        match code {
            0 => Ok(RecurrenceKind::None),
            1 => Ok(RecurrenceKind::Daily),
            2 => Ok(RecurrenceKind::Weekly),
            3 => Ok(RecurrenceKind::Monthly),
            4 => Ok(RecurrenceKind::MonFri),
            5 => Ok(RecurrenceKind::SatSun),
            6 => Ok(RecurrenceKind::MonThu),
            7 => Ok(RecurrenceKind::TueFri),
            8 => Ok(RecurrenceKind::WedFri),
            9 => Ok(RecurrenceKind::TueThu),
            other => Err(SchedError::UnknownRecurrence(other)),
        }
    }

    /// True for the patterns restricted to a subset of weekdays
    pub fn is_weekday_restricted(&self) -> bool {
        matches!(
            self,
            RecurrenceKind::MonFri
                | RecurrenceKind::SatSun
                | RecurrenceKind::MonThu
                | RecurrenceKind::TueFri
                | RecurrenceKind::WedFri
                | RecurrenceKind::TueThu
        )
    }

    /// Membership test for the weekday-restricted patterns. Unrestricted
    /// patterns permit every weekday.
    pub fn permits(&self, weekday: Weekday) -> bool {
        use Weekday::*;
        match self {
            RecurrenceKind::MonFri => matches!(weekday, Mon | Tue | Wed | Thu | Fri),
            RecurrenceKind::SatSun => matches!(weekday, Sat | Sun),
            RecurrenceKind::MonThu => matches!(weekday, Mon | Tue | Wed | Thu),
            RecurrenceKind::TueFri => matches!(weekday, Tue | Wed | Thu | Fri),
            RecurrenceKind::WedFri => matches!(weekday, Wed | Thu | Fri),
            RecurrenceKind::TueThu => matches!(weekday, Tue | Wed | Thu),
            _ => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::MonFri => "mon-fri",
            RecurrenceKind::SatSun => "sat-sun",
            RecurrenceKind::MonThu => "mon-thu",
            RecurrenceKind::TueFri => "tue-fri",
            RecurrenceKind::WedFri => "wed-fri",
            RecurrenceKind::TueThu => "tue-thu",
        }
    }
}

/// How the per-occurrence title is derived from the series base title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleMangling {
    /// Append the occurrence's start date and time, e.g. "News 2024-01-08 10.00"
    DateTime,
    /// Append a running index, e.g. "News (01/03)"
    Index,
}

impl TitleMangling {
    pub fn code(&self) -> u32 {
        match self {
            TitleMangling::DateTime => 0,
            TitleMangling::Index => 1,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(TitleMangling::DateTime),
            1 => Some(TitleMangling::Index),
            _ => None,
        }
    }
}

impl Default for TitleMangling {
    fn default() -> Self {
        TitleMangling::DateTime
    }
}

/// One concrete scheduled recording, standalone or expanded from a
/// recurring series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEntry {
    /// Process-wide unique id, assigned when the entry is committed
    pub sequence_number: u64,
    pub title: String,
    pub channel: String,
    pub filename: String,
    /// Absolute start, seconds since epoch; always `< end_ts`
    pub start_ts: i64,
    pub end_ts: i64,
    /// Never empty; at most [`MAX_PROFILES`] entries
    pub profiles: Vec<String>,
    pub recurrence: RecurrenceKind,
    /// Occurrences remaining from this one, inclusive
    pub recurrence_count: u32,
    /// Shared by every occurrence expanded from one recurring request
    pub series_id: Option<u64>,
    pub mangling: TitleMangling,
    /// Separator used when building mangled filenames
    pub mangling_prefix: String,
    /// Unmangled originals, kept on every occurrence so a series can be
    /// reconstructed from any one of them
    pub series_base_title: String,
    pub series_base_filename: String,
    /// 1-based index of this occurrence within its series
    pub series_start_number: u32,
    /// Tuner this occurrence is committed to (set at commit time)
    pub video: usize,
}

impl RecordingEntry {
    pub fn is_recurring(&self) -> bool {
        self.recurrence != RecurrenceKind::None
    }

    pub fn duration_secs(&self) -> i64 {
        self.end_ts - self.start_ts
    }

    /// Primary transcoding profile (construction guarantees at least one)
    pub fn primary_profile(&self) -> &str {
        self.profiles.first().map(String::as_str).unwrap_or("")
    }
}

/// Request to schedule a new recording, single or recurring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub title: String,
    pub channel: String,
    pub filename: String,
    pub start_ts: i64,
    pub end_ts: i64,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default = "default_recurrence")]
    pub recurrence: RecurrenceKind,
    #[serde(default = "default_count")]
    pub recurrence_count: u32,
    #[serde(default)]
    pub mangling: TitleMangling,
    #[serde(default = "default_prefix")]
    pub mangling_prefix: String,
    /// Starting index when resuming a previously persisted series
    #[serde(default = "default_start_number")]
    pub series_start_number: u32,
}

fn default_recurrence() -> RecurrenceKind {
    RecurrenceKind::None
}
fn default_count() -> u32 {
    1
}
fn default_prefix() -> String {
    "_".to_string()
}
fn default_start_number() -> u32 {
    1
}

/// Truncate a text field to its bounded length, on a char boundary
pub fn truncated(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
