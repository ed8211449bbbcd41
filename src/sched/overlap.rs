//! Time-collision detection for candidate recordings
//!
//! Windows are closed intervals: a candidate whose start equals another
//! entry's end (or vice versa) conflicts. Detection never crosses tuner
//! resources; the store only hands this module entries committed to the
//! candidate's target tuner.

use crate::sched::error::SchedError;
use crate::sched::models::{RecordingEntry, RecurrenceKind};
use crate::sched::timecalc;

/// Closed-interval intersection test. The three cases (candidate start
/// inside, candidate end inside, candidate spans) cover every
/// intersecting configuration.
pub fn windows_overlap(c_start: i64, c_end: i64, o_start: i64, o_end: i64) -> bool {
    (c_start >= o_start && c_start <= o_end)
        || (c_end >= o_start && c_end <= o_end)
        || (c_start <= o_start && c_end >= o_end)
}

/// Does the candidate, or any occurrence of a recurring candidate,
/// collide with a pending or ongoing recording on the target tuner?
///
/// Recurring candidates are checked occurrence by occurrence, advancing
/// the window with [`timecalc::advance_by_recurrence`]; the first
/// conflict wins. Occurrences of the candidate series are also checked
/// against each other, so a window long enough to reach into the next
/// occurrence rejects the whole series.
pub fn is_overlapping(
    pending: &[RecordingEntry],
    ongoing: Option<&RecordingEntry>,
    candidate: &RecordingEntry,
) -> Result<bool, SchedError> {
    let repeats = if candidate.recurrence == RecurrenceKind::None {
        1
    } else {
        candidate.recurrence_count.max(1)
    };

    let mut earlier: Vec<(i64, i64)> = Vec::new();
    let mut start = candidate.start_ts;
    let mut end = candidate.end_ts;
    for i in 0..repeats {
        for other in pending {
            if windows_overlap(start, end, other.start_ts, other.end_ts) {
                return Ok(true);
            }
        }
        if let Some(active) = ongoing {
            if windows_overlap(start, end, active.start_ts, active.end_ts) {
                return Ok(true);
            }
        }
        for &(e_start, e_end) in &earlier {
            if windows_overlap(start, end, e_start, e_end) {
                return Ok(true);
            }
        }
        if i + 1 < repeats {
            earlier.push((start, end));
            (start, end) = timecalc::advance_by_recurrence(candidate.recurrence, start, end)?;
        }
    }
    Ok(false)
}
