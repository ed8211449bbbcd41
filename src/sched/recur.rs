//! Recurring-series expansion
//!
//! Turns a recurring draft into its concrete occurrences, each with a
//! deterministically mangled title and filename and the bookkeeping
//! fields that tie the series together. The store commits the result
//! atomically; nothing here mutates shared state.

use std::path::Path;

use crate::sched::error::SchedError;
use crate::sched::models::{truncated, RecordingEntry, TitleMangling, MAX_TITLE_LEN};
use crate::sched::timecalc;

/// Expand a recurring draft into all of its occurrences.
///
/// The draft's window must already be aligned to a permitted weekday
/// (see [`timecalc::adjust_initial_occurrence`]); occurrence `i` carries
/// `series_start_number = offset + i` and a remaining-count of
/// `count - i`. Sequence numbers and the tuner id are left for the
/// store to assign at commit time. Any date-arithmetic failure aborts
/// the whole expansion.
pub fn materialize_series(
    draft: &RecordingEntry,
    series_id: u64,
) -> Result<Vec<RecordingEntry>, SchedError> {
    let count = draft.recurrence_count.max(1);
    let offset = draft.series_start_number.max(1);
    let (dir, core, ext) = split_filename(&draft.filename);

    let mut occurrences = Vec::with_capacity(count as usize);
    let mut start = draft.start_ts;
    let mut end = draft.end_ts;

    for i in 0..count {
        let title = mangled_title(&draft.title, draft.mangling, start, i, count, offset)?;
        let filename = mangled_filename(&dir, &core, &ext, &draft.mangling_prefix, start)?;

        occurrences.push(RecordingEntry {
            sequence_number: 0,
            title,
            channel: draft.channel.clone(),
            filename,
            start_ts: start,
            end_ts: end,
            profiles: draft.profiles.clone(),
            recurrence: draft.recurrence,
            recurrence_count: count - i,
            series_id: Some(series_id),
            mangling: draft.mangling,
            mangling_prefix: draft.mangling_prefix.clone(),
            series_base_title: draft.title.clone(),
            series_base_filename: draft.filename.clone(),
            series_start_number: offset + i,
            video: draft.video,
        });

        if i + 1 < count {
            (start, end) = timecalc::advance_by_recurrence(draft.recurrence, start, end)?;
        }
    }
    Ok(occurrences)
}

/// Per-occurrence title: date/time suffix or running "(nn/mm)" index.
/// The displayed total reflects the original full series length even
/// when the series resumes at a non-1 start number.
fn mangled_title(
    base: &str,
    mode: TitleMangling,
    start: i64,
    index: u32,
    count: u32,
    offset: u32,
) -> Result<String, SchedError> {
    let title = match mode {
        TitleMangling::DateTime => {
            let (y, m, d, h, min, _) = timecalc::from_timestamp(start)?;
            format!("{base} {y:04}-{m:02}-{d:02} {h:02}.{min:02}")
        }
        TitleMangling::Index => {
            let nn = index + offset;
            let mm = count + offset - 1;
            format!("{base} ({nn:02}/{mm:02})")
        }
    };
    Ok(truncated(&title, MAX_TITLE_LEN))
}

/// Per-occurrence filename: `{dir}/{core}{prefix}{date}{prefix}{hh.mm}{ext}`.
fn mangled_filename(
    dir: &str,
    core: &str,
    ext: &str,
    prefix: &str,
    start: i64,
) -> Result<String, SchedError> {
    let (y, m, d, h, min, _) = timecalc::from_timestamp(start)?;
    let stamp = format!("{core}{prefix}{y:04}-{m:02}-{d:02}{prefix}{h:02}.{min:02}{ext}");
    if dir.is_empty() {
        Ok(stamp)
    } else {
        Ok(format!("{dir}/{stamp}"))
    }
}

/// Split a filename into (directory, stem, extension-with-dot).
fn split_filename(filename: &str) -> (String, String, String) {
    let path = Path::new(filename);
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty() && p != ".")
        .unwrap_or_default();
    let core = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (dir, core, ext)
}
