//! Textual renderings of schedule entries
//!
//! Pure projections of already-validated entries; the command layer
//! picks a style and writes the result to whatever transport it owns.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::sched::models::RecordingEntry;

/// Output style for `list`/`dump` operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    /// One line per entry
    Compact,
    /// One field per line
    Long,
    /// Table rows (lists get the surrounding table element)
    Html,
    /// Machine-readable: sequence number and raw timestamps
    Timestamps,
    /// Machine-readable JSON
    Json,
}

/// Render a single entry in the given style.
pub fn render_entry(entry: &RecordingEntry, style: RecordFormat) -> String {
    match style {
        RecordFormat::Compact => compact_line(entry),
        RecordFormat::Long => long_block(entry),
        RecordFormat::Html => html_row(entry),
        RecordFormat::Timestamps => format!(
            "{} {} {} {} {}",
            entry.sequence_number, entry.start_ts, entry.end_ts, entry.channel, entry.filename
        ),
        RecordFormat::Json => serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string()),
    }
}

/// Render a list of entries; HTML output is wrapped in a table and JSON
/// output is one array.
pub fn render_list(entries: &[&RecordingEntry], style: RecordFormat) -> String {
    match style {
        RecordFormat::Html => {
            let mut out = String::from(
                "<table>\n<tr><th>#</th><th>Title</th><th>Channel</th>\
                 <th>Start</th><th>End</th><th>Profile</th></tr>\n",
            );
            for entry in entries {
                out.push_str(&html_row(entry));
                out.push('\n');
            }
            out.push_str("</table>");
            out
        }
        RecordFormat::Json => {
            serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
        }
        other => {
            let lines: Vec<String> = entries.iter().map(|e| render_entry(e, other)).collect();
            lines.join("\n")
        }
    }
}

fn compact_line(entry: &RecordingEntry) -> String {
    format!(
        "{:03} | {} | {} | {} | {} - {} | {}",
        entry.sequence_number,
        entry.video,
        entry.title,
        entry.channel,
        stamp(entry.start_ts, "%a %Y-%m-%d %H:%M"),
        stamp(entry.end_ts, "%H:%M"),
        entry.primary_profile()
    )
}

fn long_block(entry: &RecordingEntry) -> String {
    let mut out = format!(
        "Recording #{}\n  Title:    {}\n  Channel:  {}\n  Video:    {}\n  \
         Start:    {}\n  End:      {}\n  File:     {}\n  Profiles: {}\n",
        entry.sequence_number,
        entry.title,
        entry.channel,
        entry.video,
        stamp(entry.start_ts, "%Y-%m-%d %H:%M:%S"),
        stamp(entry.end_ts, "%Y-%m-%d %H:%M:%S"),
        entry.filename,
        entry.profiles.join(", "),
    );
    if let Some(sid) = entry.series_id {
        out.push_str(&format!(
            "  Series:   {} ({}, occurrence {}, {} remaining)\n",
            sid,
            entry.recurrence.as_str(),
            entry.series_start_number,
            entry.recurrence_count,
        ));
    }
    out
}

fn html_row(entry: &RecordingEntry) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        entry.sequence_number,
        escape(&entry.title),
        escape(&entry.channel),
        stamp(entry.start_ts, "%Y-%m-%d %H:%M"),
        stamp(entry.end_ts, "%Y-%m-%d %H:%M"),
        escape(entry.primary_profile()),
    )
}

fn stamp(ts: i64, fmt: &str) -> String {
    let dt: DateTime<Local> = DateTime::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&Local);
    dt.format(fmt).to_string()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
