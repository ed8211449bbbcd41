//! Calendar arithmetic for the scheduler
//!
//! All conversions go through the local time zone so wall-clock times
//! survive DST transitions. Recurrence stepping re-normalizes start and
//! end through the same decompose/compose round trip in lockstep.

use chrono::{
    Datelike, Days, Local, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Weekday,
};

use crate::sched::error::SchedError;
use crate::sched::models::RecurrenceKind;

/// Decomposed local calendar fields: (year, month, day, hour, min, sec)
pub type CalendarFields = (i32, u32, u32, u32, u32, u32);

/// Compose local calendar fields into an absolute timestamp.
///
/// A composition that lands in a DST gap is shifted forward by one hour
/// (the same normalization `mktime` applies); an ambiguous composition
/// resolves to the earlier instant. Anything else unrepresentable is a
/// `TimeConversion` error, which callers treat as an internal defect.
pub fn to_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> Result<i64, SchedError> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        SchedError::TimeConversion(format!("invalid date {year:04}-{month:02}-{day:02}"))
    })?;
    let time = NaiveTime::from_hms_opt(hour, min, sec).ok_or_else(|| {
        SchedError::TimeConversion(format!("invalid time {hour:02}:{min:02}:{sec:02}"))
    })?;
    let naive = NaiveDateTime::new(date, time);

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp()),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.timestamp()),
        LocalResult::None => {
            // DST gap; retry one hour later
            let shifted = naive + chrono::Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.timestamp())
                .ok_or_else(|| {
                    SchedError::TimeConversion(format!("unrepresentable local time {naive}"))
                })
        }
    }
}

/// Decompose an absolute timestamp into local calendar fields.
pub fn from_timestamp(ts: i64) -> Result<CalendarFields, SchedError> {
    let dt = Local
        .timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| SchedError::TimeConversion(format!("timestamp {ts} out of range")))?;
    Ok((
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    ))
}

/// Local weekday of an absolute timestamp.
pub fn weekday_of(ts: i64) -> Result<Weekday, SchedError> {
    let (y, m, d, _, _, _) = from_timestamp(ts)?;
    NaiveDate::from_ymd_opt(y, m, d)
        .map(|date| date.weekday())
        .ok_or_else(|| SchedError::TimeConversion(format!("invalid date {y:04}-{m:02}-{d:02}")))
}

/// Advance one occurrence window to the next occurrence of the pattern.
///
/// Daily and weekly step by whole days; monthly steps by one month with
/// the day-of-month clamped to the target month's length (Jan 31 becomes
/// Feb 29/28). Weekday-restricted kinds step one day at a time until the
/// weekday is in the permitted set, at most 7 steps. The end date moves
/// by the same calendar offset as the start so windows that cross
/// midnight stay intact.
pub fn advance_by_recurrence(
    kind: RecurrenceKind,
    start: i64,
    end: i64,
) -> Result<(i64, i64), SchedError> {
    let (sy, sm, sd, sh, smin, ss) = from_timestamp(start)?;
    let (ey, em, ed, eh, emin, es) = from_timestamp(end)?;
    let start_date = naive_date(sy, sm, sd)?;
    let end_date = naive_date(ey, em, ed)?;

    let (new_start_date, new_end_date) = match kind {
        RecurrenceKind::None => {
            return Err(SchedError::UnknownRecurrence(kind.code()));
        }
        RecurrenceKind::Daily => (add_days(start_date, 1)?, add_days(end_date, 1)?),
        RecurrenceKind::Weekly => (add_days(start_date, 7)?, add_days(end_date, 7)?),
        RecurrenceKind::Monthly => (add_month(start_date)?, add_month(end_date)?),
        restricted => {
            let mut step = 1u64;
            loop {
                let candidate = add_days(start_date, step)?;
                if restricted.permits(candidate.weekday()) {
                    break (candidate, add_days(end_date, step)?);
                }
                step += 1;
                if step > 7 {
                    // every restricted pattern permits at least one weekday
                    return Err(SchedError::UnknownRecurrence(restricted.code()));
                }
            }
        }
    };

    let new_start = to_timestamp(
        new_start_date.year(),
        new_start_date.month(),
        new_start_date.day(),
        sh,
        smin,
        ss,
    )?;
    let new_end = to_timestamp(
        new_end_date.year(),
        new_end_date.month(),
        new_end_date.day(),
        eh,
        emin,
        es,
    )?;
    Ok((new_start, new_end))
}

/// Shift the first occurrence of a weekday-restricted series forward to
/// the nearest permitted weekday. A no-op for unrestricted kinds and for
/// windows already starting on a permitted day.
pub fn adjust_initial_occurrence(
    kind: RecurrenceKind,
    start: i64,
    end: i64,
) -> Result<(i64, i64), SchedError> {
    if !kind.is_weekday_restricted() {
        return Ok((start, end));
    }

    let (sy, sm, sd, sh, smin, ss) = from_timestamp(start)?;
    let (ey, em, ed, eh, emin, es) = from_timestamp(end)?;
    let start_date = naive_date(sy, sm, sd)?;
    let end_date = naive_date(ey, em, ed)?;

    let mut shift = 0u64;
    while !kind.permits(add_days(start_date, shift)?.weekday()) {
        shift += 1;
        if shift > 7 {
            return Err(SchedError::UnknownRecurrence(kind.code()));
        }
    }
    if shift == 0 {
        return Ok((start, end));
    }

    let ns = add_days(start_date, shift)?;
    let ne = add_days(end_date, shift)?;
    Ok((
        to_timestamp(ns.year(), ns.month(), ns.day(), sh, smin, ss)?,
        to_timestamp(ne.year(), ne.month(), ne.day(), eh, emin, es)?,
    ))
}

/// Resolve a symbolic date name to a concrete future local date.
///
/// Accepts "today"/"tod", "tomorrow"/"tom", and three-letter weekday
/// abbreviations. A weekday name matching today's weekday resolves to
/// the same day *next* week, never today; only the literal "today"
/// resolves to the current date.
pub fn relative_date_from_name(name: &str, now: i64) -> Result<Option<(i32, u32, u32)>, SchedError> {
    let (y, m, d, _, _, _) = from_timestamp(now)?;
    let today = naive_date(y, m, d)?;

    let target = match name.to_ascii_lowercase().as_str() {
        "today" | "tod" => today,
        "tomorrow" | "tom" => add_days(today, 1)?,
        other => {
            let wanted = match other {
                "mon" => Weekday::Mon,
                "tue" => Weekday::Tue,
                "wed" => Weekday::Wed,
                "thu" => Weekday::Thu,
                "fri" => Weekday::Fri,
                "sat" => Weekday::Sat,
                "sun" => Weekday::Sun,
                _ => return Ok(None),
            };
            let ahead = (wanted.num_days_from_monday() + 7
                - today.weekday().num_days_from_monday()
                - 1)
                % 7
                + 1;
            add_days(today, ahead as u64)?
        }
    };
    Ok(Some((target.year(), target.month(), target.day())))
}

fn naive_date(y: i32, m: u32, d: u32) -> Result<NaiveDate, SchedError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| SchedError::TimeConversion(format!("invalid date {y:04}-{m:02}-{d:02}")))
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, SchedError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| SchedError::TimeConversion(format!("date overflow past {date}")))
}

// chrono clamps the day-of-month when the target month is shorter,
// which is the documented policy for monthly recurrences.
fn add_month(date: NaiveDate) -> Result<NaiveDate, SchedError> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| SchedError::TimeConversion(format!("date overflow past {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        to_timestamp(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn timestamp_round_trip() {
        let t = ts(2024, 1, 10, 20, 0);
        assert_eq!(from_timestamp(t).unwrap(), (2024, 1, 10, 20, 0, 0));
    }

    #[test]
    fn invalid_fields_are_conversion_errors() {
        assert!(matches!(
            to_timestamp(2024, 13, 1, 0, 0, 0),
            Err(SchedError::TimeConversion(_))
        ));
        assert!(matches!(
            to_timestamp(2024, 2, 30, 0, 0, 0),
            Err(SchedError::TimeConversion(_))
        ));
        assert!(matches!(
            to_timestamp(2024, 1, 1, 24, 0, 0),
            Err(SchedError::TimeConversion(_))
        ));
    }

    #[test]
    fn daily_and_weekly_advance() {
        let start = ts(2024, 1, 10, 20, 0);
        let end = ts(2024, 1, 10, 21, 0);

        let (s, e) = advance_by_recurrence(RecurrenceKind::Daily, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 11, 20, 0, 0));
        assert_eq!(from_timestamp(e).unwrap(), (2024, 1, 11, 21, 0, 0));

        let (s, e) = advance_by_recurrence(RecurrenceKind::Weekly, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 17, 20, 0, 0));
        assert_eq!(from_timestamp(e).unwrap(), (2024, 1, 17, 21, 0, 0));
    }

    #[test]
    fn monthly_advance_clamps_short_months() {
        let start = ts(2024, 1, 31, 20, 0);
        let end = ts(2024, 1, 31, 21, 0);
        let (s, _) = advance_by_recurrence(RecurrenceKind::Monthly, start, end).unwrap();
        // 2024 is a leap year
        assert_eq!(from_timestamp(s).unwrap(), (2024, 2, 29, 20, 0, 0));
    }

    #[test]
    fn cross_midnight_window_stays_intact() {
        let start = ts(2024, 1, 10, 23, 30);
        let end = ts(2024, 1, 11, 0, 30);
        let (s, e) = advance_by_recurrence(RecurrenceKind::Daily, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 11, 23, 30, 0));
        assert_eq!(from_timestamp(e).unwrap(), (2024, 1, 12, 0, 30, 0));
    }

    #[test]
    fn restricted_advance_skips_weekends() {
        // Fri 2024-01-12 -> Mon 2024-01-15 under Mon-Fri
        let start = ts(2024, 1, 12, 10, 0);
        let end = ts(2024, 1, 12, 11, 0);
        let (s, _) = advance_by_recurrence(RecurrenceKind::MonFri, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 15, 10, 0, 0));
        assert_eq!(weekday_of(s).unwrap(), Weekday::Mon);

        // Sun 2024-01-14 -> Sat 2024-01-20 under Sat-Sun
        let start = ts(2024, 1, 14, 10, 0);
        let end = ts(2024, 1, 14, 11, 0);
        let (s, _) = advance_by_recurrence(RecurrenceKind::SatSun, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 20, 10, 0, 0));
    }

    #[test]
    fn advancing_non_recurring_is_a_defect() {
        let start = ts(2024, 1, 10, 20, 0);
        assert_eq!(
            advance_by_recurrence(RecurrenceKind::None, start, start + 3600),
            Err(SchedError::UnknownRecurrence(0))
        );
    }

    #[test]
    fn initial_adjustment_moves_saturday_to_monday() {
        // Sat 2024-01-06
        let start = ts(2024, 1, 6, 10, 0);
        let end = ts(2024, 1, 6, 11, 0);
        let (s, e) = adjust_initial_occurrence(RecurrenceKind::MonFri, start, end).unwrap();
        assert_eq!(from_timestamp(s).unwrap(), (2024, 1, 8, 10, 0, 0));
        assert_eq!(from_timestamp(e).unwrap(), (2024, 1, 8, 11, 0, 0));
    }

    #[test]
    fn initial_adjustment_is_a_noop_when_permitted() {
        let start = ts(2024, 1, 8, 10, 0); // Monday
        let end = ts(2024, 1, 8, 11, 0);
        assert_eq!(
            adjust_initial_occurrence(RecurrenceKind::MonFri, start, end).unwrap(),
            (start, end)
        );
        // unrestricted kinds never move
        let sat = ts(2024, 1, 6, 10, 0);
        assert_eq!(
            adjust_initial_occurrence(RecurrenceKind::Daily, sat, sat + 3600).unwrap(),
            (sat, sat + 3600)
        );
    }

    #[test]
    fn relative_names_resolve_forward() {
        // Wed 2024-01-10
        let now = ts(2024, 1, 10, 12, 0);
        assert_eq!(
            relative_date_from_name("today", now).unwrap(),
            Some((2024, 1, 10))
        );
        assert_eq!(
            relative_date_from_name("tom", now).unwrap(),
            Some((2024, 1, 11))
        );
        assert_eq!(
            relative_date_from_name("fri", now).unwrap(),
            Some((2024, 1, 12))
        );
        assert_eq!(
            relative_date_from_name("mon", now).unwrap(),
            Some((2024, 1, 15))
        );
        // exact weekday match is next week, never today
        assert_eq!(
            relative_date_from_name("wed", now).unwrap(),
            Some((2024, 1, 17))
        );
        assert_eq!(relative_date_from_name("noday", now).unwrap(), None);
    }
}
