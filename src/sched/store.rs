//! The authoritative per-tuner recording schedule
//!
//! One ordered collection of pending entries per tuner plus one
//! optional "ongoing" slot per tuner, owned global counters, and the
//! series exclusion tracker. Callers serialize access with a single
//! mutex around the whole store (see [`crate::sched::PvrState`]); every
//! operation leaves each tuner's collection sorted by start time before
//! returning, so no caller observes an unsorted intermediate state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::PvrSettings;
use crate::profiles::ProfileRegistry;
use crate::sched::error::SchedError;
use crate::sched::exclusions::SeriesExclusions;
use crate::sched::format::{self, RecordFormat};
use crate::sched::models::{
    truncated, RecordingEntry, RecurrenceKind, ScheduleRequest, MAX_CHANNEL_LEN, MAX_FILENAME_LEN,
    MAX_PROFILES, MAX_TITLE_LEN,
};
use crate::sched::{overlap, recur, timecalc};

/// Per-tuner ordered schedule of pending recordings
pub struct ScheduleStore {
    max_entries: usize,
    registry: Arc<dyn ProfileRegistry>,
    /// Pending entries, one vector per tuner, sorted by start time
    pending: Vec<Vec<RecordingEntry>>,
    /// Recording currently in progress, one slot per tuner; written by
    /// the capture collaborator, read by the overlap detector
    ongoing: Vec<Option<RecordingEntry>>,
    next_sequence: u64,
    next_series: u64,
    exclusions: SeriesExclusions,
}

impl ScheduleStore {
    pub fn new(settings: &PvrSettings, registry: Arc<dyn ProfileRegistry>) -> Self {
        Self {
            max_entries: settings.max_entries,
            registry,
            pending: vec![Vec::new(); settings.max_videos],
            ongoing: vec![None; settings.max_videos],
            next_sequence: 1,
            next_series: 1,
            exclusions: SeriesExclusions::new(),
        }
    }

    /// Number of configured tuner resources
    pub fn video_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending entries on one tuner
    pub fn pending_count(&self, video: usize) -> Result<usize, SchedError> {
        self.check_video(video)?;
        Ok(self.pending[video].len())
    }

    /// Schedule a recording on the given tuner. Recurring requests are
    /// expanded into their occurrences; the whole request commits or
    /// none of it does. Returns the last assigned sequence number.
    pub fn insert(&mut self, video: usize, request: ScheduleRequest) -> Result<u64, SchedError> {
        self.check_video(video)?;
        let mut draft = self.build_entry(request)?;
        draft.video = video;

        if draft.recurrence == RecurrenceKind::None {
            if overlap::is_overlapping(&self.pending[video], self.ongoing[video].as_ref(), &draft)?
            {
                debug!("Rejecting '{}' on tuner {}: overlap", draft.title, video);
                return Err(SchedError::OverlapConflict);
            }
            self.check_capacity(video, 1)?;

            let seq = self.next_seq();
            draft.sequence_number = seq;
            info!(
                "Scheduled #{} '{}' on tuner {} ({} - {})",
                seq, draft.title, video, draft.start_ts, draft.end_ts
            );
            self.pending[video].push(draft);
            self.sort_pending(video);
            Ok(seq)
        } else {
            // Align the first occurrence before any check so the whole
            // series is judged from the window it will actually occupy.
            let (start, end) = timecalc::adjust_initial_occurrence(
                draft.recurrence,
                draft.start_ts,
                draft.end_ts,
            )?;
            draft.start_ts = start;
            draft.end_ts = end;

            if overlap::is_overlapping(&self.pending[video], self.ongoing[video].as_ref(), &draft)?
            {
                debug!(
                    "Rejecting series '{}' on tuner {}: overlap",
                    draft.title, video
                );
                return Err(SchedError::OverlapConflict);
            }
            let count = draft.recurrence_count.max(1);
            self.check_capacity(video, count as usize)?;

            let series_id = self.next_series;
            let occurrences = recur::materialize_series(&draft, series_id)?;
            self.next_series += 1;

            let mut last_seq = 0;
            for mut occurrence in occurrences {
                occurrence.sequence_number = self.next_seq();
                occurrence.video = video;
                last_seq = occurrence.sequence_number;
                self.pending[video].push(occurrence);
            }
            self.sort_pending(video);
            info!(
                "Scheduled series {} '{}' on tuner {}: {} occurrences, last #{}",
                series_id, draft.title, video, count, last_seq
            );
            Ok(last_seq)
        }
    }

    /// Remove the entry with the given sequence number, or its whole
    /// series. Removed entries are returned to the caller. Deleting a
    /// single occurrence of a series records an exclusion so the
    /// persistence collaborator cannot resurrect it.
    pub fn delete_by_sequence(
        &mut self,
        seq: u64,
        whole_series: bool,
    ) -> Result<Vec<RecordingEntry>, SchedError> {
        let (video, idx) = self.locate(seq).ok_or(SchedError::NotFound(seq))?;
        let series_id = self.pending[video][idx].series_id;

        let removed = match (whole_series, series_id) {
            (true, Some(sid)) => {
                let mut removed = Vec::new();
                let mut kept = Vec::new();
                for entry in self.pending[video].drain(..) {
                    if entry.series_id == Some(sid) {
                        removed.push(entry);
                    } else {
                        kept.push(entry);
                    }
                }
                self.pending[video] = kept;
                info!(
                    "Deleted series {} from tuner {} ({} entries)",
                    sid,
                    video,
                    removed.len()
                );
                removed
            }
            _ => {
                if let Some(sid) = series_id {
                    // Capacity check happens before the removal so a full
                    // exclusion set leaves the schedule untouched.
                    let occurrence = self.pending[video][idx].series_start_number;
                    self.exclusions.mark_excluded(sid, occurrence)?;
                }
                let entry = self.pending[video].swap_remove(idx);
                info!("Deleted #{} '{}' from tuner {}", seq, entry.title, video);
                vec![entry]
            }
        };
        self.sort_pending(video);
        Ok(removed)
    }

    /// Earliest pending entry on one tuner, without removing it
    pub fn peek_top(&self, video: usize) -> Result<Option<&RecordingEntry>, SchedError> {
        self.check_video(video)?;
        Ok(self.pending[video].first())
    }

    /// Remove and return the earliest pending entry on one tuner. Used
    /// by the capture collaborator when a recording becomes due.
    pub fn pop_top(&mut self, video: usize) -> Result<Option<RecordingEntry>, SchedError> {
        self.check_video(video)?;
        if self.pending[video].is_empty() {
            return Ok(None);
        }
        // the vector is sorted, so the earliest entry is at index 0 and
        // removal preserves the sort invariant
        Ok(Some(self.pending[video].remove(0)))
    }

    /// Move the earliest due entry into the tuner's ongoing slot.
    /// Returns the promoted sequence number, or `None` when there is
    /// nothing pending or the slot is occupied.
    pub fn promote_to_ongoing(&mut self, video: usize) -> Result<Option<u64>, SchedError> {
        self.check_video(video)?;
        if self.ongoing[video].is_some() {
            return Ok(None);
        }
        match self.pop_top(video)? {
            Some(entry) => {
                let seq = entry.sequence_number;
                info!("Recording #{} '{}' started on tuner {}", seq, entry.title, video);
                self.ongoing[video] = Some(entry);
                Ok(Some(seq))
            }
            None => Ok(None),
        }
    }

    /// Recording currently in progress on one tuner, if any
    pub fn ongoing(&self, video: usize) -> Result<Option<&RecordingEntry>, SchedError> {
        self.check_video(video)?;
        Ok(self.ongoing[video].as_ref())
    }

    /// Install an entry into the ongoing slot, returning any displaced
    /// entry. Owned by the capture collaborator.
    pub fn set_ongoing(
        &mut self,
        video: usize,
        entry: RecordingEntry,
    ) -> Result<Option<RecordingEntry>, SchedError> {
        self.check_video(video)?;
        Ok(self.ongoing[video].replace(entry))
    }

    /// Clear the ongoing slot when the capture collaborator finishes
    pub fn clear_ongoing(&mut self, video: usize) -> Result<Option<RecordingEntry>, SchedError> {
        self.check_video(video)?;
        Ok(self.ongoing[video].take())
    }

    /// Overwrite the primary transcoding profile of one entry. Explicit
    /// invalid names are rejected; no silent fallback here.
    pub fn update_profile(&mut self, seq: u64, profile: &str) -> Result<(), SchedError> {
        if !self.registry.exists(profile) {
            return Err(SchedError::InvalidProfile(profile.to_string()));
        }
        let (video, idx) = self.locate(seq).ok_or(SchedError::NotFound(seq))?;
        let entry = &mut self.pending[video][idx];
        if entry.profiles.is_empty() {
            entry.profiles.push(profile.to_string());
        } else {
            entry.profiles[0] = profile.to_string();
        }
        debug!("Updated #{} primary profile to '{}'", seq, profile);
        Ok(())
    }

    /// Globally earliest pending entry across all tuners, with its
    /// tuner id. Drives the power-management collaborator's wake timing.
    pub fn find_next_scheduled(&self) -> Option<(&RecordingEntry, usize)> {
        self.pending
            .iter()
            .enumerate()
            .filter_map(|(video, entries)| entries.first().map(|e| (e, video)))
            .min_by_key(|(e, _)| (e.start_ts, e.sequence_number))
    }

    /// All tuners' pending entries merged into one time-ordered list,
    /// optionally truncated.
    pub fn list_all(&self, max_count: Option<usize>) -> Vec<&RecordingEntry> {
        let mut all: Vec<&RecordingEntry> = self.pending.iter().flatten().collect();
        all.sort_by_key(|e| (e.start_ts, e.sequence_number));
        if let Some(max) = max_count {
            all.truncate(max);
        }
        all
    }

    /// Render one entry, or every entry of its series, in the given style
    pub fn dump_one(
        &self,
        seq: u64,
        include_series: bool,
        style: RecordFormat,
    ) -> Result<String, SchedError> {
        let (video, idx) = self.locate(seq).ok_or(SchedError::NotFound(seq))?;
        let entry = &self.pending[video][idx];

        if include_series {
            if let Some(sid) = entry.series_id {
                let members: Vec<&RecordingEntry> = self.pending[video]
                    .iter()
                    .filter(|e| e.series_id == Some(sid))
                    .collect();
                return Ok(format::render_list(&members, style));
            }
        }
        Ok(format::render_entry(entry, style))
    }

    /// Full state for the persistence collaborator: every pending entry
    /// on every tuner, tuner order then start order.
    pub fn snapshot(&self) -> Vec<RecordingEntry> {
        self.pending.iter().flatten().cloned().collect()
    }

    /// Minimal persistable set: every standalone entry plus, per series,
    /// the lowest-numbered occurrence (enough to reconstruct the series
    /// together with the exclusion sets).
    pub fn series_masters(&self) -> Vec<RecordingEntry> {
        let mut masters: HashMap<u64, &RecordingEntry> = HashMap::new();
        let mut standalone: Vec<&RecordingEntry> = Vec::new();

        for entry in self.pending.iter().flatten() {
            match entry.series_id {
                None => standalone.push(entry),
                Some(sid) => {
                    let keep = masters
                        .get(&sid)
                        .map(|m| entry.series_start_number < m.series_start_number)
                        .unwrap_or(true);
                    if keep {
                        masters.insert(sid, entry);
                    }
                }
            }
        }

        let mut result: Vec<RecordingEntry> = standalone
            .into_iter()
            .chain(masters.into_values())
            .cloned()
            .collect();
        result.sort_by_key(|e| (e.start_ts, e.sequence_number));
        result
    }

    pub fn exclusions(&self) -> &SeriesExclusions {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut SeriesExclusions {
        &mut self.exclusions
    }

    /// Validate a request and shape it into a committable draft:
    /// bounded fields, registered profiles only, default profile when
    /// none survives.
    fn build_entry(&self, request: ScheduleRequest) -> Result<RecordingEntry, SchedError> {
        if request.start_ts >= request.end_ts {
            return Err(SchedError::InvalidWindow);
        }

        let mut profiles: Vec<String> = Vec::new();
        for name in request.profiles {
            if profiles.len() == MAX_PROFILES {
                break;
            }
            if self.registry.exists(&name) {
                profiles.push(name);
            } else {
                warn!("Dropping unknown profile '{}' from request", name);
            }
        }
        if profiles.is_empty() {
            profiles.push(self.registry.default_profile().to_string());
        }

        let prefix = if request.mangling_prefix.is_empty() {
            "_".to_string()
        } else {
            request.mangling_prefix
        };

        let title = truncated(&request.title, MAX_TITLE_LEN);
        let filename = truncated(&request.filename, MAX_FILENAME_LEN);
        Ok(RecordingEntry {
            sequence_number: 0,
            series_base_title: title.clone(),
            series_base_filename: filename.clone(),
            title,
            channel: truncated(&request.channel, MAX_CHANNEL_LEN),
            filename,
            start_ts: request.start_ts,
            end_ts: request.end_ts,
            profiles,
            recurrence: request.recurrence,
            recurrence_count: request.recurrence_count.max(1),
            series_id: None,
            mangling: request.mangling,
            mangling_prefix: prefix,
            series_start_number: request.series_start_number.max(1),
            video: 0,
        })
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    fn locate(&self, seq: u64) -> Option<(usize, usize)> {
        for (video, entries) in self.pending.iter().enumerate() {
            if let Some(idx) = entries.iter().position(|e| e.sequence_number == seq) {
                return Some((video, idx));
            }
        }
        None
    }

    fn check_video(&self, video: usize) -> Result<(), SchedError> {
        if video >= self.pending.len() {
            return Err(SchedError::NoSuchVideo(video));
        }
        Ok(())
    }

    fn check_capacity(&self, video: usize, additional: usize) -> Result<(), SchedError> {
        if self.pending[video].len() + additional > self.max_entries {
            return Err(SchedError::CapacityExceeded {
                requested: additional as u32,
                max: self.max_entries,
            });
        }
        Ok(())
    }

    fn sort_pending(&mut self, video: usize) {
        self.pending[video].sort_by_key(|e| (e.start_ts, e.sequence_number));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::StaticProfiles;
    use crate::sched::models::TitleMangling;
    use crate::sched::timecalc::{from_timestamp, to_timestamp, weekday_of};
    use chrono::Weekday;

    fn store_with(max_entries: usize) -> ScheduleStore {
        let settings = PvrSettings {
            max_videos: 2,
            max_entries,
            ..PvrSettings::default()
        };
        let registry = Arc::new(StaticProfiles::from_settings(&settings));
        ScheduleStore::new(&settings, registry)
    }

    fn store() -> ScheduleStore {
        store_with(32)
    }

    fn request(start: i64, end: i64) -> ScheduleRequest {
        ScheduleRequest {
            title: "News".into(),
            channel: "bbc1".into(),
            filename: "/video/news.mp4".into(),
            start_ts: start,
            end_ts: end,
            profiles: vec![],
            recurrence: RecurrenceKind::None,
            recurrence_count: 1,
            mangling: TitleMangling::Index,
            mangling_prefix: "_".into(),
            series_start_number: 1,
        }
    }

    fn ts(d: u32, h: u32, min: u32) -> i64 {
        to_timestamp(2024, 1, d, h, min, 0).unwrap()
    }

    fn assert_sorted(store: &ScheduleStore, video: usize) {
        let entries = &store.pending[video];
        for pair in entries.windows(2) {
            assert!(pair[0].start_ts <= pair[1].start_ts);
        }
    }

    #[test]
    fn first_insert_gets_sequence_one() {
        let mut s = store();
        let seq = s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(s.pending_count(0).unwrap(), 1);
        // default profile applied
        assert_eq!(s.pending[0][0].primary_profile(), "normal");
    }

    #[test]
    fn overlapping_insert_is_rejected_without_mutation() {
        let mut s = store();
        s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        let err = s
            .insert(0, request(ts(10, 20, 30), ts(10, 21, 30)))
            .unwrap_err();
        assert_eq!(err, SchedError::OverlapConflict);
        assert_eq!(s.pending_count(0).unwrap(), 1);
    }

    #[test]
    fn abutting_windows_conflict() {
        let mut s = store();
        s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        let err = s
            .insert(0, request(ts(10, 21, 0), ts(10, 22, 0)))
            .unwrap_err();
        assert_eq!(err, SchedError::OverlapConflict);
    }

    #[test]
    fn series_reaching_into_its_next_occurrence_is_rejected() {
        let mut s = store();
        // Sat 10:00 through Sun 23:00 on Sat-Sun: the second occurrence
        // starts Sunday morning, inside the first window
        let mut req = request(ts(6, 10, 0), ts(7, 23, 0));
        req.recurrence = RecurrenceKind::SatSun;
        req.recurrence_count = 2;
        assert_eq!(s.insert(0, req), Err(SchedError::OverlapConflict));
        assert_eq!(s.pending_count(0).unwrap(), 0);
    }

    #[test]
    fn conflicts_do_not_cross_tuners() {
        let mut s = store();
        s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        // identical window on the other tuner is fine
        s.insert(1, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        assert_eq!(s.pending_count(1).unwrap(), 1);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut s = store();
        assert_eq!(
            s.insert(0, request(ts(10, 21, 0), ts(10, 20, 0))),
            Err(SchedError::InvalidWindow)
        );
    }

    #[test]
    fn unknown_tuner_is_rejected() {
        let mut s = store();
        assert_eq!(
            s.insert(9, request(ts(10, 20, 0), ts(10, 21, 0))),
            Err(SchedError::NoSuchVideo(9))
        );
    }

    #[test]
    fn weekly_series_expands_with_index_titles() {
        let mut s = store();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0)); // Mon 2024-01-08
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 3;

        let last = s.insert(0, req).unwrap();
        assert_eq!(last, 3);
        assert_eq!(s.pending_count(0).unwrap(), 3);
        assert_sorted(&s, 0);

        let titles: Vec<&str> = s.pending[0].iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["News (01/03)", "News (02/03)", "News (03/03)"]);
        let days: Vec<u32> = s.pending[0]
            .iter()
            .map(|e| from_timestamp(e.start_ts).unwrap().2)
            .collect();
        assert_eq!(days, vec![8, 15, 22]);

        let sid = s.pending[0][0].series_id;
        assert!(sid.is_some());
        assert!(s.pending[0].iter().all(|e| e.series_id == sid));
        let numbers: Vec<u32> = s.pending[0]
            .iter()
            .map(|e| e.series_start_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn monfri_series_starting_saturday_shifts_to_monday() {
        let mut s = store();
        let mut req = request(ts(6, 10, 0), ts(6, 11, 0)); // Sat 2024-01-06
        req.recurrence = RecurrenceKind::MonFri;
        req.recurrence_count = 5;

        s.insert(0, req).unwrap();
        for entry in &s.pending[0] {
            let wd = weekday_of(entry.start_ts).unwrap();
            assert!(!matches!(wd, Weekday::Sat | Weekday::Sun));
        }
        // first occurrence lands on Mon 2024-01-08
        assert_eq!(from_timestamp(s.pending[0][0].start_ts).unwrap().2, 8);
    }

    #[test]
    fn single_count_recurring_still_gets_a_series_id() {
        let mut s = store();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Daily;
        req.recurrence_count = 1;

        s.insert(0, req).unwrap();
        assert_eq!(s.pending_count(0).unwrap(), 1);
        assert!(s.pending[0][0].series_id.is_some());
    }

    #[test]
    fn series_capacity_boundary() {
        let mut s = store_with(4);
        s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();

        // exactly fills remaining capacity
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Daily;
        req.recurrence_count = 3;
        s.insert(0, req).unwrap();
        assert_eq!(s.pending_count(0).unwrap(), 4);

        // one more fails and leaves the store unchanged
        let err = s
            .insert(0, request(ts(20, 10, 0), ts(20, 11, 0)))
            .unwrap_err();
        assert!(matches!(err, SchedError::CapacityExceeded { .. }));
        assert_eq!(s.pending_count(0).unwrap(), 4);
    }

    #[test]
    fn overlapping_series_commits_nothing() {
        let mut s = store();
        // existing entry a week into the candidate series
        s.insert(0, request(ts(15, 10, 0), ts(15, 11, 0))).unwrap();

        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 3;
        assert_eq!(s.insert(0, req), Err(SchedError::OverlapConflict));
        assert_eq!(s.pending_count(0).unwrap(), 1);
    }

    #[test]
    fn delete_single_occurrence_records_exclusion() {
        let mut s = store();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 3;
        s.insert(0, req).unwrap();

        // middle occurrence has sequence number 2 and start number 2
        let removed = s.delete_by_sequence(2, false).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].series_start_number, 2);
        assert_eq!(s.pending_count(0).unwrap(), 2);
        assert_sorted(&s, 0);

        let sid = s.pending[0][0].series_id.unwrap();
        assert!(s.pending[0].iter().all(|e| e.series_id == Some(sid)));
        assert!(s.exclusions().is_excluded(sid, 2));
        assert!(!s.exclusions().is_excluded(sid, 1));
    }

    #[test]
    fn delete_whole_series_removes_every_member() {
        let mut s = store();
        s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 3;
        s.insert(0, req).unwrap();
        assert_eq!(s.pending_count(0).unwrap(), 4);

        let removed = s.delete_by_sequence(3, true).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(s.pending_count(0).unwrap(), 1);
        assert!(s.pending[0][0].series_id.is_none());
        assert_sorted(&s, 0);
    }

    #[test]
    fn delete_unknown_sequence_is_not_found() {
        let mut s = store();
        s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        assert_eq!(
            s.delete_by_sequence(99, false),
            Err(SchedError::NotFound(99))
        );
        assert_eq!(s.pending_count(0).unwrap(), 1);
    }

    #[test]
    fn sequence_numbers_are_never_reused() {
        let mut s = store();
        let a = s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();
        s.delete_by_sequence(a, false).unwrap();
        let b = s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();
        assert!(b > a);
    }

    #[test]
    fn update_profile_validates_against_registry() {
        let mut s = store();
        let seq = s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();

        assert_eq!(
            s.update_profile(seq, "ultra"),
            Err(SchedError::InvalidProfile("ultra".into()))
        );
        assert_eq!(s.pending[0][0].primary_profile(), "normal");

        s.update_profile(seq, "high").unwrap();
        assert_eq!(s.pending[0][0].primary_profile(), "high");

        assert_eq!(s.update_profile(99, "high"), Err(SchedError::NotFound(99)));
    }

    #[test]
    fn unknown_request_profiles_fall_back_to_default() {
        let mut s = store();
        let mut req = request(ts(10, 20, 0), ts(10, 21, 0));
        req.profiles = vec!["bogus".into()];
        s.insert(0, req).unwrap();
        assert_eq!(s.pending[0][0].primary_profile(), "normal");
    }

    #[test]
    fn pop_and_promote() {
        let mut s = store();
        s.insert(0, request(ts(2, 10, 0), ts(2, 11, 0))).unwrap();
        s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();

        // earliest first, regardless of insertion order
        let top = s.pop_top(0).unwrap().unwrap();
        assert_eq!(from_timestamp(top.start_ts).unwrap().2, 1);

        let promoted = s.promote_to_ongoing(0).unwrap();
        assert!(promoted.is_some());
        assert!(s.ongoing(0).unwrap().is_some());
        assert_eq!(s.pending_count(0).unwrap(), 0);

        // slot occupied: nothing further promotes
        s.insert(0, request(ts(5, 10, 0), ts(5, 11, 0))).unwrap();
        assert_eq!(s.promote_to_ongoing(0).unwrap(), None);

        let finished = s.clear_ongoing(0).unwrap();
        assert!(finished.is_some());
        assert!(s.ongoing(0).unwrap().is_none());
    }

    #[test]
    fn ongoing_entry_blocks_new_inserts() {
        let mut s = store();
        s.insert(0, request(ts(10, 20, 0), ts(10, 21, 0))).unwrap();
        s.promote_to_ongoing(0).unwrap();

        let err = s
            .insert(0, request(ts(10, 20, 30), ts(10, 21, 30)))
            .unwrap_err();
        assert_eq!(err, SchedError::OverlapConflict);
    }

    #[test]
    fn find_next_scheduled_spans_tuners() {
        let mut s = store();
        assert!(s.find_next_scheduled().is_none());

        s.insert(0, request(ts(5, 10, 0), ts(5, 11, 0))).unwrap();
        s.insert(1, request(ts(3, 10, 0), ts(3, 11, 0))).unwrap();

        let (next, video) = s.find_next_scheduled().unwrap();
        assert_eq!(video, 1);
        assert_eq!(from_timestamp(next.start_ts).unwrap().2, 3);
    }

    #[test]
    fn list_all_merges_and_truncates() {
        let mut s = store();
        s.insert(0, request(ts(5, 10, 0), ts(5, 11, 0))).unwrap();
        s.insert(1, request(ts(3, 10, 0), ts(3, 11, 0))).unwrap();
        s.insert(0, request(ts(4, 10, 0), ts(4, 11, 0))).unwrap();

        let all = s.list_all(None);
        let days: Vec<u32> = all
            .iter()
            .map(|e| from_timestamp(e.start_ts).unwrap().2)
            .collect();
        assert_eq!(days, vec![3, 4, 5]);

        assert_eq!(s.list_all(Some(2)).len(), 2);
    }

    #[test]
    fn series_masters_keep_lowest_occurrence_and_standalones() {
        let mut s = store();
        s.insert(0, request(ts(1, 10, 0), ts(1, 11, 0))).unwrap();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 3;
        s.insert(0, req).unwrap();

        let masters = s.series_masters();
        assert_eq!(masters.len(), 2);
        let series_master = masters.iter().find(|e| e.series_id.is_some()).unwrap();
        assert_eq!(series_master.series_start_number, 1);

        // after deleting the first occurrence the master moves forward
        s.delete_by_sequence(series_master.sequence_number, false)
            .unwrap();
        let masters = s.series_masters();
        let series_master = masters.iter().find(|e| e.series_id.is_some()).unwrap();
        assert_eq!(series_master.series_start_number, 2);
    }

    #[test]
    fn snapshot_covers_all_tuners() {
        let mut s = store();
        s.insert(0, request(ts(5, 10, 0), ts(5, 11, 0))).unwrap();
        s.insert(1, request(ts(3, 10, 0), ts(3, 11, 0))).unwrap();
        assert_eq!(s.snapshot().len(), 2);
    }

    #[test]
    fn distinct_series_get_distinct_ids() {
        let mut s = store();
        let mut req = request(ts(8, 10, 0), ts(8, 11, 0));
        req.recurrence = RecurrenceKind::Weekly;
        req.recurrence_count = 2;
        s.insert(0, req.clone()).unwrap();

        req.start_ts = ts(9, 10, 0);
        req.end_ts = ts(9, 11, 0);
        s.insert(0, req).unwrap();

        let ids: std::collections::HashSet<u64> = s.pending[0]
            .iter()
            .filter_map(|e| e.series_id)
            .collect();
        assert_eq!(ids.len(), 2);
    }
}
