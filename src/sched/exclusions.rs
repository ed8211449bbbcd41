//! Series exclusion tracking
//!
//! When a single occurrence of a recurring series is deleted, its
//! occurrence number is recorded here so that later regeneration of the
//! series (by the persistence collaborator) does not resurrect it.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::sched::error::SchedError;

/// Hard ceiling on individually deleted occurrences per series
pub const MAX_EXCLUSIONS_PER_SERIES: usize = 1024;

/// Per-series sets of individually deleted occurrence numbers
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SeriesExclusions {
    excluded: HashMap<u64, BTreeSet<u32>>,
}

impl SeriesExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence number as deleted. Fails when the series'
    /// set is at capacity; the caller must treat that as a hard error.
    pub fn mark_excluded(&mut self, series_id: u64, occurrence: u32) -> Result<(), SchedError> {
        let set = self.excluded.entry(series_id).or_default();
        if !set.contains(&occurrence) && set.len() >= MAX_EXCLUSIONS_PER_SERIES {
            return Err(SchedError::ExclusionCapacityExceeded(series_id));
        }
        set.insert(occurrence);
        Ok(())
    }

    pub fn has_exclusions(&self, series_id: u64) -> bool {
        self.excluded
            .get(&series_id)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    pub fn is_excluded(&self, series_id: u64, occurrence: u32) -> bool {
        self.excluded
            .get(&series_id)
            .map(|set| set.contains(&occurrence))
            .unwrap_or(false)
    }

    /// Excluded occurrence numbers of one series, ascending. Finite and
    /// restartable; each call iterates from the beginning.
    pub fn iter(&self, series_id: u64) -> impl Iterator<Item = u32> + '_ {
        self.excluded
            .get(&series_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}
