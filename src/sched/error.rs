//! Error taxonomy for the scheduling core
//!
//! Every expected rejection (overlap, capacity, bad lookup) is a value
//! returned from the store's public operations. Only internal invariant
//! violations carry the "internal" marker; those fail the offending
//! operation but never corrupt shared state.

use thiserror::Error;

/// Errors produced by the scheduling core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedError {
    /// Candidate window, or one occurrence of a candidate series,
    /// intersects a pending or ongoing recording on the target tuner.
    #[error("recording collides with existing recordings on this tuner")]
    OverlapConflict,

    /// The tuner's pending collection cannot hold the requested
    /// additional occurrences.
    #[error("no free slots: {requested} more entries would exceed the per-tuner limit of {max}")]
    CapacityExceeded { requested: u32, max: usize },

    /// Referenced sequence number does not exist on any tuner.
    #[error("no recording with sequence number {0}")]
    NotFound(u64),

    /// Referenced tuner id is outside the configured range.
    #[error("no such video resource {0}")]
    NoSuchVideo(usize),

    /// The requested start/end pair is not a valid window.
    #[error("invalid recording window: start must precede end")]
    InvalidWindow,

    /// Named transcoding profile is not registered.
    #[error("unknown transcoding profile '{0}'")]
    InvalidProfile(String),

    /// A composed calendar date could not be normalized. Indicates a
    /// corrupted internal computation, not bad user input.
    #[error("time conversion failed: {0}")]
    TimeConversion(String),

    /// Recurrence code outside the supported enumeration.
    #[error("unknown recurrence type code {0}")]
    UnknownRecurrence(u32),

    /// The per-series exclusion set is full.
    #[error("exclusion list full for series {0}")]
    ExclusionCapacityExceeded(u64),
}

impl SchedError {
    /// True for errors that indicate an internal defect rather than a
    /// rejectable request. Callers log these at error level and refuse
    /// the single offending operation.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SchedError::TimeConversion(_) | SchedError::UnknownRecurrence(_)
        )
    }
}
