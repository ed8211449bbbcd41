//! pvrd: personal video recorder scheduling daemon
//!
//! The core is an in-memory, per-tuner recording schedule: requests
//! (single or recurring) are checked for time collisions, recurring
//! requests are expanded into concrete occurrences with deterministic
//! title/filename mangling, and committed entries can be listed,
//! re-profiled, or cancelled individually or as a whole series.
//! Persistence, tuner hardware control, and transcoding are external
//! collaborators; the store performs no I/O.

pub mod config;
pub mod profiles;
pub mod sched;

pub use config::PvrSettings;
pub use profiles::{ProfileRegistry, StaticProfiles};
pub use sched::error::SchedError;
pub use sched::exclusions::SeriesExclusions;
pub use sched::format::RecordFormat;
pub use sched::models::{RecordingEntry, RecurrenceKind, ScheduleRequest, TitleMangling};
pub use sched::store::ScheduleStore;
pub use sched::{init_logging, PvrState};
