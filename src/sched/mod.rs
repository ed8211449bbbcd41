//! PVR scheduling module
//!
//! Owns the per-tuner recording schedule, recurrence expansion, overlap
//! detection, and the background promotion loop. All mutable state sits
//! behind one mutex; every public store operation is a single critical
//! section, so no collaborator ever sees a half-expanded series.

pub mod error;
pub mod exclusions;
pub mod format;
pub mod models;
pub mod overlap;
pub mod recur;
pub mod scheduler;
pub mod store;
pub mod timecalc;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::PvrSettings;
use crate::profiles::StaticProfiles;
use crate::sched::scheduler::Scheduler;
use crate::sched::store::ScheduleStore;

/// Shared state for the scheduling daemon
#[derive(Clone)]
pub struct PvrState {
    pub store: Arc<Mutex<ScheduleStore>>,
    pub scheduler: Arc<RwLock<Scheduler>>,
}

impl PvrState {
    /// Initialize the scheduling system from daemon settings
    pub fn new(settings: &PvrSettings) -> Self {
        info!(
            "Initializing PVR scheduler: {} tuners, {} entries per tuner",
            settings.max_videos, settings.max_entries
        );

        let registry = Arc::new(StaticProfiles::from_settings(settings));
        let store = Arc::new(Mutex::new(ScheduleStore::new(settings, registry)));
        let scheduler = Arc::new(RwLock::new(Scheduler::new(store.clone())));

        Self { store, scheduler }
    }

    /// Start the background promotion loop
    pub async fn start_background_tasks(&self) -> anyhow::Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler.start().await?;
        info!("All background tasks started");
        Ok(())
    }

    /// Stop background tasks gracefully
    pub async fn stop(&self) {
        let mut scheduler = self.scheduler.write().await;
        scheduler.stop().await;
        info!("PVR scheduler stopped");
    }
}

/// Initialize logging for the daemon
pub fn init_logging(debug_logging: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug_logging {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
