//! Recording promotion scheduler
//!
//! Polls the schedule store and moves due entries into the per-tuner
//! ongoing slot, freeing slots whose recording window has ended.
//! Uses tokio-cron-scheduler for the repeated job.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::sched::store::ScheduleStore;

/// Window in seconds to look ahead for due recordings
const SCHEDULING_WINDOW_SECONDS: i64 = 60;

/// How late a recording may still be started after its scheduled start
const MISSED_RECORDING_GRACE_SECONDS: i64 = 300;

/// Poll interval in seconds
const POLL_INTERVAL_SECONDS: u32 = 30;

/// Drives pending entries through their Pending -> Ongoing transition
pub struct Scheduler {
    store: Arc<Mutex<ScheduleStore>>,
    scheduler: Option<JobScheduler>,
    is_running: bool,
}

impl Scheduler {
    pub fn new(store: Arc<Mutex<ScheduleStore>>) -> Self {
        Self {
            store,
            scheduler: None,
            is_running: false,
        }
    }

    /// Start the background polling job
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running {
            warn!("Scheduler already running");
            return Ok(());
        }

        info!(
            "Starting promotion scheduler (polling every {} seconds)",
            POLL_INTERVAL_SECONDS
        );

        let sched = JobScheduler::new().await?;
        let store = self.store.clone();

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(POLL_INTERVAL_SECONDS as u64),
            move |_uuid, _l| {
                let store = store.clone();
                Box::pin(async move {
                    poll_store(&store);
                })
            },
        )?;
        sched.add(job).await?;

        // run one poll immediately so a freshly started daemon picks up
        // already-due entries
        poll_store(&self.store);

        sched.start().await?;
        self.scheduler = Some(sched);
        self.is_running = true;

        info!("Promotion scheduler started");
        Ok(())
    }

    /// Stop the background polling job
    pub async fn stop(&mut self) {
        if !self.is_running {
            return;
        }
        info!("Stopping promotion scheduler");
        if let Some(mut sched) = self.scheduler.take() {
            if let Err(e) = sched.shutdown().await {
                error!("Error shutting down scheduler: {}", e);
            }
        }
        self.is_running = false;
        info!("Promotion scheduler stopped");
    }
}

/// One pass over every tuner: clear finished ongoing recordings, drop
/// pending entries that can no longer be started, then promote the
/// earliest due pending entry into each free slot. Runs entirely under
/// the store lock.
fn poll_store(store: &Arc<Mutex<ScheduleStore>>) {
    let now = chrono::Utc::now().timestamp();
    let mut guard = store.lock();

    for video in 0..guard.video_count() {
        let finished = matches!(guard.ongoing(video), Ok(Some(active)) if active.end_ts <= now);
        if finished {
            if let Ok(Some(done)) = guard.clear_ongoing(video) {
                info!(
                    "Recording #{} '{}' finished on tuner {}",
                    done.sequence_number, done.title, video
                );
            }
        }

        // an entry whose window already ended, or whose start was
        // missed by more than the grace period, is never started
        loop {
            let stale = matches!(
                guard.peek_top(video),
                Ok(Some(top)) if top.end_ts <= now
                    || top.start_ts < now - MISSED_RECORDING_GRACE_SECONDS
            );
            if !stale {
                break;
            }
            match guard.pop_top(video) {
                Ok(Some(missed)) => warn!(
                    "Dropping missed recording #{} '{}' on tuner {}",
                    missed.sequence_number, missed.title, video
                ),
                _ => break,
            }
        }

        let due = matches!(
            guard.peek_top(video),
            Ok(Some(top)) if top.start_ts <= now + SCHEDULING_WINDOW_SECONDS
        );
        if due {
            match guard.promote_to_ongoing(video) {
                Ok(Some(_)) => {}
                Ok(None) => {} // slot still occupied; retry next poll
                Err(e) => error!("Failed to promote entry on tuner {}: {}", video, e),
            }
        }
    }
}
