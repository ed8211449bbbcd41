//! pvrd daemon entry point

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use pvrd::config::PvrSettings;
use pvrd::sched::{init_logging, PvrState};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(std::env::var("PVRD_DEBUG").is_ok());

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path);
    let settings = PvrSettings::load(&settings_path)?;

    let state = PvrState::new(&settings);
    state.start_background_tasks().await?;

    info!("pvrd running, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;

    state.stop().await;
    Ok(())
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pvrd")
        .join("settings.json")
}
