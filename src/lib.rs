pub mod config;
pub mod models;
pub mod parking;
pub mod persistence;
pub mod pricing;
pub mod state;
pub mod storage;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

pub use config::CoreConfig;
pub use parking::{ParkingController, ParkingError, PlateError};
pub use persistence::{LoadReport, Persistence, SliceStatus, StorageKeys};
pub use state::{AppState, StateChanges, StateStore};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StorageError};

const DATABASE_FILE_NAME: &str = "parkwise.sqlite3";

fn default_data_dir() -> PathBuf {
    std::env::var_os("PARKWISE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".parkwise"))
}

pub fn run() -> Result<()> {
    let data_dir = default_data_dir();
    let config = CoreConfig::load(&data_dir.join(config::CONFIG_FILE_NAME))?.apply_env();

    // Initialize logging; RUST_LOG still wins over the default level.
    let level = if config.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("Parkwise starting up...");

    let data_dir = config.data_dir.clone().unwrap_or(data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

    let storage = SqliteStorage::open(data_dir.join(DATABASE_FILE_NAME))?;
    let persistence = Persistence::new(storage, config.storage_keys());
    let mut controller = ParkingController::new(persistence, config);

    let report = controller.load();
    if report.seeded_default_plate() {
        match report.seed_error() {
            Some(err) => log::warn!("Seeded default plate but could not store it: {}", err),
            None => log::info!("Seeded default plate"),
        }
    }

    // Finalize sessions whose end time passed while we were not running.
    if let Some(session) = controller
        .end_expired_session(Utc::now())
        .context("Failed to end expired session")?
    {
        log::warn!(
            "Ended expired session in zone {}",
            session.zone.as_deref().unwrap_or("?")
        );
    }

    let state = controller.state();
    log::info!(
        "Loaded state: session={} plates={} favorites={} notifications={} estimated_cost={:.2}",
        state.session.is_some(),
        state.plates.len(),
        state.favorites.len(),
        state.notifications.len(),
        controller.estimated_cost()
    );
    for (slice, err) in report.failures() {
        log::warn!("{} slice fell back to defaults: {}", slice, err);
    }

    Ok(())
}
