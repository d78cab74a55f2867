//! Slice-by-slice persistence of [`AppState`] into a [`Storage`] backend.
//!
//! Five slices are stored under independent keys: session, plates,
//! notifications (list + settings), favorites and preferences. A failure in
//! one slice never stops another from loading or saving. Loads always end in
//! a usable state and report what happened through [`SliceStatus`]; saves
//! report through [`SaveStatus`], except the session save, whose failure is
//! returned to the caller as an error.

mod favorites;
mod notifications;
mod plates;
mod preferences;
mod session;

pub use favorites::normalize_favorites;
pub use plates::PlateLoad;
pub use preferences::MAX_DEFAULT_DURATION_MINUTES;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    log_debug, log_warn,
    state::{AppState, StateStore},
    storage::{Storage, StorageError},
};

const ENABLE_LOGS: bool = true;

/// Physical storage keys, one per stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub session: String,
    pub plates: String,
    pub notifications: String,
    pub notification_settings: String,
    pub favorites: String,
    pub default_duration: String,
    pub theme: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        let key = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            }
        };
        Self {
            session: key("session"),
            plates: key("plates"),
            notifications: key("notifications"),
            notification_settings: key("notification-settings"),
            favorites: key("favorites"),
            default_duration: key("default-duration"),
            theme: key("theme"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("parkwise")
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage access for '{key}' failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("stored value for '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored value for '{key}' is not usable: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl PersistError {
    pub fn key(&self) -> &str {
        match self {
            PersistError::Storage { key, .. }
            | PersistError::Corrupt { key, .. }
            | PersistError::Encode { key, .. }
            | PersistError::InvalidValue { key, .. } => key,
        }
    }
}

/// Outcome of loading one slice. Loading never fails outright: on error the
/// slice falls back to its safe default and the cause is kept here.
#[derive(Debug)]
pub enum SliceStatus {
    Loaded,
    Missing,
    Recovered(PersistError),
}

impl SliceStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SliceStatus::Loaded)
    }

    pub fn error(&self) -> Option<&PersistError> {
        match self {
            SliceStatus::Recovered(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of saving a non-session slice. Failures are already logged; the
/// in-memory state stays authoritative until a later save succeeds.
#[derive(Debug)]
#[must_use]
pub enum SaveStatus {
    Saved,
    Failed(PersistError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }

    pub fn error(&self) -> Option<&PersistError> {
        match self {
            SaveStatus::Failed(err) => Some(err),
            SaveStatus::Saved => None,
        }
    }

    pub fn into_result(self) -> Result<(), PersistError> {
        match self {
            SaveStatus::Saved => Ok(()),
            SaveStatus::Failed(err) => Err(err),
        }
    }
}

#[derive(Debug)]
pub struct LoadReport {
    pub session: SliceStatus,
    pub plates: SliceStatus,
    /// Save outcome of the default plate, when one had to be created.
    pub default_plate_seed: Option<SaveStatus>,
    pub notifications: SliceStatus,
    pub favorites: SliceStatus,
    pub preferences: SliceStatus,
}

impl LoadReport {
    pub fn seeded_default_plate(&self) -> bool {
        self.default_plate_seed.is_some()
    }

    /// Why the seeded default plate could not be written, if it was not.
    pub fn seed_error(&self) -> Option<&PersistError> {
        self.default_plate_seed.as_ref().and_then(SaveStatus::error)
    }

    /// Slices that fell back to defaults, with the error that caused it.
    pub fn failures(&self) -> Vec<(&'static str, &PersistError)> {
        [
            ("session", &self.session),
            ("plates", &self.plates),
            ("notifications", &self.notifications),
            ("favorites", &self.favorites),
            ("preferences", &self.preferences),
        ]
        .into_iter()
        .filter_map(|(slice, status)| status.error().map(|err| (slice, err)))
        .collect()
    }
}

pub struct Persistence {
    storage: Box<dyn Storage>,
    keys: StorageKeys,
}

impl Persistence {
    pub fn new(storage: impl Storage + 'static, keys: StorageKeys) -> Self {
        Self {
            storage: Box::new(storage),
            keys,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Loads every slice into `store`. Each slice is attempted regardless of
    /// how the others went.
    pub fn load_all(&self, store: &mut StateStore) -> LoadReport {
        log_debug!("PERSIST", "Loading local state...");

        let session = self.load_session(store);
        let PlateLoad { status: plates, seed } = self.load_plates(store);
        let notifications = self.load_notifications(store);
        let favorites = self.load_favorites(store);
        let preferences = self.load_preferences(store);

        let report = LoadReport {
            session,
            plates,
            default_plate_seed: seed,
            notifications,
            favorites,
            preferences,
        };

        for (slice, err) in report.failures() {
            log_warn!("PERSIST", "{} slice recovered with defaults: {}", slice, err);
        }

        report
    }

    /// Saves every slice from `state`, stopping at the first failure.
    pub fn save_all(&self, state: &AppState) -> Result<(), PersistError> {
        self.save_session(state)?;
        self.save_plates(state).into_result()?;
        self.save_notifications(state).into_result()?;
        self.save_favorites(state).into_result()?;
        self.save_default_duration(state).into_result()?;
        self.save_theme(state).into_result()
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.storage
            .get_item(key)
            .map_err(|source| PersistError::Storage {
                key: key.to_string(),
                source,
            })
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistError> {
        let Some(raw) = self.read_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn write_raw(&self, key: &str, raw: &str) -> Result<(), PersistError> {
        self.storage
            .set_item(key, raw)
            .map_err(|source| PersistError::Storage {
                key: key.to_string(),
                source,
            })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let raw = serde_json::to_string(value).map_err(|source| PersistError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.write_raw(key, &raw)
    }
}

fn report_save(slice: &str, result: Result<(), PersistError>) -> SaveStatus {
    match result {
        Ok(()) => SaveStatus::Saved,
        Err(err) => {
            log_warn!("PERSIST", "{} save failed: {}", slice, err);
            SaveStatus::Failed(err)
        }
    }
}
