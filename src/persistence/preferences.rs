use crate::{
    log_debug,
    state::{AppState, StateChanges, StateStore, Theme},
};

use super::{report_save, PersistError, Persistence, SaveStatus, SliceStatus};

const ENABLE_LOGS: bool = true;

/// Upper bound for the prefilled duration: one day.
pub const MAX_DEFAULT_DURATION_MINUTES: u32 = 1440;

impl Persistence {
    /// Stored as plain decimal text, not JSON.
    pub fn save_default_duration(&self, state: &AppState) -> SaveStatus {
        report_save(
            "Default duration",
            self.write_raw(
                &self.keys.default_duration,
                &state.default_duration_minutes.to_string(),
            ),
        )
    }

    /// Stored as plain text: `light`, `dark` or `system`.
    pub fn save_theme(&self, state: &AppState) -> SaveStatus {
        report_save("Theme", self.write_raw(&self.keys.theme, state.theme.as_str()))
    }

    /// Reloads the default duration and theme. Values that do not parse are
    /// ignored and the current ones kept.
    pub fn load_preferences(&self, store: &mut StateStore) -> SliceStatus {
        let mut changes = StateChanges::new();
        let mut failure = None;

        match self.read_raw(&self.keys.default_duration) {
            Ok(Some(raw)) => match parse_default_duration(&raw) {
                Some(minutes) => changes = changes.default_duration_minutes(minutes),
                None => {
                    failure.get_or_insert(PersistError::InvalidValue {
                        key: self.keys.default_duration.clone(),
                        value: raw,
                    });
                }
            },
            Ok(None) => {}
            Err(err) => {
                failure.get_or_insert(err);
            }
        }

        match self.read_raw(&self.keys.theme) {
            Ok(Some(raw)) => match Theme::parse(raw.trim()) {
                Some(theme) => changes = changes.theme(theme),
                None => {
                    failure.get_or_insert(PersistError::InvalidValue {
                        key: self.keys.theme.clone(),
                        value: raw,
                    });
                }
            },
            Ok(None) => {}
            Err(err) => {
                failure.get_or_insert(err);
            }
        }

        let found = !changes.is_empty();
        if found {
            store.update(changes);
        }

        match failure {
            Some(err) => {
                log_debug!("PERSIST", "Preferences partially ignored: {}", err);
                SliceStatus::Recovered(err)
            }
            None if found => SliceStatus::Loaded,
            None => SliceStatus::Missing,
        }
    }
}

fn parse_default_duration(raw: &str) -> Option<u32> {
    let minutes = raw.trim().parse::<i64>().ok().filter(|minutes| *minutes >= 0)?;
    Some(minutes.min(i64::from(MAX_DEFAULT_DURATION_MINUTES)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{persistence::StorageKeys, storage::MemoryStorage};

    #[test]
    fn default_duration_is_capped_and_validated() {
        assert_eq!(parse_default_duration("120"), Some(120));
        assert_eq!(parse_default_duration(" 0 "), Some(0));
        assert_eq!(parse_default_duration("5000"), Some(1440));
        assert_eq!(parse_default_duration("-30"), None);
        assert_eq!(parse_default_duration("two hours"), None);
    }

    #[test]
    fn preferences_round_trip() {
        let storage = MemoryStorage::new();
        let persistence = Persistence::new(storage.clone(), StorageKeys::default());
        let mut store = StateStore::default();
        store.update(
            StateChanges::new()
                .default_duration_minutes(90)
                .theme(Theme::Dark),
        );

        assert!(persistence.save_default_duration(store.get()).is_saved());
        assert!(persistence.save_theme(store.get()).is_saved());
        assert_eq!(storage.raw("parkwise.default-duration").as_deref(), Some("90"));
        assert_eq!(storage.raw("parkwise.theme").as_deref(), Some("dark"));

        let mut fresh = StateStore::default();
        assert!(persistence.load_preferences(&mut fresh).is_loaded());
        assert_eq!(fresh.get().default_duration_minutes, 90);
        assert_eq!(fresh.get().theme, Theme::Dark);
    }

    #[test]
    fn unknown_theme_is_ignored_but_duration_still_loads() {
        let storage = MemoryStorage::new();
        storage.insert_raw("parkwise.theme", "sepia");
        storage.insert_raw("parkwise.default-duration", "60");
        let persistence = Persistence::new(storage, StorageKeys::default());
        let mut store = StateStore::default();

        let status = persistence.load_preferences(&mut store);
        assert!(matches!(
            status,
            SliceStatus::Recovered(PersistError::InvalidValue { .. })
        ));
        assert_eq!(store.get().theme, Theme::System);
        assert_eq!(store.get().default_duration_minutes, 60);
    }
}
