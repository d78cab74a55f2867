use serde_json::Value;

use crate::{
    log_warn,
    models::{Notification, NotificationSettings},
    state::{AppState, StateChanges, StateStore},
};

use super::{report_save, PersistError, Persistence, SaveStatus, SliceStatus};

const ENABLE_LOGS: bool = true;

impl Persistence {
    /// Writes the notification list and the settings map together.
    pub fn save_notifications(&self, state: &AppState) -> SaveStatus {
        let result = self
            .write_json(&self.keys.notifications, &state.notifications)
            .and_then(|()| {
                self.write_json(
                    &self.keys.notification_settings,
                    &state.notification_settings,
                )
            });
        report_save("Notifications", result)
    }

    /// Reloads the notification list and settings. Stored settings are laid
    /// over the defaults key by key, so toggles added after the payload was
    /// written keep their default value and a mistyped key only loses itself.
    /// Unparseable settings reset to defaults; a corrupt list leaves the
    /// current list in place.
    pub fn load_notifications(&self, store: &mut StateStore) -> SliceStatus {
        let mut changes = StateChanges::new();
        let mut failure = None;

        match self.read_json::<Vec<Notification>>(&self.keys.notifications) {
            Ok(Some(notifications)) => changes = changes.notifications(notifications),
            Ok(None) => {}
            Err(err) => {
                log_warn!("PERSIST", "Notifications load failed: {}", err);
                failure = Some(err);
            }
        }

        let settings_key = &self.keys.notification_settings;
        match self.read_json::<Value>(settings_key) {
            Ok(Some(Value::Object(stored))) => {
                let mut settings = NotificationSettings::default();
                let rejected = settings.overlay(stored);
                if !rejected.is_empty() {
                    let err = PersistError::InvalidValue {
                        key: settings_key.clone(),
                        value: rejected.join(", "),
                    };
                    log_warn!("PERSIST", "Notification settings partially ignored: {}", err);
                    failure.get_or_insert(err);
                }
                changes = changes.notification_settings(settings);
            }
            Ok(Some(other)) => {
                let err = PersistError::InvalidValue {
                    key: settings_key.clone(),
                    value: other.to_string(),
                };
                log_warn!("PERSIST", "Notification settings unusable, using defaults: {}", err);
                changes = changes.notification_settings(NotificationSettings::default());
                failure.get_or_insert(err);
            }
            Ok(None) => {}
            Err(err) => {
                log_warn!("PERSIST", "Notification settings load failed, using defaults: {}", err);
                changes = changes.notification_settings(NotificationSettings::default());
                failure.get_or_insert(err);
            }
        }

        let found = changes.notifications.is_some() || changes.notification_settings.is_some();
        if !changes.is_empty() {
            store.update(changes);
        }

        match failure {
            Some(err) => SliceStatus::Recovered(err),
            None if found => SliceStatus::Loaded,
            None => SliceStatus::Missing,
        }
    }
}
