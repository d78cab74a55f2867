use chrono::{DateTime, Utc};

use crate::{
    log_debug,
    models::{Notification, NotificationSettings},
    state::StateChanges,
};

use super::{ParkingController, Slice};

const ENABLE_LOGS: bool = true;

impl ParkingController {
    /// Records a notification unless its kind is switched off in the settings.
    /// Unknown kinds are always recorded. Only the newest `notification_limit`
    /// entries are kept. Returns whether it was recorded.
    pub fn add_notification(
        &mut self,
        kind: &str,
        message: &str,
        detail: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let state = self.state();
        if !state.notification_settings.allows(kind) {
            log_debug!("NOTIFY", "{} disabled, skipping", kind);
            return false;
        }

        let mut notifications = state.notifications.clone();
        notifications.push(Notification::new(kind, message, detail, now));
        let limit = self.config().notification_limit;
        if notifications.len() > limit {
            let excess = notifications.len() - limit;
            notifications.drain(..excess);
        }

        self.store_mut()
            .update(StateChanges::new().notifications(notifications));
        self.persist(Slice::Notifications);
        true
    }

    pub fn update_notification_settings(&mut self, settings: NotificationSettings) {
        self.store_mut()
            .update(StateChanges::new().notification_settings(settings));
        self.persist(Slice::Notifications);
    }

    pub fn clear_notifications(&mut self) {
        self.store_mut()
            .update(StateChanges::new().notifications(Vec::new()));
        self.persist(Slice::Notifications);
    }
}
