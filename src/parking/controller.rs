use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::CoreConfig,
    log_info, log_warn,
    models::{NotificationKind, Session, SessionTime, Zone},
    persistence::{LoadReport, Persistence},
    pricing::{self, EndAdjustment},
    state::{AppState, ChangeNotifier, Language, Screen, StateChanges, StateField, StateStore},
};

use super::{ParkingError, Slice};

const ENABLE_LOGS: bool = true;

/// Owns the application state and its persistence adapter, and runs the
/// parking workflows against them. All writes to state go through here.
pub struct ParkingController {
    store: StateStore,
    persistence: Persistence,
    config: CoreConfig,
    /// Slices whose last save failed; state is ahead of storage for these.
    unsaved: BTreeSet<Slice>,
}

impl ParkingController {
    pub fn new(persistence: Persistence, config: CoreConfig) -> Self {
        Self::with_store(StateStore::default(), persistence, config)
    }

    pub fn with_store(store: StateStore, persistence: Persistence, config: CoreConfig) -> Self {
        Self {
            store,
            persistence,
            config,
            unsaved: BTreeSet::new(),
        }
    }

    pub fn set_notifier(&mut self, notifier: impl ChangeNotifier + 'static) {
        self.store.set_notifier(Some(Box::new(notifier)));
    }

    pub fn state(&self) -> &AppState {
        self.store.get()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Merges UI-level changes (screen, zone selection, search) into state.
    pub fn update(&mut self, changes: StateChanges) -> Vec<StateField> {
        self.store.update(changes)
    }

    pub fn load(&mut self) -> LoadReport {
        let report = self.persistence.load_all(&mut self.store);
        if report.seed_error().is_some() {
            self.unsaved.insert(Slice::Plates);
        }
        report
    }

    pub(super) fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Saves one slice and tracks whether storage now matches state.
    pub(super) fn persist(&mut self, slice: Slice) -> bool {
        let state = self.store.get();
        let status = match slice {
            Slice::Plates => self.persistence.save_plates(state),
            Slice::Notifications => self.persistence.save_notifications(state),
            Slice::Favorites => self.persistence.save_favorites(state),
        };

        let saved = status.is_saved();
        if saved {
            self.unsaved.remove(&slice);
        } else {
            self.unsaved.insert(slice);
        }
        saved
    }

    /// Slices changed in memory whose save has not succeeded yet.
    pub fn unsaved_slices(&self) -> Vec<Slice> {
        self.unsaved.iter().copied().collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.unsaved.is_empty()
    }

    /// Saves every slice whose last save failed. Returns those still unsaved.
    pub fn retry_unsaved(&mut self) -> Vec<Slice> {
        for slice in self.unsaved_slices() {
            if !self.persist(slice) {
                log_warn!("PERSIST", "{} still unsaved", slice.as_str());
            }
        }
        self.unsaved_slices()
    }

    pub fn start_session(&mut self, now: DateTime<Utc>) -> Result<Session, ParkingError> {
        let state = self.store.get();
        if state.session.is_some() {
            log_warn!("PARKING_START", "Blocked: session already active");
            return Err(ParkingError::SessionAlreadyActive);
        }
        let Some(selected) = state.selected_zone.clone() else {
            log_warn!("PARKING_START", "Blocked: no selected zone");
            return Err(ParkingError::NoZoneSelected);
        };
        let Some(zone) = state.find_zone(&selected) else {
            log_warn!(
                "PARKING_START",
                "Zone {} not found in zones list (zones count: {})",
                selected,
                state.zones.len()
            );
            return Err(ParkingError::ZoneNotFound(selected));
        };

        let end = if state.duration > 0 {
            now.checked_add_signed(Duration::minutes(i64::from(state.duration)))
        } else {
            None
        };
        let mut session = Session::new(now, end);
        session.id = Some(Uuid::new_v4().to_string());
        session.zone = Some(zone.id.clone());
        session.zone_uid = Some(selected);
        session.plate = state.active_plate().map(|plate| plate.text.clone());
        session.rate = Some(pricing::resolve_hourly_rate(
            Some(zone),
            self.config.fallback_hourly_rate,
        ));

        self.store.update(
            StateChanges::new()
                .session(Some(session.clone()))
                .active_overlay(None)
                .selected_zone(None),
        );
        self.persistence.save_session(self.store.get())?;

        log_info!(
            "PARKING_START",
            "Session started in zone {} (until {})",
            session.zone.as_deref().unwrap_or("?"),
            end.map(|end| end.to_rfc3339())
                .unwrap_or_else(|| "stopped".to_string())
        );

        let detail = session_detail(&session, None);
        let message = match self.store.get().language {
            Language::Nl => "Parkeersessie gestart",
            Language::En => "Parking session started",
        };
        self.add_notification(NotificationKind::SessionStarted.as_str(), message, &detail, now);

        Ok(session)
    }

    /// Ends the active session on the user's request.
    pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<Session, ParkingError> {
        let Some(session) = self.clear_session()? else {
            log_warn!("PARKING_END", "Blocked: no active session");
            return Err(ParkingError::NoActiveSession);
        };

        let detail = session_detail(&session, self.store.get().zone_for_session(&session));
        let message = match self.store.get().language {
            Language::Nl => "Parkeersessie beëindigd",
            Language::En => "Parking session ended",
        };
        self.add_notification(
            NotificationKind::SessionEndedByUser.as_str(),
            message,
            &detail,
            now,
        );

        Ok(session)
    }

    /// Ends the active session because the zone's maximum time was reached.
    /// Returns `None` when nothing was active.
    pub fn end_session_by_max_time(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, ParkingError> {
        let Some(session) = self.clear_session()? else {
            return Ok(None);
        };

        let detail = session_detail(&session, self.store.get().zone_for_session(&session));
        let message = match self.store.get().language {
            Language::Nl => "Parkeersessie beëindigd (maximale parkeertijd bereikt)",
            Language::En => "Parking session ended (maximum parking time reached)",
        };
        self.add_notification(
            NotificationKind::SessionEndedByMaxTime.as_str(),
            message,
            &detail,
            now,
        );

        Ok(Some(session))
    }

    /// Ends the active session when its end time has passed. Open-ended
    /// sessions and sessions with an unreadable end are left alone.
    pub fn end_expired_session(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, ParkingError> {
        let expired = self
            .store
            .get()
            .session
            .as_ref()
            .and_then(Session::end_at)
            .is_some_and(|end| end <= now);
        if !expired {
            return Ok(None);
        }
        let Some(session) = self.clear_session()? else {
            return Ok(None);
        };

        log_info!(
            "PARKING_END",
            "Session in zone {} reached its end time",
            session.zone.as_deref().unwrap_or("?")
        );
        let detail = session_detail(&session, self.store.get().zone_for_session(&session));
        let message = match self.store.get().language {
            Language::Nl => "Parkeersessie automatisch beëindigd (eindtijd bereikt)",
            Language::En => "Parking session ended automatically (end time reached)",
        };
        self.add_notification(
            NotificationKind::SessionEndedByUser.as_str(),
            message,
            &detail,
            now,
        );

        Ok(Some(session))
    }

    /// Moves the end of the active session; see [`pricing::adjust_session_end`].
    pub fn extend_session_end(
        &mut self,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<EndAdjustment, ParkingError> {
        let state = self.store.get();
        let Some(session) = state.session.clone() else {
            return Err(ParkingError::NoActiveSession);
        };
        let max = state.session_zone().and_then(Zone::max_duration);

        let adjustment = pricing::adjust_session_end(session.end_at(), delta, max, now);
        if let EndAdjustment::Set(end) = adjustment {
            let session = Session {
                end: end.map(SessionTime::Valid),
                ..session
            };
            self.store.update(StateChanges::new().session(Some(session)));
            self.persistence.save_session(self.store.get())?;
        }

        Ok(adjustment)
    }

    pub fn modify_duration(&mut self, delta: i32) -> u32 {
        pricing::modify_duration(&mut self.store, delta)
    }

    /// Cost of the duration currently picked for the selected zone.
    pub fn estimated_cost(&self) -> f64 {
        let state = self.store.get();
        let rate =
            pricing::resolve_hourly_rate(state.selected_zone(), self.config.fallback_hourly_rate);
        pricing::calculate_cost(f64::from(state.duration), rate)
    }

    pub fn sign_out(&mut self) -> Result<(), ParkingError> {
        self.store.update(
            StateChanges::new()
                .session(None)
                .active_overlay(None)
                .screen(Screen::Login),
        );
        self.persistence.save_session(self.store.get())?;
        Ok(())
    }

    fn clear_session(&mut self) -> Result<Option<Session>, ParkingError> {
        let Some(session) = self.store.get().session.clone() else {
            return Ok(None);
        };
        self.store
            .update(StateChanges::new().session(None).active_overlay(None));
        self.persistence.save_session(self.store.get())?;
        Ok(Some(session))
    }
}

fn session_detail(session: &Session, zone: Option<&Zone>) -> String {
    let zone_label = zone
        .map(|zone| zone.id.as_str())
        .or(session.zone.as_deref())
        .unwrap_or("?");
    let plate = session.plate.as_deref().unwrap_or("?");
    format!("{zone_label} · {plate}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;
    use crate::{
        models::{Plate, Zone},
        persistence::StorageKeys,
        storage::MemoryStorage,
    };

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, hour, minute, 0).unwrap()
    }

    fn zone() -> Zone {
        Zone {
            uid: Some("z-101".into()),
            price: Some(Value::from(3.0)),
            max_duration_mins: Some(120),
            ..Zone::new("101")
        }
    }

    fn controller() -> (ParkingController, MemoryStorage) {
        let storage = MemoryStorage::new();
        let mut controller = ParkingController::new(
            Persistence::new(storage.clone(), StorageKeys::default()),
            CoreConfig::default(),
        );
        controller.update(
            StateChanges::new()
                .zones(vec![zone()])
                .plates(vec![Plate::seeded_default()]),
        );
        (controller, storage)
    }

    #[test]
    fn start_requires_a_known_selected_zone() {
        let (mut controller, _) = controller();
        assert!(matches!(
            controller.start_session(at(9, 0)),
            Err(ParkingError::NoZoneSelected)
        ));

        controller.update(StateChanges::new().selected_zone(Some("nope".into())));
        assert!(matches!(
            controller.start_session(at(9, 0)),
            Err(ParkingError::ZoneNotFound(key)) if key == "nope"
        ));
        assert!(controller.state().session.is_none());
    }

    #[test]
    fn start_builds_and_saves_the_session() {
        let (mut controller, storage) = controller();
        controller.update(
            StateChanges::new()
                .selected_zone(Some("z-101".into()))
                .active_overlay(Some("sheet-zone".into()))
                .duration(90),
        );

        let session = controller.start_session(at(9, 0)).expect("start");

        assert_eq!(session.zone.as_deref(), Some("101"));
        assert_eq!(session.zone_uid.as_deref(), Some("z-101"));
        assert_eq!(session.plate.as_deref(), Some("1-ABC-123"));
        assert_eq!(session.rate, Some(3.0));
        assert_eq!(session.end_at(), Some(at(10, 30)));
        assert!(session.id.is_some());

        let state = controller.state();
        assert_eq!(state.session.as_ref(), Some(&session));
        assert_eq!(state.active_overlay, None);
        assert_eq!(state.selected_zone, None);
        assert_eq!(state.notifications.len(), 1);
        assert_eq!(state.notifications[0].kind, "sessionStarted");
        assert_eq!(state.notifications[0].detail, "101 · 1-ABC-123");

        let stored = storage.raw("parkwise.session").expect("session stored");
        assert!(stored.contains("\"start\":\"2025-05-02T09:00:00.000Z\""));

        assert!(matches!(
            controller.start_session(at(9, 5)),
            Err(ParkingError::SessionAlreadyActive)
        ));
    }

    #[test]
    fn zero_duration_starts_an_open_ended_session() {
        let (mut controller, _) = controller();
        controller.update(StateChanges::new().selected_zone(Some("101".into())));
        let session = controller.start_session(at(9, 0)).expect("start");
        assert!(session.is_until_stopped());
    }

    #[test]
    fn session_save_failure_is_returned() {
        let (mut controller, storage) = controller();
        controller.update(StateChanges::new().selected_zone(Some("101".into())));
        storage.set_fail_writes(true);

        assert!(matches!(
            controller.start_session(at(9, 0)),
            Err(ParkingError::Persist(_))
        ));
        assert!(controller.state().session.is_some());
    }

    #[test]
    fn end_clears_and_records_why() {
        let (mut controller, storage) = controller();
        assert!(matches!(
            controller.end_session(at(9, 0)),
            Err(ParkingError::NoActiveSession)
        ));
        assert!(controller
            .end_session_by_max_time(at(9, 0))
            .expect("no-op")
            .is_none());

        controller.update(StateChanges::new().selected_zone(Some("101".into())));
        controller.start_session(at(9, 0)).expect("start");
        let ended = controller
            .end_session_by_max_time(at(11, 0))
            .expect("end")
            .expect("was active");

        assert_eq!(ended.zone.as_deref(), Some("101"));
        assert!(controller.state().session.is_none());
        assert_eq!(
            storage.raw("parkwise.session").as_deref(),
            Some("null")
        );
        let kinds: Vec<_> = controller
            .state()
            .notifications
            .iter()
            .map(|n| n.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["sessionStarted", "sessionEndedByMaxTime"]);
    }

    #[test]
    fn expired_sessions_end_automatically() {
        let (mut controller, _) = controller();
        controller.update(
            StateChanges::new()
                .selected_zone(Some("101".into()))
                .duration(30),
        );
        controller.start_session(at(9, 0)).expect("start");

        assert!(controller
            .end_expired_session(at(9, 29))
            .expect("check")
            .is_none());
        assert!(controller.state().session.is_some());

        let ended = controller.end_expired_session(at(9, 30)).expect("check");
        assert!(ended.is_some());
        assert!(controller.state().session.is_none());
        assert_eq!(
            controller.state().notifications.last().map(|n| n.kind.as_str()),
            Some("sessionEndedByUser")
        );
    }

    #[test]
    fn extending_respects_zone_maximum_and_shortening_opens_the_end() {
        let (mut controller, _) = controller();
        controller.update(
            StateChanges::new()
                .selected_zone(Some("z-101".into()))
                .duration(60),
        );
        controller.start_session(at(9, 0)).expect("start");

        let now = at(9, 10);
        assert_eq!(
            controller.extend_session_end(60, now).expect("extend"),
            EndAdjustment::Set(Some(at(11, 0)))
        );
        assert_eq!(
            controller.extend_session_end(60, now).expect("extend"),
            EndAdjustment::Set(Some(at(11, 10)))
        );
        assert_eq!(
            controller.extend_session_end(-60, at(10, 30)).expect("shorten"),
            EndAdjustment::Set(None)
        );
        assert!(controller
            .state()
            .session
            .as_ref()
            .expect("still active")
            .is_until_stopped());
    }

    #[test]
    fn out_of_range_stored_end_does_not_break_extending() {
        let (mut controller, storage) = controller();
        storage.insert_raw(
            "parkwise.session",
            r#"{"start":"2025-03-01T09:30:00Z","end":8210266876799000}"#,
        );
        controller.load();
        assert!(controller.state().session.is_some());

        assert_eq!(
            controller.extend_session_end(30, at(9, 0)).expect("extend"),
            EndAdjustment::Unchanged
        );
        assert!(controller.state().session.is_some());
    }

    #[test]
    fn failed_saves_are_tracked_until_a_retry_succeeds() {
        let (mut controller, storage) = controller();
        storage.set_fail_writes(true);

        controller.add_plate("AB12CD", "").expect("state updated");
        controller.toggle_favorite("z-101", "101");
        assert!(controller.has_unsaved_changes());
        assert_eq!(
            controller.unsaved_slices(),
            vec![Slice::Plates, Slice::Favorites]
        );
        assert_eq!(
            controller.retry_unsaved(),
            vec![Slice::Plates, Slice::Favorites]
        );

        storage.set_fail_writes(false);
        assert!(controller.retry_unsaved().is_empty());
        assert!(!controller.has_unsaved_changes());
        assert!(storage
            .raw("parkwise.plates")
            .is_some_and(|raw| raw.contains("AB12CD")));
        assert!(storage.raw("parkwise.favorites").is_some());
    }

    #[test]
    fn estimated_cost_uses_zone_price_or_fallback() {
        let (mut controller, _) = controller();
        controller.update(StateChanges::new().duration(90));
        assert!((controller.estimated_cost() - 3.0).abs() < 1e-9);

        controller.update(StateChanges::new().selected_zone(Some("101".into())));
        assert!((controller.estimated_cost() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn sign_out_drops_the_session() {
        let (mut controller, storage) = controller();
        controller.update(
            StateChanges::new()
                .selected_zone(Some("101".into()))
                .screen(Screen::Parking),
        );
        controller.start_session(at(9, 0)).expect("start");

        controller.sign_out().expect("sign out");
        assert!(controller.state().session.is_none());
        assert_eq!(controller.state().screen, Screen::Login);
        assert_eq!(
            storage.raw("parkwise.session").as_deref(),
            Some("null")
        );
    }
}
