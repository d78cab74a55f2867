use crate::models::{Favorite, Notification, NotificationSettings, Plate, Session, Zone};

use super::app_state::{AppState, Language, Screen, SearchMode, Theme};

/// Names of the [`AppState`] fields, as reported in change diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Screen,
    Language,
    Theme,
    ActiveOverlay,
    Session,
    SelectedZone,
    SelectedZoneRate,
    SearchMode,
    SearchQuery,
    Duration,
    DefaultDurationMinutes,
    Zones,
    ZonesLoading,
    ZonesLoadError,
    Plates,
    SelectedPlateId,
    Notifications,
    NotificationSettings,
    Favorites,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Screen => "screen",
            StateField::Language => "language",
            StateField::Theme => "theme",
            StateField::ActiveOverlay => "activeOverlay",
            StateField::Session => "session",
            StateField::SelectedZone => "selectedZone",
            StateField::SelectedZoneRate => "selectedZoneRate",
            StateField::SearchMode => "searchMode",
            StateField::SearchQuery => "searchQuery",
            StateField::Duration => "duration",
            StateField::DefaultDurationMinutes => "defaultDurationMinutes",
            StateField::Zones => "zones",
            StateField::ZonesLoading => "zonesLoading",
            StateField::ZonesLoadError => "zonesLoadError",
            StateField::Plates => "plates",
            StateField::SelectedPlateId => "selectedPlateId",
            StateField::Notifications => "notifications",
            StateField::NotificationSettings => "notificationSettings",
            StateField::Favorites => "favorites",
        }
    }

    /// Collections that are logged by size instead of by content.
    pub fn is_bulk(&self) -> bool {
        matches!(self, StateField::Zones | StateField::Notifications)
    }
}

/// A partial record for [`super::StateStore::update`].
///
/// Every field left as `None` is untouched by the merge; a field that is set
/// replaces the whole value in state. Nullable state fields use a nested
/// `Option` so they can be cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct StateChanges {
    pub screen: Option<Screen>,
    pub language: Option<Language>,
    pub theme: Option<Theme>,
    pub active_overlay: Option<Option<String>>,
    pub session: Option<Option<Session>>,
    pub selected_zone: Option<Option<String>>,
    pub selected_zone_rate: Option<f64>,
    pub search_mode: Option<SearchMode>,
    pub search_query: Option<String>,
    pub duration: Option<u32>,
    pub default_duration_minutes: Option<u32>,
    pub zones: Option<Vec<Zone>>,
    pub zones_loading: Option<bool>,
    pub zones_load_error: Option<Option<String>>,
    pub plates: Option<Vec<Plate>>,
    pub selected_plate_id: Option<Option<String>>,
    pub notifications: Option<Vec<Notification>>,
    pub notification_settings: Option<NotificationSettings>,
    pub favorites: Option<Vec<Favorite>>,
}

impl StateChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(mut self, value: Screen) -> Self {
        self.screen = Some(value);
        self
    }

    pub fn language(mut self, value: Language) -> Self {
        self.language = Some(value);
        self
    }

    pub fn theme(mut self, value: Theme) -> Self {
        self.theme = Some(value);
        self
    }

    pub fn active_overlay(mut self, value: Option<String>) -> Self {
        self.active_overlay = Some(value);
        self
    }

    pub fn session(mut self, value: Option<Session>) -> Self {
        self.session = Some(value);
        self
    }

    pub fn selected_zone(mut self, value: Option<String>) -> Self {
        self.selected_zone = Some(value);
        self
    }

    pub fn selected_zone_rate(mut self, value: f64) -> Self {
        self.selected_zone_rate = Some(value);
        self
    }

    pub fn search_mode(mut self, value: SearchMode) -> Self {
        self.search_mode = Some(value);
        self
    }

    pub fn search_query(mut self, value: impl Into<String>) -> Self {
        self.search_query = Some(value.into());
        self
    }

    pub fn duration(mut self, value: u32) -> Self {
        self.duration = Some(value);
        self
    }

    pub fn default_duration_minutes(mut self, value: u32) -> Self {
        self.default_duration_minutes = Some(value);
        self
    }

    pub fn zones(mut self, value: Vec<Zone>) -> Self {
        self.zones = Some(value);
        self
    }

    pub fn zones_loading(mut self, value: bool) -> Self {
        self.zones_loading = Some(value);
        self
    }

    pub fn zones_load_error(mut self, value: Option<String>) -> Self {
        self.zones_load_error = Some(value);
        self
    }

    pub fn plates(mut self, value: Vec<Plate>) -> Self {
        self.plates = Some(value);
        self
    }

    pub fn selected_plate_id(mut self, value: Option<String>) -> Self {
        self.selected_plate_id = Some(value);
        self
    }

    pub fn notifications(mut self, value: Vec<Notification>) -> Self {
        self.notifications = Some(value);
        self
    }

    pub fn notification_settings(mut self, value: NotificationSettings) -> Self {
        self.notification_settings = Some(value);
        self
    }

    pub fn favorites(mut self, value: Vec<Favorite>) -> Self {
        self.favorites = Some(value);
        self
    }

    /// Fields this change set will write, in declaration order.
    pub fn fields(&self) -> Vec<StateField> {
        let present = [
            (self.screen.is_some(), StateField::Screen),
            (self.language.is_some(), StateField::Language),
            (self.theme.is_some(), StateField::Theme),
            (self.active_overlay.is_some(), StateField::ActiveOverlay),
            (self.session.is_some(), StateField::Session),
            (self.selected_zone.is_some(), StateField::SelectedZone),
            (self.selected_zone_rate.is_some(), StateField::SelectedZoneRate),
            (self.search_mode.is_some(), StateField::SearchMode),
            (self.search_query.is_some(), StateField::SearchQuery),
            (self.duration.is_some(), StateField::Duration),
            (
                self.default_duration_minutes.is_some(),
                StateField::DefaultDurationMinutes,
            ),
            (self.zones.is_some(), StateField::Zones),
            (self.zones_loading.is_some(), StateField::ZonesLoading),
            (self.zones_load_error.is_some(), StateField::ZonesLoadError),
            (self.plates.is_some(), StateField::Plates),
            (self.selected_plate_id.is_some(), StateField::SelectedPlateId),
            (self.notifications.is_some(), StateField::Notifications),
            (
                self.notification_settings.is_some(),
                StateField::NotificationSettings,
            ),
            (self.favorites.is_some(), StateField::Favorites),
        ];
        present
            .into_iter()
            .filter_map(|(set, field)| set.then_some(field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Shallow merge: each present field replaces the state's value.
    pub(crate) fn apply_to(self, state: &mut AppState) {
        if let Some(value) = self.screen {
            state.screen = value;
        }
        if let Some(value) = self.language {
            state.language = value;
        }
        if let Some(value) = self.theme {
            state.theme = value;
        }
        if let Some(value) = self.active_overlay {
            state.active_overlay = value;
        }
        if let Some(value) = self.session {
            state.session = value;
        }
        if let Some(value) = self.selected_zone {
            state.selected_zone = value;
        }
        if let Some(value) = self.selected_zone_rate {
            state.selected_zone_rate = value;
        }
        if let Some(value) = self.search_mode {
            state.search_mode = value;
        }
        if let Some(value) = self.search_query {
            state.search_query = value;
        }
        if let Some(value) = self.duration {
            state.duration = value;
        }
        if let Some(value) = self.default_duration_minutes {
            state.default_duration_minutes = value;
        }
        if let Some(value) = self.zones {
            state.zones = value;
        }
        if let Some(value) = self.zones_loading {
            state.zones_loading = value;
        }
        if let Some(value) = self.zones_load_error {
            state.zones_load_error = value;
        }
        if let Some(value) = self.plates {
            state.plates = value;
        }
        if let Some(value) = self.selected_plate_id {
            state.selected_plate_id = value;
        }
        if let Some(value) = self.notifications {
            state.notifications = value;
        }
        if let Some(value) = self.notification_settings {
            state.notification_settings = value;
        }
        if let Some(value) = self.favorites {
            state.favorites = value;
        }
    }

    /// Element count of the bulk collections carried by this change set.
    pub(crate) fn bulk_counts(&self) -> Vec<(StateField, usize)> {
        let mut counts = Vec::new();
        if let Some(zones) = &self.zones {
            counts.push((StateField::Zones, zones.len()));
        }
        if let Some(notifications) = &self.notifications {
            counts.push((StateField::Notifications, notifications.len()));
        }
        counts
    }
}
