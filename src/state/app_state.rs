use serde::{Deserialize, Serialize};

use crate::models::{Favorite, Notification, NotificationSettings, Plate, Session, Zone};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    #[default]
    Login,
    Register,
    Parking,
    History,
    Plates,
    Notifications,
    CarSpecs,
    Favorites,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Nl,
    #[default]
    En,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Zone,
    Address,
}

/// Default hourly rate shown before a zone has been selected.
pub const DEFAULT_ZONE_RATE: f64 = 2.0;

/// The aggregate application record. Only [`super::StateStore::update`]
/// writes to it; everyone else reads a borrowed view or a cloned snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub screen: Screen,
    pub language: Language,
    pub theme: Theme,
    pub active_overlay: Option<String>,
    pub session: Option<Session>,
    pub selected_zone: Option<String>,
    pub selected_zone_rate: f64,
    pub search_mode: SearchMode,
    pub search_query: String,
    /// Minutes; `0` is the "until stopped" sentinel.
    pub duration: u32,
    pub default_duration_minutes: u32,
    pub zones: Vec<Zone>,
    pub zones_loading: bool,
    pub zones_load_error: Option<String>,
    pub plates: Vec<Plate>,
    pub selected_plate_id: Option<String>,
    pub notifications: Vec<Notification>,
    pub notification_settings: NotificationSettings,
    pub favorites: Vec<Favorite>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            language: Language::En,
            theme: Theme::System,
            active_overlay: None,
            session: None,
            selected_zone: None,
            selected_zone_rate: DEFAULT_ZONE_RATE,
            search_mode: SearchMode::Zone,
            search_query: String::new(),
            duration: 0,
            default_duration_minutes: 0,
            zones: Vec::new(),
            zones_loading: true,
            zones_load_error: None,
            plates: Vec::new(),
            selected_plate_id: None,
            notifications: Vec::new(),
            notification_settings: NotificationSettings::default(),
            favorites: Vec::new(),
        }
    }
}

impl AppState {
    /// Looks a zone up by `uid` first, then by display `id`.
    pub fn find_zone(&self, key: &str) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|zone| zone.uid.as_deref() == Some(key))
            .or_else(|| self.zones.iter().find(|zone| zone.id == key))
    }

    pub fn selected_zone(&self) -> Option<&Zone> {
        self.selected_zone
            .as_deref()
            .and_then(|key| self.find_zone(key))
    }

    /// Zone of the active session, if it is still in the zone list.
    pub fn session_zone(&self) -> Option<&Zone> {
        self.zone_for_session(self.session.as_ref()?)
    }

    /// Zone a session was started in: by `zone_uid`, then by display `zone`.
    pub fn zone_for_session(&self, session: &Session) -> Option<&Zone> {
        session
            .zone_uid
            .as_deref()
            .and_then(|key| self.find_zone(key))
            .or_else(|| session.zone.as_deref().and_then(|key| self.find_zone(key)))
    }

    /// The selected plate, else the default plate, else the first plate.
    pub fn active_plate(&self) -> Option<&Plate> {
        self.selected_plate_id
            .as_deref()
            .and_then(|id| self.plates.iter().find(|plate| plate.id == id))
            .or_else(|| self.plates.iter().find(|plate| plate.default))
            .or_else(|| self.plates.first())
    }
}
