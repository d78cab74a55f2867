use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    SessionStarted,
    SessionExpiringSoon,
    SessionEndedByUser,
    SessionEndedByMaxTime,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SessionStarted => "sessionStarted",
            NotificationKind::SessionExpiringSoon => "sessionExpiringSoon",
            NotificationKind::SessionEndedByUser => "sessionEndedByUser",
            NotificationKind::SessionEndedByMaxTime => "sessionEndedByMaxTime",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sessionStarted" => Some(NotificationKind::SessionStarted),
            "sessionExpiringSoon" => Some(NotificationKind::SessionExpiringSoon),
            "sessionEndedByUser" => Some(NotificationKind::SessionEndedByUser),
            "sessionEndedByMaxTime" => Some(NotificationKind::SessionEndedByMaxTime),
            _ => None,
        }
    }
}

/// One entry of the append-only notification log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub detail: String,
    /// ISO 8601 text, as written when the entry was produced.
    pub at: String,
}

impl Notification {
    pub fn new(kind: &str, message: &str, detail: &str, at: DateTime<Utc>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
            detail: detail.to_string(),
            at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

const DEFAULT_EXPIRING_SOON_MINUTES: u32 = 10;

/// Per-kind notification toggles.
///
/// Stored settings are overlaid on the defaults key by key: a key whose value
/// has the wrong type keeps its default without touching its neighbours, and
/// keys this build does not know are carried over in `extra`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub session_started: bool,
    pub session_expiring_soon: bool,
    pub session_ended_by_user: bool,
    pub session_ended_by_max_time: bool,
    pub expiring_soon_minutes: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            session_started: true,
            session_expiring_soon: true,
            session_ended_by_user: true,
            session_ended_by_max_time: true,
            expiring_soon_minutes: DEFAULT_EXPIRING_SOON_MINUTES,
            extra: Map::new(),
        }
    }
}

impl NotificationSettings {
    pub fn allows(&self, kind: &str) -> bool {
        match NotificationKind::parse(kind) {
            Some(NotificationKind::SessionStarted) => self.session_started,
            Some(NotificationKind::SessionExpiringSoon) => self.session_expiring_soon,
            Some(NotificationKind::SessionEndedByUser) => self.session_ended_by_user,
            Some(NotificationKind::SessionEndedByMaxTime) => self.session_ended_by_max_time,
            None => true,
        }
    }

    /// Applies every stored key whose value fits its field. Returns the known
    /// keys that were skipped because of their type.
    pub fn overlay(&mut self, stored: Map<String, Value>) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in stored {
            let applied = match key.as_str() {
                "sessionStarted" => set_flag(&mut self.session_started, &value),
                "sessionExpiringSoon" => set_flag(&mut self.session_expiring_soon, &value),
                "sessionEndedByUser" => set_flag(&mut self.session_ended_by_user, &value),
                "sessionEndedByMaxTime" => set_flag(&mut self.session_ended_by_max_time, &value),
                "expiringSoonMinutes" => match value.as_u64().and_then(|m| u32::try_from(m).ok()) {
                    Some(minutes) => {
                        self.expiring_soon_minutes = minutes;
                        true
                    }
                    None => false,
                },
                _ => {
                    self.extra.insert(key, value);
                    continue;
                }
            };
            if !applied {
                rejected.push(key);
            }
        }
        rejected
    }
}

fn set_flag(slot: &mut bool, value: &Value) -> bool {
    match value.as_bool() {
        Some(flag) => {
            *slot = flag;
            true
        }
        None => false,
    }
}

impl<'de> Deserialize<'de> for NotificationSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = Map::<String, Value>::deserialize(deserializer)?;
        let mut settings = Self::default();
        settings.overlay(stored);
        Ok(settings)
    }
}
