use serde::{Deserialize, Serialize};

/// A favorite zone. Duplicates are the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub zone_uid: String,
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl Favorite {
    pub fn new(zone_uid: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            zone_uid: zone_uid.into(),
            zone_id: zone_id.into(),
            name: None,
            order: None,
        }
    }

    pub fn matches(&self, zone_uid: &str, zone_id: &str) -> bool {
        self.zone_uid == zone_uid || self.zone_id == zone_id
    }
}
