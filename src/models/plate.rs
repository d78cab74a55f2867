use serde::{Deserialize, Serialize};

pub const DEFAULT_PLATE_ID: &str = "1-ABC-123";
pub const DEFAULT_PLATE_DESCRIPTION: &str = "Lease";

/// A license-plate profile. `id` is the normalized form, `text` the display form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plate {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: bool,
}

impl Plate {
    /// The plate seeded when no plates exist yet.
    pub fn seeded_default() -> Self {
        Self {
            id: DEFAULT_PLATE_ID.into(),
            text: DEFAULT_PLATE_ID.into(),
            description: DEFAULT_PLATE_DESCRIPTION.into(),
            default: true,
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.text == key
    }
}
