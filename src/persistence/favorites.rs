use serde_json::Value;

use crate::{
    log_warn,
    models::Favorite,
    state::{AppState, StateChanges, StateStore},
};

use super::{report_save, PersistError, Persistence, SaveStatus, SliceStatus};

const ENABLE_LOGS: bool = true;

impl Persistence {
    pub fn save_favorites(&self, state: &AppState) -> SaveStatus {
        report_save("Favorites", self.write_json(&self.keys.favorites, &state.favorites))
    }

    /// Reloads favorites. On any failure the current list is left as it is.
    pub fn load_favorites(&self, store: &mut StateStore) -> SliceStatus {
        let key = &self.keys.favorites;
        let raw = match self.read_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SliceStatus::Missing,
            Err(err) => {
                log_warn!("PERSIST", "Favorites load failed: {}", err);
                return SliceStatus::Recovered(err);
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                store.update(StateChanges::new().favorites(normalize_favorites(&value)));
                SliceStatus::Loaded
            }
            Err(source) => {
                let err = PersistError::Corrupt {
                    key: key.clone(),
                    source,
                };
                log_warn!("PERSIST", "Favorites load failed: {}", err);
                SliceStatus::Recovered(err)
            }
        }
    }
}

/// Turns a stored favorites payload into a clean list. Anything that is not
/// a list yields an empty list; `zoneId` falls back to `zoneUid` (and back),
/// blank names are dropped, and a missing `order` becomes the entry's index.
pub fn normalize_favorites(value: &Value) -> Vec<Favorite> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let zone_uid = id_field(entry, "zoneUid");
            let zone_id = id_field(entry, "zoneId");
            let (zone_uid, zone_id) = match (zone_uid, zone_id) {
                (Some(uid), Some(id)) => (uid, id),
                (Some(uid), None) => (uid.clone(), uid),
                (None, Some(id)) => (id.clone(), id),
                (None, None) => return None,
            };

            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let order = entry
                .get("order")
                .and_then(Value::as_u64)
                .and_then(|order| u32::try_from(order).ok())
                .unwrap_or(index as u32);

            Some(Favorite {
                zone_uid,
                zone_id,
                name,
                order: Some(order),
            })
        })
        .collect()
}

fn id_field(entry: &Value, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{persistence::StorageKeys, storage::MemoryStorage};

    #[test]
    fn normalizes_ids_names_and_order() {
        let favorites = normalize_favorites(&json!([
            {"zoneUid": "u1", "zoneId": "12100", "name": "  Office  "},
            {"zoneUid": "u2", "name": "   ", "order": 7},
            {"zoneId": 363},
            {"name": "no ids"}
        ]));

        assert_eq!(
            favorites,
            vec![
                Favorite {
                    zone_uid: "u1".into(),
                    zone_id: "12100".into(),
                    name: Some("Office".into()),
                    order: Some(0),
                },
                Favorite {
                    zone_uid: "u2".into(),
                    zone_id: "u2".into(),
                    name: None,
                    order: Some(7),
                },
                Favorite {
                    zone_uid: "363".into(),
                    zone_id: "363".into(),
                    name: None,
                    order: Some(2),
                },
            ]
        );
    }

    #[test]
    fn non_list_payload_loads_empty() {
        assert!(normalize_favorites(&json!({"zoneUid": "u1"})).is_empty());
    }

    #[test]
    fn duplicates_are_not_removed() {
        let favorites = normalize_favorites(&json!([
            {"zoneUid": "u1", "zoneId": "1"},
            {"zoneUid": "u1", "zoneId": "1"}
        ]));
        assert_eq!(favorites.len(), 2);
    }

    #[test]
    fn corrupt_payload_keeps_current_favorites() {
        let storage = MemoryStorage::new();
        storage.insert_raw("parkwise.favorites", "[{");
        let persistence = Persistence::new(storage, StorageKeys::default());
        let mut store = StateStore::default();
        store.update(StateChanges::new().favorites(vec![Favorite::new("u1", "1")]));

        let status = persistence.load_favorites(&mut store);
        assert!(status.error().is_some());
        assert_eq!(store.get().favorites, vec![Favorite::new("u1", "1")]);
    }

    #[test]
    fn round_trip_through_storage() {
        let storage = MemoryStorage::new();
        let persistence = Persistence::new(storage, StorageKeys::default());
        let mut store = StateStore::default();
        let mut favorite = Favorite::new("u9", "450");
        favorite.order = Some(0);
        store.update(StateChanges::new().favorites(vec![favorite.clone()]));

        assert!(persistence.save_favorites(store.get()).is_saved());
        let mut fresh = StateStore::default();
        assert!(persistence.load_favorites(&mut fresh).is_loaded());
        assert_eq!(fresh.get().favorites, vec![favorite]);
    }
}
