use crate::{models::Favorite, state::StateChanges};

use super::{ParkingController, Slice};

impl ParkingController {
    /// Removes the favorite matching either id, or adds one. Returns whether
    /// the zone is a favorite afterwards.
    pub fn toggle_favorite(&mut self, zone_uid: &str, zone_id: &str) -> bool {
        let mut favorites = self.state().favorites.clone();
        let before = favorites.len();
        favorites.retain(|favorite| !favorite.matches(zone_uid, zone_id));

        let added = favorites.len() == before;
        if added {
            favorites.push(new_favorite(zone_uid, zone_id, before));
        }

        self.store_favorites(favorites);
        added
    }

    /// Adds a favorite unless one already matches. Returns whether it was added.
    pub fn add_favorite(&mut self, zone_uid: &str, zone_id: &str) -> bool {
        let favorites = &self.state().favorites;
        if favorites
            .iter()
            .any(|favorite| favorite.matches(zone_uid, zone_id))
        {
            return false;
        }

        let mut favorites = favorites.clone();
        favorites.push(new_favorite(zone_uid, zone_id, favorites.len()));
        self.store_favorites(favorites);
        true
    }

    /// Removes every favorite for `zone_uid`. Returns whether any was removed.
    pub fn remove_favorite(&mut self, zone_uid: &str) -> bool {
        let mut favorites = self.state().favorites.clone();
        let before = favorites.len();
        favorites.retain(|favorite| favorite.zone_uid != zone_uid);
        if favorites.len() == before {
            return false;
        }

        self.store_favorites(favorites);
        true
    }

    pub fn is_favorite(&self, zone_uid: &str, zone_id: &str) -> bool {
        self.state()
            .favorites
            .iter()
            .any(|favorite| favorite.matches(zone_uid, zone_id))
    }

    fn store_favorites(&mut self, favorites: Vec<Favorite>) {
        self.store_mut()
            .update(StateChanges::new().favorites(favorites));
        self.persist(Slice::Favorites);
    }
}

fn new_favorite(zone_uid: &str, zone_id: &str, order: usize) -> Favorite {
    let zone_id = if zone_id.is_empty() { zone_uid } else { zone_id };
    Favorite {
        order: u32::try_from(order).ok(),
        ..Favorite::new(zone_uid, zone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CoreConfig,
        persistence::{Persistence, StorageKeys},
        storage::MemoryStorage,
    };

    fn controller(storage: &MemoryStorage) -> ParkingController {
        ParkingController::new(
            Persistence::new(storage.clone(), StorageKeys::default()),
            CoreConfig::default(),
        )
    }

    #[test]
    fn toggle_adds_then_removes() {
        let storage = MemoryStorage::new();
        let mut controller = controller(&storage);

        assert!(controller.toggle_favorite("z-101", "101"));
        assert!(controller.is_favorite("z-101", "101"));
        assert_eq!(controller.state().favorites[0].order, Some(0));

        assert!(!controller.toggle_favorite("z-101", "101"));
        assert!(controller.state().favorites.is_empty());
        assert_eq!(storage.raw("parkwise.favorites").as_deref(), Some("[]"));
    }

    #[test]
    fn add_is_idempotent_and_remove_reports() {
        let storage = MemoryStorage::new();
        let mut controller = controller(&storage);

        assert!(controller.add_favorite("z-101", "101"));
        assert!(!controller.add_favorite("z-101", "101"));
        assert!(controller.add_favorite("z-202", ""));
        assert_eq!(controller.state().favorites[1].zone_id, "z-202");
        assert_eq!(controller.state().favorites[1].order, Some(1));

        assert!(controller.remove_favorite("z-101"));
        assert!(!controller.remove_favorite("z-101"));
        assert_eq!(controller.state().favorites.len(), 1);

        let stored = storage.raw("parkwise.favorites").expect("saved");
        assert!(stored.contains("\"zoneUid\":\"z-202\""));
    }
}
