use crate::{
    log_info, log_warn,
    models::Plate,
    state::{AppState, StateChanges, StateStore},
};

use super::{report_save, Persistence, SaveStatus, SliceStatus};

const ENABLE_LOGS: bool = true;

#[derive(Debug)]
pub struct PlateLoad {
    pub status: SliceStatus,
    /// Save outcome of the default plate, when one had to be created.
    pub seed: Option<SaveStatus>,
}

impl PlateLoad {
    pub fn seeded(&self) -> bool {
        self.seed.is_some()
    }
}

impl Persistence {
    /// Writes the whole plate list as one value.
    pub fn save_plates(&self, state: &AppState) -> SaveStatus {
        report_save("Plates", self.write_json(&self.keys.plates, &state.plates))
    }

    /// Reloads plates; a corrupt payload becomes an empty list. If the list
    /// ends up empty the default plate is seeded and saved right away.
    pub fn load_plates(&self, store: &mut StateStore) -> PlateLoad {
        let status = match self.read_json::<Vec<Plate>>(&self.keys.plates) {
            Ok(Some(plates)) => {
                store.update(StateChanges::new().plates(plates));
                SliceStatus::Loaded
            }
            Ok(None) => SliceStatus::Missing,
            Err(err) => {
                log_warn!("PERSIST", "Plates load failed, using empty: {}", err);
                store.update(StateChanges::new().plates(Vec::new()));
                SliceStatus::Recovered(err)
            }
        };

        let seed = self.ensure_default_plate(store);
        PlateLoad { status, seed }
    }

    fn ensure_default_plate(&self, store: &mut StateStore) -> Option<SaveStatus> {
        if !store.get().plates.is_empty() {
            return None;
        }

        log_info!("PERSIST", "No plates stored, seeding default plate");
        store.update(StateChanges::new().plates(vec![Plate::seeded_default()]));
        Some(self.save_plates(store.get()))
    }
}
