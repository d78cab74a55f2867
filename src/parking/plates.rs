use crate::{log_info, log_warn, models::Plate, state::StateChanges};

use super::{ParkingController, ParkingError, PlateError, Slice};

const ENABLE_LOGS: bool = true;

pub const MAX_PLATE_LENGTH: usize = 8;

/// Strips whitespace and dashes and uppercases. The result must be 1 to
/// [`MAX_PLATE_LENGTH`] ASCII letters or digits.
pub fn normalize_plate(raw: &str) -> Result<String, PlateError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect();

    if normalized.is_empty() {
        return Err(PlateError::Empty);
    }
    let len = normalized.chars().count();
    if len > MAX_PLATE_LENGTH {
        return Err(PlateError::TooLong { len });
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PlateError::InvalidCharacters);
    }
    Ok(normalized)
}

impl ParkingController {
    /// Adds a plate. The first plate on an empty list becomes the default.
    pub fn add_plate(&mut self, raw: &str, description: &str) -> Result<Plate, ParkingError> {
        let text = normalize_plate(raw)?;
        let plates = &self.state().plates;
        if plates.iter().any(|plate| plate.matches(&text)) {
            return Err(PlateError::AlreadyExists(text).into());
        }

        let plate = Plate {
            id: text.clone(),
            text,
            description: description.trim().to_string(),
            default: plates.is_empty(),
        };
        let mut plates = plates.clone();
        plates.push(plate.clone());

        self.store_mut()
            .update(StateChanges::new().plates(plates).active_overlay(None));
        self.persist(Slice::Plates);
        log_info!("PLATES", "Added plate {}", plate.id);

        Ok(plate)
    }

    /// Removes the plate whose id or text is `key`.
    pub fn delete_plate(&mut self, key: &str) -> Result<Plate, ParkingError> {
        let state = self.state();
        let Some(index) = state.plates.iter().position(|plate| plate.matches(key)) else {
            log_warn!("PLATES", "delete_plate: plate not found {}", key);
            return Err(PlateError::NotFound(key.to_string()).into());
        };

        let mut plates = state.plates.clone();
        let removed = plates.remove(index);
        if removed.default {
            if let Some(first) = plates.first_mut() {
                first.default = true;
            }
        }

        let selected = state
            .selected_plate_id
            .clone()
            .filter(|id| *id != removed.id && *id != removed.text);

        self.store_mut()
            .update(StateChanges::new().plates(plates).selected_plate_id(selected));
        self.persist(Slice::Plates);

        Ok(removed)
    }

    /// Flags exactly the plate matching `key` as default and clears the selection.
    pub fn set_default_plate(&mut self, key: &str) -> Result<(), ParkingError> {
        let plates = &self.state().plates;
        if !plates.iter().any(|plate| plate.matches(key)) {
            return Err(PlateError::NotFound(key.to_string()).into());
        }

        let mut found = false;
        let plates = plates
            .iter()
            .map(|plate| {
                let default = !found && plate.matches(key);
                found |= default;
                Plate {
                    default,
                    ..plate.clone()
                }
            })
            .collect();

        self.store_mut()
            .update(StateChanges::new().plates(plates).selected_plate_id(None));
        self.persist(Slice::Plates);
        Ok(())
    }
}
