//! Parking workflows on top of the state store and persistence layer.

mod controller;
mod favorites;
mod notifications;
mod plates;

pub use controller::ParkingController;
pub use plates::{normalize_plate, MAX_PLATE_LENGTH};

use thiserror::Error;

use crate::persistence::PersistError;

/// Non-session slices the controller writes after each change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slice {
    Plates,
    Notifications,
    Favorites,
}

impl Slice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slice::Plates => "plates",
            Slice::Notifications => "notifications",
            Slice::Favorites => "favorites",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlateError {
    #[error("license plate is empty")]
    Empty,
    #[error("license plate is too long ({len} characters, max {MAX_PLATE_LENGTH})")]
    TooLong { len: usize },
    #[error("license plate may only contain letters and digits")]
    InvalidCharacters,
    #[error("license plate {0} already exists")]
    AlreadyExists(String),
    #[error("license plate {0} not found")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("a parking session is already active")]
    SessionAlreadyActive,
    #[error("no active parking session")]
    NoActiveSession,
    #[error("no zone selected")]
    NoZoneSelected,
    #[error("zone {0} not found in the zone list")]
    ZoneNotFound(String),
    #[error(transparent)]
    Plate(#[from] PlateError),
    #[error("failed to persist session: {0}")]
    Persist(#[from] PersistError),
}
