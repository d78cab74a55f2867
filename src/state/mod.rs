pub mod app_state;
pub mod changes;
pub mod store;

pub use app_state::{AppState, Language, Screen, SearchMode, Theme, DEFAULT_ZONE_RATE};
pub use changes::{StateChanges, StateField};
pub use store::{ChangeNotifier, StateStore};
