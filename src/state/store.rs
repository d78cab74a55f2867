use crate::log_debug;

use super::{
    app_state::AppState,
    changes::{StateChanges, StateField},
};

const ENABLE_LOGS: bool = true;

/// Hook invoked once after every [`StateStore::update`], with the merged state.
pub trait ChangeNotifier {
    fn notify(&self, state: &AppState);
}

impl<F> ChangeNotifier for F
where
    F: Fn(&AppState),
{
    fn notify(&self, state: &AppState) {
        self(state)
    }
}

/// Owner of the single [`AppState`] record.
///
/// Reads go through [`StateStore::get`] (a borrowed view) or
/// [`StateStore::snapshot`] (a detached copy). Writes go through
/// [`StateStore::update`] only. There is no validation here; callers check
/// their own inputs before merging.
pub struct StateStore {
    state: AppState,
    notifier: Option<Box<dyn ChangeNotifier>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl StateStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: impl ChangeNotifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn set_notifier(&mut self, notifier: Option<Box<dyn ChangeNotifier>>) {
        self.notifier = notifier;
    }

    pub fn get(&self) -> &AppState {
        &self.state
    }

    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    /// Merges `changes` into state, then fires the notifier (if any) exactly once.
    /// Returns the fields that were written.
    pub fn update(&mut self, changes: StateChanges) -> Vec<StateField> {
        let fields = changes.fields();
        log_change(&changes, &fields);

        changes.apply_to(&mut self.state);

        if let Some(notifier) = &self.notifier {
            notifier.notify(&self.state);
        }

        fields
    }
}

fn log_change(changes: &StateChanges, fields: &[StateField]) {
    let keys = fields
        .iter()
        .map(StateField::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let bulk = changes.bulk_counts();
    if bulk.is_empty() {
        log_debug!("STATE", "Updated: {} {:?}", keys, changes);
    } else {
        let counts = bulk
            .iter()
            .map(|(field, count)| format!("{} count: {}", field.as_str(), count))
            .collect::<Vec<_>>()
            .join(", ");
        log_debug!("STATE", "Updated: {} ({})", keys, counts);
    }
}
