use crate::{
    log_debug, log_warn,
    models::Session,
    state::{AppState, StateChanges, StateStore},
};

use super::{PersistError, Persistence, SliceStatus};

const ENABLE_LOGS: bool = true;

impl Persistence {
    /// Writes the session (or `null`). Storage failures are returned, not
    /// logged: losing an active session is the caller's decision to handle.
    pub fn save_session(&self, state: &AppState) -> Result<(), PersistError> {
        self.write_json(&self.keys.session, &state.session)
    }

    /// Reloads the session. Any failure leaves the session cleared.
    ///
    /// Sessions whose timestamps do not parse are still accepted; each
    /// problem is logged so the caller can decide whether to end them.
    pub fn load_session(&self, store: &mut StateStore) -> SliceStatus {
        let (session, status) = match self.read_json::<Option<Session>>(&self.keys.session) {
            Ok(Some(session)) => (session, SliceStatus::Loaded),
            Ok(None) => {
                log_debug!("PERSIST", "No stored session");
                (None, SliceStatus::Missing)
            }
            Err(err) => {
                log_warn!("PERSIST", "Session load failed, clearing: {}", err);
                (None, SliceStatus::Recovered(err))
            }
        };

        if let Some(session) = &session {
            for issue in session.timestamp_issues() {
                log_warn!(
                    "PERSIST",
                    "{} (start: {:?}, end: {:?})",
                    issue.as_str(),
                    session.start,
                    session.end
                );
            }
        }

        store.update(StateChanges::new().session(session));
        status
    }
}
