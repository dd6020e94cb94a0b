use std::collections::HashMap;
use std::sync::Arc;

use crate::sequence::RequestSequencer;
use crate::session::Session;

/// UI surfaces that may tag requests for last-request-wins sequencing.
pub const SURFACES: &[&str] = &["tooltip", "popup", "sidepanel", "dictation"];

/// Shared by every handler: the session plus one sequencer per known UI surface.
pub struct ServerState {
    pub(crate) session: Arc<Session>,
    sequencers: HashMap<&'static str, RequestSequencer>,
}

impl ServerState {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            sequencers: SURFACES
                .iter()
                .map(|surface| (*surface, RequestSequencer::new()))
                .collect(),
        }
    }

    /// `None` for a surface outside [`SURFACES`].
    pub(crate) fn sequencer(&self, surface: &str) -> Option<&RequestSequencer> {
        self.sequencers.get(surface.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::store::{KeyValueStore, MemoryStore};

    #[tokio::test]
    async fn only_known_surfaces_have_sequencers() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = Session::init(Settings::default(), store, None).await.unwrap();
        let state = ServerState::new(Arc::new(session));

        let first = state.sequencer("tooltip").unwrap().issue();
        let second = state.sequencer(" tooltip ").unwrap().issue();
        assert!(!state.sequencer("tooltip").unwrap().is_latest(first));
        assert!(state.sequencer("tooltip").unwrap().is_latest(second));
        assert!(state.sequencer("attacker-surface-1").is_none());
        assert_eq!(state.sequencers.len(), SURFACES.len());
    }
}
