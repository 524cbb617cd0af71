use std::sync::Arc;

use crate::{config::settings::Settings, events::EventBus, repositories::vote_store::VoteStore};

/// Process-wide application state, created once in `main` and handed to the
/// router as an extension. There is no ambient singleton; everything that
/// mutates votes goes through this handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VoteStore>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let events = EventBus::new(settings.event_capacity);
        Self {
            store: Arc::new(VoteStore::new(events)),
        }
    }
}
