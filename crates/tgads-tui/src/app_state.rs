//! AppState — data shared read-only with components during render/event.
//!
//! The App event loop is the only writer.

use std::sync::Arc;

use tgads_core::ads::AdDraft;
use tgads_core::catalog::CurationSession;
use tgads_core::config::Config;
use tgads_core::protocol::Taxonomy;
use tgads_core::store::StateStore;

use crate::widgets::status_bar::InputMode;

pub struct AppState {
    pub session: CurationSession,
    pub taxonomy: Taxonomy,
    pub taxonomy_error: Option<String>,
    pub draft: AdDraft,
    pub input_mode: InputMode,
    pub generating: bool,
    pub publishing: bool,
    /// Last server message from a successful publish.
    pub last_publish: Option<String>,
    pub api_base: String,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn StateStore>, api_base: String) -> Self {
        Self {
            session: CurationSession::new(Arc::clone(&store), config.fetch.failure_policy),
            taxonomy: Taxonomy::default(),
            taxonomy_error: None,
            draft: AdDraft::restore(store),
            input_mode: InputMode::Normal,
            generating: false,
            publishing: false,
            last_publish: None,
            api_base,
        }
    }
}
