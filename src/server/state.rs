use crate::config::Config;
use crate::history::HistoryStore;
use crate::link::LinkResolver;

pub struct AppState {
    pub resolver: LinkResolver,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: LinkResolver::from_config(&config.resolver),
            history: HistoryStore::new(config.history.limit),
        }
    }
}
