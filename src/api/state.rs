//! Application state for the Shift & Schedule Engine API.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::engine::Engine;
use crate::store::ShiftStore;

/// Shared application state.
///
/// Holds the engine services, which share one store.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
}

impl AppState {
    /// Creates the state over a store and configuration.
    pub fn new(store: Arc<dyn ShiftStore>, config: &ConfigLoader) -> Self {
        Self {
            engine: Arc::new(Engine::new(store, config)),
        }
    }

    pub(crate) fn shared_engine(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }
}
