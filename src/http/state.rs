use crate::session::SessionEngine;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single live session (clones share it)
    pub engine: SessionEngine,
}

impl AppState {
    pub fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }
}
