use std::sync::Arc;

use docchat_rag::RagEngine;

/// Shared, read-only state handed to every handler
pub struct AppState {
    pub engine: Arc<RagEngine>,
}

impl AppState {
    pub fn new(engine: Arc<RagEngine>) -> Self {
        Self { engine }
    }
}
