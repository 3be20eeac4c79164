use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::store::AnytimeStore;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AnytimeStore>,
    pub auth: TokenVerifier,
}

impl AppState {
    pub fn new(store: Arc<dyn AnytimeStore>, auth: TokenVerifier) -> Self {
        Self { store, auth }
    }
}
