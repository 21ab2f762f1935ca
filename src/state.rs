//! Shared application state for all routes.

use crate::session::SessionStore;
use crate::storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, sessions: Arc<dyn SessionStore>) -> Self {
        AppState { storage, sessions }
    }
}
