//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::Authorizer;
use crate::store::ScheduleStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScheduleStore>,
    /// Gate for lecture scheduling.
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    pub fn new(store: Arc<dyn ScheduleStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer }
    }
}
