//! Shared, read-only request state.

use crate::services::{auth::Authenticator, storage_service::StorageService};

/// Everything a handler needs. Built once at startup and cloned per request;
/// nothing in here is mutated after construction.
#[derive(Clone, Debug)]
pub struct AppState {
    pub storage: StorageService,
    pub auth: Authenticator,
}

impl AppState {
    pub fn new(storage: StorageService, auth: Authenticator) -> Self {
        Self { storage, auth }
    }
}
