//! Anonymous, ephemeral file drop.
//!
//! Uploads land on the local filesystem under short random identifiers;
//! objects flagged self-destructing can be fetched exactly once, and only with
//! an allow-listed credential.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use services::{auth::Authenticator, storage_service::StorageService};
use state::AppState;

/// Assemble the application router around a storage root and allow-list.
pub fn app(storage: StorageService, auth: Authenticator, max_upload_bytes: usize) -> Router {
    routes::routes::routes(max_upload_bytes).with_state(AppState::new(storage, auth))
}
