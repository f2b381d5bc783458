//! Defines the routes of the file drop.
//!
//! ## Structure
//! - `POST /new`          — multipart upload, answers with links
//! - `GET|POST /{name}`   — fetch a file by `<id>[.<ext>]`
//! - `GET /healthz`, `GET /readyz` — probes
//!
//! Static segments win over `/{name}`; generated identifiers are always eight
//! characters, so they never collide with them.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        object_handlers::{get_file, post_file, upload_files},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router with request bodies capped at `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/new", post(upload_files))
        .route("/{name}", get(get_file).post(post_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
