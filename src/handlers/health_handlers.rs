//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks disk I/O under the storage root

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, io, path::Path};
use tokio::fs;
use uuid::Uuid;

const PROBE_BYTES: &[u8] = b"readyz";

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Performs a best-effort write/read/delete against the storage root.
/// HTTP 200 when the check passes, HTTP 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    // Probe file names contain a dot, so they can never shadow an identifier.
    let tmp_path = state
        .storage
        .base_path()
        .join(format!(".readyz-{}", Uuid::new_v4()));

    let disk = match check_disk(&tmp_path).await {
        Ok(()) => CheckStatus {
            ok: true,
            error: None,
        },
        Err(err) => {
            let _ = fs::remove_file(&tmp_path).await;
            tracing::warn!("readiness disk check: {}", err);
            CheckStatus {
                ok: false,
                error: Some(err.to_string()),
            }
        }
    };

    let (status, label) = if disk.ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };
    let mut checks = HashMap::new();
    checks.insert("disk", disk);

    (
        status,
        Json(ReadyResponse {
            status: label.into(),
            checks,
        }),
    )
}

/// Write, read back and remove a small file at `path`.
async fn check_disk(path: &Path) -> io::Result<()> {
    fs::write(path, PROBE_BYTES).await?;
    if fs::read(path).await? != PROBE_BYTES {
        return Err(io::Error::other("file content mismatch"));
    }
    fs::remove_file(path).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
