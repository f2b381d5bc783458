//! JSON body returned by `POST /new`.

use serde::{Deserialize, Serialize};

/// One stored file in an upload response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Link path, `/<id><ext>`.
    pub url: String,

    /// Sanitized filename as it was stored.
    pub filename: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub ok: bool,
    pub uploads: Vec<UploadedFile>,
}
