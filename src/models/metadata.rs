//! The descriptive sidecar record stored next to every content artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What produced the object. Only direct uploads exist today.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Upload,
}

/// Metadata persisted as `<id>.meta`.
///
/// The record is written only after the content artifact is complete, so its
/// presence is what makes an object visible.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// Sanitized original filename.
    pub filename: String,

    pub upload_date: DateTime<Utc>,

    /// Size of the content artifact in bytes.
    pub size: u64,

    /// Read-once object, deleted by its first authenticated retrieval.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private_selfdestruct: bool,

    #[serde(default)]
    pub kind: ObjectKind,
}

impl Metadata {
    pub fn new_upload(filename: impl Into<String>, size: u64, private_selfdestruct: bool) -> Self {
        Self {
            filename: filename.into(),
            upload_date: Utc::now(),
            size,
            private_selfdestruct,
            kind: ObjectKind::Upload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn uses_kebab_case_field_names() {
        let meta = Metadata::new_upload("secret.txt", 12, true);
        let json: Value = serde_json::to_value(&meta).expect("serialize");
        assert_eq!(json["filename"], "secret.txt");
        assert_eq!(json["size"], 12);
        assert_eq!(json["private-selfdestruct"], true);
        assert_eq!(json["kind"], "upload");
        assert!(json["upload-date"].is_string());
    }

    #[test]
    fn omits_flag_when_unset() {
        let meta = Metadata::new_upload("photo.jpg", 3, false);
        let json: Value = serde_json::to_value(&meta).expect("serialize");
        assert!(json.get("private-selfdestruct").is_none());
    }

    #[test]
    fn reads_records_without_optional_fields() {
        let raw = r#"{"filename":"a.txt","upload-date":"2024-05-01T10:00:00Z","size":1}"#;
        let meta: Metadata = serde_json::from_str(raw).expect("parse");
        assert!(!meta.private_selfdestruct);
        assert_eq!(meta.kind, ObjectKind::Upload);
    }
}
