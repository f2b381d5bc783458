//! Serializable records of the file-drop service.
//!
//! `Metadata` is what lands on disk beside each content artifact;
//! `UploadResponse` is what `POST /new` answers with.

pub mod metadata;
pub mod upload;
