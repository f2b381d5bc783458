//! Storage and retrieval core: sanitizing names, allocating identifiers,
//! persisting content and metadata, checking credentials, and the
//! self-destruct lifecycle.

pub mod auth;
pub mod content_store;
pub mod identifier;
pub mod metadata_store;
pub mod sanitize;
pub mod storage_service;
