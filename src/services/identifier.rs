//! Object identifiers and the `<id>[.<ext>]` names used in links.
//!
//! Fresh identifiers are 6 random bytes encoded as unpadded URL-safe base64.
//! Lookups accept anything that decodes to 2..=6 bytes and always work with
//! the canonical re-encoding, so one object has exactly one on-disk name.

use crate::services::sanitize::is_sanitized;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::fmt;
use thiserror::Error;

/// Raw bytes drawn for a new identifier.
pub const ID_BYTES: usize = 6;

/// Shortest raw identifier accepted on lookup.
pub const ID_MIN_BYTES: usize = 2;

/// Longest encoded identifier accepted on lookup: ceil(6 * 4 / 3).
pub const ID_MAX_CHARS: usize = (ID_BYTES * 4).div_ceil(3);

/// Why a requested name was rejected. Every variant is answered with 404.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("identifier longer than {} characters", ID_MAX_CHARS)]
    TooLong,
    #[error("extension contains unsafe characters")]
    UnsafeExtension,
    #[error("identifier is not valid url-safe base64")]
    Undecodable,
    #[error("identifier decodes to {0} bytes")]
    BadLength(usize),
}

/// Canonical, URL-safe object identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Draw a fresh identifier from the thread-local CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Validate an untrusted identifier and return its canonical form.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        if raw.len() > ID_MAX_CHARS {
            return Err(NameError::TooLong);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| NameError::Undecodable)?;
        if !(ID_MIN_BYTES..=ID_BYTES).contains(&bytes.len()) {
            return Err(NameError::BadLength(bytes.len()));
        }
        Ok(Self::from_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed link name: identifier plus the (ignored) display extension.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectName {
    pub id: ObjectId,
    pub extension: String,
}

impl ObjectName {
    /// Split `name` at its first `.` and validate both halves.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let (raw_id, extension) = name.split_once('.').unwrap_or((name, ""));
        if raw_id.len() > ID_MAX_CHARS {
            return Err(NameError::TooLong);
        }
        if !is_sanitized(extension) {
            return Err(NameError::UnsafeExtension);
        }
        Ok(Self {
            id: ObjectId::parse(raw_id)?,
            extension: extension.to_string(),
        })
    }
}
