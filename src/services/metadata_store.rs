//! Metadata sidecars, stored as JSON in `<root>/<id>.meta`.
//!
//! Writes go through a temporary file and a rename so a reader only ever sees
//! a complete record. A record that is missing and one that fails to parse
//! look the same to callers.

use crate::{models::metadata::Metadata, services::identifier::ObjectId};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Suffix separating a metadata record from its content artifact.
pub const METADATA_SUFFIX: &str = ".meta";

#[derive(Clone, Debug)]
pub struct MetadataStore {
    root: PathBuf,
}

/// Exclusive ownership of a metadata record that has been moved out of its
/// lookup path. Only one caller can ever hold the claim for a record.
#[derive(Debug)]
pub struct Claim {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(format!("{}{}", id, METADATA_SUFFIX))
    }

    /// Persist `metadata` for `id`, replacing any previous record.
    pub async fn put(&self, id: &ObjectId, metadata: &Metadata) -> io::Result<()> {
        let encoded = serde_json::to_vec(metadata).map_err(io::Error::other)?;
        let final_path = self.path(id);
        let tmp_path = self
            .root
            .join(format!("{}{}.tmp-{}", id, METADATA_SUFFIX, Uuid::new_v4()));

        if let Err(err) = fs::write(&tmp_path, &encoded).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        Ok(())
    }

    /// Load the record for `id`. `None` covers both absence and corruption.
    pub async fn get(&self, id: &ObjectId) -> io::Result<Option<Metadata>> {
        let raw = match fs::read(self.path(id)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no metadata for {}", id);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        match serde_json::from_slice(&raw) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) => {
                warn!("unreadable metadata for {}: {}", id, err);
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, id: &ObjectId) -> io::Result<()> {
        fs::remove_file(self.path(id)).await
    }

    /// Atomically move the record for `id` away from its lookup path.
    ///
    /// Returns `None` when the record is already gone, which is what every
    /// loser of a concurrent claim observes.
    pub async fn claim(&self, id: &ObjectId) -> io::Result<Option<Claim>> {
        let claimed = self
            .root
            .join(format!("{}{}.claimed-{}", id, METADATA_SUFFIX, Uuid::new_v4()));
        match fs::rename(self.path(id), &claimed).await {
            Ok(()) => Ok(Some(Claim { path: claimed })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Drop a claimed record for good.
    pub async fn release(&self, claim: Claim) -> io::Result<()> {
        match fs::remove_file(&claim.path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, MetadataStore, ObjectId) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MetadataStore::new(dir.path());
        (dir, store, ObjectId::from_bytes(b"\x01\x02\x03\x04\x05\x06"))
    }

    #[tokio::test]
    async fn put_then_get() {
        let (_dir, store, id) = setup();
        let meta = Metadata::new_upload("notes.txt", 42, false);

        store.put(&id, &meta).await.expect("put");
        let loaded = store.get(&id).await.expect("get").expect("present");
        assert_eq!(loaded, meta);
        assert!(store.path(&id).to_string_lossy().ends_with(".meta"));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let (_dir, store, id) = setup();
        assert!(store.get(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_none() {
        let (_dir, store, id) = setup();
        std::fs::write(store.path(&id), b"{not json").expect("seed");
        assert!(store.get(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn put_leaves_no_temporary_files() {
        let (dir, store, id) = setup();
        store
            .put(&id, &Metadata::new_upload("a", 1, false))
            .await
            .expect("put");
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{}.meta", id)]);
    }

    #[tokio::test]
    async fn delete_hides_record() {
        let (_dir, store, id) = setup();
        store
            .put(&id, &Metadata::new_upload("a", 1, false))
            .await
            .expect("put");
        store.delete(&id).await.expect("delete");
        assert!(store.get(&id).await.expect("get").is_none());
        assert_eq!(
            store.delete(&id).await.expect_err("already gone").kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn only_one_claim_succeeds() {
        let (_dir, store, id) = setup();
        store
            .put(&id, &Metadata::new_upload("once.txt", 1, true))
            .await
            .expect("put");

        let first = store.claim(&id).await.expect("claim");
        let second = store.claim(&id).await.expect("claim");
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(store.get(&id).await.expect("get").is_none());

        store.release(first.expect("claimed")).await.expect("release");
    }
}
