//! src/services/storage_service.rs
//!
//! StorageService — the upload and retrieval paths of the file drop. Content
//! artifacts and metadata sidecars live side by side under `base_path`; the
//! filesystem's exclusive-create and rename primitives are the only
//! coordination between concurrent requests.

use crate::{
    models::metadata::Metadata,
    services::{
        auth::Authenticator,
        content_store::ContentStore,
        identifier::ObjectId,
        metadata_store::MetadataStore,
        sanitize::is_sanitized,
    },
};
use bytes::Bytes;
use futures::Stream;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs::File;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("no free identifier after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// How often the allocator redraws after a name collision. No backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

/// A freshly stored upload.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: ObjectId,
    pub metadata: Metadata,
}

/// Outcome of a retrieval that found a live object.
#[derive(Debug)]
pub enum Retrieval {
    /// Content is ready to stream.
    Ready { metadata: Metadata, file: File },
    /// Self-destructing object and no valid credential; nothing was consumed.
    AuthRequired,
}

#[derive(Clone, Debug)]
pub struct StorageService {
    content: ContentStore,
    metadata: MetadataStore,
    retry: RetryPolicy,

    /// Directory holding every artifact.
    base_path: PathBuf,
}

impl StorageService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            content: ContentStore::new(&base_path),
            metadata: MetadataStore::new(&base_path),
            retry: RetryPolicy::default(),
            base_path,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Reserve a fresh identifier by exclusively creating its content file.
    pub async fn allocate(&self) -> StorageResult<(ObjectId, File)> {
        self.allocate_with(ObjectId::random).await
    }

    async fn allocate_with<F>(&self, mut draw: F) -> StorageResult<(ObjectId, File)>
    where
        F: FnMut() -> ObjectId,
    {
        for attempt in 1..=self.retry.max_attempts {
            let id = draw();
            match self.content.create_exclusive(&id).await {
                Ok(file) => return Ok((id, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!("identifier collision on attempt {}: {}", attempt, id);
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        }

        error!(
            "identifier allocation exhausted after {} attempts",
            self.retry.max_attempts
        );
        Err(StorageError::Exhausted {
            attempts: self.retry.max_attempts,
        })
    }

    /// Store one uploaded file: allocate, write content, then publish metadata.
    ///
    /// # Panics
    ///
    /// If `filename` is not sanitized. That is a broken caller contract, not a
    /// request error.
    pub async fn upload_object_stream<S>(
        &self,
        filename: &str,
        private_selfdestruct: bool,
        stream: S,
    ) -> StorageResult<StoredObject>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        assert!(
            is_sanitized(filename),
            "unsanitized filename reached storage: {:?}",
            filename
        );

        let (id, file) = self.allocate().await?;

        let size = match self.content.write(file, stream).await {
            Ok(size) => size,
            Err(err) => {
                warn!("writing content for {} failed: {}", id, err);
                let _ = self.content.delete(&id).await;
                return Err(StorageError::Io(err));
            }
        };

        let metadata = Metadata::new_upload(filename, size, private_selfdestruct);
        if let Err(err) = self.metadata.put(&id, &metadata).await {
            error!("writing metadata for {} failed: {}", id, err);
            let _ = self.content.delete(&id).await;
            return Err(StorageError::Io(err));
        }

        info!(
            "stored {} ({} bytes, self-destruct: {})",
            id, size, private_selfdestruct
        );
        Ok(StoredObject { id, metadata })
    }

    /// Look up an object for reading, enforcing the self-destruct lifecycle.
    ///
    /// A self-destructing object is consumed by moving its metadata away
    /// before the content is opened. Only the request that wins that move gets
    /// the content; everything after it sees `NotFound`.
    pub async fn retrieve(
        &self,
        id: &ObjectId,
        credential: Option<&str>,
        auth: &Authenticator,
    ) -> StorageResult<Retrieval> {
        let metadata = self
            .metadata
            .get(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        if !metadata.private_selfdestruct {
            let file = self.open_content(id).await?;
            return Ok(Retrieval::Ready { metadata, file });
        }

        if !credential.is_some_and(|c| auth.authenticate(c)) {
            debug!("self-destructing {} requested without valid credential", id);
            return Ok(Retrieval::AuthRequired);
        }

        let claim = match self.metadata.claim(id).await {
            Ok(Some(claim)) => claim,
            Ok(None) => {
                debug!("{} was consumed by a concurrent request", id);
                return Err(StorageError::NotFound);
            }
            Err(err) => {
                error!("error self-destructing {}: {}", id, err);
                return Err(StorageError::NotFound);
            }
        };

        let opened = self.open_content(id).await;

        if let Err(err) = self.metadata.release(claim).await {
            warn!("could not remove claimed metadata for {}: {}", id, err);
        }
        if let Err(err) = self.content.delete(id).await {
            warn!("could not remove consumed content {}: {}", id, err);
        }

        let file = opened?;
        info!("self-destructed {}", id);
        Ok(Retrieval::Ready { metadata, file })
    }

    async fn open_content(&self, id: &ObjectId) -> StorageResult<File> {
        self.content.open(id).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                warn!("metadata present but content missing for {}", id);
                StorageError::NotFound
            } else {
                StorageError::Io(err)
            }
        })
    }
}
