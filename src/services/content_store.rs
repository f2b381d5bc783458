//! Raw content artifacts, one file per identifier directly under the root.

use crate::services::identifier::ObjectId;
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Create the artifact for `id`, failing with `AlreadyExists` if any file
    /// already has that name.
    pub async fn create_exclusive(&self, id: &ObjectId) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(id))
            .await
    }

    /// Copy `stream` into `file` and return the number of bytes written.
    pub async fn write<S>(&self, mut file: File, stream: S) -> io::Result<u64>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let mut written: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Open the artifact for reading.
    pub async fn open(&self, id: &ObjectId) -> io::Result<File> {
        File::open(self.path(id)).await
    }

    /// Best-effort removal; a missing artifact counts as removed.
    pub async fn delete(&self, id: &ObjectId) -> io::Result<()> {
        match fs::remove_file(self.path(id)).await {
            Ok(()) => {
                debug!("removed content {}", id);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("content {} already missing", id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
