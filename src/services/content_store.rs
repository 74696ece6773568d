//! src/services/content_store.rs
//!
//! Content-addressed blob storage for encrypted payloads. The vault only
//! ever sees the address returned by `put`; the ledger stores that address,
//! never the bytes.
//!
//! `DiskContentStore` addresses blobs by the hex SHA-256 of their bytes and
//! shards them beneath `base_path/{aa}/{bb}/{address}`.

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use sha2::{Digest, Sha256};
use std::{
    future::Future,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content `{0}` not found")]
    NotFound(String),
    #[error("invalid content address `{0}`")]
    InvalidAddress(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ContentResult<T> = Result<T, ContentError>;

/// Lazily produced content bytes.
pub type ContentStream = BoxStream<'static, io::Result<Bytes>>;

pub trait ContentStore: Send + Sync {
    /// Store immutable bytes and return their locator.
    fn put(&self, bytes: Bytes) -> impl Future<Output = ContentResult<String>> + Send;

    fn get(&self, address: &str) -> impl Future<Output = ContentResult<ContentStream>> + Send;

    /// Write-read-delete probe under the store's root, for readiness checks.
    fn probe(&self) -> impl Future<Output = ContentResult<()>> + Send;
}

/// Drain a content stream into memory.
pub async fn read_all(mut stream: ContentStream) -> ContentResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}

#[derive(Clone, Debug)]
pub struct DiskContentStore {
    /// Root directory for payloads.
    pub base_path: PathBuf,
}

impl DiskContentStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// An address is exactly 64 lowercase hex characters; anything else
    /// could escape the store root.
    fn ensure_address_valid(address: &str) -> ContentResult<()> {
        if address.len() == 64 && address.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(())
        } else {
            Err(ContentError::InvalidAddress(address.to_string()))
        }
    }

    fn blob_path(&self, address: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(&address[0..2]);
        path.push(&address[2..4]);
        path.push(address);
        path
    }
}

impl ContentStore for DiskContentStore {
    /// Writes to a temp file, fsyncs, then renames into place. Content that
    /// is already present is not rewritten.
    async fn put(&self, bytes: Bytes) -> ContentResult<String> {
        let address = format!("{:x}", Sha256::digest(&bytes));
        let path = self.blob_path(&address);
        if fs::try_exists(&path).await? {
            debug!(%address, "content already stored");
            return Ok(address);
        }

        let parent = path.parent().map(Path::to_path_buf).ok_or_else(|| {
            ContentError::Io(io::Error::new(
                ErrorKind::Other,
                "content path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &path).await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ContentError::Io(err));
        }

        debug!(%address, size = bytes.len(), "content stored");
        Ok(address)
    }

    async fn get(&self, address: &str) -> ContentResult<ContentStream> {
        Self::ensure_address_valid(address)?;
        let file = File::open(self.blob_path(address)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ContentError::NotFound(address.to_string())
            } else {
                ContentError::Io(err)
            }
        })?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn probe(&self) -> ContentResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz").await?;
        let read = fs::read(&tmp_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        if read? == b"readyz" {
            Ok(())
        } else {
            Err(ContentError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "file content mismatch",
            )))
        }
    }
}
