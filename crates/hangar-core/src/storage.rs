//! Content-addressed storage for uploaded file contents.

use std::{
    fs,
    path::{Path, PathBuf},
};

use hangar_utils::{
    fs::{safe_remove, write_atomic},
    hash::{hash_bytes, md5_bytes, verify_bytes},
};
use tracing::trace;

use crate::{
    error::{ErrorContext, RegistryError},
    RegistryResult,
};

/// A blob written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub hash: String,
    pub md5: String,
    pub size: i64,
    /// False when identical content was already present.
    pub created: bool,
}

/// Blob directory laid out as `root/aa/bb/<hash>`.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, hash: &str) -> RegistryResult<PathBuf> {
        if hash.len() < 4 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RegistryError::Custom(format!("invalid blob hash '{hash}'")));
        }
        Ok(self.root.join(&hash[0..2]).join(&hash[2..4]).join(hash))
    }

    pub fn exists(&self, hash: &str) -> RegistryResult<bool> {
        Ok(self.path_for(hash)?.is_file())
    }

    /// Stores `data` under its blake3 hash, skipping the write when the blob exists.
    pub fn write(&self, data: &[u8]) -> RegistryResult<StoredBlob> {
        let hash = hash_bytes(data);
        let path = self.path_for(&hash)?;
        let size = data.len() as i64;

        if path.is_file() {
            trace!("blob {} already stored", hash);
            return Ok(StoredBlob {
                hash,
                md5: md5_bytes(data),
                size,
                created: false,
            });
        }

        write_atomic(&path, data)?;
        trace!("stored blob {} ({} bytes)", hash, size);

        Ok(StoredBlob {
            hash,
            md5: md5_bytes(data),
            size,
            created: true,
        })
    }

    /// Reads a blob back, rejecting content that no longer matches its hash.
    pub fn read(&self, hash: &str) -> RegistryResult<Vec<u8>> {
        let path = self.path_for(hash)?;
        let data = fs::read(&path).with_context(|| format!("reading blob {}", path.display()))?;
        verify_bytes(&data, hash)?;
        Ok(data)
    }

    pub fn remove(&self, hash: &str) -> RegistryResult<()> {
        let path = self.path_for(hash)?;
        safe_remove(&path)?;
        trace!("removed blob {}", hash);
        Ok(())
    }
}
