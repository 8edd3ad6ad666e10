//! Local disk storage for uploaded images.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid file name: {0}")]
    InvalidName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written by [`ImageStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name on disk, `<content hash><ext>`
    pub stored_name: String,
    /// Path recorded in the database and served to clients
    pub public_path: String,
}

/// Upload directory on local disk.
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write `content` under a content-addressed name.
    ///
    /// Identical uploads map to the same file; the extension comes from
    /// `original_name`.
    pub async fn save(&self, original_name: &str, content: &[u8]) -> Result<StoredFile, StorageError> {
        let stored_name = format!("{}{}", hash_prefix(content), extension(original_name));
        let path = self.root.join(&stored_name);

        tokio::fs::write(&path, content).await?;
        tracing::info!("Stored upload {} ({} bytes)", stored_name, content.len());

        Ok(StoredFile {
            public_path: Self::make_public_path(&stored_name),
            stored_name,
        })
    }

    /// Read a file back by the public path recorded for it.
    pub async fn read(&self, public_path: &str) -> Result<Vec<u8>, StorageError> {
        let name = Self::stored_name(public_path)?;
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(public_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Format: `/uploads/{stored_name}`
    pub fn make_public_path(stored_name: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, stored_name.trim_start_matches('/'))
    }

    /// Last path segment, refusing anything that could escape the upload directory.
    fn stored_name(public_path: &str) -> Result<&str, StorageError> {
        let name = public_path.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
            return Err(StorageError::InvalidName(public_path.to_string()));
        }
        Ok(name)
    }
}

fn hash_prefix(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    format!("{:x}", digest)[..32].to_string()
}

/// Lowercased `.ext` of a client file name, or empty when absent or odd.
fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}
