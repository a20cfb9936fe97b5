//! Local-disk storage for uploaded images.
//!
//! Files land under one flat directory served at `/uploads`.  Each upload
//! gets a UUID identifier; the original file name only contributes its
//! extension, sanitized, so client input never influences the path.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

/// The URL and identifier handed back to the client after an upload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredFile {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    base_path: PathBuf,
    max_size: usize,
}

impl UploadStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Upload store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist an uploaded file and return its public URL and identifier.
    pub async fn store_file(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, ApiError> {
        if data.is_empty() {
            return Err(ApiError::Validation("empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::Validation(format!(
                "file too large: {} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }

        let public_id = Uuid::new_v4().to_string();
        let file_name = match sanitized_extension(original_name) {
            Some(ext) => format!("{public_id}.{ext}"),
            None => public_id.clone(),
        };
        let path = self.base_path.join(&file_name);

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to write upload {public_id}: {e}")))?;

        debug!(public_id = %public_id, size = data.len(), "Stored upload");

        Ok(StoredFile {
            url: format!("/uploads/{file_name}"),
            public_id,
        })
    }
}

/// The lowercase alphanumeric extension of a client-supplied file name, if
/// it has a reasonable one.
fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (UploadStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn store_and_read_back() {
        let (store, _dir) = test_store().await;

        let stored = store.store_file("photo.JPG", b"image-bytes").await.unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".jpg"));

        let on_disk = store
            .base_path()
            .join(stored.url.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"image-bytes");
    }

    #[tokio::test]
    async fn hostile_file_names_cannot_escape() {
        let (store, _dir) = test_store().await;

        let stored = store
            .store_file("../../etc/passwd", b"data")
            .await
            .unwrap();
        // Only the extension survives; the stored name is the UUID.
        assert!(!stored.url.contains(".."));

        let entries: Vec<_> = std::fs::read_dir(store.base_path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn empty_and_oversized_uploads_rejected() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 4).await.unwrap();

        assert!(store.store_file("a.png", b"").await.is_err());
        assert!(store.store_file("a.png", b"too big").await.is_err());
        assert!(store.store_file("a.png", b"ok").await.is_ok());
    }
}
