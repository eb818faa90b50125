//! File storage for uploaded shot images.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Image extensions accepted for shot uploads.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Uploaded file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Storage key (relative path).
    pub key: String,
    /// File size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`.
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<UploadedFile>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<UploadedFile> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Split an uploaded file name into a filesystem-safe stem and a lowercase
/// extension. Returns `None` for the extension when there is none.
fn split_file_name(original_name: &str) -> (String, Option<String>) {
    // Browsers on some platforms send the full client path.
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let (stem, extension) = match base.rfind('.') {
        Some(pos) if pos > 0 && pos < base.len() - 1 => (&base[..pos], Some(&base[pos + 1..])),
        _ => (base, None),
    };

    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .chars()
        .take(64)
        .collect();

    let extension = extension
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    (if stem.is_empty() { "shot".to_string() } else { stem }, extension)
}

/// Whether a file name carries one of the accepted image extensions.
#[must_use]
pub fn has_image_extension(original_name: &str) -> bool {
    split_file_name(original_name)
        .1
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Generate a unique storage key for an uploaded file.
///
/// The key keeps the uploader's file name readable and appends a
/// millisecond timestamp, e.g. `hole-7_20250101120000123.jpg`.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    let (stem, extension) = split_file_name(original_name);
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..6];

    format!(
        "{stem}_{stamp}{suffix}.{}",
        extension.as_deref().unwrap_or("bin")
    )
}
