use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Single-file cap enforced before anything touches disk.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix under which stored files are served back.
pub const PUBLIC_PREFIX: &str = "uploads/";

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// A single attachment as parsed out of the submission body.
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Manages on-disk storage for report attachments.
///
/// Each attachment is stored as a flat file at `{dir}/{uuid}.{ext}` and
/// referenced from its report row as `uploads/{uuid}.{ext}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Checks the allow-list and size cap, returning the normalized
    /// extension to store under.
    pub fn validate(image: &UploadedImage) -> Result<&'static str, ApiError> {
        let ext = Path::new(&image.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let ext = match ext.as_deref() {
            Some("jpeg") => "jpeg",
            Some("jpg") => "jpg",
            Some("png") => "png",
            Some("gif") => "gif",
            _ => {
                return Err(ApiError::Validation(
                    "Only image files are allowed (jpeg, jpg, png, gif)".to_string(),
                ));
            }
        };

        if !ALLOWED_MIME_TYPES.contains(&image.content_type.as_str()) {
            return Err(ApiError::Validation(
                "Only image files are allowed (jpeg, jpg, png, gif)".to_string(),
            ));
        }

        if image.data.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::Validation(
                "Image exceeds the 5 MB size limit".to_string(),
            ));
        }

        Ok(ext)
    }

    /// Validates and persists an attachment under a generated unique
    /// filename. Returns the public path recorded on the report.
    pub async fn save_image(&self, image: &UploadedImage) -> Result<String, ApiError> {
        let ext = Self::validate(image)?;
        let name = format!("{}.{}", Uuid::new_v4(), ext);

        fs::write(self.file_path(&name), &image.data)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        info!("Stored attachment {} ({} bytes)", name, image.data.len());
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    /// Delete a stored attachment by its recorded public path.
    pub async fn delete_image(&self, public_path: &str) -> Result<()> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX).unwrap_or(public_path);
        // Stored names are always `{uuid}.{ext}`; anything else is not ours.
        if name.contains('/') || name.contains("..") {
            bail!("refusing to delete non-storage path: {}", public_path);
        }

        match fs::remove_file(self.file_path(name)).await {
            Ok(()) => {
                info!("Deleted attachment {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Attachment {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List stored attachment filenames.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(filename: &str, content_type: &str, len: usize) -> UploadedImage {
        UploadedImage {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: vec![0u8; len],
        }
    }

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        assert_eq!(Storage::validate(&image("a.png", "image/png", 10)).unwrap(), "png");
        assert_eq!(Storage::validate(&image("a.JPG", "image/jpeg", 10)).unwrap(), "jpg");
        assert_eq!(Storage::validate(&image("a.jpeg", "image/jpeg", 10)).unwrap(), "jpeg");
        assert_eq!(Storage::validate(&image("a.gif", "image/gif", 10)).unwrap(), "gif");
    }

    #[test]
    fn rejects_disallowed_extension_and_mime() {
        assert!(Storage::validate(&image("a.pdf", "application/pdf", 10)).is_err());
        assert!(Storage::validate(&image("a.png", "application/octet-stream", 10)).is_err());
        assert!(Storage::validate(&image("noextension", "image/png", 10)).is_err());
    }

    #[test]
    fn rejects_oversized_image() {
        let err = Storage::validate(&image("a.png", "image/png", MAX_IMAGE_BYTES + 1)).unwrap_err();
        assert!(err.to_string().contains("5 MB"));

        // exactly at the cap is fine
        assert!(Storage::validate(&image("a.png", "image/png", MAX_IMAGE_BYTES)).is_ok());
    }

    #[tokio::test]
    async fn save_then_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("refuge_storage_test_{}", std::process::id()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        let path = storage.save_image(&image("a.png", "image/png", 64)).await.unwrap();
        assert!(path.starts_with(PUBLIC_PREFIX));

        let name = path.strip_prefix(PUBLIC_PREFIX).unwrap();
        assert!(dir.join(name).exists());

        storage.delete_image(&path).await.unwrap();
        assert!(!dir.join(name).exists());

        // deleting again is not an error
        storage.delete_image(&path).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn delete_refuses_paths_outside_storage() {
        let dir = std::env::temp_dir().join(format!("refuge_storage_guard_{}", std::process::id()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        assert!(storage.delete_image("uploads/../etc/passwd").await.is_err());
        assert!(storage.delete_image("/etc/passwd").await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
