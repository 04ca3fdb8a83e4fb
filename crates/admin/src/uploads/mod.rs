//! Image storage for catalog uploads.
//!
//! Images land either in a local directory (served by the admin binary at
//! `/uploads`) or in Cloudinary, depending on configuration. Either way the
//! caller gets back a public URL, which is what the database stores.

pub mod cloudinary;
pub mod local;

use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

pub use cloudinary::CloudinaryStore;
pub use local::LocalStore;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors from storing or removing images.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file is not an accepted image type.
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image is larger than {} MiB", MAX_IMAGE_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("Image file is empty")]
    Empty,

    /// Writing to the upload directory failed.
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Cloudinary request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary rejected the upload.
    #[error("Cloudinary error: {0}")]
    Cloudinary(String),
}

impl UploadError {
    /// Whether the client sent something unusable, as opposed to a storage failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::TooLarge | Self::Empty)
    }
}

/// An image received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    /// Check type and size, and return the file extension to store under.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file is empty, too large, or not a
    /// supported raster image.
    pub fn validate(&self) -> Result<&'static str, UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge);
        }
        extension_for(&self.content_type)
            .ok_or_else(|| UploadError::UnsupportedType(self.content_type.clone()))
    }
}

/// File extension for an accepted image content type. SVG is refused since
/// it can carry script.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Random, collision-free stem for a stored file.
fn random_stem() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Where images are kept.
#[derive(Debug, Clone)]
pub enum ImageStore {
    Local(LocalStore),
    Cloudinary(CloudinaryStore),
}

impl ImageStore {
    /// Cloudinary when configured, otherwise the local directory.
    #[must_use]
    pub fn from_config(config: &UploadConfig, http: reqwest::Client) -> Self {
        match &config.cloudinary {
            Some(cloudinary) => Self::Cloudinary(CloudinaryStore::new(cloudinary.clone(), http)),
            None => Self::Local(LocalStore::new(config.dir.clone(), config.public_url.clone())),
        }
    }

    /// Store one image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if validation or storage fails.
    pub async fn store(&self, image: &ImageUpload) -> Result<String, UploadError> {
        let extension = image.validate()?;
        let url = match self {
            Self::Local(store) => store.store(&image.bytes, extension).await?,
            Self::Cloudinary(store) => store.store(image, extension).await?,
        };
        tracing::info!(url = %url, size = image.bytes.len(), "Image stored");
        Ok(url)
    }

    /// Store several images, removing the ones already stored if any fails.
    ///
    /// # Errors
    ///
    /// Returns the first `UploadError`.
    pub async fn store_all(&self, images: &[ImageUpload]) -> Result<Vec<String>, UploadError> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            match self.store(image).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    self.delete_all(&urls).await;
                    return Err(e);
                }
            }
        }
        Ok(urls)
    }

    /// Remove an image. Failures are logged, never returned: a stray file
    /// must not fail the request that replaced it.
    pub async fn delete(&self, url: &str) {
        let result = match self {
            Self::Local(store) => store.delete(url).await,
            Self::Cloudinary(store) => store.delete(url).await,
        };
        if let Err(e) = result {
            tracing::warn!(url = %url, error = %e, "Failed to delete stored image");
        }
    }

    pub async fn delete_all(&self, urls: &[String]) {
        for url in urls {
            self.delete(url).await;
        }
    }

    /// Local directory to serve at `/uploads`, if images are kept locally.
    #[must_use]
    pub const fn local_dir(&self) -> Option<&std::path::PathBuf> {
        match self {
            Self::Local(store) => Some(store.dir()),
            Self::Cloudinary(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> ImageUpload {
        ImageUpload {
            bytes: vec![0xFF; len],
            content_type: content_type.to_string(),
            file_name: Some("photo".to_string()),
        }
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn test_validate() {
        assert_eq!(upload("image/webp", 10).validate().ok(), Some("webp"));
        assert!(matches!(upload("image/png", 0).validate(), Err(UploadError::Empty)));
        assert!(matches!(
            upload("image/png", MAX_IMAGE_BYTES + 1).validate(),
            Err(UploadError::TooLarge)
        ));
        let err = upload("text/html", 10).validate().unwrap_err();
        assert!(err.is_client_error());
    }
}
