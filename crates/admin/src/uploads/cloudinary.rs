//! Cloudinary signed uploads.
//!
//! Requests are signed by hashing the sorted parameters followed by the API
//! secret with SHA-256, as Cloudinary's upload API describes.

use std::collections::BTreeMap;

use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageUpload, UploadError, random_stem};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Uploads images to one Cloudinary cloud.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl CloudinaryStore {
    #[must_use]
    pub const fn new(config: CloudinaryConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.config.cloud_name)
    }

    /// Hex SHA-256 over `k=v&k=v` (sorted by key) followed by the secret.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub(super) async fn store(
        &self,
        image: &ImageUpload,
        extension: &str,
    ) -> Result<String, UploadError> {
        let stem = random_stem();
        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("public_id", stem.clone());
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let file = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(format!("{stem}.{extension}"))
            .mime_str(&image.content_type)?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response: UploadResponse = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(UploadError::Cloudinary(error.message));
        }
        response
            .secure_url
            .ok_or_else(|| UploadError::Cloudinary("upload response had no URL".to_string()))
    }

    pub(super) async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let Some(public_id) = public_id_from_url(url, &self.config.cloud_name) else {
            tracing::debug!(url = %url, "Not a Cloudinary image of this cloud, nothing to delete");
            return Ok(());
        };

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id);
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let mut form: Vec<(&str, String)> = params.into_iter().collect();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response: DestroyResponse = self
            .http
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(UploadError::Cloudinary(error.message));
        }
        match response.result.as_deref() {
            Some("ok" | "not found") => Ok(()),
            other => Err(UploadError::Cloudinary(format!(
                "unexpected destroy result: {}",
                other.unwrap_or("none")
            ))),
        }
    }
}

/// Public id of a delivery URL such as
/// `https://res.cloudinary.com/<cloud>/image/upload/v1712/dokan/ab12.jpg`
/// (here `dokan/ab12`). Transformations are not expected in stored URLs.
fn public_id_from_url(url: &str, cloud_name: &str) -> Option<String> {
    let marker = format!("/{cloud_name}/image/upload/");
    let (_, rest) = url.split_once(&marker)?;

    let rest = match rest.split_once('/') {
        Some((version, tail))
            if version.len() > 1
                && version.starts_with('v')
                && version.chars().skip(1).all(|c| c.is_ascii_digit()) =>
        {
            tail
        }
        _ => rest,
    };

    let id = rest.rsplit_once('.').map_or(rest, |(stem, _)| stem);
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn store() -> CloudinaryStore {
        CloudinaryStore::new(
            CloudinaryConfig {
                cloud_name: "dokan".to_string(),
                api_key: "1234".to_string(),
                api_secret: SecretString::from("abcd"),
                folder: "dokan".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_sign_sorts_params_and_appends_secret() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());

        let mut hasher = Sha256::new();
        hasher.update(b"public_id=sample_image&timestamp=1315060510abcd");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(store().sign(&params), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(
            public_id_from_url(
                "https://res.cloudinary.com/dokan/image/upload/v1712345678/dokan/ab12.jpg",
                "dokan"
            )
            .as_deref(),
            Some("dokan/ab12")
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/dokan/image/upload/ab12.png", "dokan")
                .as_deref(),
            Some("ab12")
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/other/image/upload/ab12.png", "dokan"),
            None
        );
        assert_eq!(
            public_id_from_url("http://localhost:3001/uploads/ab12.png", "dokan"),
            None
        );
    }
}
