//! Object storage uploads for local image inputs.
//!
//! Image-to-video providers only accept URLs, so local files are pushed to a
//! Supabase storage bucket and replaced by their public URL.

use crate::config::Config;
use crate::error::{Error, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

/// Image extensions accepted for upload.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Folder uploaded images are placed under inside the bucket.
const UPLOAD_PREFIX: &str = "video-generation";

/// Whether `input` should be treated as a local file rather than a URL.
///
/// Anything that parses as a URL is remote. Single-letter schemes are
/// Windows drive prefixes (`C:\images\cat.png`) and stay local.
pub fn is_local_path(input: &str) -> bool {
    match reqwest::Url::parse(input) {
        Ok(url) => url.scheme().len() == 1,
        Err(_) => true,
    }
}

/// RFC 3339 UTC timestamp with `:` and `.` replaced by `-`, safe for file names.
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Lowercased extension with a leading dot, or empty when there is none.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Validate the image extension and return its content type.
pub fn image_content_type(path: &Path) -> Result<&'static str, StorageError> {
    let ext = dotted_extension(path);
    let content_type = match ext.as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".webp" => "image/webp",
        _ => {
            return Err(StorageError::InvalidImage {
                extension: ext,
                supported: IMAGE_EXTENSIONS.join(", "),
            });
        }
    };
    Ok(content_type)
}

fn encode_object_path(object: &str) -> String {
    object
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Supabase storage client.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            bucket: bucket.into(),
        }
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `Error::MissingCredential` if the storage URL or key is unset.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let url = config
            .supabase_url
            .as_deref()
            .ok_or_else(|| Error::missing_credential("SUPABASE_URL"))?;
        let key = config
            .supabase_service_key
            .as_deref()
            .ok_or_else(|| Error::missing_credential("SUPABASE_SERVICE_ROLE_KEY"))?;
        Ok(Self::new(url, key, config.supabase_bucket.clone()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object path for an uploaded file: `video-generation/{timestamp}_{basename}`.
    pub fn object_path(file: &Path, now: DateTime<Utc>) -> String {
        let basename = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        format!("{}/{}_{}", UPLOAD_PREFIX, timestamp_slug(now), basename)
    }

    /// Public URL of an object in the bucket.
    pub fn public_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_object_path(object)
        )
    }

    /// Upload a local image and return its public URL.
    ///
    /// # Errors
    /// - `StorageError::NotFound` if the file does not exist
    /// - `StorageError::InvalidImage` for unsupported extensions
    /// - `StorageError::UploadFailed` if the request fails or is rejected
    pub async fn upload_image(&self, path: &Path) -> Result<String, Error> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.display().to_string()).into());
        }
        let content_type = image_content_type(path)?;
        let data = tokio::fs::read(path).await?;
        let object = Self::object_path(path, Utc::now());

        self.upload(&object, data, content_type).await?;

        let url = self.public_url(&object);
        tracing::info!(path = %path.display(), url = %url, "Uploaded local image");
        Ok(url)
    }

    /// Upload raw bytes to `object` without overwriting an existing object.
    pub async fn upload(
        &self,
        object: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_object_path(object)
        );

        tracing::debug!(object = %object, bytes = data.len(), "Uploading to storage");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(object, 0, format!("Upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(object, status.as_u16(), body));
        }

        Ok(())
    }
}
