//! Upload module
//!
//! Request/response types and the [`ImageUploader`] seam. The imgbb HTTP
//! implementation lives in [`imgbb`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod imgbb;

pub use imgbb::{ImgbbClient, ImgbbClientBuilder};

/// Public imgbb v1 upload endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";

/// Shortest expiration imgbb accepts, in seconds
pub const MIN_EXPIRATION_SECS: u64 = 60;

/// Longest expiration imgbb accepts (180 days), in seconds
pub const MAX_EXPIRATION_SECS: u64 = 15_552_000;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Request rejected locally, before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Endpoint answered with a failure status or an unusable payload
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "validation",
            UploadError::Remote(_) => "remote",
            UploadError::Http(_) => "http",
            UploadError::Io(_) => "io",
        }
    }
}

/// Where the image bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Local file, read at upload time
    Path(PathBuf),
    /// Raw image bytes
    Bytes(Bytes),
    /// Image already encoded as base64
    Base64(String),
    /// Remote image imgbb fetches itself
    Url(String),
}

impl ImageSource {
    fn is_empty(&self) -> bool {
        match self {
            ImageSource::Path(path) => path.as_os_str().is_empty(),
            ImageSource::Bytes(bytes) => bytes.is_empty(),
            ImageSource::Base64(s) | ImageSource::Url(s) => s.trim().is_empty(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ImageSource::Path(_) => "path",
            ImageSource::Bytes(_) => "bytes",
            ImageSource::Base64(_) => "base64",
            ImageSource::Url(_) => "url",
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Bytes> for ImageSource {
    fn from(bytes: Bytes) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(Bytes::from(bytes))
    }
}

/// Optional metadata for an upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub name: Option<String>,
    /// Seconds until imgbb deletes the image
    pub expiration: Option<u64>,
}

/// A complete upload request
///
/// Every field is optional so that incomplete requests can be represented
/// and rejected by [`UploadRequest::validate`] instead of at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    pub api_key: Option<String>,
    pub image: Option<ImageSource>,
    pub name: Option<String>,
    pub expiration: Option<u64>,
}

impl UploadRequest {
    pub fn new(api_key: impl Into<String>, image: impl Into<ImageSource>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            image: Some(image.into()),
            name: None,
            expiration: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn expiration(mut self, seconds: u64) -> Self {
        self.expiration = Some(seconds);
        self
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        if options.name.is_some() {
            self.name = options.name;
        }
        if options.expiration.is_some() {
            self.expiration = options.expiration;
        }
        self
    }

    /// Check the request without touching the filesystem or the network
    pub fn validate(&self) -> Result<(), UploadError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(UploadError::Validation("API key is required".into())),
        }

        match &self.image {
            Some(image) if !image.is_empty() => {}
            Some(image) => {
                return Err(UploadError::Validation(format!(
                    "Image source ({}) is empty",
                    image.kind()
                )))
            }
            None => return Err(UploadError::Validation("Image source is required".into())),
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(UploadError::Validation(
                    "Image name cannot be blank when provided".into(),
                ));
            }
        }

        if let Some(expiration) = self.expiration {
            if !(MIN_EXPIRATION_SECS..=MAX_EXPIRATION_SECS).contains(&expiration) {
                return Err(UploadError::Validation(format!(
                    "Expiration {} out of range: must be between {} and {} seconds",
                    expiration, MIN_EXPIRATION_SECS, MAX_EXPIRATION_SECS
                )));
            }
        }

        Ok(())
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResponse {
    pub id: String,
    /// Direct link to the image
    pub url: String,
    pub display_url: Option<String>,
    pub delete_url: Option<String>,
    pub size: u64,
    pub name: String,
    pub mime: Option<String>,
    /// `None` when the image never expires
    pub expiration: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Image uploader trait
#[async_trait::async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload using a request bundle
    async fn upload_request(&self, request: UploadRequest) -> Result<UploadResponse, UploadError>;

    /// Upload with positional arguments
    async fn upload(
        &self,
        api_key: &str,
        image: ImageSource,
        options: Option<UploadOptions>,
    ) -> Result<UploadResponse, UploadError> {
        let request = UploadRequest::new(api_key, image).with_options(options.unwrap_or_default());
        self.upload_request(request).await
    }
}
