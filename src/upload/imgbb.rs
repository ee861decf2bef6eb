//! imgbb HTTP uploader
//!
//! Sends one multipart POST per upload. There is no retry: transient
//! failures surface to the caller unchanged.
//!
//! # Example
//!
//! ```no_run
//! use imgbb_uploadr::upload::{ImageUploader, ImgbbClient, UploadRequest};
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ImgbbClient::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let request = UploadRequest::new("my-api-key", PathBuf::from("cat.jpg"))
//!     .name("cat")
//!     .expiration(600);
//! let response = client.upload_request(request).await?;
//! println!("Uploaded to {}", response.url);
//! # Ok(())
//! # }
//! ```

use super::{
    ImageSource, ImageUploader, UploadError, UploadRequest, UploadResponse, DEFAULT_ENDPOINT,
};
#[cfg(feature = "metrics")]
use crate::metrics;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::time::{Duration, Instant};

/// Default timeout for upload requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// imgbb client configuration
#[derive(Debug, Clone)]
pub struct ImgbbConfig {
    /// Upload endpoint (e.g., "https://api.imgbb.com/1/upload")
    pub endpoint: String,
    /// Request timeout (default: 30 seconds)
    pub timeout: Option<Duration>,
}

impl Default for ImgbbConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

/// imgbb uploader backed by reqwest
pub struct ImgbbClient {
    config: ImgbbConfig,
    client: reqwest::Client,
}

/// Builder for ImgbbClient
#[derive(Default)]
pub struct ImgbbClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl ImgbbClientBuilder {
    /// Set the upload endpoint
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the ImgbbClient
    pub fn build(self) -> Result<ImgbbClient, UploadError> {
        let config = ImgbbConfig {
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: self.timeout,
        };
        ImgbbClient::new(config)
    }
}

impl ImgbbClient {
    /// Create a new imgbb client
    pub fn new(config: ImgbbConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a new builder for ImgbbClient
    pub fn builder() -> ImgbbClientBuilder {
        ImgbbClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Turn the image source into the `image` form value
    async fn encode_image(image: ImageSource) -> Result<(String, usize), UploadError> {
        let engine = base64::engine::general_purpose::STANDARD;
        match image {
            ImageSource::Path(path) => {
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read image");
                    e
                })?;
                Ok((engine.encode(&data), data.len()))
            }
            ImageSource::Bytes(bytes) => Ok((engine.encode(&bytes), bytes.len())),
            ImageSource::Base64(encoded) => {
                let len = encoded.len();
                Ok((encoded, len))
            }
            ImageSource::Url(url) => Ok((url, 0)),
        }
    }

    async fn send(&self, request: UploadRequest) -> Result<UploadResponse, UploadError> {
        let (api_key, image) = match (request.api_key, request.image) {
            (Some(api_key), Some(image)) => (api_key, image),
            _ => return Err(UploadError::Validation("Incomplete upload request".into())),
        };

        let (encoded, payload_bytes) = Self::encode_image(image).await?;
        tracing::Span::current().record("upload.bytes", payload_bytes as u64);

        let mut form = reqwest::multipart::Form::new().text("image", encoded);
        if let Some(name) = request.name {
            form = form.text("name", name);
        }

        let mut query: Vec<(&str, String)> = vec![("key", api_key)];
        if let Some(expiration) = request.expiration {
            query.push(("expiration", expiration.to_string()));
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(redact_url)?;

        let status = response.status();
        let body = response.text().await.map_err(redact_url)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ImgbbEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error)
                .map(|error| error.message)
                .unwrap_or(body);
            return Err(UploadError::Remote(format!(
                "imgbb returned status {}: {}",
                status, message
            )));
        }

        let envelope: ImgbbEnvelope = serde_json::from_str(&body)
            .map_err(|e| UploadError::Remote(format!("Malformed response: {}", e)))?;

        if envelope.success == Some(false) {
            let message = envelope
                .error
                .map(|error| error.message)
                .unwrap_or_else(|| "upload rejected".to_string());
            return Err(UploadError::Remote(message));
        }

        envelope
            .data
            .ok_or_else(|| UploadError::Remote("Response has no data".into()))
            .map(UploadResponse::from)
    }
}

/// The request URL carries the API key in its query string
fn redact_url(error: reqwest::Error) -> UploadError {
    UploadError::Http(error.without_url())
}

#[async_trait]
impl ImageUploader for ImgbbClient {
    #[tracing::instrument(
        name = "upload.imgbb",
        skip(self, request),
        fields(
            image.source = request.image.as_ref().map(|i| i.kind()).unwrap_or("none"),
            image.name = ?request.name,
            image.expiration = ?request.expiration,
            upload.bytes = tracing::field::Empty,
            image.url = tracing::field::Empty
        ),
        err
    )]
    async fn upload_request(&self, request: UploadRequest) -> Result<UploadResponse, UploadError> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "Upload request rejected");
            #[cfg(feature = "metrics")]
            metrics::record_upload_failure(e.kind());
            return Err(e);
        }

        let start_time = Instant::now();
        let result = self.send(request).await;
        let duration = start_time.elapsed();

        #[cfg(feature = "metrics")]
        metrics::record_upload_duration(duration.as_secs_f64());

        match result {
            Ok(response) => {
                #[cfg(feature = "metrics")]
                metrics::record_upload_success(response.size);

                tracing::Span::current().record("image.url", response.url.as_str());
                tracing::info!(
                    id = %response.id,
                    size = response.size,
                    duration_ms = duration.as_millis(),
                    "Upload completed"
                );
                Ok(response)
            }
            Err(e) => {
                #[cfg(feature = "metrics")]
                metrics::record_upload_failure(e.kind());

                tracing::error!(
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Upload failed"
                );
                Err(e)
            }
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ImgbbEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<ImgbbData>,
    #[serde(default)]
    error: Option<ImgbbErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ImgbbErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ImgbbData {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    url: String,
    #[serde(default)]
    display_url: Option<String>,
    #[serde(default)]
    delete_url: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    time: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    expiration: Option<u64>,
    image: ImgbbImage,
}

#[derive(Debug, Deserialize)]
struct ImgbbImage {
    name: String,
    #[serde(default)]
    mime: Option<String>,
}

impl From<ImgbbData> for UploadResponse {
    fn from(data: ImgbbData) -> Self {
        let uploaded_at: Option<DateTime<Utc>> = data
            .time
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Self {
            id: data.id,
            url: data.url,
            display_url: data.display_url,
            delete_url: data.delete_url,
            size: data.size,
            name: data.image.name,
            mime: data.image.mime,
            // imgbb reports "0" for images that never expire
            expiration: data.expiration.filter(|secs| *secs > 0),
            uploaded_at,
        }
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Float(f64),
    String(String),
}

fn coerce_u64<E: serde::de::Error>(value: NumberOrString) -> Result<Option<u64>, E> {
    match value {
        NumberOrString::Number(n) => Ok(Some(n)),
        NumberOrString::Float(f) if f >= 0.0 => Ok(Some(f.trunc() as u64)),
        NumberOrString::Float(f) => Err(E::custom(format!("negative number {}", f))),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(None),
        NumberOrString::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| E::custom(format!("expected integer, got '{}'", s))),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberOrString::deserialize(deserializer)?;
    coerce_u64::<D::Error>(value)?
        .ok_or_else(|| serde::de::Error::custom("expected integer, got empty"))
}

fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => coerce_u64(value),
        None => Ok(None),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::Float(f) => f.to_string(),
        NumberOrString::String(s) => s,
    })
}
