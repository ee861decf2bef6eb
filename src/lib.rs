//! imgbb Uploadr Library
//!
//! Client for the imgbb image hosting API, plus a generator that derives an
//! ES module test suite from CommonJS tests.
//!
//! # Features
//!
//! - **Single-shot uploads**: one multipart POST per call, no retries
//! - **Local validation**: requests missing a key or image never hit the network
//! - **Test generation**: `require` to `import` rewriting with test renaming
//!
//! # Example
//!
//! ```no_run
//! use imgbb_uploadr::upload::{ImageSource, UploadOptions};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = UploadOptions {
//!         name: Some("waifu".into()),
//!         expiration: Some(600),
//!     };
//!     let image = ImageSource::Path(PathBuf::from("waifu.jpg"));
//!     let response = imgbb_uploadr::upload("api-key", image, Some(options)).await?;
//!     println!("{}", response.url);
//!     Ok(())
//! }
//! ```

pub mod codegen;
pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod telemetry;
pub mod upload;

// Re-export commonly used types
pub use codegen::{Codegen, CodegenReport};
pub use config::Config;
pub use upload::{
    ImageSource, ImageUploader, ImgbbClient, UploadError, UploadOptions, UploadRequest,
    UploadResponse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upload an image with a default [`ImgbbClient`]
pub async fn upload(
    api_key: &str,
    image: ImageSource,
    options: Option<UploadOptions>,
) -> Result<UploadResponse, UploadError> {
    let request = UploadRequest::new(api_key, image).with_options(options.unwrap_or_default());
    upload_request(request).await
}

/// Upload an options bundle with a default [`ImgbbClient`]
pub async fn upload_request(request: UploadRequest) -> Result<UploadResponse, UploadError> {
    // Reject before a client is built
    request.validate()?;
    let client = ImgbbClient::builder().build()?;
    client.upload_request(request).await
}
