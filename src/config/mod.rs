//! Configuration module for imgbb-uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

use crate::codegen::RewriteRules;
use crate::upload::{MAX_EXPIRATION_SECS, MIN_EXPIRATION_SECS};

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("API_KEY", "abc");
/// assert_eq!(expand_env_vars("${API_KEY}"), "abc");
/// assert_eq!(expand_env_vars("${MISSING:-fallback}"), "fallback");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub uploader: UploaderConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Load configuration from a file, or fall back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.uploader.endpoint) {
            return Err(ConfigError::ValidationError(
                "Invalid uploader endpoint: must start with http:// or https://".into(),
            ));
        }

        if self.uploader.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Uploader timeout must be greater than zero".into(),
            ));
        }

        if let Some(expiration) = self.uploader.default_expiration {
            if !(MIN_EXPIRATION_SECS..=MAX_EXPIRATION_SECS).contains(&expiration) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid default expiration {}: must be between {} and {} seconds",
                    expiration, MIN_EXPIRATION_SECS, MAX_EXPIRATION_SECS
                )));
            }
        }

        let codegen = &self.codegen;
        if codegen.marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "Codegen marker cannot be empty".into(),
            ));
        }

        if codegen.output_dir.trim().is_empty() || codegen.output_dir.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "Invalid codegen output_dir '{}': must be a single directory name",
                codegen.output_dir
            )));
        }

        if codegen.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "Codegen max_concurrency must be greater than zero".into(),
            ));
        }

        if codegen.rules.from_variant.is_empty() || codegen.rules.description_tag.is_empty() {
            return Err(ConfigError::ValidationError(
                "Codegen rules need a non-empty from_variant and description_tag".into(),
            ));
        }

        Ok(())
    }
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Uploader configuration
///
/// ```yaml
/// uploader:
///   api_key: "${API_KEY}"
///   timeout_seconds: 30
///   default_expiration: 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// imgbb API key. Supports ${VAR} and ${VAR:-default} expansion.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upload endpoint. Default: "https://api.imgbb.com/1/upload"
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds. Default: 30
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Expiration applied when an upload does not specify one
    #[serde(default)]
    pub default_expiration: Option<u64>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            default_expiration: None,
        }
    }
}

fn default_endpoint() -> String {
    crate::upload::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Test suite generator configuration
///
/// ```yaml
/// codegen:
///   tests_dir: "./src/__tests__"
///   output_dir: "import"
///   jest_config: "./jestconfig.json"
///   ignore:
///     - "codegen.js"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Root directory scanned for test files. Default: "./src/__tests__"
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,

    /// Name of the output directory created under `tests_dir`. Default: "import"
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Filename fragment a test file must contain. Default: ".js"
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Basenames never rewritten
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Jest config whose `testPathIgnorePatterns` extend the ignore list
    #[serde(default)]
    pub jest_config: Option<PathBuf>,

    /// Maximum number of files processed at once. Default: 64
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub rules: RewriteRules,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            output_dir: default_output_dir(),
            marker: default_marker(),
            ignore: Vec::new(),
            jest_config: None,
            max_concurrency: default_max_concurrency(),
            rules: RewriteRules::default(),
        }
    }
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("./src/__tests__")
}

fn default_output_dir() -> String {
    "import".to_string()
}

fn default_marker() -> String {
    ".js".to_string()
}

fn default_max_concurrency() -> usize {
    64
}
