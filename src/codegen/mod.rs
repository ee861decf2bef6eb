//! Test suite generator
//!
//! Rewrites the CommonJS test files of the tests directory into ES module
//! variants under `<tests_dir>/<output_dir>/`. Each file goes through
//! `discovered -> read -> rewritten -> written -> counted`; files run
//! concurrently up to `max_concurrency`.
//!
//! # Example
//!
//! ```no_run
//! use imgbb_uploadr::codegen::Codegen;
//! use imgbb_uploadr::config::CodegenConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codegen = Codegen::new(CodegenConfig::default())?;
//! let report = codegen.run().await?;
//! println!("Longest LOC: {}", report.longest_loc);
//! # Ok(())
//! # }
//! ```

use crate::config::CodegenConfig;
#[cfg(feature = "metrics")]
use crate::metrics;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod count;
pub mod discover;
pub mod ignore;
pub mod rewrite;

pub use count::count_lines;
pub use discover::{discover, DiscoverFilter};
pub use ignore::IgnoreList;
pub use rewrite::{LineKind, RewriteRules, RewriteStats, Rewriter};

/// Generator errors
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Jest config {}: {source}", path.display())]
    JestConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid rewrite pattern: {0}")]
    Pattern(String),
}

impl CodegenError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A rewritten test file as written to disk
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTestFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(skip)]
    pub content: String,
    /// Newline count of the written file
    pub line_count: usize,
    pub stats: RewriteStats,
}

/// Outcome of a generator run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodegenReport {
    /// Generated files, sorted by destination
    pub files: Vec<GeneratedTestFile>,
    /// Largest `line_count` among `files`; diagnostic only
    pub longest_loc: usize,
}

/// Test suite generator
pub struct Codegen {
    config: CodegenConfig,
    rewriter: Rewriter,
}

impl Codegen {
    pub fn new(config: CodegenConfig) -> Result<Self, CodegenError> {
        let rewriter = Rewriter::new(config.rules.clone())?;
        Ok(Self { config, rewriter })
    }

    /// Directory generated files are written to
    pub fn output_path(&self) -> PathBuf {
        self.config.tests_dir.join(&self.config.output_dir)
    }

    /// Merge the configured names with the Jest config patterns, if any
    pub async fn ignore_list(&self) -> Result<IgnoreList, CodegenError> {
        let mut ignore = IgnoreList::from_patterns(&self.config.ignore);
        if let Some(jest_config) = &self.config.jest_config {
            let from_jest = IgnoreList::load_jest_config(jest_config).await?;
            tracing::debug!(
                path = %jest_config.display(),
                count = from_jest.len(),
                "Loaded ignore patterns from Jest config"
            );
            ignore.extend(from_jest.names());
        }
        Ok(ignore)
    }

    /// Run the generator over the whole tests directory
    ///
    /// Every discovered file is processed even if another one fails; the
    /// first failure is then returned. Files written before the failure
    /// stay on disk.
    #[tracing::instrument(
        name = "codegen.run",
        skip(self),
        fields(tests_dir = %self.config.tests_dir.display())
    )]
    pub async fn run(&self) -> Result<CodegenReport, CodegenError> {
        let filter = DiscoverFilter {
            marker: self.config.marker.clone(),
            ignore: self.ignore_list().await?,
            output_dir: self.config.output_dir.clone(),
        };
        let sources = discover(&self.config.tests_dir, &filter).await?;

        let output = self.output_path();
        tokio::fs::create_dir_all(&output)
            .await
            .map_err(|source| CodegenError::io(&output, source))?;

        let results: Vec<Result<GeneratedTestFile, CodegenError>> = stream::iter(sources)
            .map(|source| self.process(source, &output))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut files = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        if let Some(e) = first_error {
            tracing::error!(error = %e, written = files.len(), "Test generation failed");
            return Err(e);
        }

        files.sort_by(|a, b| a.destination.cmp(&b.destination));
        let longest_loc = files.iter().map(|f| f.line_count).fold(0, usize::max);

        #[cfg(feature = "metrics")]
        metrics::record_codegen_longest_loc(longest_loc);

        tracing::info!(
            files = files.len(),
            longest_loc = longest_loc,
            "Done rewriting import tests"
        );

        Ok(CodegenReport { files, longest_loc })
    }

    /// Read, rewrite, write and count a single file
    #[tracing::instrument(
        name = "codegen.file",
        skip(self, source, output),
        fields(file = %source.display(), loc = tracing::field::Empty)
    )]
    async fn process(
        &self,
        source: PathBuf,
        output: &Path,
    ) -> Result<GeneratedTestFile, CodegenError> {
        let result = self.process_inner(source, output).await;

        #[cfg(feature = "metrics")]
        metrics::record_codegen_file(result.is_ok());

        match &result {
            Ok(file) => {
                tracing::Span::current().record("loc", file.line_count as u64);
                tracing::info!(
                    destination = %file.destination.display(),
                    loc = file.line_count,
                    "Generated test file"
                );
            }
            Err(e) => {
                #[cfg(feature = "metrics")]
                metrics::record_error("codegen");
                tracing::error!(error = %e, "Failed to generate test file");
            }
        }

        result
    }

    async fn process_inner(
        &self,
        source: PathBuf,
        output: &Path,
    ) -> Result<GeneratedTestFile, CodegenError> {
        let original = tokio::fs::read_to_string(&source)
            .await
            .map_err(|e| CodegenError::io(&source, e))?;

        let (content, stats) = self.rewriter.rewrite_source(&original);
        tracing::debug!(
            config_loads = stats.config_loads,
            binding_loads = stats.binding_loads,
            tagged_descriptions = stats.tagged_descriptions,
            "Rewrote test file"
        );

        let file_name = source.file_name().ok_or_else(|| {
            CodegenError::io(
                &source,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;
        let destination = output.join(file_name);

        tokio::fs::write(&destination, &content)
            .await
            .map_err(|e| CodegenError::io(&destination, e))?;

        let line_count = count_lines(&destination).await?;

        Ok(GeneratedTestFile {
            source,
            destination,
            content,
            line_count,
            stats,
        })
    }
}
