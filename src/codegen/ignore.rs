//! Files excluded from generation

use super::CodegenError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Set of file basenames the generator never rewrites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    names: HashSet<String>,
}

/// The part of a Jest config we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JestConfig {
    #[serde(default)]
    test_path_ignore_patterns: Vec<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from paths or patterns; only the last path segment is kept
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        list.extend(patterns);
        list
    }

    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            if let Some(name) = basename(pattern.as_ref()) {
                self.names.insert(name.to_string());
            }
        }
    }

    /// Read `testPathIgnorePatterns` from a Jest config file
    pub async fn load_jest_config(path: &Path) -> Result<Self, CodegenError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CodegenError::io(path, source))?;
        Self::parse_jest_config(&content).map_err(|source| CodegenError::JestConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse_jest_config(content: &str) -> Result<Self, serde_json::Error> {
        let config: JestConfig = serde_json::from_str(content)?;
        Ok(Self::from_patterns(config.test_path_ignore_patterns))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn basename(pattern: &str) -> Option<&str> {
    pattern.rsplit('/').next().filter(|name| !name.is_empty())
}
