//! Line rewriting from CommonJS `require` to ES module `import`
//!
//! Each line is classified into one of a small closed set of shapes:
//!
//! | Shape | Example input | Output |
//! |-------|---------------|--------|
//! | Config load | `require("dotenv").config();` | `import "dotenv/config";` |
//! | Binding load | `const { csv } = require("./foo-cjs");` | `import { csv } from "./foo-esm";` |
//! | Other | `test("uploads", ...)` | `test("ESM: uploads", ...)` |
//!
//! Tagging of test descriptions is idempotent. The binding transform is
//! not, but its output no longer has the binding shape, so a second pass
//! leaves it untouched.

use super::CodegenError;
use serde::{Deserialize, Serialize};

/// Constants driving the rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteRules {
    /// Substring replaced in module paths. Default: "cjs"
    pub from_variant: String,
    /// Replacement for `from_variant`. Default: "esm"
    pub to_variant: String,
    /// Call whose first string argument is the test description. Default: "test"
    pub test_marker: String,
    /// Prefix added to test descriptions. Default: "ESM: "
    pub description_tag: String,
    /// Line emitted for a side-effecting config load
    pub config_load_replacement: String,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            from_variant: "cjs".to_string(),
            to_variant: "esm".to_string(),
            test_marker: "test".to_string(),
            description_tag: "ESM: ".to_string(),
            config_load_replacement: r#"import "dotenv/config";"#.to_string(),
        }
    }
}

/// Shape of a source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    ConfigLoad,
    BindingLoad,
    Other,
}

/// Per-file rewrite counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub config_loads: usize,
    pub binding_loads: usize,
    pub tagged_descriptions: usize,
}

/// Compiled rewriter
#[derive(Debug, Clone)]
pub struct Rewriter {
    rules: RewriteRules,
    config_load: regex_lite::Regex,
    binding_load: regex_lite::Regex,
    test_call: regex_lite::Regex,
}

impl Rewriter {
    pub fn new(rules: RewriteRules) -> Result<Self, CodegenError> {
        let config_load = compile(
            r#"^\s*require\s*\(\s*["'][^"']+["']\s*\)\s*\.\s*config\s*\(\s*\)[ \t]*;?[ \t]*(\r?)$"#,
        )?;
        let binding_load = compile(
            r#"^(\s*)(?:const|let|var)\s+([^;]+?)\s*=\s*require\s*\(\s*(["'][^"']*["'])\s*\)[ \t]*;?[ \t]*(\r?)$"#,
        )?;
        let test_call = compile(&format!(
            r#"\b{}\(""#,
            regex_lite::escape(&rules.test_marker)
        ))?;

        Ok(Self {
            rules,
            config_load,
            binding_load,
            test_call,
        })
    }

    pub fn rules(&self) -> &RewriteRules {
        &self.rules
    }

    pub fn classify(&self, line: &str) -> LineKind {
        if self.config_load.is_match(line) {
            LineKind::ConfigLoad
        } else if self.binding_load.is_match(line) {
            LineKind::BindingLoad
        } else {
            LineKind::Other
        }
    }

    /// Rewrite a single line (without its trailing newline)
    pub fn rewrite_line(&self, line: &str) -> String {
        self.rewrite_line_counted(line, &mut RewriteStats::default())
    }

    /// Rewrite a whole file, preserving line structure
    pub fn rewrite_source(&self, source: &str) -> (String, RewriteStats) {
        let mut stats = RewriteStats::default();
        let rewritten = source
            .split('\n')
            .map(|line| self.rewrite_line_counted(line, &mut stats))
            .collect::<Vec<_>>()
            .join("\n");
        (rewritten, stats)
    }

    fn rewrite_line_counted(&self, line: &str, stats: &mut RewriteStats) -> String {
        match self.classify(line) {
            LineKind::ConfigLoad => {
                stats.config_loads += 1;
                // Keep a CRLF line ending
                let cr = self
                    .config_load
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .map_or("", |m| m.as_str());
                format!("{}{}", self.rules.config_load_replacement, cr)
            }
            LineKind::BindingLoad => match self.rewrite_binding(line) {
                Some(rewritten) => {
                    stats.binding_loads += 1;
                    rewritten
                }
                None => line.to_string(),
            },
            LineKind::Other => {
                let (tagged, count) = self.tag_descriptions(line);
                stats.tagged_descriptions += count;
                tagged
            }
        }
    }

    fn rewrite_binding(&self, line: &str) -> Option<String> {
        let caps = self.binding_load.captures(line)?;
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let bindings = caps.get(2)?.as_str();
        let path = caps
            .get(3)?
            .as_str()
            .replacen(&self.rules.from_variant, &self.rules.to_variant, 1);
        let cr = caps.get(4).map_or("", |m| m.as_str());
        Some(format!("{}import {} from {};{}", indent, bindings, path, cr))
    }

    /// Insert the description tag after every `marker("` not already tagged
    fn tag_descriptions(&self, line: &str) -> (String, usize) {
        let tag = &self.rules.description_tag;
        let mut result = String::with_capacity(line.len() + tag.len());
        let mut last = 0;
        let mut count = 0;

        for m in self.test_call.find_iter(line) {
            let rest = &line[m.end()..];
            let starts_with_word = rest
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if !starts_with_word || rest.starts_with(tag.as_str()) {
                continue;
            }
            result.push_str(&line[last..m.end()]);
            result.push_str(tag);
            last = m.end();
            count += 1;
        }

        result.push_str(&line[last..]);
        (result, count)
    }
}

fn compile(pattern: &str) -> Result<regex_lite::Regex, CodegenError> {
    regex_lite::Regex::new(pattern).map_err(|e| CodegenError::Pattern(e.to_string()))
}
