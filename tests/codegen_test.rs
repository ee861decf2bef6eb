//! Test Generator Integration Tests
//!
//! Runs the full discover/rewrite/write/count pipeline on temporary trees.

use imgbb_uploadr::codegen::{Codegen, CodegenError};
use imgbb_uploadr::config::CodegenConfig;
use std::path::Path;
use tempfile::TempDir;

const REQUIRE_FIXTURE: &str = include_str!("fixtures/imgbbUploaderRequire.test.js");
const IMPORT_FIXTURE: &str = include_str!("fixtures/imgbbUploaderImport.test.js");

/// Helper to build a generator over `root`
fn create_codegen(root: &Path, ignore: &[&str]) -> Codegen {
    let config = CodegenConfig {
        tests_dir: root.to_path_buf(),
        ignore: ignore.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    Codegen::new(config).unwrap()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn tests_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "imgbbUploaderRequire.test.js", REQUIRE_FIXTURE);
    write(dir.path(), "codegen.js", "const { writeFile } = require(\"fs/promises\");\n");
    write(dir.path(), "images/imagePath.js", "module.exports = __dirname;\n");
    dir
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_import_variant() {
        let dir = tests_tree();
        let codegen = create_codegen(dir.path(), &["codegen.js", "imagePath.js"]);

        let report = codegen.run().await.unwrap();

        assert_eq!(report.files.len(), 1);
        let generated =
            std::fs::read_to_string(dir.path().join("import/imgbbUploaderRequire.test.js"))
                .unwrap();
        assert_eq!(generated, IMPORT_FIXTURE);
        assert_eq!(report.files[0].content, IMPORT_FIXTURE);
        assert_eq!(report.files[0].stats.config_loads, 1);
        assert_eq!(report.files[0].stats.binding_loads, 4);
        assert_eq!(report.files[0].stats.tagged_descriptions, 2);
    }

    #[tokio::test]
    async fn test_ignored_files_not_generated() {
        let dir = tests_tree();
        let codegen = create_codegen(dir.path(), &["codegen.js", "imagePath.js"]);

        codegen.run().await.unwrap();

        assert!(!dir.path().join("import/codegen.js").exists());
        assert!(!dir.path().join("import/imagePath.js").exists());
    }

    #[tokio::test]
    async fn test_jest_config_extends_ignore_list() {
        let dir = tests_tree();
        let jest_config = dir.path().join("jestconfig.json");
        std::fs::write(
            &jest_config,
            r#"{"testPathIgnorePatterns": ["<rootDir>/src/__tests__/codegen.js", "<rootDir>/src/__tests__/images/imagePath.js"]}"#,
        )
        .unwrap();

        let config = CodegenConfig {
            tests_dir: dir.path().to_path_buf(),
            jest_config: Some(jest_config),
            // jestconfig.json itself contains ".js"
            ignore: vec!["jestconfig.json".into()],
            ..Default::default()
        };
        let report = Codegen::new(config).unwrap().run().await.unwrap();

        let names: Vec<String> = report
            .files
            .iter()
            .map(|f| f.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["imgbbUploaderRequire.test.js".to_string()]);
    }

    #[tokio::test]
    async fn test_longest_loc_is_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let counts = [3usize, 17, 1, 9, 17, 0];
        for (i, lines) in counts.iter().enumerate() {
            write(dir.path(), &format!("f{}.test.js", i), &"x;\n".repeat(*lines));
        }

        let config = CodegenConfig {
            tests_dir: dir.path().to_path_buf(),
            max_concurrency: 2,
            ..Default::default()
        };
        let report = Codegen::new(config).unwrap().run().await.unwrap();

        assert_eq!(report.files.len(), counts.len());
        assert_eq!(report.longest_loc, 17);
        for file in &report.files {
            let on_disk = std::fs::read_to_string(&file.destination).unwrap();
            assert_eq!(file.line_count, on_disk.matches('\n').count());
        }
    }

    #[tokio::test]
    async fn test_rerun_overwrites_and_skips_output_dir() {
        let dir = tests_tree();
        let codegen = create_codegen(dir.path(), &["codegen.js", "imagePath.js"]);
        let destination = dir.path().join("import/imgbbUploaderRequire.test.js");

        codegen.run().await.unwrap();
        std::fs::write(&destination, "stale").unwrap();
        let report = codegen.run().await.unwrap();

        assert_eq!(report.files.len(), 1, "generated files are not rediscovered");
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), IMPORT_FIXTURE);
    }

    #[tokio::test]
    async fn test_nested_files_flattened_into_output() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "nested/deep/upload.test.js", "test(\"nested\", () => {});\n");

        let report = create_codegen(dir.path(), &[]).run().await.unwrap();

        let destination = dir.path().join("import/upload.test.js");
        assert_eq!(report.files[0].destination, destination);
        assert_eq!(
            std::fs::read_to_string(destination).unwrap(),
            "test(\"ESM: nested\", () => {});\n"
        );
    }

    #[tokio::test]
    async fn test_failure_fails_run_but_keeps_other_output() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.test.js", "test(\"ok\", () => {});\n");
        // Invalid UTF-8 cannot be read as text
        std::fs::write(dir.path().join("bad.test.js"), [0xFF, 0xFE, 0x00, 0xC3]).unwrap();

        let result = create_codegen(dir.path(), &[]).run().await;

        match result {
            Err(CodegenError::Io { path, .. }) => assert!(path.ends_with("bad.test.js")),
            other => panic!("Expected IO error, got {:?}", other.map(|r| r.longest_loc)),
        }
        assert!(dir.path().join("import/good.test.js").exists());
    }

    #[tokio::test]
    async fn test_missing_tests_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_codegen(&dir.path().join("absent"), &[]).run().await;
        assert!(matches!(result, Err(CodegenError::Io { .. })));
    }

    #[tokio::test]
    async fn test_empty_tree_reports_zero() {
        let dir = tempfile::tempdir().unwrap();
        let report = create_codegen(dir.path(), &[]).run().await.unwrap();
        assert!(report.files.is_empty());
        assert_eq!(report.longest_loc, 0);
    }
}
