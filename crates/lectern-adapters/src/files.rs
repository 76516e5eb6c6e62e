//! Source file collection for pattern-based adapters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::traits::AdapterError;

/// Expand patterns into the matching source files.
///
/// Relative patterns are resolved against `base_dir`. A pattern naming a
/// directory collects every file below it with one of `extensions`; glob
/// matches are taken as-is. Test and spec files are skipped. The result is
/// sorted and free of duplicates.
pub fn collect_sources(
    base_dir: &Path,
    patterns: &[String],
    extensions: &[&str],
) -> Result<Vec<PathBuf>, AdapterError> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            base_dir.join(pattern)
        };

        if full.is_dir() {
            for entry in WalkDir::new(&full)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && has_extension(path, extensions) && !is_test_file(path) {
                    files.insert(path.to_path_buf());
                }
            }
            continue;
        }

        let matches = glob::glob(&full.to_string_lossy()).map_err(|e| AdapterError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut matched = 0;
        for entry in matches {
            let path = entry.map_err(|e| AdapterError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if path.is_file() && !is_test_file(&path) {
                files.insert(path);
                matched += 1;
            }
        }

        if matched == 0 {
            tracing::debug!("Pattern '{}' matched no files", pattern);
        }
    }

    Ok(files.into_iter().collect())
}

/// [`collect_sources`] on the blocking thread pool.
pub async fn find_sources(
    base_dir: &Path,
    patterns: Vec<String>,
    extensions: &'static [&'static str],
) -> Result<Vec<PathBuf>, AdapterError> {
    let base_dir = base_dir.to_path_buf();
    tokio::task::spawn_blocking(move || collect_sources(&base_dir, &patterns, extensions))
        .await
        .map_err(|e| AdapterError::Scan(e.to_string()))?
}

/// Path relative to `base_dir` for display in doclets.
pub fn display_path(path: &Path, base_dir: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn is_test_file(path: &Path) -> bool {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    filename.contains(".test.") || filename.contains(".spec.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn expands_globs_relative_to_base() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.scss"), "").unwrap();
        fs::write(temp.path().join("b.scss"), "").unwrap();
        fs::write(temp.path().join("c.js"), "").unwrap();

        let files = collect_sources(temp.path(), &["*.scss".to_string()], &["scss"]).unwrap();

        assert_eq!(
            files,
            vec![temp.path().join("a.scss"), temp.path().join("b.scss")]
        );
    }

    #[test]
    fn walks_directories_by_extension() {
        let temp = tempdir().unwrap();
        let lib = temp.path().join("lib/nested");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("util.js"), "").unwrap();
        fs::write(lib.join("util.test.js"), "").unwrap();
        fs::write(lib.join("notes.txt"), "").unwrap();

        let files = collect_sources(temp.path(), &["lib".to_string()], &["js"]).unwrap();

        assert_eq!(files, vec![lib.join("util.js")]);
    }

    #[test]
    fn deduplicates_overlapping_patterns() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.scss"), "").unwrap();

        let patterns = vec!["*.scss".to_string(), "a.scss".to_string()];
        let files = collect_sources(temp.path(), &patterns, &["scss"]).unwrap();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn rejects_malformed_patterns() {
        let temp = tempdir().unwrap();

        let result = collect_sources(temp.path(), &["[".to_string()], &["scss"]);

        assert!(matches!(result, Err(AdapterError::Pattern { .. })));
    }

    #[tokio::test]
    async fn finds_sources_off_the_runtime() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.scss"), "").unwrap();

        let files = find_sources(temp.path(), vec!["*.scss".to_string()], &["scss"])
            .await
            .unwrap();

        assert_eq!(files, vec![temp.path().join("a.scss")]);
    }

    #[test]
    fn displays_relative_paths() {
        assert_eq!(
            display_path(Path::new("/src/scss/_button.scss"), Path::new("/src")),
            "scss/_button.scss"
        );
    }
}
