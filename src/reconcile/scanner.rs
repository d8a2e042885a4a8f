//! Directory scanning.

use std::path::{Path, PathBuf};

use crate::resource::is_decodable;

/// Files eligible for decoding across all configured directories.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Candidate files, sorted by path within each directory.
    pub files: Vec<PathBuf>,
    /// Directories that could not be listed.
    pub unreadable: Vec<PathBuf>,
}

/// List decodable files in each directory (non-recursive).
///
/// A directory that cannot be listed is logged and skipped; the remaining
/// directories are still scanned.
pub fn scan(directories: &[PathBuf]) -> ScanResult {
    let mut result = ScanResult::default();

    for dir in directories {
        match list_dir(dir) {
            Ok(mut files) => {
                files.sort();
                result.files.extend(files);
            }
            Err(e) => {
                tracing::warn!(directory = %dir.display(), error = %e, "Error listing directory");
                result.unreadable.push(dir.clone());
            }
        }
    }

    result
}

fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        // `is_file` follows symlinks, so mounted config maps are picked up.
        if is_decodable(&path) && path.is_file() {
            files.push(path);
        } else {
            tracing::trace!(path = %path.display(), "Skipping non-resource entry");
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.toml", "c.bin", ".hidden.json", "README.md", "noext"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let result = scan(&[dir.path().to_path_buf()]);
        let names: Vec<_> = result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.toml", "b.json", "c.bin"]);
        assert!(result.unreadable.is_empty());
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "").unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = scan(&[missing.clone(), dir.path().to_path_buf()]);
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.unreadable, vec![missing]);
    }
}
