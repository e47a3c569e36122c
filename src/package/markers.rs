//! Package marker creation (`__init__.py` in every generated directory).

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use walkdir::WalkDir;

/// Create an empty `marker` in `root` and every directory beneath it.
///
/// Directories that already have one are left alone. Symlinked directories
/// are not followed. Returns how many markers were created.
pub fn ensure_package_markers(root: &Path, marker: &str) -> Result<usize> {
    let mut created = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry =
            entry.with_context(|| format!("walking generated tree '{}'", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path().join(marker);
        if fs::symlink_metadata(&path).is_ok() {
            continue;
        }
        File::create(&path)
            .with_context(|| format!("creating package marker '{}'", path.display()))?;
        tracing::trace!(path = %path.display(), "created package marker");
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dirs_without_marker(root: &Path) -> Vec<std::path::PathBuf> {
        WalkDir::new(root)
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| !e.path().join("__init__.py").is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    #[test]
    fn test_markers_in_every_directory_including_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("dist");
        fs::create_dir_all(root.join("raystack/compass/v1beta1")).unwrap();
        fs::create_dir_all(root.join("raystack/frontier/v1beta1")).unwrap();
        fs::write(root.join("raystack/compass/v1beta1/service_pb2.py"), "x = 1\n").unwrap();

        let created = ensure_package_markers(&root, "__init__.py").unwrap();

        assert_eq!(created, 6);
        assert!(dirs_without_marker(&root).is_empty());
        assert!(root.join("__init__.py").is_file());
    }

    #[test]
    fn test_existing_markers_are_kept() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("dist");
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "from .x import *\n").unwrap();

        let created = ensure_package_markers(&root, "__init__.py").unwrap();

        assert_eq!(created, 1);
        assert_eq!(
            fs::read_to_string(root.join("pkg/__init__.py")).unwrap(),
            "from .x import *\n"
        );
    }

    #[test]
    fn test_second_pass_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("dist");
        fs::create_dir_all(root.join("a/b")).unwrap();

        assert_eq!(ensure_package_markers(&root, "__init__.py").unwrap(), 3);
        assert_eq!(ensure_package_markers(&root, "__init__.py").unwrap(), 0);
        assert!(dirs_without_marker(&root).is_empty());
    }

    #[test]
    fn test_new_marker_is_empty() {
        let temp = TempDir::new().unwrap();
        ensure_package_markers(temp.path(), "__init__.py").unwrap();
        assert_eq!(fs::metadata(temp.path().join("__init__.py")).unwrap().len(), 0);
    }
}
