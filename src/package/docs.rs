//! Copying optional documentation files (README, LICENSE) into the package.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Copy `source` into `output_dir` under its own file name.
///
/// A missing source is skipped silently and yields `None`.
pub fn copy_optional(source: &Path, output_dir: &Path) -> Result<Option<PathBuf>> {
    if !source.is_file() {
        tracing::debug!(source = %source.display(), "optional file absent; skipping");
        return Ok(None);
    }
    let Some(name) = source.file_name() else {
        return Ok(None);
    };
    let target = output_dir.join(name);
    println!(
        "Copying {} to {}...",
        name.to_string_lossy(),
        display_name(output_dir)
    );
    fs::copy(source, &target).with_context(|| {
        format!(
            "copying '{}' to '{}'",
            source.display(),
            target.display()
        )
    })?;
    Ok(Some(target))
}

/// Last component of a directory, for progress lines.
pub(crate) fn display_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
