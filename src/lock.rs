//! Advisory lock serializing invocations on one output directory.
//!
//! Lock files live together under `<root>/.proton-pack/locks/`, one per
//! output directory, outside anything `clean` deletes.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Component, Path, PathBuf};

use crate::error::PackError;

const LOCKS_DIR: &str = ".proton-pack/locks";

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct OutputLock {
    file: File,
    path: PathBuf,
}

impl OutputLock {
    /// Take the lock for `output_dir` (relative to `root`), failing fast if
    /// another process has it.
    pub fn acquire(root: &Path, output_dir: &Path) -> Result<Self> {
        let dir = locks_dir(root);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating lock directory '{}'", dir.display()))?;
        let path = lock_path_for(root, output_dir);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("opening lock file '{}'", path.display()))?;

        if let Err(err) = file.try_lock_exclusive() {
            if err.kind() == fs2::lock_contended_error().kind() {
                return Err(PackError::Locked(path).into());
            }
            return Err(err).with_context(|| format!("locking '{}'", path.display()));
        }
        tracing::trace!(path = %path.display(), "acquired output lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub fn locks_dir(root: &Path) -> PathBuf {
    root.join(LOCKS_DIR)
}

/// `python/dist` -> `<root>/.proton-pack/locks/python-dist.lock`
pub fn lock_path_for(root: &Path, output_dir: &Path) -> PathBuf {
    let key = output_dir
        .components()
        .filter_map(|part| match part {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-");
    let key = if key.is_empty() { "output".to_string() } else { key };
    locks_dir(root).join(format!("{key}.lock"))
}
