//! Fatal conditions callers may want to tell apart.
//!
//! Everything else flows through `anyhow` with path context attached. These
//! variants are raised through `anyhow` too, so match on them with
//! `err.downcast_ref::<PackError>()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ToolOutcome;

#[derive(Debug, Error)]
pub enum PackError {
    /// An external tool ran and exited unsuccessfully.
    #[error("{tool} failed with {}", .outcome.describe_status())]
    ToolFailed { tool: String, outcome: ToolOutcome },

    /// `publish` was called before `build` produced anything.
    #[error("output directory '{}' not found; run 'build' first", .0.display())]
    OutputDirMissing(PathBuf),

    /// The packaging tool could not be probed.
    #[error("'{tool}' package not installed")]
    PackagerUnavailable { tool: String, install_hint: String },

    /// The selected target has no packaging step.
    #[error("target '{0}' has no packaging tool configured")]
    NoPackager(String),

    /// Another invocation is working on the same output directory.
    #[error("output directory is locked by another invocation (lock file '{}')", .0.display())]
    Locked(PathBuf),

    #[error("unknown target '{name}'; expected one of: {known}")]
    UnknownTarget { name: String, known: String },

    /// `output_dir` would resolve to the project root or outside it.
    #[error("output_dir '{}' must be a relative path below the project root", .0.display())]
    InvalidOutputDir(PathBuf),

    /// A command array in the configuration has no program.
    #[error("'{0}' must name a program")]
    EmptyCommand(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message_leaves_hint_to_caller() {
        let err = PackError::PackagerUnavailable {
            tool: "build".to_string(),
            install_hint: "pip install build".to_string(),
        };
        assert_eq!(err.to_string(), "'build' package not installed");
    }

    #[test]
    fn test_invalid_output_dir_names_the_path() {
        let err = PackError::InvalidOutputDir(PathBuf::from(".."));
        assert!(err.to_string().starts_with("output_dir '..' must be"));
    }
}
