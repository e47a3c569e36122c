//! Preflight checks for the packaging tool.
//!
//! `publish` checks that the packager is installed before asking it to build
//! anything, so a missing tool produces installation instructions instead of
//! a half-built archive.
//!
//! # Example
//!
//! ```rust
//! use proton_pack::preflight::command_exists;
//!
//! if !command_exists("buf") {
//!     println!("buf is not installed");
//! }
//! ```

use anyhow::Result;

use crate::config::PackagerSpec;
use crate::error::PackError;
use crate::process::{Capture, Invocation, ToolRunner};

/// Check if a command exists on the host system.
///
/// Absolute and relative paths are checked directly; bare names are searched
/// in `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Probe the packaging tool with its version flag.
///
/// Fails with [`PackError::PackagerUnavailable`] when the runner cannot
/// locate the program, cannot start it, or it exits non-zero.
pub fn probe_packager(
    runner: &dyn ToolRunner,
    packager: &PackagerSpec,
    invocation: Invocation,
) -> Result<()> {
    let unavailable = || PackError::PackagerUnavailable {
        tool: packager.tool_name(),
        install_hint: packager.install_hint.clone(),
    };

    if !runner.locate(&invocation.program) {
        tracing::debug!(program = %invocation.program, "packager program not found");
        return Err(unavailable().into());
    }

    let probe = invocation.arg(packager.probe_arg.clone());
    match runner.run(&probe, Capture::Collect) {
        Ok(outcome) if outcome.success() => {
            tracing::info!(version = %outcome.stdout.trim(), "packager available");
            Ok(())
        }
        Ok(outcome) => {
            tracing::debug!(
                status = %outcome.describe_status(),
                stderr = %outcome.stderr.trim(),
                "packager probe failed"
            );
            Err(unavailable().into())
        }
        Err(err) => {
            tracing::debug!("packager probe could not start: {err:#}");
            Err(unavailable().into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SystemRunner;
    use std::path::PathBuf;

    fn packager_spec(command: &[&str]) -> PackagerSpec {
        PackagerSpec {
            command: command.iter().map(|s| s.to_string()).collect(),
            probe_arg: "--version".to_string(),
            build_arg: "--wheel".to_string(),
            install_hint: "pip install build".to_string(),
            artifact_dir: "dist".to_string(),
        }
    }

    fn invocation(spec: &PackagerSpec) -> Invocation {
        Invocation::from_command(spec.tool_name(), &spec.command, PathBuf::from("."))
    }

    #[test]
    fn test_command_exists() {
        // 'ls' should exist on any Unix system
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_probe_missing_program() {
        let spec = packager_spec(&["definitely_not_a_real_command_12345", "-m", "build"]);
        let err = probe_packager(&SystemRunner, &spec, invocation(&spec)).unwrap_err();
        match err.downcast_ref::<PackError>() {
            Some(PackError::PackagerUnavailable { tool, install_hint }) => {
                assert_eq!(tool, "build");
                assert_eq!(install_hint, "pip install build");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_probe_failing_program() {
        let spec = packager_spec(&["sh", "-c", "exit 1"]);
        let err = probe_packager(&SystemRunner, &spec, invocation(&spec)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::PackagerUnavailable { .. })
        ));
    }

    #[test]
    fn test_probe_succeeding_program() {
        let spec = packager_spec(&["sh", "-c", "exit 0"]);
        assert!(probe_packager(&SystemRunner, &spec, invocation(&spec)).is_ok());
    }
}
