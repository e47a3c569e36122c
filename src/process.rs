//! External tool invocation.
//!
//! The driver never calls `std::process::Command` directly. It describes what
//! to run as an [`Invocation`] and hands it to a [`ToolRunner`], which lets
//! tests substitute a recording fake for `buf` and `python -m build`.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// How the child's stdio is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Child writes straight to our stdout/stderr.
    Inherit,
    /// Stdout and stderr are collected into the [`ToolOutcome`].
    Collect,
}

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Short name used in messages (`buf`, `python -m build`).
    pub tool: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Directories prepended to the child's `PATH`.
    pub path_prepend: Vec<PathBuf>,
}

impl Invocation {
    /// Build an invocation from a command array: program first, then args.
    pub fn from_command(tool: impl Into<String>, command: &[String], cwd: PathBuf) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self {
            tool: tool.into(),
            program,
            args,
            cwd,
            path_prepend: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn prepend_path(mut self, dir: PathBuf) -> Self {
        self.path_prepend.push(dir);
        self
    }

    fn child_path(&self) -> Result<Option<OsString>> {
        if self.path_prepend.is_empty() {
            return Ok(None);
        }
        let current = std::env::var_os("PATH").unwrap_or_default();
        let dirs = self
            .path_prepend
            .iter()
            .cloned()
            .chain(std::env::split_paths(&current));
        let joined = std::env::join_paths(dirs)
            .with_context(|| format!("building PATH for '{}'", self.tool))?;
        Ok(Some(joined))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Exit code; `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs external tools to completion.
pub trait ToolRunner {
    /// Run `invocation`, blocking until it exits.
    ///
    /// An `Err` means the process could not be started at all; a process that
    /// ran and failed comes back as `Ok` with a non-success outcome.
    fn run(&self, invocation: &Invocation, capture: Capture) -> Result<ToolOutcome>;

    /// Whether `program` can be found before trying to run it.
    fn locate(&self, program: &str) -> bool;
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, capture: Capture) -> Result<ToolOutcome> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.cwd);
        if let Some(path) = invocation.child_path()? {
            cmd.env("PATH", path);
        }
        tracing::debug!(cwd = %invocation.cwd.display(), "spawning {invocation}");

        match capture {
            Capture::Inherit => {
                let status = cmd.status().with_context(|| {
                    format!(
                        "running {} in '{}'",
                        invocation.tool,
                        invocation.cwd.display()
                    )
                })?;
                Ok(ToolOutcome {
                    code: status.code(),
                    ..ToolOutcome::default()
                })
            }
            Capture::Collect => {
                let output = cmd
                    .stdin(Stdio::null())
                    .output()
                    .with_context(|| format!("running {}", invocation.tool))?;
                Ok(ToolOutcome {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }

    fn locate(&self, program: &str) -> bool {
        crate::preflight::command_exists(program)
    }
}
