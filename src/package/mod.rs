//! The packaging driver: `clean`, `build`, and `publish` for one target.
//!
//! Each operation is a straight sequence of filesystem steps and blocking
//! tool invocations. The first failing step ends the operation; optional
//! inputs (template, README, LICENSE) that are absent are skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use proton_pack::{Driver, Profile};
//!
//! let driver = Driver::new("/src/proton".into(), Profile::python());
//! driver.build(Some("3f2a9c1"))?;
//! driver.publish()?;
//! ```

pub mod docs;
pub mod manifest;
pub mod markers;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{validate_output_dir, Profile};
use crate::error::PackError;
use crate::lock::OutputLock;
use crate::preflight::probe_packager;
use crate::process::{Capture, Invocation, SystemRunner, ToolRunner};

/// What a successful `build` produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub markers_created: usize,
    pub manifest: Option<PathBuf>,
    pub version: String,
    pub copied: Vec<PathBuf>,
    /// Top-level generated packages under the proto namespace.
    pub packages: Vec<String>,
}

pub struct Driver<R: ToolRunner = SystemRunner> {
    root: PathBuf,
    profile: Profile,
    runner: R,
}

impl Driver<SystemRunner> {
    pub fn new(root: PathBuf, profile: Profile) -> Self {
        Self::with_runner(root, profile, SystemRunner)
    }
}

impl<R: ToolRunner> Driver<R> {
    pub fn with_runner(root: PathBuf, profile: Profile, runner: R) -> Self {
        Self {
            root,
            profile,
            runner,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.profile.output_dir)
    }

    /// Delete the output directory if present.
    pub fn clean(&self) -> Result<()> {
        let output_dir = self.checked_output_dir()?;
        if !output_dir.exists() {
            tracing::debug!(path = %output_dir.display(), "nothing to clean");
            return Ok(());
        }
        let _lock = OutputLock::acquire(&self.root, &self.profile.output_dir)?;
        remove_output_dir(&output_dir)
    }

    /// Regenerate the package from scratch.
    pub fn build(&self, version_hash: Option<&str>) -> Result<BuildReport> {
        let output_dir = self.checked_output_dir()?;
        let _lock = OutputLock::acquire(&self.root, &self.profile.output_dir)?;

        remove_output_dir(&output_dir)?;
        self.generate()?;

        let mut report = BuildReport {
            output_dir: output_dir.clone(),
            version: manifest::package_version(&self.profile.base_version, version_hash),
            ..BuildReport::default()
        };

        if output_dir.is_dir() {
            if let Some(marker) = &self.profile.package_marker {
                println!("Creating {marker} files...");
                report.markers_created = markers::ensure_package_markers(&output_dir, marker)?;
                tracing::info!(count = report.markers_created, "package markers created");
            }
        }

        if let Some(spec) = &self.profile.manifest {
            report.manifest = manifest::write_manifest(
                spec,
                &self.root,
                &output_dir,
                &self.profile.base_version,
                version_hash,
            )?;
        }

        for source in [&self.profile.readme, &self.profile.license]
            .into_iter()
            .flatten()
        {
            if let Some(copied) = docs::copy_optional(&self.root.join(source), &output_dir)? {
                report.copied.push(copied);
            }
        }

        if let Some(namespace) = &self.profile.proto_namespace {
            report.packages = generated_packages(&output_dir, namespace)?;
            if !report.packages.is_empty() {
                tracing::info!(packages = ?report.packages, "generated packages under {namespace}");
            }
        }

        println!("Build successful!");
        Ok(report)
    }

    /// Build a distributable archive from an existing output directory.
    ///
    /// Returns the directory the packager wrote its archives to.
    pub fn publish(&self) -> Result<PathBuf> {
        let output_dir = self.checked_output_dir()?;
        if !output_dir.is_dir() {
            return Err(PackError::OutputDirMissing(output_dir).into());
        }
        let packager = self
            .profile
            .packager
            .as_ref()
            .ok_or_else(|| PackError::NoPackager(self.profile.name.clone()))?;
        let _lock = OutputLock::acquire(&self.root, &self.profile.output_dir)?;

        let base = Invocation::from_command(
            packager.tool_name(),
            &packager.command,
            output_dir.clone(),
        );
        if let Err(err) = probe_packager(&self.runner, packager, base.clone()) {
            if let Some(PackError::PackagerUnavailable { tool, install_hint }) =
                err.downcast_ref::<PackError>()
            {
                println!("Error: '{tool}' package not installed. Install it with:");
                println!("  {install_hint}");
            }
            return Err(err);
        }

        println!("Building wheel...");
        let build = base.arg(packager.build_arg.clone());
        let outcome = self
            .runner
            .run(&build, Capture::Inherit)
            .with_context(|| format!("running '{build}' in '{}'", output_dir.display()))?;
        if !outcome.success() {
            eprintln!("Wheel build failed!");
            return Err(PackError::ToolFailed {
                tool: build.tool,
                outcome,
            }
            .into());
        }

        let artifacts = output_dir.join(&packager.artifact_dir);
        println!("Wheel built successfully!");
        println!("Output: {}/", artifacts.display());
        Ok(artifacts)
    }

    /// The output directory, refusing anything that is not strictly below
    /// the root. Profiles built in code skip config validation.
    fn checked_output_dir(&self) -> Result<PathBuf> {
        validate_output_dir(&self.profile.output_dir)?;
        Ok(self.output_dir())
    }

    fn generate(&self) -> Result<()> {
        let tool = self.profile.generator.first().cloned().unwrap_or_default();
        let mut invocation =
            Invocation::from_command(tool, &self.profile.generator, self.root.clone());
        if let Some(bin) = &self.profile.generator_path_prepend {
            invocation = invocation.prepend_path(self.root.join(bin));
        }

        println!("Running: {invocation}");
        let outcome = self
            .runner
            .run(&invocation, Capture::Inherit)
            .with_context(|| format!("running '{invocation}' in '{}'", self.root.display()))?;
        if !outcome.success() {
            eprintln!("Build failed!");
            return Err(PackError::ToolFailed {
                tool: invocation.tool,
                outcome,
            }
            .into());
        }
        Ok(())
    }
}

fn remove_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        println!("Cleaning {}", output_dir.display());
        fs::remove_dir_all(output_dir).with_context(|| {
            format!("removing output directory '{}'", output_dir.display())
        })?;
    }
    Ok(())
}

/// Sorted names of the directories directly under `<output_dir>/<namespace>`.
fn generated_packages(output_dir: &Path, namespace: &str) -> Result<Vec<String>> {
    let dir = output_dir.join(namespace);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut packages = Vec::new();
    for entry in fs::read_dir(&dir)
        .with_context(|| format!("reading generated namespace '{}'", dir.display()))?
    {
        let entry =
            entry.with_context(|| format!("reading entry under '{}'", dir.display()))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            packages.push(name.to_string());
        }
    }
    packages.sort();
    Ok(packages)
}
