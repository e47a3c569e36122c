//! Target profiles and the optional `proton-pack.toml` overrides.
//!
//! A profile says where the generated package lives, which generator to run,
//! and which optional assembly steps apply. Two profiles are built in
//! (`python` and `js`); a config file can override individual fields of
//! either but cannot invent new targets.
//!
//! ```toml
//! [targets.python]
//! output_dir = "python/dist"
//! base_version = "0.1.0"
//! license = ""          # empty disables the LICENSE copy
//! packager = ["python3.12", "-m", "build"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::PackError;

/// Config file looked up at the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILENAME: &str = "proton-pack.toml";

pub const DEFAULT_TARGET: &str = "python";

const BASE_VERSION: &str = "0.1.0";
const KNOWN_TARGETS: &[&str] = &["python", "js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Plain text with a literal `version = "<base>"` line.
    Text,
    /// JSON object with a top-level `version` key.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSpec {
    pub template: PathBuf,
    /// Name of the rendered file inside the output directory.
    pub file_name: String,
    pub format: ManifestFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerSpec {
    /// Program and leading args, e.g. `python3 -m build`.
    pub command: Vec<String>,
    pub probe_arg: String,
    pub build_arg: String,
    pub install_hint: String,
    /// Where the packager leaves archives, relative to the output directory.
    pub artifact_dir: String,
}

impl PackagerSpec {
    /// Name used in messages: the command line minus the interpreter path.
    pub fn tool_name(&self) -> String {
        match self.command.as_slice() {
            [_, flag, module, ..] if flag == "-m" => module.clone(),
            [program, ..] => program.clone(),
            [] => String::new(),
        }
    }
}

/// Everything the driver needs to know about one target.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub output_dir: PathBuf,
    pub generator: Vec<String>,
    pub generator_path_prepend: Option<PathBuf>,
    pub base_version: String,
    pub package_marker: Option<String>,
    pub manifest: Option<ManifestSpec>,
    pub readme: Option<PathBuf>,
    pub license: Option<PathBuf>,
    pub packager: Option<PackagerSpec>,
    /// Top-level proto package whose generated subpackages get listed.
    pub proto_namespace: Option<String>,
}

impl Profile {
    pub fn python() -> Self {
        Self {
            name: "python".to_string(),
            output_dir: PathBuf::from("python/dist"),
            generator: strings(&[
                "buf",
                "generate",
                "--template",
                "python/scripts/buf.gen.yaml",
                "--include-imports",
                "--path",
                "raystack",
                ".",
            ]),
            generator_path_prepend: None,
            base_version: BASE_VERSION.to_string(),
            package_marker: Some("__init__.py".to_string()),
            manifest: Some(ManifestSpec {
                template: PathBuf::from("python/scripts/pyproject.template.toml"),
                file_name: "pyproject.toml".to_string(),
                format: ManifestFormat::Text,
            }),
            readme: Some(PathBuf::from("python/README.md")),
            license: Some(PathBuf::from("LICENSE")),
            packager: Some(PackagerSpec {
                command: strings(&["python3", "-m", "build"]),
                probe_arg: "--version".to_string(),
                build_arg: "--wheel".to_string(),
                install_hint: "pip install build".to_string(),
                artifact_dir: "dist".to_string(),
            }),
            proto_namespace: Some("raystack".to_string()),
        }
    }

    pub fn js() -> Self {
        Self {
            name: "js".to_string(),
            output_dir: PathBuf::from("js/dist"),
            generator: strings(&["buf", "generate", "--template", "js/buf.gen.yaml", "."]),
            generator_path_prepend: Some(PathBuf::from("js/node_modules/.bin")),
            base_version: BASE_VERSION.to_string(),
            package_marker: None,
            manifest: Some(ManifestSpec {
                template: PathBuf::from("js/scripts/package.template.json"),
                file_name: "package.json".to_string(),
                format: ManifestFormat::Json,
            }),
            readme: None,
            license: None,
            packager: None,
            proto_namespace: Some("raystack".to_string()),
        }
    }

    /// Look up a built-in profile by target name.
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "python" => Ok(Self::python()),
            "js" => Ok(Self::js()),
            other => Err(PackError::UnknownTarget {
                name: other.to_string(),
                known: KNOWN_TARGETS.join(", "),
            }
            .into()),
        }
    }

    /// The built-in profile for `name` with overrides from `config` applied.
    pub fn resolve(name: &str, config: Option<&PackConfig>) -> Result<Self> {
        let mut profile = Self::builtin(name)?;
        if let Some(overrides) = config.and_then(|c| c.targets.get(name)) {
            overrides.apply(&mut profile)?;
        }
        if profile.generator.is_empty() {
            return Err(PackError::EmptyCommand("generator").into());
        }
        validate_output_dir(&profile.output_dir)?;
        Ok(profile)
    }
}

/// Reject output directories that are empty, absolute, or climb out of the
/// project root. `clean` deletes this path wholesale.
pub fn validate_output_dir(dir: &Path) -> Result<()> {
    let mut depth = 0usize;
    for component in dir.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackError::InvalidOutputDir(dir.to_path_buf()).into());
            }
        }
    }
    if depth == 0 {
        return Err(PackError::InvalidOutputDir(dir.to_path_buf()).into());
    }
    Ok(())
}

/// Parsed `proton-pack.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetOverrides {
    pub output_dir: Option<String>,
    pub generator: Option<Vec<String>>,
    pub base_version: Option<String>,
    pub template: Option<String>,
    pub readme: Option<String>,
    pub license: Option<String>,
    pub packager: Option<Vec<String>>,
    pub install_hint: Option<String>,
}

impl TargetOverrides {
    fn apply(&self, profile: &mut Profile) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            let dir = PathBuf::from(dir.trim());
            validate_output_dir(&dir)?;
            profile.output_dir = dir;
        }
        if let Some(generator) = &self.generator {
            profile.generator = generator.clone();
        }
        if let Some(version) = &self.base_version {
            profile.base_version = version.trim().to_string();
        }
        if let Some(template) = &self.template {
            match optional_path(template) {
                Some(path) => {
                    if let Some(manifest) = profile.manifest.as_mut() {
                        manifest.template = path;
                    }
                }
                None => profile.manifest = None,
            }
        }
        if let Some(readme) = &self.readme {
            profile.readme = optional_path(readme);
        }
        if let Some(license) = &self.license {
            profile.license = optional_path(license);
        }
        if let Some(command) = &self.packager {
            if command.is_empty() {
                return Err(PackError::EmptyCommand("packager").into());
            }
            if let Some(packager) = profile.packager.as_mut() {
                packager.command = command.clone();
            }
        }
        if let Some(hint) = &self.install_hint {
            if let Some(packager) = profile.packager.as_mut() {
                packager.install_hint = hint.clone();
            }
        }
        Ok(())
    }
}

/// Load the config file at `path`.
pub fn load_config(path: &Path) -> Result<PackConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    let config: PackConfig =
        toml::from_str(&text).with_context(|| format!("parsing config '{}'", path.display()))?;
    for name in config.targets.keys() {
        if !KNOWN_TARGETS.contains(&name.as_str()) {
            return Err(PackError::UnknownTarget {
                name: name.clone(),
                known: KNOWN_TARGETS.join(", "),
            })
            .with_context(|| format!("validating config '{}'", path.display()));
        }
    }
    Ok(config)
}

/// Load an explicit config, or the default file under `root` if it exists.
pub fn discover_config(root: &Path, explicit: Option<&Path>) -> Result<Option<PackConfig>> {
    if let Some(path) = explicit {
        return load_config(path).map(Some);
    }
    let default_path = root.join(DEFAULT_CONFIG_FILENAME);
    if default_path.is_file() {
        tracing::debug!(path = %default_path.display(), "using default config");
        return load_config(&default_path).map(Some);
    }
    Ok(None)
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> PackConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_builtin_python_profile() {
        let profile = Profile::builtin("python").unwrap();
        assert_eq!(profile.output_dir, PathBuf::from("python/dist"));
        assert_eq!(profile.package_marker.as_deref(), Some("__init__.py"));
        assert_eq!(profile.base_version, "0.1.0");
        assert_eq!(profile.license, Some(PathBuf::from("LICENSE")));
        assert_eq!(profile.generator[0], "buf");
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let err = Profile::builtin("go").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::UnknownTarget { name, .. }) if name == "go"
        ));
    }

    #[test]
    fn test_overrides_replace_only_named_fields() {
        let config = parse(
            r#"
            [targets.python]
            output_dir = "out/py"
            base_version = "1.2.3"
            "#,
        );
        let profile = Profile::resolve("python", Some(&config)).unwrap();
        assert_eq!(profile.output_dir, PathBuf::from("out/py"));
        assert_eq!(profile.base_version, "1.2.3");
        assert_eq!(profile.readme, Profile::python().readme);
        assert_eq!(profile.generator, Profile::python().generator);
    }

    #[test]
    fn test_empty_license_disables_copy() {
        let config = parse(
            r#"
            [targets.python]
            license = ""
            "#,
        );
        let profile = Profile::resolve("python", Some(&config)).unwrap();
        assert_eq!(profile.license, None);
    }

    #[test]
    fn test_empty_generator_is_rejected() {
        let config = parse(
            r#"
            [targets.js]
            generator = []
            "#,
        );
        let err = Profile::resolve("js", Some(&config)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::EmptyCommand("generator"))
        ));
    }

    #[test]
    fn test_unknown_keys_fail_to_parse() {
        let result: std::result::Result<PackConfig, _> = toml::from_str(
            r#"
            [targets.python]
            outdir = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_rejects_unknown_target_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "[targets.rust]\noutput_dir = \"x\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_discover_config_without_file() {
        let temp = TempDir::new().unwrap();
        assert!(discover_config(temp.path(), None).unwrap().is_none());
    }

    #[test]
    fn test_discover_config_default_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILENAME),
            "[targets.python]\npackager = [\"python3.12\", \"-m\", \"build\"]\n",
        )
        .unwrap();
        let config = discover_config(temp.path(), None).unwrap().unwrap();
        let profile = Profile::resolve("python", Some(&config)).unwrap();
        let packager = profile.packager.unwrap();
        assert_eq!(packager.command[0], "python3.12");
        assert_eq!(packager.tool_name(), "build");
    }

    #[test]
    fn test_output_dir_must_stay_below_root() {
        for bad in ["", "  ", ".", "./", "..", "../dist", "python/../..", "/", "/tmp/dist"] {
            let config = parse(&format!("[targets.python]\noutput_dir = \"{bad}\"\n"));
            let err = Profile::resolve("python", Some(&config)).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<PackError>(), Some(PackError::InvalidOutputDir(_))),
                "accepted output_dir {bad:?}"
            );
        }
    }

    #[test]
    fn test_output_dir_relative_paths_are_accepted() {
        assert!(validate_output_dir(Path::new("out/py/dist")).is_ok());
        assert!(validate_output_dir(Path::new("./python/dist")).is_ok());
        assert!(validate_output_dir(&Profile::js().output_dir).is_ok());
    }
}
