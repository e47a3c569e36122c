//! Package metadata rendering from a template.
//!
//! Text templates get a literal substitution of `version = "<base>"`. JSON
//! templates get their top-level `version` rewritten when it equals the base
//! version. Either way nothing else in the template changes.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ManifestFormat, ManifestSpec};

/// `<base>+<hash>`, or `<base>` when no usable hash was given.
pub fn package_version(base: &str, hash: Option<&str>) -> String {
    match normalize_hash(hash) {
        Some(hash) => format!("{base}+{hash}"),
        None => base.to_string(),
    }
}

/// Empty hashes are treated as absent.
pub fn normalize_hash(hash: Option<&str>) -> Option<&str> {
    hash.filter(|h| !h.is_empty())
}

/// Replace every `version = "<base>"` with the hashed version.
///
/// Templates without the literal come back unchanged.
pub fn rewrite_text_version(content: &str, base: &str, hash: &str) -> String {
    let needle = format!("version = \"{base}\"");
    let replacement = format!("version = \"{base}+{hash}\"");
    content.replace(&needle, &replacement)
}

/// Set the top-level `version` of a JSON manifest when it matches `base`.
pub fn rewrite_json_version(manifest: &mut Value, base: &str, hash: &str) -> bool {
    let Some(version) = manifest.get_mut("version") else {
        return false;
    };
    if version.as_str() != Some(base) {
        return false;
    }
    *version = Value::String(format!("{base}+{hash}"));
    true
}

/// Render `spec.template` (relative to `root`) into `output_dir`.
///
/// Returns the written path, or `None` when the template is absent (or, for
/// JSON, unreadable).
pub fn write_manifest(
    spec: &ManifestSpec,
    root: &Path,
    output_dir: &Path,
    base_version: &str,
    hash: Option<&str>,
) -> Result<Option<PathBuf>> {
    let template = root.join(&spec.template);
    if !template.is_file() {
        tracing::debug!(template = %template.display(), "no manifest template; skipping");
        return Ok(None);
    }
    let target = output_dir.join(&spec.file_name);
    let hash = normalize_hash(hash);

    let rendered = match spec.format {
        ManifestFormat::Text => render_text(&template, base_version, hash)?,
        ManifestFormat::Json => match render_json(&template, base_version, hash) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!("could not generate {}: {err:#}", spec.file_name);
                return Ok(None);
            }
        },
    };

    println!(
        "Copying {} to {}...",
        spec.file_name,
        super::docs::display_name(output_dir)
    );
    fs::write(&target, rendered)
        .with_context(|| format!("writing manifest '{}'", target.display()))?;
    Ok(Some(target))
}

fn render_text(template: &Path, base: &str, hash: Option<&str>) -> Result<String> {
    let content = fs::read_to_string(template)
        .with_context(|| format!("reading manifest template '{}'", template.display()))?;
    Ok(match hash {
        Some(hash) => {
            println!("Set version to: {}", package_version(base, Some(hash)));
            rewrite_text_version(&content, base, hash)
        }
        None => content,
    })
}

fn render_json(template: &Path, base: &str, hash: Option<&str>) -> Result<String> {
    let content = fs::read_to_string(template)
        .with_context(|| format!("reading manifest template '{}'", template.display()))?;
    let mut manifest: Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing manifest template '{}'", template.display()))?;
    if let Some(hash) = hash {
        if rewrite_json_version(&mut manifest, base, hash) {
            println!("Set version to: {}", package_version(base, Some(hash)));
        }
    }
    let mut rendered = serde_json::to_string_pretty(&manifest)
        .with_context(|| format!("serializing manifest from '{}'", template.display()))?;
    rendered.push('\n');
    Ok(rendered)
}
