//! Forward manifest injection to the external `workbox-cli` tool.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use super::{InjectManifestOptions, InjectOutcome, ManifestInjector};

/// File name of the configuration handed to the external tool.
pub const CLI_CONFIG_FILE: &str = "workbox-config.js";

/// Runs `workbox-cli injectManifest` with the picked options written to a config module.
#[derive(Debug, Clone)]
pub struct WorkboxCli {
  program: String,
  args: Vec<String>,
}

impl Default for WorkboxCli {
  fn default() -> Self {
    Self::new("npx", ["--no-install", "workbox-cli", "injectManifest"])
  }
}

impl WorkboxCli {
  /// Use a custom command; the config path is appended as the last argument.
  pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      program: program.into(),
      args: args.into_iter().map(Into::into).collect(),
    }
  }

  fn config_path(options: &InjectManifestOptions) -> PathBuf {
    options.sw_src.with_file_name(CLI_CONFIG_FILE)
  }
}

impl ManifestInjector for WorkboxCli {
  fn inject_manifest(&self, options: &InjectManifestOptions) -> Result<InjectOutcome> {
    let mut warnings = Vec::new();
    if !options.manifest_transforms.is_empty() {
      let message = format!(
        "{} manifest transform(s) cannot be forwarded to {} and were skipped",
        options.manifest_transforms.len(),
        self.program
      );
      warn!("{message}");
      warnings.push(message);
    }

    let config_path = Self::config_path(options);
    let config = serde_json::to_string_pretty(options)?;
    if let Some(parent) = config_path.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&config_path, format!("module.exports = {config};\n"))
      .with_context(|| format!("failed to write {}", config_path.display()))?;

    debug!(program = %self.program, config = %config_path.display(), "running external injector");
    let output = Command::new(&self.program)
      .args(&self.args)
      .arg(&config_path)
      .output()
      .with_context(|| format!("failed to run `{}`", self.program))?;

    if !output.status.success() {
      return Err(anyhow!(
        "`{}` failed with status {}: {}",
        self.program,
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
      ));
    }

    Ok(InjectOutcome {
      count: None,
      size: None,
      warnings,
    })
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  use crate::models::ManifestTransform;
  use tempfile::tempdir;

  fn options(root: &std::path::Path) -> InjectManifestOptions {
    InjectManifestOptions {
      sw_src: root.join(".build/sw.template.js"),
      sw_dest: root.join("static/sw.js"),
      glob_directory: root.join(".build/dist"),
      glob_follow: true,
      glob_ignores: Vec::new(),
      glob_patterns: vec!["**/*.{js,css}".into()],
      dont_cache_bust_urls_matching: None,
      glob_strict: true,
      templated_urls: BTreeMap::new(),
      maximum_file_size_to_cache_in_bytes: 2 * 1024 * 1024,
      modify_url_prefix: BTreeMap::from([(String::new(), "/_nuxt/".to_string())]),
      manifest_transforms: vec![ManifestTransform::new(|entries| entries)],
    }
  }

  #[test]
  fn forwards_options_as_config_module() {
    let dir = tempdir().unwrap();
    let options = options(dir.path());
    let cli = WorkboxCli::new("sh", [
      "-c",
      r#"cp "$0" "$(dirname "$0")/forwarded.js""#,
    ]);

    let outcome = cli.inject_manifest(&options).unwrap();
    assert_eq!(outcome.warnings.len(), 1);

    let forwarded = fs::read_to_string(dir.path().join(".build/forwarded.js")).unwrap();
    assert!(forwarded.starts_with("module.exports = {"));
    assert!(forwarded.contains("\"globPatterns\""));
    assert!(forwarded.contains("\"modifyUrlPrefix\""));
    assert!(!forwarded.contains("manifestTransforms"));
  }

  #[test]
  fn reports_failing_command() {
    let dir = tempdir().unwrap();
    let cli = WorkboxCli::new("sh", ["-c", "echo 'no injection point' >&2; exit 3"]);

    let err = cli.inject_manifest(&options(dir.path())).unwrap_err();
    assert!(err.to_string().contains("no injection point"));
  }
}
