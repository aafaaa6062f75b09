use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

/// Generated file handed to the host template system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  /// File name relative to the build directory.
  pub file_name: String,
  /// Rendered file contents.
  pub contents: String,
}

/// Client plugin registered with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRegistration {
  /// Location of the rendered plugin.
  pub path: PathBuf,
  /// Whether the plugin also runs during server-side rendering.
  pub ssr: bool,
}

/// Host template and plugin registry.
pub trait TemplateRegistry {
  /// Register a generated file and return where the host placed it.
  fn add_template(&mut self, file: GeneratedFile) -> Result<PathBuf>;

  /// Register a generated file as an application plugin.
  fn add_plugin(&mut self, file: GeneratedFile, ssr: bool) -> Result<PathBuf>;

  /// Plugins registered so far.
  fn plugins(&self) -> &[PluginRegistration];
}

/// Registry writing templates straight into the build directory.
#[derive(Debug)]
pub struct FsTemplateRegistry {
  build_dir: PathBuf,
  plugins: Vec<PluginRegistration>,
}

impl FsTemplateRegistry {
  /// Create a registry rooted at `build_dir`.
  pub fn new(build_dir: impl Into<PathBuf>) -> Self {
    Self {
      build_dir: build_dir.into(),
      plugins: Vec::new(),
    }
  }
}

impl TemplateRegistry for FsTemplateRegistry {
  fn add_template(&mut self, file: GeneratedFile) -> Result<PathBuf> {
    let target = self.build_dir.join(&file.file_name);
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&target, &file.contents)
      .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), "wrote template");
    Ok(target)
  }

  fn add_plugin(&mut self, file: GeneratedFile, ssr: bool) -> Result<PathBuf> {
    let path = self.add_template(file)?;
    self.plugins.push(PluginRegistration {
      path: path.clone(),
      ssr,
    });
    Ok(path)
  }

  fn plugins(&self) -> &[PluginRegistration] {
    &self.plugins
  }
}
