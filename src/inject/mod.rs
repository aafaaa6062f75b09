//! Manifest injection: select the injector options and run the injector once the build is done.

mod cli;
mod globs;
mod native;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

pub use cli::WorkboxCli;
pub use native::PrecacheInjector;

use crate::host::BuildHost;
use crate::models::{ManifestTransform, TemplatedUrl};
use crate::options::ResolvedOptions;
use crate::project::HostProject;

/// Subset of the resolved options understood by a manifest injector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectManifestOptions {
  /// Template containing the injection point.
  pub sw_src: PathBuf,
  /// Destination of the injected service worker.
  pub sw_dest: PathBuf,
  /// Directory the glob patterns are evaluated in.
  pub glob_directory: PathBuf,
  /// Follow symlinks while globbing.
  pub glob_follow: bool,
  /// Patterns excluded from the manifest.
  pub glob_ignores: Vec<String>,
  /// Patterns selecting manifest entries.
  pub glob_patterns: Vec<String>,
  /// Regular expression for URLs that need no revision.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dont_cache_bust_urls_matching: Option<String>,
  /// Fail on unreadable entries.
  pub glob_strict: bool,
  /// Extra URLs with computed revisions.
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub templated_urls: BTreeMap<String, TemplatedUrl>,
  /// Largest file, in bytes, included in the manifest.
  pub maximum_file_size_to_cache_in_bytes: u64,
  /// URL prefix rewrites.
  pub modify_url_prefix: BTreeMap<String, String>,
  /// Callbacks rewriting the manifest.
  #[serde(skip)]
  pub manifest_transforms: Vec<ManifestTransform>,
}

impl InjectManifestOptions {
  /// Pick the injector options out of the resolved option set.
  ///
  /// Without an explicit glob directory the project's client build directory is used, so this
  /// should run once the bundle has been written.
  pub fn pick(options: &ResolvedOptions, project: &HostProject) -> Self {
    Self {
      sw_src: options.sw_src.clone(),
      sw_dest: options.sw_dest.clone(),
      glob_directory: options
        .glob_directory
        .clone()
        .unwrap_or_else(|| project.client_build_dir()),
      glob_follow: options.glob_follow,
      glob_ignores: options.glob_ignores.clone(),
      glob_patterns: options.glob_patterns.clone(),
      dont_cache_bust_urls_matching: options.dont_cache_bust_urls_matching.clone(),
      glob_strict: options.glob_strict,
      templated_urls: options.templated_urls.clone(),
      maximum_file_size_to_cache_in_bytes: options.maximum_file_size_to_cache_in_bytes,
      modify_url_prefix: options.modify_url_prefix.clone(),
      manifest_transforms: options.manifest_transforms.clone(),
    }
  }
}

/// Summary returned by an injector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectOutcome {
  /// Number of manifest entries injected, when the injector reports it.
  pub count: Option<usize>,
  /// Total size in bytes of the precached files, when reported.
  pub size: Option<u64>,
  /// Non-fatal problems encountered while building the manifest.
  pub warnings: Vec<String>,
}

/// Something that can embed a precache manifest into a service worker template.
pub trait ManifestInjector {
  /// Build the manifest and write the injected service worker.
  fn inject_manifest(&self, options: &InjectManifestOptions) -> Result<InjectOutcome>;
}

/// Run `injector` with the picked options when the build completes.
///
/// Errors from the injector reach the host unchanged.
pub fn schedule_injection(
  host: &mut BuildHost,
  options: &ResolvedOptions,
  injector: Arc<dyn ManifestInjector>,
) {
  let options = options.clone();
  host.scheduler.on_build_complete(Box::new(move |host: &mut BuildHost| {
    let picked = InjectManifestOptions::pick(&options, &host.project);
    let outcome = injector.inject_manifest(&picked)?;
    info!(
      sw_dest = %picked.sw_dest.display(),
      count = ?outcome.count,
      size = ?outcome.size,
      warnings = outcome.warnings.len(),
      "injected precache manifest"
    );
    Ok(())
  }));
}
