//! User-facing configuration for the service worker module.
//!
//! Every field is optional: an absent field keeps whatever the lower layer (built-in defaults or
//! module options) provided. See [`WorkboxConfig::merge`] for the precedence rules.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::{ManifestTransform, RuntimeCachingRule, TemplatedUrl};

/// Configuration files searched for in the project root, in order.
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
  "workbox.config.json",
  "workbox.config.yaml",
  "workbox.config.yml",
];

/// Optional overrides layered over the computed defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkboxConfig {
  /// Register the service worker from a client-only plugin.
  pub auto_register: Option<bool>,
  /// Router base overriding the host value.
  pub router_base: Option<String>,
  /// Public asset path overriding the host value before derivation.
  pub public_path: Option<String>,
  /// Service worker template read by the manifest injector.
  pub sw_src: Option<PathBuf>,
  /// Final service worker written by the manifest injector.
  pub sw_dest: Option<PathBuf>,
  /// Index file appended to directory requests.
  pub directory_index: Option<String>,
  /// Path (alias-aware) of a script inlined before the runtime caching routes.
  pub caching_extensions: Option<String>,
  /// Path (alias-aware) of a script inlined after the routes.
  pub routing_extensions: Option<String>,
  /// Prefix of the cache names created by the runtime.
  pub cache_id: Option<String>,
  /// Take control of open clients on activation.
  pub clients_claim: Option<bool>,
  /// Activate a new worker without waiting for old clients to close.
  pub skip_waiting: Option<bool>,
  /// Patterns selecting precached files.
  pub glob_patterns: Option<Vec<String>>,
  /// Directory the glob patterns are evaluated in.
  pub glob_directory: Option<PathBuf>,
  /// Follow symlinks while globbing.
  pub glob_follow: Option<bool>,
  /// Patterns excluded from the precache.
  pub glob_ignores: Option<Vec<String>>,
  /// Fail on unreadable directories instead of skipping them.
  pub glob_strict: Option<bool>,
  /// Regular expression for URLs that already carry a content hash.
  pub dont_cache_bust_urls_matching: Option<String>,
  /// Extra precache URLs with revisions computed from files or content.
  pub templated_urls: Option<BTreeMap<String, TemplatedUrl>>,
  /// Largest file, in bytes, that is precached.
  pub maximum_file_size_to_cache_in_bytes: Option<u64>,
  /// URL prefix rewrites applied to manifest entries.
  pub modify_url_prefix: Option<BTreeMap<String, String>>,
  /// Callbacks rewriting the manifest; only settable from code.
  #[serde(skip)]
  pub manifest_transforms: Option<Vec<ManifestTransform>>,
  /// Cache navigations so the site works offline.
  pub offline: Option<bool>,
  /// Page served when a navigation fails offline.
  pub offline_page: Option<String>,
  /// Additional runtime caching routes.
  pub runtime_caching: Option<Vec<RuntimeCachingRule>>,
  /// Leave the static file headers untouched.
  pub custom_headers: Option<bool>,
  /// Extra scripts imported by the service worker.
  pub import_scripts: Option<Vec<String>>,
  /// Service worker URL relative to the router base.
  #[serde(rename = "swURL")]
  pub sw_url: Option<String>,
  /// Emit the development build of the runtime script.
  pub dev: Option<bool>,
  /// Path (alias-aware) of the vendored workbox runtime script.
  pub runtime_script: Option<String>,
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  Json {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// Failed to parse the YAML configuration file.
  Yaml {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_yaml::Error,
  },
}

impl WorkboxConfig {
  /// Load the first configuration file found in `root_dir`.
  ///
  /// A project without any configuration file yields the empty configuration.
  pub fn discover(root_dir: &Path) -> Result<Self, ConfigError> {
    for candidate in CONFIG_FILE_CANDIDATES {
      let path = root_dir.join(candidate);
      if path.is_file() {
        return Self::from_path(&path);
      }
    }
    Ok(Self::default())
  }

  /// Read configuration from a JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
      serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
      })
    } else {
      serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
      })
    }
  }

  /// Layer `other` over `self`.
  ///
  /// Scalars and lists present in `other` replace the current value. Maps merge key by key with
  /// `other` winning on conflicts.
  pub fn merge(mut self, other: WorkboxConfig) -> Self {
    macro_rules! replace {
      ($base:ident, $overlay:ident; $($field:ident),* $(,)?) => {
        $(
          if $overlay.$field.is_some() {
            $base.$field = $overlay.$field;
          }
        )*
      };
    }

    replace!(
      self, other;
      auto_register,
      router_base,
      public_path,
      sw_src,
      sw_dest,
      directory_index,
      caching_extensions,
      routing_extensions,
      cache_id,
      clients_claim,
      skip_waiting,
      glob_patterns,
      glob_directory,
      glob_follow,
      glob_ignores,
      glob_strict,
      dont_cache_bust_urls_matching,
      maximum_file_size_to_cache_in_bytes,
      manifest_transforms,
      offline,
      offline_page,
      runtime_caching,
      custom_headers,
      import_scripts,
      sw_url,
      dev,
      runtime_script,
    );

    self.modify_url_prefix = merge_maps(self.modify_url_prefix, other.modify_url_prefix);
    self.templated_urls = merge_maps(self.templated_urls, other.templated_urls);
    self
  }
}

fn merge_maps<V>(
  base: Option<BTreeMap<String, V>>,
  overlay: Option<BTreeMap<String, V>>,
) -> Option<BTreeMap<String, V>> {
  match (base, overlay) {
    (Some(mut base), Some(overlay)) => {
      base.extend(overlay);
      Some(base)
    }
    (base, None) => base,
    (None, overlay) => overlay,
  }
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Json { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
      Self::Yaml { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Json { source, .. } => Some(source),
      Self::Yaml { source, .. } => Some(source),
    }
  }
}
