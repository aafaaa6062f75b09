//! Resolve the final option set from host settings, defaults and user overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::config::WorkboxConfig;
use crate::host::AliasResolver;
use crate::models::{CachingHandler, ManifestTransform, RuntimeCachingRule, TemplatedUrl};
use crate::project::HostProject;
use crate::urls::{is_url, join_url};

/// Environment variable supplying the default cache identifier.
pub const CACHE_ID_ENV: &str = "CARGO_PKG_NAME";
/// Cache identifier used when the environment does not provide one.
pub const FALLBACK_CACHE_ID: &str = "app";
/// Default vendored runtime script, relative to the project root.
pub const DEFAULT_RUNTIME_SCRIPT: &str = "~~/node_modules/workbox-sw/build/workbox-sw.js";
/// Default ceiling for precached files.
pub const DEFAULT_MAXIMUM_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Fully resolved options shared by every step of a single build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
  /// Register the service worker from a client-only plugin.
  pub auto_register: bool,
  /// Router base the application is mounted under.
  pub router_base: String,
  /// URL prefix built assets are served from.
  pub public_path: String,
  /// Service worker template read by the manifest injector.
  pub sw_src: PathBuf,
  /// Final service worker written by the manifest injector.
  pub sw_dest: PathBuf,
  /// Index file appended to directory requests.
  pub directory_index: String,
  /// Inlined caching extension script, `None` when unset or missing on disk.
  pub caching_extensions: Option<String>,
  /// Inlined routing extension script, `None` when unset or missing on disk.
  pub routing_extensions: Option<String>,
  /// Prefix of the cache names created by the runtime.
  pub cache_id: String,
  /// Take control of open clients on activation.
  pub clients_claim: bool,
  /// Activate without waiting for old clients to close.
  pub skip_waiting: bool,
  /// Patterns selecting precached files.
  pub glob_patterns: Vec<String>,
  /// Directory the glob patterns are evaluated in; the client build directory when unset.
  pub glob_directory: Option<PathBuf>,
  /// Follow symlinks while globbing.
  pub glob_follow: bool,
  /// Patterns excluded from the precache.
  pub glob_ignores: Vec<String>,
  /// Fail on unreadable entries instead of skipping them.
  pub glob_strict: bool,
  /// Regular expression for URLs that already carry a content hash.
  pub dont_cache_bust_urls_matching: Option<String>,
  /// Extra precache URLs with computed revisions.
  pub templated_urls: BTreeMap<String, TemplatedUrl>,
  /// Largest file, in bytes, that is precached.
  pub maximum_file_size_to_cache_in_bytes: u64,
  /// URL prefix rewrites applied to manifest entries.
  pub modify_url_prefix: BTreeMap<String, String>,
  /// Callbacks rewriting the manifest before injection.
  #[serde(skip)]
  pub manifest_transforms: Vec<ManifestTransform>,
  /// Cache navigations so the site works offline.
  pub offline: bool,
  /// Page served when a navigation fails offline.
  pub offline_page: Option<String>,
  /// Routes derived from the public path and offline settings.
  pub builtin_runtime_caching: Vec<RuntimeCachingRule>,
  /// Routes supplied by the user.
  pub runtime_caching: Vec<RuntimeCachingRule>,
  /// Leave the static file headers untouched.
  pub custom_headers: bool,
  /// Extra scripts imported after the runtime script.
  pub import_scripts: Vec<String>,
  /// Service worker URL relative to the router base.
  #[serde(rename = "swURL")]
  pub sw_url: Option<String>,
  /// Emit the development build of the runtime script.
  pub dev: bool,
  /// Path (alias-aware) of the vendored runtime script.
  pub runtime_script: String,
}

impl ResolvedOptions {
  /// Built-in routes followed by user routes, with handler and method defaults applied.
  pub fn runtime_caching_rules(&self) -> Vec<RuntimeCachingRule> {
    self
      .builtin_runtime_caching
      .iter()
      .chain(&self.runtime_caching)
      .map(RuntimeCachingRule::with_defaults)
      .collect()
  }
}

/// Compute the public path assets are served from.
///
/// Absolute and protocol-relative paths are kept verbatim; protocol-relative ones get a leading
/// slash. Anything else is mounted under the router base.
pub fn resolve_public_path(router_base: &str, raw_public_path: &str) -> String {
  if is_url(raw_public_path) {
    if raw_public_path.starts_with("//") {
      let escaped = format!("/{raw_public_path}");
      debug!(public_path = %escaped, "escaped protocol-relative public path");
      return escaped;
    }
    return raw_public_path.to_string();
  }

  let public_path = join_url(router_base, raw_public_path);
  debug!(%public_path, "derived public path from router base");
  public_path
}

/// Default cache identifier, taken from the environment when available.
pub fn default_cache_id() -> String {
  std::env::var(CACHE_ID_ENV)
    .ok()
    .filter(|value| !value.is_empty())
    .unwrap_or_else(|| FALLBACK_CACHE_ID.to_string())
}

/// Merge `overrides` over the defaults for `project` and compute the derived fields.
pub fn resolve_options(
  project: &HostProject,
  aliases: &dyn AliasResolver,
  overrides: WorkboxConfig,
) -> ResolvedOptions {
  let router_base = overrides
    .router_base
    .clone()
    .unwrap_or_else(|| project.router_base.clone());
  let raw_public_path = overrides
    .public_path
    .clone()
    .unwrap_or_else(|| project.public_path.clone());
  let public_path = resolve_public_path(&router_base, &raw_public_path);

  let mut modify_url_prefix = BTreeMap::from([(String::new(), join_url(&public_path, ""))]);
  if let Some(user_prefixes) = overrides.modify_url_prefix {
    modify_url_prefix.extend(user_prefixes);
  }

  let offline = overrides.offline.unwrap_or(true);
  let offline_page = overrides.offline_page;

  let mut builtin_runtime_caching = vec![RuntimeCachingRule::new(
    join_url(&public_path, ".*"),
    CachingHandler::CacheFirst,
  )];
  if offline && offline_page.is_none() {
    builtin_runtime_caching.push(RuntimeCachingRule::new(
      join_url(&router_base, ".*"),
      CachingHandler::NetworkFirst,
    ));
  }

  let caching_extensions = overrides
    .caching_extensions
    .as_deref()
    .and_then(|path| load_script_extension(aliases, path));
  let routing_extensions = overrides
    .routing_extensions
    .as_deref()
    .and_then(|path| load_script_extension(aliases, path));

  ResolvedOptions {
    auto_register: overrides.auto_register.unwrap_or(true),
    sw_src: overrides
      .sw_src
      .unwrap_or_else(|| project.build_dir.join("sw.template.js")),
    sw_dest: overrides
      .sw_dest
      .unwrap_or_else(|| project.static_dir_path().join("sw.js")),
    directory_index: overrides.directory_index.unwrap_or_else(|| "/".into()),
    caching_extensions,
    routing_extensions,
    cache_id: overrides.cache_id.unwrap_or_else(default_cache_id),
    clients_claim: overrides.clients_claim.unwrap_or(true),
    skip_waiting: overrides.skip_waiting.unwrap_or(true),
    glob_patterns: overrides
      .glob_patterns
      .unwrap_or_else(|| vec!["**/*.{js,css}".into()]),
    glob_directory: overrides.glob_directory,
    glob_follow: overrides.glob_follow.unwrap_or(true),
    glob_ignores: overrides
      .glob_ignores
      .unwrap_or_else(|| vec!["node_modules/**/*".into()]),
    glob_strict: overrides.glob_strict.unwrap_or(true),
    dont_cache_bust_urls_matching: overrides.dont_cache_bust_urls_matching,
    templated_urls: overrides.templated_urls.unwrap_or_default(),
    maximum_file_size_to_cache_in_bytes: overrides
      .maximum_file_size_to_cache_in_bytes
      .unwrap_or(DEFAULT_MAXIMUM_FILE_SIZE),
    modify_url_prefix,
    manifest_transforms: overrides.manifest_transforms.unwrap_or_default(),
    offline,
    offline_page,
    builtin_runtime_caching,
    runtime_caching: overrides.runtime_caching.unwrap_or_default(),
    custom_headers: overrides.custom_headers.unwrap_or(false),
    import_scripts: overrides.import_scripts.unwrap_or_default(),
    sw_url: overrides.sw_url,
    dev: overrides.dev.unwrap_or(false),
    runtime_script: overrides
      .runtime_script
      .unwrap_or_else(|| DEFAULT_RUNTIME_SCRIPT.into()),
    router_base,
    public_path,
  }
}

/// Read an extension script, treating a missing file as "no extension".
fn load_script_extension(aliases: &dyn AliasResolver, path: &str) -> Option<String> {
  let resolved = aliases.resolve_alias(path);
  match fs::read_to_string(&resolved) {
    Ok(script) => Some(script),
    Err(err) => {
      debug!(path = %resolved.display(), error = %err, "skipping unreadable script extension");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::host::AliasTable;
  use tempfile::tempdir;

  fn project(root: &std::path::Path) -> HostProject {
    HostProject::new(root)
  }

  fn resolve(project: &HostProject, overrides: WorkboxConfig) -> ResolvedOptions {
    let aliases = AliasTable::for_project(project);
    resolve_options(project, &aliases, overrides)
  }

  #[test]
  fn derives_public_path_from_router_base() {
    assert_eq!(resolve_public_path("/", "/_nuxt/"), "/_nuxt/");
    assert_eq!(resolve_public_path("/app/", "/_nuxt/"), "/app/_nuxt/");
  }

  #[test]
  fn keeps_absolute_public_paths() {
    assert_eq!(
      resolve_public_path("/app", "https://cdn.example.com/_nuxt/"),
      "https://cdn.example.com/_nuxt/"
    );
    assert_eq!(
      resolve_public_path("/app", "//cdn.example.com/_nuxt/"),
      "///cdn.example.com/_nuxt/"
    );
  }

  #[test]
  fn applies_defaults() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig::default());

    assert!(options.auto_register);
    assert!(options.clients_claim);
    assert!(options.skip_waiting);
    assert!(options.offline);
    assert!(!options.custom_headers);
    assert_eq!(options.directory_index, "/");
    assert_eq!(options.glob_patterns, vec!["**/*.{js,css}".to_string()]);
    assert!(options.glob_directory.is_none());
    assert_eq!(options.sw_src, project.build_dir.join("sw.template.js"));
    assert_eq!(options.sw_dest, dir.path().join("static").join("sw.js"));
    assert_eq!(options.modify_url_prefix[""], "/_nuxt/");
    assert!(!options.cache_id.is_empty());
  }

  #[test]
  fn overrides_replace_defaults() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig {
      cache_id: Some("shop".into()),
      skip_waiting: Some(false),
      glob_patterns: Some(vec!["**/*.html".into()]),
      modify_url_prefix: Some(BTreeMap::from([(
        "static/".to_string(),
        "/".to_string(),
      )])),
      ..Default::default()
    });

    assert_eq!(options.cache_id, "shop");
    assert!(!options.skip_waiting);
    assert!(options.clients_claim);
    assert_eq!(options.glob_patterns, vec!["**/*.html".to_string()]);
    assert_eq!(options.modify_url_prefix[""], "/_nuxt/");
    assert_eq!(options.modify_url_prefix["static/"], "/");
  }

  #[test]
  fn builtin_routes_follow_merged_paths() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig {
      router_base: Some("/app/".into()),
      ..Default::default()
    });

    assert_eq!(options.public_path, "/app/_nuxt/");
    assert_eq!(options.builtin_runtime_caching, vec![
      RuntimeCachingRule::new("/app/_nuxt/.*", CachingHandler::CacheFirst),
      RuntimeCachingRule::new("/app/.*", CachingHandler::NetworkFirst),
    ]);
  }

  #[test]
  fn protocol_relative_public_path_stays_on_its_host() {
    let dir = tempdir().unwrap();
    let mut project = project(dir.path());
    project.public_path = "//cdn.example.com/_nuxt/".into();
    let options = resolve(&project, WorkboxConfig::default());

    assert_eq!(options.public_path, "///cdn.example.com/_nuxt/");
    assert_eq!(options.modify_url_prefix[""], "//cdn.example.com/_nuxt/");
    assert_eq!(
      options.builtin_runtime_caching[0],
      RuntimeCachingRule::new("//cdn.example.com/_nuxt/.*", CachingHandler::CacheFirst)
    );
  }

  #[test]
  fn offline_disabled_omits_catch_all_route() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig {
      offline: Some(false),
      ..Default::default()
    });

    assert_eq!(options.builtin_runtime_caching, vec![RuntimeCachingRule::new(
      "/_nuxt/.*",
      CachingHandler::CacheFirst
    )]);
  }

  #[test]
  fn offline_page_replaces_catch_all_route() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig {
      offline_page: Some("/offline.html".into()),
      ..Default::default()
    });

    assert_eq!(options.builtin_runtime_caching.len(), 1);
    assert_eq!(options.offline_page.as_deref(), Some("/offline.html"));
  }

  #[test]
  fn merges_rules_with_defaults_applied() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    let options = resolve(&project, WorkboxConfig {
      runtime_caching: Some(vec![RuntimeCachingRule {
        url_pattern: "https://api.example.com/.*".into(),
        handler: None,
        method: Some("POST".into()),
        options: None,
      }]),
      ..Default::default()
    });

    let rules = options.runtime_caching_rules();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[0].method.as_deref(), Some("GET"));
    assert_eq!(rules[2].url_pattern, "https://api.example.com/.*");
    assert_eq!(rules[2].handler, Some(CachingHandler::NetworkFirst));
    assert_eq!(rules[2].method.as_deref(), Some("POST"));
  }

  #[test]
  fn loads_extension_scripts_through_aliases() {
    let dir = tempdir().unwrap();
    let project = project(dir.path());
    fs::create_dir_all(dir.path().join("sw")).unwrap();
    fs::write(dir.path().join("sw/caching.js"), "console.log('caching')").unwrap();

    let options = resolve(&project, WorkboxConfig {
      caching_extensions: Some("~/sw/caching.js".into()),
      routing_extensions: Some("~/sw/missing.js".into()),
      ..Default::default()
    });

    assert_eq!(
      options.caching_extensions.as_deref(),
      Some("console.log('caching')")
    );
    assert!(options.routing_extensions.is_none());
  }
}
