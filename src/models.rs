//! Data structures shared between option resolution, manifest injection and templates.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default HTTP method used by runtime caching routes.
pub const DEFAULT_ROUTE_METHOD: &str = "GET";

/// Caching strategy names understood by the workbox runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CachingHandler {
  /// Serve from cache, falling back to the network.
  CacheFirst,
  /// Only ever serve from cache.
  CacheOnly,
  /// Prefer the network, falling back to cache.
  NetworkFirst,
  /// Never touch the cache.
  NetworkOnly,
  /// Serve from cache while refreshing it in the background.
  StaleWhileRevalidate,
}

impl CachingHandler {
  /// Name of the strategy factory on `workboxSW.strategies`.
  pub fn strategy_name(self) -> &'static str {
    match self {
      Self::CacheFirst => "cacheFirst",
      Self::CacheOnly => "cacheOnly",
      Self::NetworkFirst => "networkFirst",
      Self::NetworkOnly => "networkOnly",
      Self::StaleWhileRevalidate => "staleWhileRevalidate",
    }
  }
}

/// Rule telling the service worker how to handle requests matching a URL pattern.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCachingRule {
  /// Regular expression source matched against request URLs.
  pub url_pattern: String,
  /// Strategy used for matching requests, `networkFirst` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub handler: Option<CachingHandler>,
  /// HTTP method matched by the route, `GET` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,
  /// Strategy options forwarded untouched to the runtime.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Value>,
}

impl RuntimeCachingRule {
  /// Build a rule for a pattern and handler with the remaining fields left to their defaults.
  pub fn new(url_pattern: impl Into<String>, handler: CachingHandler) -> Self {
    Self {
      url_pattern: url_pattern.into(),
      handler: Some(handler),
      method: None,
      options: None,
    }
  }

  /// Resolve the defaults used when the rule is rendered into the service worker.
  pub fn with_defaults(&self) -> Self {
    Self {
      url_pattern: self.url_pattern.clone(),
      handler: Some(self.strategy()),
      method: Some(self.route_method().to_string()),
      options: self.options.clone(),
    }
  }

  /// Handler of the route, `networkFirst` when unset.
  pub fn strategy(&self) -> CachingHandler {
    self.handler.unwrap_or(CachingHandler::NetworkFirst)
  }

  /// HTTP method of the route, [`DEFAULT_ROUTE_METHOD`] when unset.
  pub fn route_method(&self) -> &str {
    self.method.as_deref().unwrap_or(DEFAULT_ROUTE_METHOD)
  }
}

/// Source of a templated URL revision: either files on disk or literal content.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TemplatedUrl {
  /// Glob patterns, relative to the glob directory, whose contents determine the revision.
  Globs(Vec<String>),
  /// Literal content hashed to produce the revision.
  Content(String),
}

/// Single precache entry embedded into the service worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestEntry {
  /// URL requested by the service worker.
  pub url: String,
  /// Content revision, omitted for URLs that already carry a hash.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub revision: Option<String>,
}

/// Callback rewriting the manifest before it is injected.
#[derive(Clone)]
pub struct ManifestTransform(Arc<dyn Fn(Vec<ManifestEntry>) -> Vec<ManifestEntry> + Send + Sync>);

impl ManifestTransform {
  /// Wrap a closure as a manifest transform.
  pub fn new<F>(transform: F) -> Self
  where
    F: Fn(Vec<ManifestEntry>) -> Vec<ManifestEntry> + Send + Sync + 'static,
  {
    Self(Arc::new(transform))
  }

  /// Run the transform over a manifest.
  pub fn apply(&self, entries: Vec<ManifestEntry>) -> Vec<ManifestEntry> {
    (self.0)(entries)
  }
}

impl fmt::Debug for ManifestTransform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ManifestTransform(..)")
  }
}
