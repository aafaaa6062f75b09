use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

/// Sink for response headers set while serving a static file.
pub trait ResponseHeaders {
  /// Set `name` to `value`, replacing any previous value.
  fn set_header(&mut self, name: &str, value: &str);
}

impl ResponseHeaders for BTreeMap<String, String> {
  fn set_header(&mut self, name: &str, value: &str) {
    self.insert(name.to_string(), value.to_string());
  }
}

/// Callback invoked with the response headers and request path of every static file.
pub type SetHeaders = Arc<dyn Fn(&mut dyn ResponseHeaders, &str) + Send + Sync>;

/// Static file serving configuration exposed by the host.
#[derive(Clone, Default)]
pub struct StaticServeConfig {
  /// Header callback, if one is configured.
  pub set_headers: Option<SetHeaders>,
}

impl StaticServeConfig {
  /// Apply the configured header callback for `path`.
  pub fn apply(&self, headers: &mut dyn ResponseHeaders, path: &str) {
    if let Some(set_headers) = &self.set_headers {
      set_headers(headers, path);
    }
  }
}

impl std::fmt::Debug for StaticServeConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StaticServeConfig")
      .field("set_headers", &self.set_headers.is_some())
      .finish()
  }
}

/// Wrap the configured header callback so service worker scripts are never cached.
///
/// Paths ending in `sw.js` get `Cache-Control: no-cache`; every other path goes to the previous
/// callback unchanged.
pub fn install_no_cache_header(config: &mut StaticServeConfig) {
  let previous = config.set_headers.take();
  debug!(wraps_existing = previous.is_some(), "installing sw.js cache header override");
  config.set_headers = Some(Arc::new(move |headers: &mut dyn ResponseHeaders, path: &str| {
    if path.ends_with("sw.js") {
      headers.set_header("Cache-Control", "no-cache");
    } else if let Some(previous) = &previous {
      previous(headers, path);
    }
  }));
}
