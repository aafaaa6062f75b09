use anyhow::Result;
use serde::Serialize;

use crate::models::RuntimeCachingRule;
use crate::options::ResolvedOptions;

/// Options passed to the `WorkboxSW` constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkboxSwOptions {
  /// Prefix of the runtime cache names.
  pub cache_id: String,
  /// Index file appended to directory requests.
  pub directory_index: String,
  /// Whether `.html` is appended to extension-less requests.
  pub clean_urls: bool,
  /// Take control of open clients on activation.
  pub clients_claim: bool,
  /// Activate without waiting for old clients to close.
  pub skip_waiting: bool,
}

/// Variables of the generated service worker script.
#[derive(Debug, Clone)]
pub struct ServiceWorkerTemplate {
  /// Page served when a navigation fails offline.
  pub offline_page: Option<String>,
  /// Script inlined before the runtime caching routes.
  pub caching_extensions: Option<String>,
  /// Script inlined after every route.
  pub routing_extensions: Option<String>,
  /// Scripts loaded with `importScripts`, runtime first.
  pub import_scripts: Vec<String>,
  /// Runtime caching routes with defaults applied.
  pub runtime_caching: Vec<RuntimeCachingRule>,
  /// Constructor options for the runtime.
  pub workbox_options: WorkboxSwOptions,
}

impl ServiceWorkerTemplate {
  /// Collect the template variables from the resolved options.
  pub fn from_options(options: &ResolvedOptions, runtime_url: &str) -> Self {
    let mut import_scripts = vec![runtime_url.to_string()];
    import_scripts.extend(options.import_scripts.iter().cloned());

    Self {
      offline_page: options.offline_page.clone(),
      caching_extensions: options.caching_extensions.clone(),
      routing_extensions: options.routing_extensions.clone(),
      import_scripts,
      runtime_caching: options.runtime_caching_rules(),
      workbox_options: WorkboxSwOptions {
        cache_id: options.cache_id.clone(),
        directory_index: options.directory_index.clone(),
        clean_urls: false,
        clients_claim: options.clients_claim,
        skip_waiting: options.skip_waiting,
      },
    }
  }

  /// Render the script; the empty `precache([])` call is the manifest injection point.
  pub fn render(&self) -> Result<String> {
    let import_scripts = self
      .import_scripts
      .iter()
      .map(serde_json::to_string)
      .collect::<Result<Vec<_>, _>>()?
      .join(", ");
    let workbox_options = serde_json::to_string_pretty(&self.workbox_options)?;

    let mut routes = Vec::with_capacity(self.runtime_caching.len());
    for rule in &self.runtime_caching {
      routes.push(render_route(rule)?);
    }

    let offline_page = match &self.offline_page {
      Some(page) => format!(
        r#"
// Offline page
workboxSW.router.registerRoute(new RegExp('/.*'), args => {{
  return workboxSW.strategies.networkFirst().handle(args).catch(() => caches.match({page}))
}})
"#,
        page = serde_json::to_string(page)?
      ),
      None => String::new(),
    };

    Ok(format!(
      r#"importScripts({import_scripts})

const workboxSW = new self.WorkboxSW({workbox_options})

workboxSW.precache([])
{caching_extensions}
// Runtime caching
{routes}
{offline_page}{routing_extensions}"#,
      caching_extensions = extension_block("Caching extensions", &self.caching_extensions),
      routes = routes.join("\n"),
      routing_extensions = extension_block("Routing extensions", &self.routing_extensions),
    ))
  }
}

fn render_route(rule: &RuntimeCachingRule) -> Result<String> {
  let strategy_options = match &rule.options {
    Some(options) => serde_json::to_string(options)?,
    None => "{}".to_string(),
  };
  Ok(format!(
    "workboxSW.router.registerRoute(new RegExp({pattern}), workboxSW.strategies.{strategy}({strategy_options}), {method})",
    pattern = serde_json::to_string(&rule.url_pattern)?,
    strategy = rule.strategy().strategy_name(),
    method = serde_json::to_string(rule.route_method())?,
  ))
}

fn extension_block(label: &str, script: &Option<String>) -> String {
  match script {
    Some(script) => format!("\n// {label}\n{}\n", script.trim_end()),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::WorkboxConfig;
  use crate::host::AliasTable;
  use crate::models::CachingHandler;
  use crate::options::resolve_options;
  use crate::project::HostProject;

  fn template(overrides: WorkboxConfig) -> ServiceWorkerTemplate {
    let project = HostProject::new("/srv/app");
    let aliases = AliasTable::for_project(&project);
    let options = resolve_options(&project, &aliases, overrides);
    ServiceWorkerTemplate::from_options(&options, "/_nuxt/workbox.abcd1234.js")
  }

  #[test]
  fn imports_runtime_before_user_scripts() {
    let template = template(WorkboxConfig {
      import_scripts: Some(vec!["/custom-sw.js".into()]),
      ..Default::default()
    });
    assert_eq!(template.import_scripts, vec![
      "/_nuxt/workbox.abcd1234.js".to_string(),
      "/custom-sw.js".to_string(),
    ]);

    let rendered = template.render().unwrap();
    assert!(rendered.starts_with(
      r#"importScripts("/_nuxt/workbox.abcd1234.js", "/custom-sw.js")"#
    ));
  }

  #[test]
  fn renders_runtime_caching_routes() {
    let rendered = template(WorkboxConfig {
      cache_id: Some("shop".into()),
      ..Default::default()
    })
    .render()
    .unwrap();

    assert!(rendered.contains("workboxSW.precache([])"));
    assert!(rendered.contains(
      r#"workboxSW.router.registerRoute(new RegExp("/_nuxt/.*"), workboxSW.strategies.cacheFirst({}), "GET")"#
    ));
    assert!(rendered.contains(
      r#"workboxSW.router.registerRoute(new RegExp("/.*"), workboxSW.strategies.networkFirst({}), "GET")"#
    ));
    assert!(rendered.contains(r#""cacheId": "shop""#));
    assert!(rendered.contains(r#""cleanUrls": false"#));
    assert!(!rendered.contains("// Offline page"));
  }

  #[test]
  fn renders_offline_page_and_extensions() {
    let mut template = template(WorkboxConfig {
      offline_page: Some("/offline.html".into()),
      ..Default::default()
    });
    template.caching_extensions = Some("console.log('caching')\n".into());
    template.routing_extensions = Some("console.log('routing')".into());

    let rendered = template.render().unwrap();
    assert!(rendered.contains(r#"caches.match("/offline.html")"#));
    assert!(rendered.contains("// Caching extensions\nconsole.log('caching')\n"));
    assert!(rendered.contains("// Routing extensions\nconsole.log('routing')\n"));
    let caching = rendered.find("console.log('caching')").unwrap();
    let routes = rendered.find("// Runtime caching").unwrap();
    let routing = rendered.find("console.log('routing')").unwrap();
    assert!(caching < routes && routes < routing);
  }

  #[test]
  fn forwards_strategy_options() {
    let rendered = template(WorkboxConfig {
      runtime_caching: Some(vec![RuntimeCachingRule {
        url_pattern: "https://fonts.googleapis.com/.*".into(),
        handler: Some(CachingHandler::StaleWhileRevalidate),
        method: None,
        options: Some(serde_json::json!({ "cacheName": "fonts" })),
      }]),
      ..Default::default()
    })
    .render()
    .unwrap();

    assert!(rendered.contains(
      r#"new RegExp("https://fonts.googleapis.com/.*"), workboxSW.strategies.staleWhileRevalidate({"cacheName":"fonts"}), "GET")"#
    ));
  }

  #[test]
  fn renders_user_method_with_default_strategy() {
    let rendered = template(WorkboxConfig {
      runtime_caching: Some(vec![RuntimeCachingRule {
        url_pattern: "/api/.*".into(),
        handler: None,
        method: Some("POST".into()),
        options: None,
      }]),
      ..Default::default()
    })
    .render()
    .unwrap();

    assert!(rendered.contains(
      r#"new RegExp("/api/.*"), workboxSW.strategies.networkFirst({}), "POST")"#
    ));
  }
}
