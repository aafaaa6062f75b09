use anyhow::Result;

use crate::options::ResolvedOptions;
use crate::urls::fix_url;

/// Variables of the client-side registration snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationTemplate {
  /// Public URL of the service worker script.
  pub sw_url: String,
  /// Registration scope.
  pub sw_scope: String,
}

impl RegistrationTemplate {
  /// Derive the worker URL and scope from the router base.
  pub fn from_options(options: &ResolvedOptions) -> Self {
    let sw_file = options.sw_url.as_deref().unwrap_or("sw.js");
    Self {
      sw_url: fix_url(&format!("{}/{}", options.router_base, sw_file)),
      sw_scope: fix_url(&format!("{}/", options.router_base)),
    }
  }

  /// Render the registration snippet.
  pub fn render(&self) -> Result<String> {
    Ok(format!(
      r#"if ('serviceWorker' in navigator) {{
  navigator.serviceWorker.register({url}, {{
    scope: {scope}
  }}).then(registration => {{
    window.$sw = registration
  }}).catch(error => {{
    console.error('Service worker registration failed:', error)
  }})
}} else {{
  console.warn('Service workers are not supported.')
}}
"#,
      url = serde_json::to_string(&self.sw_url)?,
      scope = serde_json::to_string(&self.sw_scope)?,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::WorkboxConfig;
  use crate::host::AliasTable;
  use crate::options::resolve_options;
  use crate::project::HostProject;

  fn registration(overrides: WorkboxConfig) -> RegistrationTemplate {
    let project = HostProject::new("/srv/app");
    let aliases = AliasTable::for_project(&project);
    RegistrationTemplate::from_options(&resolve_options(&project, &aliases, overrides))
  }

  #[test]
  fn defaults_to_root_scope() {
    assert_eq!(registration(WorkboxConfig::default()), RegistrationTemplate {
      sw_url: "/sw.js".into(),
      sw_scope: "/".into(),
    });
  }

  #[test]
  fn normalises_router_base_and_custom_url() {
    let template = registration(WorkboxConfig {
      router_base: Some("/app/".into()),
      sw_url: Some("/workers/sw.js".into()),
      ..Default::default()
    });
    assert_eq!(template.sw_url, "/app/workers/sw.js");
    assert_eq!(template.sw_scope, "/app/");
  }

  #[test]
  fn renders_browser_fallbacks() {
    let rendered = registration(WorkboxConfig::default()).render().unwrap();
    assert!(rendered.contains(r#"navigator.serviceWorker.register("/sw.js", {"#));
    assert!(rendered.contains(r#"scope: "/""#));
    assert!(rendered.contains("console.warn('Service workers are not supported.')"));
    assert!(rendered.contains("console.error('Service worker registration failed:', error)"));
  }
}
