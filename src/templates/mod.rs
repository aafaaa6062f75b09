//! Render the generated service worker files and register them with the host.

mod registration;
mod service_worker;

use anyhow::Result;
use tracing::debug;

pub use registration::RegistrationTemplate;
pub use service_worker::{ServiceWorkerTemplate, WorkboxSwOptions};

use crate::host::{BuildHost, GeneratedFile};
use crate::options::ResolvedOptions;

/// File name of the service worker template read by the manifest injector.
pub const SW_TEMPLATE_FILE: &str = "sw.template.js";
/// File name of the client registration plugin.
pub const SW_PLUGIN_FILE: &str = "sw.plugin.js";

/// Register the service worker template and the client registration snippet.
///
/// With auto-registration the snippet becomes a client-only plugin; otherwise it is written as a
/// plain template for the application to import itself.
pub fn register_templates(
  host: &mut BuildHost,
  options: &ResolvedOptions,
  runtime_url: &str,
) -> Result<()> {
  let service_worker = ServiceWorkerTemplate::from_options(options, runtime_url).render()?;
  host.templates.add_template(GeneratedFile {
    file_name: SW_TEMPLATE_FILE.into(),
    contents: service_worker,
  })?;

  let registration = GeneratedFile {
    file_name: SW_PLUGIN_FILE.into(),
    contents: RegistrationTemplate::from_options(options).render()?,
  };
  if options.auto_register {
    debug!("registering client-only service worker plugin");
    host.templates.add_plugin(registration, false)?;
  } else {
    host.templates.add_template(registration)?;
  }
  Ok(())
}
