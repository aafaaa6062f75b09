//! Service worker module orchestrating option resolution, injection, assets and templates.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::WorkboxConfig;
use crate::emit::emit_runtime_script;
use crate::host::{BuildHost, install_no_cache_header};
use crate::inject::{ManifestInjector, PrecacheInjector, schedule_injection};
use crate::options::{ResolvedOptions, resolve_options};
use crate::templates::register_templates;

/// High-level entry point wiring a service worker into a host build.
pub struct WorkboxModule {
  module_options: WorkboxConfig,
  injector: Arc<dyn ManifestInjector>,
}

impl WorkboxModule {
  /// Create a module with the given options and the in-process manifest injector.
  pub fn new(module_options: WorkboxConfig) -> Self {
    Self {
      module_options,
      injector: Arc::new(PrecacheInjector),
    }
  }

  /// Replace the manifest injector.
  pub fn with_injector(mut self, injector: Arc<dyn ManifestInjector>) -> Self {
    self.injector = injector;
    self
  }

  /// Register the module with `host`.
  ///
  /// Development builds are left untouched. Otherwise all work happens in the host's before-build
  /// phase, which in turn schedules the injection and asset copies for build completion.
  pub fn install(self, host: &mut BuildHost) {
    if host.project.dev {
      debug!("development build, skipping service worker");
      return;
    }

    host
      .scheduler
      .on_before_build(Box::new(move |host: &mut BuildHost| {
        self.prepare(host).map(|_| ())
      }));
  }

  /// Resolve the options for `host` without registering anything.
  ///
  /// Module options are layered under the project configuration file, if one exists.
  pub fn resolve(&self, host: &BuildHost) -> Result<ResolvedOptions> {
    let project_config = WorkboxConfig::discover(&host.project.root_dir)?;
    let overrides = self.module_options.clone().merge(project_config);
    Ok(resolve_options(
      &host.project,
      host.aliases.as_ref(),
      overrides,
    ))
  }

  fn prepare(self, host: &mut BuildHost) -> Result<ResolvedOptions> {
    info!("adding workbox service worker");
    let options = self.resolve(host)?;

    schedule_injection(host, &options, self.injector);
    if !options.custom_headers {
      install_no_cache_header(&mut host.static_serve);
    }
    let runtime_url = emit_runtime_script(host, &options)?;
    register_templates(host, &options, &runtime_url)?;

    Ok(options)
  }
}
