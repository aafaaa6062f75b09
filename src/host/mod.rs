//! Abstractions over the host build system the service worker is wired into.
//!
//! The host owns the lifecycle: it runs every hook registered for a phase, in registration order,
//! and hands each hook mutable access to its services so hooks can register further work.

mod aliases;
mod headers;
mod scheduler;
mod templates;

use anyhow::Result;
use tracing::debug;

pub use aliases::{AliasResolver, AliasTable};
pub use headers::{ResponseHeaders, SetHeaders, StaticServeConfig, install_no_cache_header};
pub use scheduler::{BuildScheduler, HookScheduler, HostApi, LegacyPluginScheduler};
pub use templates::{FsTemplateRegistry, GeneratedFile, PluginRegistration, TemplateRegistry};

use crate::project::HostProject;

/// Lifecycle phases exposed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Runs before the host compiles the application.
  BeforeBuild,
  /// Runs once the compiled bundle is on disk.
  BuildComplete,
}

/// Work scheduled for a lifecycle phase.
pub type Hook = Box<dyn FnOnce(&mut BuildHost) -> Result<()>>;

/// Services the host exposes to hooks.
pub struct BuildHost {
  /// Project paths and URL settings.
  pub project: HostProject,
  /// Hook registry for the remaining phases.
  pub scheduler: Box<dyn BuildScheduler>,
  /// Template and plugin registry.
  pub templates: Box<dyn TemplateRegistry>,
  /// Alias resolution for user supplied paths.
  pub aliases: Box<dyn AliasResolver>,
  /// Static file serving configuration.
  pub static_serve: StaticServeConfig,
}

impl BuildHost {
  /// Create a host with filesystem-backed templates and the project's default aliases.
  pub fn new(project: HostProject, api: HostApi) -> Self {
    let templates = FsTemplateRegistry::new(project.build_dir.clone());
    let aliases = AliasTable::for_project(&project);
    Self {
      project,
      scheduler: api.scheduler(),
      templates: Box::new(templates),
      aliases: Box::new(aliases),
      static_serve: StaticServeConfig::default(),
    }
  }

  /// Run every hook registered for `phase`, stopping at the first failure.
  pub fn run_phase(&mut self, phase: Phase) -> Result<()> {
    let hooks = self.scheduler.take_hooks(phase);
    debug!(
      event = self.scheduler.event_name(phase),
      hooks = hooks.len(),
      "running build hooks"
    );
    for hook in hooks {
      hook(self)?;
    }
    Ok(())
  }

  /// Run the before-build phase followed by the build-complete phase.
  pub fn build(&mut self) -> Result<()> {
    self.run_phase(Phase::BeforeBuild)?;
    self.run_phase(Phase::BuildComplete)
  }
}
