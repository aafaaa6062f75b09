use super::{Hook, Phase};

/// Registry of lifecycle hooks exposed by a host build system.
pub trait BuildScheduler {
  /// Schedule `hook` to run before the host compiles the application.
  fn on_before_build(&mut self, hook: Hook);

  /// Schedule `hook` to run after the compiled bundle has been written.
  fn on_build_complete(&mut self, hook: Hook);

  /// Remove and return the hooks registered for `phase`, in registration order.
  fn take_hooks(&mut self, phase: Phase) -> Vec<Hook>;

  /// Host event name backing `phase`, used for diagnostics.
  fn event_name(&self, phase: Phase) -> &'static str;
}

/// Hook API generation exposed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostApi {
  /// Named lifecycle hooks (`build:before`, `build:done`).
  Hooks,
  /// Plugin events (`build`, then `built` on the builder).
  LegacyPlugins,
}

impl HostApi {
  /// Construct the scheduler matching this API generation.
  pub fn scheduler(self) -> Box<dyn BuildScheduler> {
    match self {
      Self::Hooks => Box::new(HookScheduler::default()),
      Self::LegacyPlugins => Box::new(LegacyPluginScheduler::default()),
    }
  }
}

/// Scheduler for hosts exposing named lifecycle hooks.
#[derive(Default)]
pub struct HookScheduler {
  before_build: Vec<Hook>,
  build_done: Vec<Hook>,
}

impl BuildScheduler for HookScheduler {
  fn on_before_build(&mut self, hook: Hook) {
    self.before_build.push(hook);
  }

  fn on_build_complete(&mut self, hook: Hook) {
    self.build_done.push(hook);
  }

  fn take_hooks(&mut self, phase: Phase) -> Vec<Hook> {
    match phase {
      Phase::BeforeBuild => std::mem::take(&mut self.before_build),
      Phase::BuildComplete => std::mem::take(&mut self.build_done),
    }
  }

  fn event_name(&self, phase: Phase) -> &'static str {
    match phase {
      Phase::BeforeBuild => "build:before",
      Phase::BuildComplete => "build:done",
    }
  }
}

/// Scheduler for hosts that only expose the `build` and `built` plugin events.
#[derive(Default)]
pub struct LegacyPluginScheduler {
  build_plugins: Vec<Hook>,
  builder_plugins: Vec<Hook>,
}

impl BuildScheduler for LegacyPluginScheduler {
  fn on_before_build(&mut self, hook: Hook) {
    self.build_plugins.push(hook);
  }

  fn on_build_complete(&mut self, hook: Hook) {
    self.builder_plugins.push(hook);
  }

  fn take_hooks(&mut self, phase: Phase) -> Vec<Hook> {
    match phase {
      Phase::BeforeBuild => std::mem::take(&mut self.build_plugins),
      Phase::BuildComplete => std::mem::take(&mut self.builder_plugins),
    }
  }

  fn event_name(&self, phase: Phase) -> &'static str {
    match phase {
      Phase::BeforeBuild => "build",
      Phase::BuildComplete => "built",
    }
  }
}
