//! Command-line entry point running the service worker pipeline against a project on disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use offline_workbox::{
  BuildHost, HostApi, HostProject, WorkboxCli, WorkboxConfig, WorkboxModule,
};

#[derive(Debug, Parser)]
#[command(name = "offline-workbox", version, about = "Wire a workbox service worker into a web build")]
struct Cli {
  /// Enable debug logging regardless of RUST_LOG.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Print the resolved options as JSON.
  Resolve(ProjectArgs),
  /// Run the before-build and build-complete phases.
  Build {
    #[command(flatten)]
    project: ProjectArgs,
    /// Use the legacy plugin hook API.
    #[arg(long)]
    legacy_hooks: bool,
    /// Forward manifest injection to `workbox-cli` instead of injecting in-process.
    #[arg(long)]
    workbox_cli: bool,
  },
}

#[derive(Debug, Args)]
struct ProjectArgs {
  /// Project root directory.
  #[arg(long, default_value = ".")]
  root: PathBuf,
  /// Application source directory, relative to the root.
  #[arg(long)]
  src_dir: Option<PathBuf>,
  /// Build directory, relative to the root.
  #[arg(long, default_value = ".build")]
  build_dir: PathBuf,
  /// Static directory name inside the source directory.
  #[arg(long)]
  static_dir: Option<String>,
  /// Router base the application is mounted under.
  #[arg(long, default_value = "/")]
  router_base: String,
  /// Public path of the built assets.
  #[arg(long, default_value = "/_nuxt/")]
  public_path: String,
}

impl ProjectArgs {
  fn into_project(self) -> HostProject {
    let mut project = HostProject::new(&self.root);
    project.src_dir = self
      .src_dir
      .map(|dir| self.root.join(dir))
      .unwrap_or_else(|| self.root.clone());
    project.build_dir = self.root.join(self.build_dir);
    project.static_dir = self.static_dir;
    project.router_base = self.router_base;
    project.public_path = self.public_path;
    project
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose)?;

  match cli.command {
    Command::Resolve(args) => {
      let host = BuildHost::new(args.into_project(), HostApi::Hooks);
      let options = WorkboxModule::new(WorkboxConfig::default()).resolve(&host)?;
      println!("{}", serde_json::to_string_pretty(&options)?);
    }
    Command::Build {
      project,
      legacy_hooks,
      workbox_cli,
    } => {
      let api = if legacy_hooks {
        HostApi::LegacyPlugins
      } else {
        HostApi::Hooks
      };
      let mut host = BuildHost::new(project.into_project(), api);

      let mut module = WorkboxModule::new(WorkboxConfig::default());
      if workbox_cli {
        module = module.with_injector(Arc::new(WorkboxCli::default()));
      }
      module.install(&mut host);
      host.build().context("service worker build failed")?;

      for plugin in host.templates.plugins() {
        info!(path = %plugin.path.display(), ssr = plugin.ssr, "registered plugin");
      }
    }
  }

  Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(true).compact())
    .try_init()
    .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
