#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod emit;
pub mod host;
pub mod inject;
pub mod models;
pub mod options;
pub mod project;
pub mod templates;
pub mod urls;

pub use builder::WorkboxModule;
pub use config::WorkboxConfig;
pub use host::{BuildHost, HostApi, Phase};
pub use inject::{ManifestInjector, PrecacheInjector, WorkboxCli};
pub use options::{ResolvedOptions, resolve_options};
pub use project::HostProject;
