//! Description of the host project whose build the service worker is wired into.

use std::path::{Path, PathBuf};

/// Directory name used for static files when the host does not configure one.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Paths and URL settings inherited from the host build.
#[derive(Debug, Clone)]
pub struct HostProject {
  /// Project root, used for `~~`/`@@` aliases and the vendored runtime lookup.
  pub root_dir: PathBuf,
  /// Application source directory, used for `~`/`@` aliases.
  pub src_dir: PathBuf,
  /// Directory receiving generated templates and the compiled bundle.
  pub build_dir: PathBuf,
  /// Name of the static directory inside the source directory, if configured.
  pub static_dir: Option<String>,
  /// Router base the application is mounted under.
  pub router_base: String,
  /// Raw public path configured for built assets.
  pub public_path: String,
  /// Whether the host is running a development build.
  pub dev: bool,
}

impl HostProject {
  /// Describe a project rooted at `root_dir` using conventional sub-directories.
  pub fn new(root_dir: impl Into<PathBuf>) -> Self {
    let root_dir = root_dir.into();
    Self {
      src_dir: root_dir.clone(),
      build_dir: root_dir.join(".build"),
      root_dir,
      static_dir: None,
      router_base: "/".into(),
      public_path: "/_nuxt/".into(),
      dev: false,
    }
  }

  /// Directory holding static files copied verbatim into the site.
  pub fn static_dir_path(&self) -> PathBuf {
    self
      .src_dir
      .join(self.static_dir.as_deref().unwrap_or(DEFAULT_STATIC_DIR))
  }

  /// Directory holding the compiled client bundle.
  ///
  /// Newer hosts emit into `dist/client`; older ones write straight into `dist`. The check runs
  /// against the filesystem, so callers that run before the bundle exists should call this again
  /// once it does.
  pub fn client_build_dir(&self) -> PathBuf {
    resolve_client_build_dir(&self.build_dir)
  }
}

fn resolve_client_build_dir(build_dir: &Path) -> PathBuf {
  let client = build_dir.join("dist").join("client");
  if client.exists() {
    client
  } else {
    build_dir.join("dist")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn falls_back_to_dist_without_client_dir() {
    let dir = tempdir().unwrap();
    let project = HostProject::new(dir.path());
    assert_eq!(project.client_build_dir(), project.build_dir.join("dist"));
  }

  #[test]
  fn prefers_client_dir_when_present() {
    let dir = tempdir().unwrap();
    let project = HostProject::new(dir.path());
    fs::create_dir_all(project.build_dir.join("dist/client")).unwrap();
    assert_eq!(
      project.client_build_dir(),
      project.build_dir.join("dist").join("client")
    );
  }

  #[test]
  fn static_dir_defaults_to_static() {
    let mut project = HostProject::new("/srv/app");
    assert_eq!(project.static_dir_path(), PathBuf::from("/srv/app/static"));
    project.static_dir = Some("public".into());
    assert_eq!(project.static_dir_path(), PathBuf::from("/srv/app/public"));
  }
}
