use std::path::{Path, PathBuf};

use crate::project::HostProject;

/// Resolves user supplied paths that may start with a host alias.
pub trait AliasResolver {
  /// Map `path` onto a filesystem location.
  fn resolve_alias(&self, path: &str) -> PathBuf;
}

/// Prefix based alias table with a base directory for plain relative paths.
#[derive(Debug, Clone)]
pub struct AliasTable {
  aliases: Vec<(String, PathBuf)>,
  base_dir: PathBuf,
}

impl AliasTable {
  /// Create an empty table resolving relative paths against `base_dir`.
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      aliases: Vec::new(),
      base_dir: base_dir.into(),
    }
  }

  /// Default aliases: `~`/`@` for the source directory and `~~`/`@@` for the project root.
  pub fn for_project(project: &HostProject) -> Self {
    Self::new(&project.src_dir)
      .with_alias("~~", &project.root_dir)
      .with_alias("@@", &project.root_dir)
      .with_alias("~", &project.src_dir)
      .with_alias("@", &project.src_dir)
  }

  /// Register an additional alias.
  pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<PathBuf>) -> Self {
    self.aliases.push((alias.into(), target.into()));
    self
  }
}

impl AliasResolver for AliasTable {
  fn resolve_alias(&self, path: &str) -> PathBuf {
    for (alias, target) in &self.aliases {
      if path == alias {
        return target.clone();
      }
      if let Some(rest) = path.strip_prefix(alias.as_str())
        && rest.starts_with('/')
      {
        return target.join(rest.trim_start_matches('/'));
      }
    }

    let candidate = Path::new(path);
    if candidate.is_absolute() {
      candidate.to_path_buf()
    } else {
      self.base_dir.join(candidate)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn project() -> HostProject {
    let mut project = HostProject::new("/srv/app");
    project.src_dir = PathBuf::from("/srv/app/client");
    project
  }

  #[test]
  fn resolves_source_and_root_aliases() {
    let table = AliasTable::for_project(&project());
    assert_eq!(
      table.resolve_alias("~/sw/caching.js"),
      PathBuf::from("/srv/app/client/sw/caching.js")
    );
    assert_eq!(
      table.resolve_alias("@/sw/routing.js"),
      PathBuf::from("/srv/app/client/sw/routing.js")
    );
    assert_eq!(
      table.resolve_alias("~~/node_modules/workbox-sw/build/workbox-sw.js"),
      PathBuf::from("/srv/app/node_modules/workbox-sw/build/workbox-sw.js")
    );
    assert_eq!(table.resolve_alias("@@"), PathBuf::from("/srv/app"));
  }

  #[test]
  fn resolves_plain_paths_against_source_dir() {
    let table = AliasTable::for_project(&project());
    assert_eq!(
      table.resolve_alias("sw/caching.js"),
      PathBuf::from("/srv/app/client/sw/caching.js")
    );
    assert_eq!(
      table.resolve_alias("/etc/caching.js"),
      PathBuf::from("/etc/caching.js")
    );
  }

  #[test]
  fn does_not_treat_prefixed_names_as_aliases() {
    let table = AliasTable::for_project(&project());
    assert_eq!(
      table.resolve_alias("~components/x.js"),
      PathBuf::from("/srv/app/client/~components/x.js")
    );
  }
}
