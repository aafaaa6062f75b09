//! In-process manifest injector.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::globs::GlobSet;
use super::{InjectManifestOptions, InjectOutcome, ManifestInjector};
use crate::models::{ManifestEntry, TemplatedUrl};

fn injection_point() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(\.precache\()\s*\[\s*\]\s*(\))").expect("invalid injection point regex")
  })
}

/// Builds the precache manifest from the glob directory and writes the injected worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecacheInjector;

/// File discovered under the glob directory.
#[derive(Debug)]
struct DiscoveredFile {
  relative: String,
  path: PathBuf,
  size: u64,
}

impl ManifestInjector for PrecacheInjector {
  fn inject_manifest(&self, options: &InjectManifestOptions) -> Result<InjectOutcome> {
    let globs = GlobSet::new(&options.glob_patterns, &options.glob_ignores)?;
    let cache_busted = options
      .dont_cache_bust_urls_matching
      .as_deref()
      .map(Regex::new)
      .transpose()
      .context("invalid dontCacheBustUrlsMatching expression")?;

    let mut warnings = Vec::new();
    let files = discover_files(options, &mut warnings)?;

    let mut entries = Vec::new();
    let mut size = 0;
    for file in files.iter().filter(|file| globs.is_match(&file.relative)) {
      if file.size > options.maximum_file_size_to_cache_in_bytes {
        let message = format!(
          "{} is {} bytes, above the {} byte limit, and will not be precached",
          file.relative, file.size, options.maximum_file_size_to_cache_in_bytes
        );
        warn!("{message}");
        warnings.push(message);
        continue;
      }

      size += file.size;
      entries.push(ManifestEntry {
        url: file.relative.clone(),
        revision: Some(file_revision(&file.path)?),
      });
    }

    for (url, source) in &options.templated_urls {
      let revision = templated_revision(url, source, &files)?;
      entries.push(ManifestEntry {
        url: url.clone(),
        revision: Some(revision),
      });
    }

    for entry in &mut entries {
      entry.url = modify_url_prefix(&entry.url, options);
      if cache_busted
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&entry.url))
      {
        entry.revision = None;
      }
    }

    for transform in &options.manifest_transforms {
      entries = transform.apply(entries);
    }

    let count = entries.len();
    write_injected_worker(options, &entries)?;
    debug!(count, size, "built precache manifest");

    Ok(InjectOutcome {
      count: Some(count),
      size: Some(size),
      warnings,
    })
  }
}

fn discover_files(
  options: &InjectManifestOptions,
  warnings: &mut Vec<String>,
) -> Result<Vec<DiscoveredFile>> {
  let root = &options.glob_directory;
  let mut files = Vec::new();

  let walker = WalkDir::new(root)
    .follow_links(options.glob_follow)
    .sort_by_file_name();
  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(err) if options.glob_strict => {
        return Err(err).with_context(|| format!("failed to scan {}", root.display()));
      }
      Err(err) => {
        let message = format!("skipping unreadable entry under {}: {err}", root.display());
        warn!("{message}");
        warnings.push(message);
        continue;
      }
    };

    if !entry.file_type().is_file() {
      continue;
    }

    let relative = relative_url(root, entry.path())?;
    let size = entry
      .metadata()
      .with_context(|| format!("failed to stat {}", entry.path().display()))?
      .len();
    files.push(DiscoveredFile {
      relative,
      path: entry.into_path(),
      size,
    });
  }

  Ok(files)
}

fn relative_url(root: &Path, path: &Path) -> Result<String> {
  let relative = path
    .strip_prefix(root)
    .map_err(|_| anyhow!("{} is outside {}", path.display(), root.display()))?;
  Ok(relative.to_string_lossy().replace('\\', "/"))
}

fn file_revision(path: &Path) -> Result<String> {
  let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

fn templated_revision(url: &str, source: &TemplatedUrl, files: &[DiscoveredFile]) -> Result<String> {
  match source {
    TemplatedUrl::Content(content) => Ok(hex::encode(Sha256::digest(content.as_bytes()))),
    TemplatedUrl::Globs(patterns) => {
      let globs = GlobSet::new(patterns, &[])?;
      let mut hasher = Sha256::new();
      let mut matched = false;
      for file in files.iter().filter(|file| globs.is_match(&file.relative)) {
        hasher.update(file_revision(&file.path)?.as_bytes());
        matched = true;
      }
      if !matched {
        bail!("templated URL `{url}` did not match any files for {patterns:?}");
      }
      Ok(hex::encode(hasher.finalize()))
    }
  }
}

fn modify_url_prefix(url: &str, options: &InjectManifestOptions) -> String {
  let mut url = url.to_string();
  for (prefix, replacement) in &options.modify_url_prefix {
    if let Some(rest) = url.strip_prefix(prefix.as_str()) {
      url = format!("{replacement}{rest}");
    }
  }
  url
}

fn write_injected_worker(options: &InjectManifestOptions, entries: &[ManifestEntry]) -> Result<()> {
  let template = fs::read_to_string(&options.sw_src)
    .with_context(|| format!("failed to read {}", options.sw_src.display()))?;
  if !injection_point().is_match(&template) {
    bail!(
      "unable to find the injection point `precache([])` in {}",
      options.sw_src.display()
    );
  }

  let manifest = serde_json::to_string(entries)?;
  let injected = injection_point().replace(&template, |caps: &Captures| {
    format!("{}{}{}", &caps[1], manifest, &caps[2])
  });

  if let Some(parent) = options.sw_dest.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::write(&options.sw_dest, injected.as_bytes())
    .with_context(|| format!("failed to write {}", options.sw_dest.display()))
}
