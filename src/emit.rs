//! Emit vendored runtime files into the build output under content-hashed names.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::host::BuildHost;
use crate::options::ResolvedOptions;
use crate::urls::join_url;

const HASH_LENGTH: usize = 8;

/// Short content hash used in emitted file names.
///
/// Depends only on the bytes, so unchanged inputs keep their URL across builds.
pub fn content_hash(bytes: &[u8]) -> String {
  let digest = Sha256::digest(bytes);
  let mut encoded = hex::encode(digest);
  encoded.truncate(HASH_LENGTH);
  encoded
}

/// Asset read during option resolution and written once the build completes.
#[derive(Debug, Clone)]
struct PendingAsset {
  source: Vec<u8>,
  file_name: String,
}

/// Collects assets to copy into the client build directory.
#[derive(Debug, Default)]
pub struct AssetEmitter {
  assets: Vec<PendingAsset>,
}

impl AssetEmitter {
  /// Create an emitter with nothing queued.
  pub fn new() -> Self {
    Self::default()
  }

  /// Read `path` and queue it as `<name>.<hash>.<ext>`, returning the hashed file name.
  pub fn emit(&mut self, path: &Path, name: &str, ext: &str) -> Result<String> {
    let source =
      fs::read(path).with_context(|| format!("failed to read asset {}", path.display()))?;
    let file_name = format!("{name}.{}.{ext}", content_hash(&source));
    self.assets.push(PendingAsset {
      source,
      file_name: file_name.clone(),
    });
    Ok(file_name)
  }

  /// Number of queued assets.
  pub fn len(&self) -> usize {
    self.assets.len()
  }

  /// Whether nothing has been queued.
  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }

  /// Copy the queued assets into the client build directory once the build completes.
  ///
  /// The directory is looked up when the hook runs; it usually does not exist yet when the
  /// assets are queued.
  pub fn schedule(self, host: &mut BuildHost) {
    let assets = self.assets;
    host.scheduler.on_build_complete(Box::new(move |host: &mut BuildHost| {
      let out_dir = host.project.client_build_dir();
      fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
      for asset in assets {
        let target = out_dir.join(&asset.file_name);
        fs::write(&target, &asset.source)
          .with_context(|| format!("failed to write {}", target.display()))?;
        info!(path = %target.display(), "emitted asset");
      }
      Ok(())
    }));
  }
}

/// Queue the workbox runtime script and return its public URL.
pub fn emit_runtime_script(
  host: &mut BuildHost,
  options: &ResolvedOptions,
) -> Result<String> {
  let mut runtime_path = host.aliases.resolve_alias(&options.runtime_script);
  if options.dev
    && let Some(file_name) = runtime_path.file_name().and_then(|name| name.to_str())
  {
    let dev_name = file_name.replace("prod", "dev");
    runtime_path.set_file_name(dev_name);
  }
  let name = if options.dev { "workbox.dev" } else { "workbox" };

  let mut emitter = AssetEmitter::new();
  let file_name = emitter.emit(&runtime_path, name, "js")?;
  emitter.schedule(host);

  Ok(join_url(&options.public_path, &file_name))
}
