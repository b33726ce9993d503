//! Resolve configured cache entries into public URLs.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::asset_paths::{
  absolute_path, append_query, expand_pattern, has_network_location, split_query, to_public_url,
};
use crate::error::{ManifestError, ManifestResult};
use crate::models::ResolvedAsset;
use crate::project::AppcacheSettings;

/// Expands media-relative entries against the media root and passes verbatim entries through.
#[derive(Debug)]
pub struct PathResolver<'a> {
  settings: &'a AppcacheSettings,
  media_root: PathBuf,
}

impl<'a> PathResolver<'a> {
  /// Create a resolver, anchoring the media root to an absolute path.
  pub fn new(settings: &'a AppcacheSettings) -> ManifestResult<Self> {
    let media_root = absolute_path(&settings.media_root)
      .map_err(|err| ManifestError::io(&settings.media_root, err))?;
    Ok(Self {
      settings,
      media_root,
    })
  }

  /// Absolute media root every local entry lives under.
  pub fn media_root(&self) -> &Path {
    &self.media_root
  }

  /// Resolve every configured entry, media-relative entries first.
  pub fn resolve(&self) -> ManifestResult<Vec<ResolvedAsset>> {
    let mut assets = self.resolve_media_entries()?;
    assets.extend(self.resolve_verbatim_entries()?);
    Ok(assets)
  }

  /// Resolve the media-relative entries in configured order.
  ///
  /// Every entry is validated before the filesystem is consulted, so an absolute URL fails
  /// the build without any I/O.
  pub fn resolve_media_entries(&self) -> ManifestResult<Vec<ResolvedAsset>> {
    let entries = self.settings.media_to_cache.resolve()?;

    if let Some(entry) = entries.iter().find(|entry| has_network_location(entry)) {
      return Err(ManifestError::Configuration {
        entry: entry.clone(),
      });
    }

    let mut assets = Vec::new();
    for entry in &entries {
      let (pattern, query) = split_query(entry);
      let matches = expand_pattern(&self.media_root, pattern)?;
      if matches.is_empty() {
        warn!(entry = %entry, "media pattern matched no files");
      }

      for path in matches {
        if !path.exists() {
          return Err(ManifestError::MissingFile {
            fragment: entry.clone(),
            attempted: path,
          });
        }

        let url = to_public_url(&self.media_root, &self.settings.media_url, &path)?;
        let url = append_query(url, query);
        debug!(url = %url, path = %path.display(), "resolved media entry");
        assets.push(ResolvedAsset::local(url, path));
      }
    }

    Ok(assets)
  }

  /// Pass the verbatim entries through untouched.
  pub fn resolve_verbatim_entries(&self) -> ManifestResult<Vec<ResolvedAsset>> {
    Ok(
      self
        .settings
        .to_cache
        .resolve()?
        .into_iter()
        .map(ResolvedAsset::verbatim)
        .collect(),
    )
  }
}
