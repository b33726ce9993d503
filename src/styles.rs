//! Discover assets referenced from stylesheets so they are cached alongside them.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::asset_paths::{
  append_query, from_public_url, is_external_asset, is_inline_data, normalize_path, split_query,
  to_public_url,
};
use crate::error::{ManifestError, ManifestResult};

fn url_reference_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)url\(\s*['"]?(.*?)['"]?\s*\)"#).expect("invalid url() regex")
  })
}

/// Collect every value written inside `url(...)` in a stylesheet, in source order.
pub fn collect_url_references(css: &str) -> Vec<&str> {
  url_reference_pattern()
    .captures_iter(css)
    .filter_map(|caps| caps.get(1))
    .map(|value| value.as_str().trim())
    .filter(|value| !value.is_empty())
    .collect()
}

/// Returns `true` for files carrying the stylesheet extension.
pub fn is_stylesheet(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|extension| extension.eq_ignore_ascii_case("css"))
}

/// Scans stylesheets below a media root for the images they reference.
#[derive(Debug, Clone, Copy)]
pub struct StylesheetScanner<'a> {
  media_root: &'a Path,
  media_url: &'a str,
}

impl<'a> StylesheetScanner<'a> {
  /// Create a scanner translating files below `media_root` to URLs under `media_url`.
  pub fn new(media_root: &'a Path, media_url: &'a str) -> Self {
    Self {
      media_root,
      media_url,
    }
  }

  /// Return the distinct URLs referenced by the stylesheets among `candidates`.
  ///
  /// Non-stylesheet candidates are ignored. Local references must exist on disk; a missing
  /// one fails the whole scan.
  pub fn collect_assets<P: AsRef<Path>>(&self, candidates: &[P]) -> ManifestResult<BTreeSet<String>> {
    let mut assets = BTreeSet::new();

    for candidate in candidates {
      let stylesheet: &Path = candidate.as_ref();
      if !is_stylesheet(stylesheet) {
        continue;
      }

      let bytes = fs::read(stylesheet).map_err(|err| ManifestError::io(stylesheet, err))?;
      let css = String::from_utf8_lossy(&bytes);

      for reference in collect_url_references(&css) {
        if let Some(url) = self.resolve_reference(stylesheet, reference)? {
          assets.insert(url);
        }
      }
      debug!(stylesheet = %stylesheet.display(), total = assets.len(), "scanned stylesheet");
    }

    Ok(assets)
  }

  fn resolve_reference(&self, stylesheet: &Path, reference: &str) -> ManifestResult<Option<String>> {
    if is_inline_data(reference) {
      return Ok(None);
    }

    if is_external_asset(reference) {
      return Ok(Some(reference.to_string()));
    }

    let (path, query) = split_query(reference);
    let path = path.split_once('#').map_or(path, |(path, _)| path);
    let resolved = self.locate(stylesheet, path);

    if !resolved.is_file() {
      return Err(ManifestError::AssetNotFound {
        reference: reference.to_string(),
        stylesheet: stylesheet.to_path_buf(),
        attempted: resolved,
      });
    }

    let url = to_public_url(self.media_root, self.media_url, &resolved)?;
    Ok(Some(append_query(url, query)))
  }

  fn locate(&self, stylesheet: &Path, path: &str) -> PathBuf {
    if path.starts_with('/') {
      if let Some(file) = from_public_url(self.media_root, self.media_url, path) {
        return normalize_path(&file);
      }
      return PathBuf::from(path);
    }

    let directory = stylesheet.parent().unwrap_or(self.media_root);
    normalize_path(&directory.join(path))
  }
}
