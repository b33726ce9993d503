//! Resolved build settings shared by every stage of a manifest build.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ManifestError, ManifestResult};

type Producer = Arc<dyn Fn() -> Result<Vec<String>, String> + Send + Sync>;

/// A configured list of paths, either spelled out or produced on demand.
///
/// Lazy sources are evaluated once at the start of every build, so they can reflect files
/// generated after the process started.
#[derive(Clone)]
pub enum PathSource {
  /// Entries known up front.
  Literal(Vec<String>),
  /// Entries computed by a callback each time a build runs.
  Lazy(Producer),
}

impl PathSource {
  /// Build a lazy source from a producer callback.
  pub fn lazy<F>(producer: F) -> Self
  where
    F: Fn() -> Result<Vec<String>, String> + Send + Sync + 'static,
  {
    Self::Lazy(Arc::new(producer))
  }

  /// Evaluate the source, yielding its entries in order.
  pub fn resolve(&self) -> ManifestResult<Vec<String>> {
    match self {
      Self::Literal(entries) => Ok(entries.clone()),
      Self::Lazy(producer) => producer().map_err(ManifestError::Source),
    }
  }
}

impl Default for PathSource {
  fn default() -> Self {
    Self::Literal(Vec::new())
  }
}

impl From<Vec<String>> for PathSource {
  fn from(entries: Vec<String>) -> Self {
    Self::Literal(entries)
  }
}

impl From<Vec<&str>> for PathSource {
  fn from(entries: Vec<&str>) -> Self {
    Self::Literal(entries.into_iter().map(str::to_string).collect())
  }
}

impl fmt::Debug for PathSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Literal(entries) => f.debug_tuple("Literal").field(entries).finish(),
      Self::Lazy(_) => f.write_str("Lazy(..)"),
    }
  }
}

/// Everything a build needs, constructed once and passed by reference.
#[derive(Debug, Clone)]
pub struct AppcacheSettings {
  /// Directory backing the public media files.
  pub media_root: PathBuf,
  /// Public URL prefix mapped onto `media_root`.
  pub media_url: String,
  /// Entries relative to `media_root`, wildcards allowed.
  pub media_to_cache: PathSource,
  /// Pre-formed URLs added to the cache section verbatim.
  pub to_cache: PathSource,
  /// Patterns that always require the network.
  pub net_paths: PathSource,
  /// Request pattern to offline substitute.
  pub fallback_paths: BTreeMap<String, String>,
  /// Custom template file; the built-in template is used when unset.
  pub template: Option<PathBuf>,
  /// Where the rendered manifest is written.
  pub file_path: PathBuf,
  /// Public URL serving the manifest when it is not served by this crate.
  pub url: Option<String>,
  /// Route used by the built-in server.
  pub serve_route: String,
}

impl AppcacheSettings {
  /// Settings for `media_root` mapped to `media_url` with every other value defaulted.
  pub fn new(media_root: impl Into<PathBuf>, media_url: impl Into<String>) -> Self {
    let media_root = media_root.into();
    let file_path = media_root.join(DEFAULT_MANIFEST_FILE);
    Self {
      media_root,
      media_url: media_url.into(),
      media_to_cache: PathSource::default(),
      to_cache: PathSource::default(),
      net_paths: PathSource::from(vec!["*"]),
      fallback_paths: BTreeMap::new(),
      template: None,
      file_path,
      url: None,
      serve_route: DEFAULT_SERVE_ROUTE.to_string(),
    }
  }

  /// Replace the media-relative cache entries.
  pub fn with_media_to_cache(mut self, source: impl Into<PathSource>) -> Self {
    self.media_to_cache = source.into();
    self
  }

  /// Replace the verbatim cache entries.
  pub fn with_to_cache(mut self, source: impl Into<PathSource>) -> Self {
    self.to_cache = source.into();
    self
  }

  /// Replace the network-only patterns.
  pub fn with_net_paths(mut self, source: impl Into<PathSource>) -> Self {
    self.net_paths = source.into();
    self
  }

  /// Add one fallback pair.
  pub fn with_fallback(mut self, pattern: impl Into<String>, fallback: impl Into<String>) -> Self {
    self.fallback_paths.insert(pattern.into(), fallback.into());
    self
  }

  /// Write the manifest to `path`.
  pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.file_path = path.into();
    self
  }

  /// Render through the template at `path`.
  pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
    self.template = Some(path.into());
    self
  }

  /// Destination of the rendered manifest.
  pub fn file_path(&self) -> &Path {
    &self.file_path
  }
}

/// File name used when no manifest path is configured.
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.appcache";

/// Route served by the built-in server when none is configured.
pub const DEFAULT_SERVE_ROUTE: &str = "/manifest.appcache";
