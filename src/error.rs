//! Error taxonomy for manifest builds.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every build stage.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Failures that abort a manifest build.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// A media-relative entry names an absolute URL with a network location.
  #[error("media path {entry:?} must be relative to the media root, not an absolute URL")]
  Configuration {
    /// Entry exactly as configured.
    entry: String,
  },

  /// A configured or expanded media path is not present on disk.
  #[error("media root path {fragment:?} does not exist at {}", attempted.display())]
  MissingFile {
    /// Fragment exactly as configured.
    fragment: String,
    /// Absolute filesystem path that was checked.
    attempted: PathBuf,
  },

  /// A stylesheet references a local asset that is not present on disk.
  #[error(
    "asset {reference:?} referenced from {} does not exist at {}",
    stylesheet.display(),
    attempted.display()
  )]
  AssetNotFound {
    /// Value found inside `url(...)`.
    reference: String,
    /// Stylesheet containing the reference.
    stylesheet: PathBuf,
    /// Absolute filesystem path that was checked.
    attempted: PathBuf,
  },

  /// A resolved file lives outside the media root and has no public URL.
  #[error("{} is outside the media root {}", path.display(), root.display())]
  OutsideMediaRoot {
    /// Resolved filesystem path.
    path: PathBuf,
    /// Configured media root.
    root: PathBuf,
  },

  /// A wildcard entry could not be compiled into a matcher.
  #[error("invalid wildcard pattern {pattern:?}: {source}")]
  InvalidPattern {
    /// Pattern exactly as configured.
    pattern: String,
    /// Underlying matcher error.
    source: globset::Error,
  },

  /// The manifest template could not be loaded or rendered.
  #[error("template error: {0}")]
  Template(String),

  /// A lazy path source failed to produce its entries.
  #[error("path source failed: {0}")]
  Source(String),

  /// Filesystem access failed.
  #[error("failed to access {}: {source}", path.display())]
  Io {
    /// Path being read or written.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
}

impl ManifestError {
  /// Wrap an I/O error together with the path that produced it.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
