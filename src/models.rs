//! Data structures produced while building a cache manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A cache entry produced by the path resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// Public URL, including any query string that was configured.
  pub url_path: String,
  /// File backing the URL; only present for entries resolved below the media root.
  pub absolute_file_path: Option<PathBuf>,
}

impl ResolvedAsset {
  /// An entry backed by a file below the media root.
  pub fn local(url_path: String, absolute_file_path: PathBuf) -> Self {
    Self {
      url_path,
      absolute_file_path: Some(absolute_file_path),
    }
  }

  /// A pre-formed entry with no local file.
  pub fn verbatim(url_path: String) -> Self {
    Self {
      url_path,
      absolute_file_path: None,
    }
  }
}

/// Files backing the locally resolved entries, in resolution order.
pub fn local_files(assets: &[ResolvedAsset]) -> Vec<&Path> {
  assets
    .iter()
    .filter_map(|asset| asset.absolute_file_path.as_deref())
    .collect()
}

/// The three sections of a cache manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSections {
  /// Explicit media paths, then verbatim entries, then stylesheet assets.
  pub cache_paths: Vec<String>,
  /// Patterns that always require the network.
  pub network_paths: Vec<String>,
  /// Request pattern to offline substitute, rendered in key order.
  pub fallback_pairs: BTreeMap<String, String>,
}

/// A freshly rendered manifest document.
#[derive(Debug, Clone)]
pub struct Manifest {
  /// UTC stamp identifying this build.
  pub build_version: String,
  /// Section contents the document was rendered from.
  pub sections: ManifestSections,
  /// Rendered manifest text.
  pub content: String,
}
