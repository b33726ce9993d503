//! Assembling and flattening the manifest sections.

use std::collections::BTreeMap;

use crate::models::ManifestSections;

impl ManifestSections {
  /// Assemble the sections of one build.
  ///
  /// Explicit entries keep their configured order and are followed by the discovered
  /// stylesheet assets. The two lists are concatenated as-is: an asset listed explicitly and
  /// also referenced from a stylesheet appears twice.
  pub fn assemble<I>(
    explicit: Vec<String>,
    discovered: I,
    network_paths: Vec<String>,
    fallback_pairs: BTreeMap<String, String>,
  ) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    let mut cache_paths = explicit;
    cache_paths.extend(discovered);
    Self {
      cache_paths,
      network_paths,
      fallback_pairs,
    }
  }

  /// Cache entries, one per line.
  pub fn cache_block(&self) -> String {
    self.cache_paths.join("\n")
  }

  /// Network-only patterns, one per line.
  pub fn network_block(&self) -> String {
    self.network_paths.join("\n")
  }

  /// `<request-pattern> <fallback-path>` lines in key order.
  pub fn fallback_block(&self) -> String {
    self
      .fallback_pairs
      .iter()
      .map(|(pattern, fallback)| format!("{pattern} {fallback}"))
      .collect::<Vec<_>>()
      .join("\n")
  }
}
