//! Manifest rendering broken into focused submodules for easier testing.

mod sections;
mod template;
mod version;

use chrono::{DateTime, Utc};

pub use template::{MANIFEST_HEADER, ManifestRenderer, PlaceholderTemplate, RenderContext};
pub use version::{build_version, next_build_time, parse_build_version};

use crate::error::{ManifestError, ManifestResult};
use crate::models::{Manifest, ManifestSections};
use crate::project::AppcacheSettings;

/// Render `sections` into a manifest stamped with `now`.
pub fn render_manifest(
  sections: ManifestSections,
  now: DateTime<Utc>,
  renderer: &dyn ManifestRenderer,
  settings: &AppcacheSettings,
) -> ManifestResult<Manifest> {
  let build_version = build_version(now);
  let context = RenderContext {
    build_version: &build_version,
    cache_paths: sections.cache_block(),
    network_paths: sections.network_block(),
    fallback_paths: sections.fallback_block(),
  };

  let content = renderer.render(&context, settings)?;
  if !content.starts_with(MANIFEST_HEADER) {
    return Err(ManifestError::Template(format!(
      "rendered manifest must start with {MANIFEST_HEADER:?}"
    )));
  }

  Ok(Manifest {
    build_version,
    sections,
    content,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use std::collections::BTreeMap;

  #[test]
  fn renders_sections_through_the_template() {
    let settings = AppcacheSettings::new("/media", "/static");
    let sections = ManifestSections::assemble(
      vec!["/static/app.css".into()],
      vec!["/static/logo.png".to_string()],
      vec!["*".into()],
      BTreeMap::from([("/".to_string(), "/offline.html".to_string())]),
    );
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let manifest =
      render_manifest(sections, now, &PlaceholderTemplate::builtin(), &settings).unwrap();

    assert_eq!(manifest.build_version, "2024-05-01 12:00:00+0000");
    assert!(manifest.content.contains("/static/app.css\n/static/logo.png"));
    assert!(manifest.content.contains("FALLBACK:\n/ /offline.html"));
  }

  #[test]
  fn rejects_output_without_header() {
    let settings = AppcacheSettings::new("/media", "/static");
    let template = PlaceholderTemplate::from_source("CACHE:\n{{ cache_paths }}\n");
    let err = render_manifest(ManifestSections::default(), Utc::now(), &template, &settings)
      .unwrap_err();
    assert!(matches!(err, ManifestError::Template(_)));
  }
}
