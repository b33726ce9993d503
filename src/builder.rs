//! Manifest build orchestrator tying resolution, stylesheet scanning and rendering together.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::ManifestResult;
use crate::manifest::{
  ManifestRenderer, PlaceholderTemplate, next_build_time, parse_build_version, render_manifest,
};
use crate::models::{Manifest, ManifestSections, local_files};
use crate::project::AppcacheSettings;
use crate::resolver::PathResolver;
use crate::store::ManifestStore;
use crate::styles::StylesheetScanner;

/// High-level helper producing a cache manifest from the configured settings.
pub struct ManifestBuilder<'a> {
  settings: &'a AppcacheSettings,
  renderer: Option<Box<dyn ManifestRenderer + 'a>>,
}

impl<'a> ManifestBuilder<'a> {
  /// Create a builder rendering through the configured template.
  pub fn new(settings: &'a AppcacheSettings) -> Self {
    Self {
      settings,
      renderer: None,
    }
  }

  /// Render through `renderer` instead of the configured template.
  pub fn with_renderer<R>(mut self, renderer: R) -> Self
  where
    R: ManifestRenderer + 'a,
  {
    self.renderer = Some(Box::new(renderer));
    self
  }

  /// Build a manifest stamped with the current time.
  ///
  /// Every build in a process gets a later stamp than the one before it.
  pub fn build(&self) -> ManifestResult<Manifest> {
    self.build_at(next_build_time(Utc::now(), None))
  }

  /// Build a manifest stamped with `now`.
  pub fn build_at(&self, now: DateTime<Utc>) -> ManifestResult<Manifest> {
    let sections = self.collect_sections()?;

    let manifest = match &self.renderer {
      Some(renderer) => render_manifest(sections, now, renderer.as_ref(), self.settings)?,
      None => {
        let template = PlaceholderTemplate::for_settings(self.settings)?;
        render_manifest(sections, now, &template, self.settings)?
      }
    };

    info!(
      version = %manifest.build_version,
      entries = manifest.sections.cache_paths.len(),
      "built manifest"
    );
    Ok(manifest)
  }

  /// Build the manifest and write it to the configured file.
  ///
  /// The new stamp is always later than the one in the manifest being replaced.
  pub fn build_and_store(&self) -> ManifestResult<Manifest> {
    let store = ManifestStore::new(self.settings.file_path());
    let previous = store
      .read()?
      .and_then(|bytes| parse_build_version(&String::from_utf8_lossy(&bytes)));
    let manifest = self.build_at(next_build_time(Utc::now(), previous))?;
    store.write(&manifest.content)?;
    info!(path = %store.path().display(), "wrote manifest");
    Ok(manifest)
  }

  /// Resolve every configured source into the three manifest sections.
  pub fn collect_sections(&self) -> ManifestResult<ManifestSections> {
    let resolver = PathResolver::new(self.settings)?;
    let resolved = resolver.resolve()?;

    let scanner = StylesheetScanner::new(resolver.media_root(), &self.settings.media_url);
    let discovered = scanner.collect_assets(&local_files(&resolved))?;

    Ok(ManifestSections::assemble(
      resolved.into_iter().map(|asset| asset.url_path).collect(),
      discovered,
      self.settings.net_paths.resolve()?,
      self.settings.fallback_paths.clone(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ManifestError;
  use crate::manifest::RenderContext;
  use chrono::TimeZone;
  use std::fs;
  use std::path::Path;
  use tempfile::tempdir;

  fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn caches_stylesheets_and_the_images_they_reference() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("app.css"), "body { background: url(logo.png) }");
    write_file(&root.join("logo.png"), "png");

    let settings = AppcacheSettings::new(root, "/static").with_media_to_cache(vec!["app.css"]);
    let sections = ManifestBuilder::new(&settings).collect_sections().unwrap();

    assert_eq!(sections.cache_paths, vec!["/static/app.css", "/static/logo.png"]);
    assert_eq!(sections.network_paths, vec!["*"]);
  }

  #[test]
  fn verbatim_entries_follow_media_entries_and_precede_discoveries() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("app.css"), ".a { background: url(a.png) }");
    write_file(&root.join("a.png"), "");

    let settings = AppcacheSettings::new(root, "/static/")
      .with_media_to_cache(vec!["app.css"])
      .with_to_cache(vec!["http://other.example/include.js"]);
    let sections = ManifestBuilder::new(&settings).collect_sections().unwrap();

    assert_eq!(
      sections.cache_paths,
      vec!["/static/app.css", "http://other.example/include.js", "/static/a.png"]
    );
  }

  #[test]
  fn consecutive_rebuilds_differ_only_in_version() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("app.js"), "");
    let settings = AppcacheSettings::new(dir.path(), "/static/")
      .with_media_to_cache(vec!["app.js"])
      .with_fallback("/", "/offline.html");
    let builder = ManifestBuilder::new(&settings);

    let first = builder.build_and_store().unwrap();
    let second = builder.build_and_store().unwrap();

    assert_ne!(first.build_version, second.build_version);
    assert_ne!(first.content, second.content);
    assert_eq!(first.sections, second.sections);
    assert_eq!(fs::read_to_string(settings.file_path()).unwrap(), second.content);
  }

  #[test]
  fn rebuilds_move_past_the_stored_stamp() {
    let dir = tempdir().unwrap();
    let settings = AppcacheSettings::new(dir.path(), "/static/");
    let stored = Utc::now() + chrono::Duration::seconds(2);
    write_file(
      settings.file_path(),
      &format!("CACHE MANIFEST\n# version {}\n", crate::manifest::build_version(stored)),
    );

    let manifest = ManifestBuilder::new(&settings).build_and_store().unwrap();
    let stamped = parse_build_version(&manifest.content).unwrap();
    assert!(stamped > stored);
  }

  #[test]
  fn custom_renderers_receive_the_blocks() {
    let dir = tempdir().unwrap();
    let settings = AppcacheSettings::new(dir.path(), "/static/")
      .with_net_paths(vec!["/api/", "/login"])
      .with_fallback("/", "/offline.html");

    let manifest = ManifestBuilder::new(&settings)
      .with_renderer(|ctx: &RenderContext<'_>, _: &AppcacheSettings| -> ManifestResult<String> {
        Ok(format!(
          "CACHE MANIFEST\n[{}]\n[{}]\n[{}]\n",
          ctx.cache_paths, ctx.network_paths, ctx.fallback_paths
        ))
      })
      .build()
      .unwrap();

    assert_eq!(manifest.content, "CACHE MANIFEST\n[]\n[/api/\n/login]\n[/ /offline.html]\n");
  }

  #[test]
  fn custom_template_files_are_loaded() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("custom.appcache");
    write_file(&template, "CACHE MANIFEST\n# custom {{ build_version }}\n");
    let settings = AppcacheSettings::new(dir.path(), "/static/").with_template(&template);

    let manifest = ManifestBuilder::new(&settings)
      .build_at(Utc.with_ymd_and_hms(2024, 2, 2, 2, 2, 2).unwrap())
      .unwrap();
    assert_eq!(manifest.content, "CACHE MANIFEST\n# custom 2024-02-02 02:02:02+0000\n");
  }

  #[test]
  fn failed_builds_leave_the_previous_manifest_untouched() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("manifest.appcache");
    write_file(&output, "CACHE MANIFEST\n# previous\n");

    let settings = AppcacheSettings::new(dir.path(), "/static/")
      .with_media_to_cache(vec!["missing.css"])
      .with_file_path(&output);
    let err = ManifestBuilder::new(&settings).build_and_store().unwrap_err();

    assert!(matches!(err, ManifestError::MissingFile { .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "CACHE MANIFEST\n# previous\n");
  }

  #[test]
  fn stores_the_rendered_manifest() {
    let dir = tempdir().unwrap();
    let settings = AppcacheSettings::new(dir.path(), "/static/");
    let manifest = ManifestBuilder::new(&settings).build_and_store().unwrap();

    let written = fs::read_to_string(settings.file_path()).unwrap();
    assert_eq!(written, manifest.content);
    assert!(written.starts_with("CACHE MANIFEST"));
  }
}
