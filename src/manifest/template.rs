//! Manifest rendering through a pluggable template.

use std::fs;
use std::path::Path;

use regex::{Captures, Regex};

use crate::error::{ManifestError, ManifestResult};
use crate::project::AppcacheSettings;

/// Header line every cache manifest must start with.
pub const MANIFEST_HEADER: &str = "CACHE MANIFEST";

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/manifest.appcache");

/// Values handed to a renderer for one build.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
  /// UTC build stamp.
  pub build_version: &'a str,
  /// Cache entries, one per line.
  pub cache_paths: String,
  /// Network-only patterns, one per line.
  pub network_paths: String,
  /// `<pattern> <fallback>` lines.
  pub fallback_paths: String,
}

/// Turns a render context into manifest text.
pub trait ManifestRenderer {
  /// Render the manifest document.
  fn render(&self, context: &RenderContext<'_>, settings: &AppcacheSettings) -> ManifestResult<String>;
}

impl<F> ManifestRenderer for F
where
  F: Fn(&RenderContext<'_>, &AppcacheSettings) -> ManifestResult<String>,
{
  fn render(&self, context: &RenderContext<'_>, settings: &AppcacheSettings) -> ManifestResult<String> {
    self(context, settings)
  }
}

fn placeholder_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("invalid placeholder regex")
  })
}

/// Template with `{{ name }}` placeholders.
///
/// Recognised placeholders are `build_version`, `cache_paths`, `network_paths`,
/// `fallback_paths` and `media_url`.
#[derive(Debug, Clone)]
pub struct PlaceholderTemplate {
  source: String,
}

impl PlaceholderTemplate {
  /// The template shipped with the crate.
  pub fn builtin() -> Self {
    Self::from_source(BUILTIN_TEMPLATE)
  }

  /// Wrap template text.
  pub fn from_source(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
    }
  }

  /// Read a template file.
  pub fn load(path: &Path) -> ManifestResult<Self> {
    let source = fs::read_to_string(path).map_err(|err| ManifestError::io(path, err))?;
    Ok(Self::from_source(source))
  }

  /// The configured template, or the built-in one.
  pub fn for_settings(settings: &AppcacheSettings) -> ManifestResult<Self> {
    match &settings.template {
      Some(path) => Self::load(path),
      None => Ok(Self::builtin()),
    }
  }
}

impl ManifestRenderer for PlaceholderTemplate {
  fn render(&self, context: &RenderContext<'_>, settings: &AppcacheSettings) -> ManifestResult<String> {
    let mut unknown = None;
    let rendered = placeholder_pattern().replace_all(&self.source, |caps: &Captures<'_>| {
      match &caps[1] {
        "build_version" => context.build_version.to_string(),
        "cache_paths" => context.cache_paths.clone(),
        "network_paths" => context.network_paths.clone(),
        "fallback_paths" => context.fallback_paths.clone(),
        "media_url" => settings.media_url.clone(),
        other => {
          unknown.get_or_insert_with(|| other.to_string());
          String::new()
        }
      }
    });

    match unknown {
      Some(name) => Err(ManifestError::Template(format!("unknown placeholder {{{{ {name} }}}}"))),
      None => Ok(rendered.into_owned()),
    }
  }
}
