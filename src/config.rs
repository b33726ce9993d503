//! Configuration file describing what goes into the manifest and where it is written.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::project::{AppcacheSettings, DEFAULT_MANIFEST_FILE, DEFAULT_SERVE_ROUTE, PathSource};

const CONFIG_CANDIDATES: [&str; 3] = [
  "appcache.config.json",
  "appcache.config.yaml",
  "appcache.config.yml",
];

/// Serialised configuration, every field optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppcacheConfig {
  /// Directory backing the public media files.
  pub media_root: PathBuf,
  /// Public URL prefix mapped onto `media_root`.
  pub media_url: String,
  /// Paths relative to `media_root` to cache; wildcards are expanded.
  pub media_to_cache: Vec<String>,
  /// Pre-formed URLs added to the cache section as-is.
  pub to_cache: Vec<String>,
  /// Patterns that always require the network.
  pub net_paths: Vec<String>,
  /// Request pattern to offline substitute.
  pub fallback_paths: BTreeMap<String, String>,
  /// Custom template file.
  pub template: Option<PathBuf>,
  /// Where the manifest is written; defaults to `manifest.appcache` in the media root.
  pub file_path: Option<PathBuf>,
  /// Public URL of the manifest when it is served elsewhere.
  pub url: Option<String>,
  /// Built-in server options.
  pub serve: ServeConfig,
}

/// Options for the built-in server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
  /// Socket address to listen on.
  pub address: String,
  /// Route the manifest is served at.
  pub route: String,
  /// Seconds a read manifest is kept in memory.
  pub cache_ttl_secs: u64,
}

impl Default for AppcacheConfig {
  fn default() -> Self {
    Self {
      media_root: PathBuf::from("media"),
      media_url: "/media/".into(),
      media_to_cache: Vec::new(),
      to_cache: Vec::new(),
      net_paths: vec!["*".into()],
      fallback_paths: BTreeMap::new(),
      template: None,
      file_path: None,
      url: None,
      serve: ServeConfig::default(),
    }
  }
}

impl Default for ServeConfig {
  fn default() -> Self {
    Self {
      address: "127.0.0.1:8000".into(),
      route: DEFAULT_SERVE_ROUTE.into(),
      cache_ttl_secs: crate::serve::DEFAULT_CACHE_TTL.as_secs(),
    }
  }
}

impl ServeConfig {
  /// Response cache lifetime.
  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache_ttl_secs)
  }
}

/// A loaded configuration together with the directory relative paths are anchored to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
  /// Parsed configuration.
  pub config: AppcacheConfig,
  /// Directory containing the configuration file.
  pub base_dir: PathBuf,
  /// File the configuration came from, if any.
  pub source: Option<PathBuf>,
}

impl AppcacheConfig {
  /// Look for a configuration file in `dir`.
  ///
  /// When no candidate file exists the defaults are used; a file that exists but fails to
  /// parse is an error.
  pub fn discover(dir: &Path) -> Result<LoadedConfig> {
    for name in CONFIG_CANDIDATES {
      let candidate = dir.join(name);
      if candidate.is_file() {
        return Self::load(&candidate);
      }
    }

    Ok(LoadedConfig {
      config: Self::default(),
      base_dir: dir.to_path_buf(),
      source: None,
    })
  }

  /// Read configuration from a specific JSON or YAML file.
  pub fn load(path: &Path) -> Result<LoadedConfig> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config = Self::parse(path, &content)?;
    let base_dir = path
      .parent()
      .filter(|parent| !parent.as_os_str().is_empty())
      .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    Ok(LoadedConfig {
      config,
      base_dir,
      source: Some(path.to_path_buf()),
    })
  }

  fn parse(path: &Path, content: &str) -> Result<Self> {
    let extension = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);

    match extension.as_deref() {
      Some("json") => serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON config at {}", path.display())),
      Some("yaml") | Some("yml") => serde_yaml::from_str(content)
        .with_context(|| format!("failed to parse YAML config at {}", path.display())),
      _ => bail!(
        "unsupported config format for {}; use .json, .yaml or .yml",
        path.display()
      ),
    }
  }

  /// Convert into build settings, anchoring relative paths at `base_dir`.
  pub fn to_settings(&self, base_dir: &Path) -> AppcacheSettings {
    let media_root = base_dir.join(&self.media_root);
    let file_path = match &self.file_path {
      Some(path) => base_dir.join(path),
      None => media_root.join(DEFAULT_MANIFEST_FILE),
    };

    AppcacheSettings {
      media_root,
      media_url: self.media_url.clone(),
      media_to_cache: PathSource::Literal(self.media_to_cache.clone()),
      to_cache: PathSource::Literal(self.to_cache.clone()),
      net_paths: PathSource::Literal(self.net_paths.clone()),
      fallback_paths: self.fallback_paths.clone(),
      template: self.template.as_ref().map(|path| base_dir.join(path)),
      file_path,
      url: self.url.clone(),
      serve_route: self.serve.route.clone(),
    }
  }
}

impl LoadedConfig {
  /// Build settings for this configuration.
  pub fn settings(&self) -> AppcacheSettings {
    self.config.to_settings(&self.base_dir)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn missing_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let loaded = AppcacheConfig::discover(dir.path()).unwrap();

    assert!(loaded.source.is_none());
    let settings = loaded.settings();
    assert_eq!(settings.media_root, dir.path().join("media"));
    assert_eq!(settings.file_path, dir.path().join("media/manifest.appcache"));
    assert_eq!(settings.net_paths.resolve().unwrap(), vec!["*".to_string()]);
    assert_eq!(settings.serve_route, "/manifest.appcache");
  }

  #[test]
  fn parses_json_and_anchors_paths() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join("appcache.config.json"),
      r#"{
        "media_root": "public",
        "media_url": "/static/",
        "media_to_cache": ["css/*.css"],
        "to_cache": ["http://other.example/include.js"],
        "fallback_paths": {"/": "/offline.html"},
        "file_path": "out/manifest.appcache",
        "serve": {"cache_ttl_secs": 30}
      }"#,
    )
    .unwrap();

    let loaded = AppcacheConfig::discover(dir.path()).unwrap();
    assert_eq!(loaded.config.serve.cache_ttl(), Duration::from_secs(30));
    assert_eq!(loaded.config.serve.address, "127.0.0.1:8000");

    let settings = loaded.settings();
    assert_eq!(settings.media_root, dir.path().join("public"));
    assert_eq!(settings.file_path, dir.path().join("out/manifest.appcache"));
    assert_eq!(settings.media_to_cache.resolve().unwrap(), vec!["css/*.css".to_string()]);
    assert_eq!(settings.fallback_paths.get("/"), Some(&"/offline.html".to_string()));
  }

  #[test]
  fn parses_yaml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("appcache.config.yaml");
    fs::write(
      &path,
      "media_url: /assets/\nnet_paths:\n  - /api/\nurl: /app.appcache\n",
    )
    .unwrap();

    let loaded = AppcacheConfig::load(&path).unwrap();
    assert_eq!(loaded.config.media_url, "/assets/");
    assert_eq!(loaded.config.net_paths, vec!["/api/".to_string()]);
    assert_eq!(loaded.config.url.as_deref(), Some("/app.appcache"));
  }

  #[test]
  fn malformed_config_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("appcache.config.json"), "{ not json").unwrap();
    assert!(AppcacheConfig::discover(dir.path()).is_err());
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("appcache.config.json");
    fs::write(&path, r#"{"media_rot": "typo"}"#).unwrap();
    let err = AppcacheConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("media_rot"));
  }
}
