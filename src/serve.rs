//! HTTP endpoint serving the stored manifest.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

use crate::asset_paths::split_query;
use crate::project::AppcacheSettings;
use crate::store::ManifestStore;

/// Content type browsers require for cache manifests.
pub const MANIFEST_CONTENT_TYPE: &str = "text/cache-manifest";

/// Response cache lifetime used when none is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// URL the manifest is published at: the configured one, or the built-in route.
pub fn manifest_url(settings: &AppcacheSettings) -> &str {
  settings.url.as_deref().unwrap_or(&settings.serve_route)
}

/// The `manifest="..."` attribute to place on a page's `<html>` element.
pub fn manifest_attribute(settings: &AppcacheSettings) -> String {
  format!("manifest=\"{}\"", manifest_url(settings))
}

/// Transport-independent response produced by [`ManifestServer::respond`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeResponse {
  /// HTTP status code.
  pub status: u16,
  /// Content type, when there is a body to describe.
  pub content_type: Option<&'static str>,
  /// `Cache-Control: max-age` in seconds, when the response may be cached.
  pub max_age: Option<u64>,
  /// Response body.
  pub body: Vec<u8>,
}

impl ServeResponse {
  fn empty(status: u16) -> Self {
    Self {
      status,
      content_type: None,
      max_age: None,
      body: Vec::new(),
    }
  }
}

struct CachedManifest {
  body: Vec<u8>,
  fetched_at: Instant,
}

/// Serves the stored manifest, keeping successful reads in memory for a short time.
///
/// Rebuilding the manifest does not invalidate the in-memory copy; clients see the new
/// manifest once the cache lifetime has passed.
pub struct ManifestServer {
  store: ManifestStore,
  route: String,
  ttl: Duration,
  cached: Mutex<Option<CachedManifest>>,
}

impl ManifestServer {
  /// Serve the manifest in `store` at `route`.
  pub fn new(store: ManifestStore, route: impl Into<String>, ttl: Duration) -> Self {
    Self {
      store,
      route: route.into(),
      ttl,
      cached: Mutex::new(None),
    }
  }

  /// Server for the configured manifest file and route.
  pub fn for_settings(settings: &AppcacheSettings, ttl: Duration) -> Self {
    Self::new(
      ManifestStore::new(settings.file_path()),
      settings.serve_route.clone(),
      ttl,
    )
  }

  /// Answer a request for `url` made with `method`.
  pub fn respond(&self, method: &Method, url: &str) -> ServeResponse {
    let (path, _) = split_query(url);
    if path != self.route {
      return ServeResponse::empty(404);
    }

    let head = match method {
      Method::Get => false,
      Method::Head => true,
      _ => return ServeResponse::empty(405),
    };

    match self.manifest_bytes() {
      Ok(Some(body)) => ServeResponse {
        status: 200,
        content_type: Some(MANIFEST_CONTENT_TYPE),
        max_age: Some(self.ttl.as_secs()),
        body: if head { Vec::new() } else { body },
      },
      Ok(None) => ServeResponse::empty(404),
      Err(err) => {
        warn!(error = %err, "failed to read manifest");
        ServeResponse::empty(500)
      }
    }
  }

  fn manifest_bytes(&self) -> crate::error::ManifestResult<Option<Vec<u8>>> {
    let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = cached.as_ref() {
      if entry.fetched_at.elapsed() < self.ttl {
        return Ok(Some(entry.body.clone()));
      }
    }

    let body = self.store.read()?;
    *cached = match &body {
      Some(bytes) if !self.ttl.is_zero() => Some(CachedManifest {
        body: bytes.clone(),
        fetched_at: Instant::now(),
      }),
      _ => None,
    };
    Ok(body)
  }

  /// Bind `address` and answer requests until the process exits.
  pub fn run(&self, address: &str) -> Result<()> {
    let server =
      Server::http(address).map_err(|err| anyhow!("failed to bind {address}: {err}"))?;
    info!(address = %address, route = %self.route, "serving manifest");

    for request in server.incoming_requests() {
      let response = self.respond(request.method(), request.url());
      debug!(method = %request.method(), url = %request.url(), status = response.status, "request");
      if let Err(err) = send(request, response) {
        warn!(error = %err, "failed to send response");
      }
    }

    Ok(())
  }
}

fn send(request: Request, response: ServeResponse) -> std::io::Result<()> {
  let mut reply = Response::from_data(response.body).with_status_code(StatusCode(response.status));
  if let Some(content_type) = response.content_type {
    if let Some(header) = make_header("Content-Type", content_type) {
      reply.add_header(header);
    }
  }
  if let Some(max_age) = response.max_age {
    if let Some(header) = make_header("Cache-Control", &format!("max-age={max_age}")) {
      reply.add_header(header);
    }
  }
  request.respond(reply)
}

fn make_header(key: &str, value: &str) -> Option<Header> {
  Header::from_bytes(key.as_bytes(), value.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  fn server_for(dir: &std::path::Path, ttl: Duration) -> ManifestServer {
    let store = ManifestStore::new(dir.join("manifest.appcache"));
    ManifestServer::new(store, "/manifest.appcache", ttl)
  }

  #[test]
  fn missing_manifest_is_not_found_with_empty_body() {
    let dir = tempdir().unwrap();
    let server = server_for(dir.path(), DEFAULT_CACHE_TTL);

    let response = server.respond(&Method::Get, "/manifest.appcache");
    assert_eq!(response, ServeResponse::empty(404));
  }

  #[test]
  fn serves_manifest_with_cache_manifest_content_type() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("manifest.appcache"), "CACHE MANIFEST\n").unwrap();
    let server = server_for(dir.path(), DEFAULT_CACHE_TTL);

    let response = server.respond(&Method::Get, "/manifest.appcache?cb=1");
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, Some("text/cache-manifest"));
    assert_eq!(response.max_age, Some(300));
    assert_eq!(response.body, b"CACHE MANIFEST\n");
  }

  #[test]
  fn cached_copy_outlives_rebuilds_until_expiry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("manifest.appcache");
    fs::write(&path, "CACHE MANIFEST\n# one\n").unwrap();

    let cached = server_for(dir.path(), Duration::from_secs(60));
    assert_eq!(cached.respond(&Method::Get, "/manifest.appcache").body, b"CACHE MANIFEST\n# one\n");
    fs::write(&path, "CACHE MANIFEST\n# two\n").unwrap();
    assert_eq!(cached.respond(&Method::Get, "/manifest.appcache").body, b"CACHE MANIFEST\n# one\n");

    let uncached = server_for(dir.path(), Duration::ZERO);
    assert_eq!(uncached.respond(&Method::Get, "/manifest.appcache").body, b"CACHE MANIFEST\n# two\n");
  }

  #[test]
  fn other_routes_and_methods_are_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("manifest.appcache"), "CACHE MANIFEST\n").unwrap();
    let server = server_for(dir.path(), DEFAULT_CACHE_TTL);

    assert_eq!(server.respond(&Method::Get, "/other").status, 404);
    assert_eq!(server.respond(&Method::Post, "/manifest.appcache").status, 405);

    let head = server.respond(&Method::Head, "/manifest.appcache");
    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
  }

  #[test]
  fn manifest_attribute_prefers_the_configured_url() {
    let mut settings = AppcacheSettings::new("/srv/media", "/static/");
    assert_eq!(manifest_attribute(&settings), "manifest=\"/manifest.appcache\"");

    settings.url = Some("https://example.com/app.appcache".into());
    assert_eq!(manifest_attribute(&settings), "manifest=\"https://example.com/app.appcache\"");
  }
}
