use std::path::{Path, PathBuf};

use regex::Regex;

use super::filters::has_network_location;
use crate::error::{ManifestError, ManifestResult};

/// Split a value into its path and the query string following the first `?`.
pub fn split_query(value: &str) -> (&str, Option<&str>) {
  match value.split_once('?') {
    Some((path, query)) => (path, Some(query)),
    None => (value, None),
  }
}

/// Re-attach a query string previously removed with [`split_query`].
pub fn append_query(url: String, query: Option<&str>) -> String {
  match query {
    Some(query) => format!("{url}?{query}"),
    None => url,
  }
}

fn authority_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/]*").expect("invalid authority regex")
  })
}

/// Collapse repeated slashes in the path portion of a URL.
///
/// A leading `scheme://host` authority is left untouched.
pub fn collapse_slashes(url: &str) -> String {
  let (authority, path) = match authority_pattern().find(url) {
    Some(found) => url.split_at(found.end()),
    None => ("", url),
  };

  let mut collapsed = String::with_capacity(url.len());
  collapsed.push_str(authority);
  let mut previous_slash = false;
  for ch in path.chars() {
    if ch == '/' {
      if previous_slash {
        continue;
      }
      previous_slash = true;
    } else {
      previous_slash = false;
    }
    collapsed.push(ch);
  }
  collapsed
}

/// Translate a file below `media_root` into its public URL under `media_url`.
///
/// The generated URL always uses forward slashes so manifests built on any platform are
/// identical.
pub fn to_public_url(media_root: &Path, media_url: &str, path: &Path) -> ManifestResult<String> {
  let relative = path
    .strip_prefix(media_root)
    .map_err(|_| ManifestError::OutsideMediaRoot {
      path: path.to_path_buf(),
      root: media_root.to_path_buf(),
    })?;

  let relative = relative.to_string_lossy().replace('\\', "/");
  let relative = collapse_slashes(relative.trim_start_matches('/'));
  let base = media_url.trim_end_matches('/');

  if has_network_location(base) {
    Ok(format!("{base}/{relative}"))
  } else {
    Ok(collapse_slashes(&format!("/{base}/{relative}")))
  }
}

/// Map a root-relative public URL back onto the media root, if it lives under `media_url`.
pub fn from_public_url(media_root: &Path, media_url: &str, url: &str) -> Option<PathBuf> {
  let base = media_url.trim_end_matches('/');
  let prefix = if has_network_location(base) {
    format!("{base}/")
  } else {
    collapse_slashes(&format!("/{base}/"))
  };
  let relative = url.strip_prefix(prefix.as_str())?;
  Some(media_root.join(relative.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_and_restores_query_strings() {
    let (path, query) = split_query("css/app.css?v=3&x=1");
    assert_eq!(path, "css/app.css");
    assert_eq!(query, Some("v=3&x=1"));
    assert_eq!(append_query("/static/css/app.css".into(), query), "/static/css/app.css?v=3&x=1");

    assert_eq!(split_query("plain.png"), ("plain.png", None));
  }

  #[test]
  fn collapses_duplicate_slashes_but_keeps_authority() {
    assert_eq!(collapse_slashes("//static//css///app.css"), "/static/css/app.css");
    assert_eq!(collapse_slashes("/static//app.css"), "/static/app.css");
    assert_eq!(
      collapse_slashes("https://cdn.example//static//app.css"),
      "https://cdn.example/static/app.css"
    );
  }

  #[test]
  fn replaces_media_root_with_media_url() {
    let url = to_public_url(
      Path::new("/srv/media"),
      "/static/",
      Path::new("/srv/media/css/app.css"),
    )
    .unwrap();
    assert_eq!(url, "/static/css/app.css");
  }

  #[test]
  fn always_produces_a_single_leading_slash() {
    let root = Path::new("/srv/media");
    let file = Path::new("/srv/media/app.css");
    assert_eq!(to_public_url(root, "/", file).unwrap(), "/app.css");
    assert_eq!(to_public_url(root, "static", file).unwrap(), "/static/app.css");
    assert_eq!(to_public_url(root, "/static//", file).unwrap(), "/static/app.css");
  }

  #[test]
  fn keeps_absolute_media_urls_intact() {
    let url = to_public_url(
      Path::new("/srv/media"),
      "https://cdn.example/static/",
      Path::new("/srv/media/img/a.png"),
    )
    .unwrap();
    assert_eq!(url, "https://cdn.example/static/img/a.png");
  }

  #[test]
  fn rejects_paths_outside_the_media_root() {
    let err = to_public_url(Path::new("/srv/media"), "/static", Path::new("/srv/other/a.css"))
      .unwrap_err();
    assert!(matches!(err, ManifestError::OutsideMediaRoot { .. }));
  }

  #[test]
  fn maps_public_urls_back_to_the_media_root() {
    let root = Path::new("/srv/media");
    assert_eq!(
      from_public_url(root, "/static/", "/static/img/logo.png"),
      Some(root.join("img/logo.png"))
    );
    assert_eq!(from_public_url(root, "/static", "/elsewhere/logo.png"), None);
  }
}
