use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{ManifestError, ManifestResult};

const WILDCARD_CHARS: [char; 3] = ['*', '?', '['];

/// Returns `true` when the pattern contains shell wildcard syntax.
pub fn has_wildcards(pattern: &str) -> bool {
  pattern.contains(WILDCARD_CHARS)
}

/// Expand a media-relative pattern against `media_root`.
///
/// Literal patterns expand to exactly one path whether or not it exists, leaving the
/// existence check to the caller. Wildcard patterns follow shell glob rules: `*` and `?`
/// stay within one path segment, `**` crosses directories, and hidden entries only match
/// when the pattern spells out a leading dot. Braces are literal characters. Only files are
/// returned, sorted. A matched symlink whose target is gone is still returned, so the caller's
/// existence check reports it.
pub fn expand_pattern(media_root: &Path, pattern: &str) -> ManifestResult<Vec<PathBuf>> {
  let relative = pattern.trim_start_matches('/');
  if !has_wildcards(relative) {
    return Ok(vec![media_root.join(relative)]);
  }

  let matcher = compile(pattern, relative)?;
  let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
  let literal_len = segments
    .iter()
    .take_while(|segment| !has_wildcards(segment))
    .count();

  let walk_root = segments[..literal_len]
    .iter()
    .fold(media_root.to_path_buf(), |path, segment| path.join(segment));
  if !walk_root.is_dir() {
    return Ok(Vec::new());
  }

  let allow_hidden = segments.iter().any(|segment| segment.starts_with('.'));
  let recursive = segments.iter().any(|segment| segment.contains("**"));

  let mut walker = WalkDir::new(&walk_root).min_depth(1).follow_links(true);
  if !recursive {
    walker = walker.max_depth(segments.len() - literal_len);
  }

  let mut matches = Vec::new();
  let entries = walker
    .into_iter()
    .filter_entry(|entry| allow_hidden || entry.depth() == 0 || !is_hidden(entry.path()));

  for entry in entries {
    let path = match entry {
      Ok(entry) if entry.file_type().is_dir() => continue,
      Ok(entry) => entry.into_path(),
      Err(err) => match dangling_link(&err) {
        Some(path) if allow_hidden || !is_hidden(&path) => path,
        Some(_) => continue,
        None => {
          let path = err.path().unwrap_or(&walk_root).to_path_buf();
          return Err(ManifestError::io(path, err.into()));
        }
      },
    };

    let Ok(candidate) = path.strip_prefix(media_root) else {
      continue;
    };
    let candidate = candidate.to_string_lossy().replace('\\', "/");
    if matcher.is_match(candidate.as_str()) {
      matches.push(path);
    }
  }

  matches.sort();
  Ok(matches)
}

fn is_hidden(path: &Path) -> bool {
  path
    .file_name()
    .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Path of a symlink that could not be followed because its target no longer exists.
fn dangling_link(err: &walkdir::Error) -> Option<PathBuf> {
  let path = err.path()?;
  let metadata = fs::symlink_metadata(path).ok()?;
  (metadata.file_type().is_symlink() && !path.exists()).then(|| path.to_path_buf())
}

/// Escape braces outside character classes; globset would otherwise read them as alternation.
fn escape_braces(relative: &str) -> String {
  let mut escaped = String::with_capacity(relative.len());
  let mut in_class = false;
  for ch in relative.chars() {
    match ch {
      '[' if !in_class => {
        in_class = true;
        escaped.push(ch);
      }
      ']' if in_class => {
        in_class = false;
        escaped.push(ch);
      }
      '{' | '}' if !in_class => {
        escaped.push('[');
        escaped.push(ch);
        escaped.push(']');
      }
      _ => escaped.push(ch),
    }
  }
  escaped
}

fn compile(pattern: &str, relative: &str) -> ManifestResult<GlobMatcher> {
  GlobBuilder::new(&escape_braces(relative))
    .literal_separator(true)
    .build()
    .map(|glob| glob.compile_matcher())
    .map_err(|source| ManifestError::InvalidPattern {
      pattern: pattern.to_string(),
      source,
    })
}
