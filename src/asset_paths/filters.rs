use regex::Regex;

fn network_location_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?//[^/]").expect("invalid network location regex")
  })
}

fn external_reference_patterns() -> &'static [Regex] {
  use std::sync::OnceLock;

  static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
  PATTERNS
    .get_or_init(|| {
      vec![
        Regex::new(r"(?i)^http").expect("invalid http regex"),
        network_location_pattern().clone(),
      ]
    })
    .as_slice()
}

/// Determine whether a configured value carries a network location (`scheme://host/...` or
/// `//host/...`), i.e. it addresses another server rather than a path under the media root.
pub fn has_network_location(value: &str) -> bool {
  network_location_pattern().is_match(value.trim())
}

/// Determine whether a stylesheet `url()` value points at an external address.
///
/// External values are kept verbatim in the manifest: they are neither checked for existence
/// nor translated into media URLs.
pub fn is_external_asset(value: &str) -> bool {
  external_reference_patterns()
    .iter()
    .any(|pattern| pattern.is_match(value))
}

/// Inline `data:` URIs carry their payload with them and never need caching.
pub fn is_inline_data(value: &str) -> bool {
  value
    .get(..5)
    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}
