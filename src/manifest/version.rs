use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

const BUILD_VERSION_FORMAT: &str = "%Y-%m-%d %H:%M:%S+0000";

static LAST_ISSUED: AtomicI64 = AtomicI64::new(i64::MIN);

/// Format the UTC build stamp written into the manifest.
///
/// Browsers refetch every cached resource when the manifest bytes change, so each build
/// carries the time it ran.
pub fn build_version(now: DateTime<Utc>) -> String {
  now.format(BUILD_VERSION_FORMAT).to_string()
}

/// First build stamp found in previously rendered manifest text.
pub fn parse_build_version(content: &str) -> Option<DateTime<Utc>> {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  let pattern = PATTERN.get_or_init(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\+0000").expect("valid build stamp regex")
  });

  let stamp = pattern.find(content)?;
  NaiveDateTime::parse_from_str(stamp.as_str(), BUILD_VERSION_FORMAT)
    .ok()
    .map(|naive| naive.and_utc())
}

/// Stamp time for a new build.
///
/// Stamps have one-second resolution, so the result is `now` truncated to the second unless
/// that would not be later than `previous` or the last stamp issued in this process; then it
/// is one second past the latest of those.
pub fn next_build_time(now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
  let wanted = now.timestamp();
  let floor = previous.map_or(i64::MIN, |previous| previous.timestamp());
  let advance = |last: i64| wanted.max(last.max(floor).saturating_add(1));

  let last = LAST_ISSUED
    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(advance(last)))
    .unwrap_or_else(|last| last);
  DateTime::from_timestamp(advance(last), 0).unwrap_or(now)
}
