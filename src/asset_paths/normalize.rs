use std::path::{Component, Path, PathBuf};

/// Lexically normalise a path, collapsing `.` and `..` segments without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => normalized.push(".."),
      },
      other => normalized.push(other.as_os_str()),
    }
  }

  if normalized.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    normalized
  }
}

/// Make a path absolute against the working directory and normalise it.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
  Ok(normalize_path(&std::path::absolute(path)?))
}
