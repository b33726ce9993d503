//! Persisting the rendered manifest and reading it back for serving.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ManifestError, ManifestResult};

/// Location of the rendered manifest on disk.
#[derive(Debug, Clone)]
pub struct ManifestStore {
  path: PathBuf,
}

impl ManifestStore {
  /// Store backed by the file at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// File the manifest is written to.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Replace the stored manifest with `content`.
  ///
  /// The text is written to a sibling temporary file and renamed into place, so readers see
  /// either the previous manifest or the new one, never a partial write.
  pub fn write(&self, content: &str) -> ManifestResult<()> {
    let directory = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|err| ManifestError::io(directory, err))?;

    let mut staged =
      NamedTempFile::new_in(directory).map_err(|err| ManifestError::io(directory, err))?;
    staged
      .write_all(content.as_bytes())
      .and_then(|_| staged.as_file().sync_all())
      .map_err(|err| ManifestError::io(staged.path(), err))?;
    staged
      .persist(&self.path)
      .map_err(|err| ManifestError::io(&self.path, err.error))?;

    debug!(path = %self.path.display(), bytes = content.len(), "stored manifest");
    Ok(())
  }

  /// Raw bytes of the stored manifest, or `None` when nothing has been built yet.
  pub fn read(&self) -> ManifestResult<Option<Vec<u8>>> {
    match fs::read(&self.path) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
      Err(err) => Err(ManifestError::io(&self.path, err)),
    }
  }
}
