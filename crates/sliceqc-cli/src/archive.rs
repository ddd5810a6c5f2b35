//! Local archive readers.
//!
//! Two layouts are supported, both built on ndarray's serde form
//! (`{"v":1,"dim":[rows,cols,time],"data":[...]}`):
//!
//! - a single JSON file holding an object of `key → array`, read whole;
//! - a directory of `<key>.json` files, one array each, read on demand.

use std::{
  collections::BTreeMap,
  fs,
  path::{Path, PathBuf},
};

use ndarray::ArrayD;
use sliceqc_core::archive::Archive;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("cannot read {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot decode {}: {source}", path.display())]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("no item {0:?} in archive")]
  Missing(String),
}

/// An archive on the local filesystem.
pub enum LocalArchive {
  Bundle(BTreeMap<String, ArrayD<f32>>),
  Directory(PathBuf),
}

impl LocalArchive {
  /// Open `path` as a directory archive if it is a directory, otherwise as a
  /// single-file bundle.
  pub fn open(path: &Path) -> Result<Self, ArchiveError> {
    if path.is_dir() {
      return Ok(Self::Directory(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let items = serde_json::from_str(&text).map_err(|source| ArchiveError::Json {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self::Bundle(items))
  }

  fn item_path(dir: &Path, key: &str) -> PathBuf { dir.join(format!("{key}.json")) }
}

impl Archive for LocalArchive {
  type Error = ArchiveError;

  fn keys(&self) -> Result<Vec<String>, Self::Error> {
    match self {
      Self::Bundle(items) => Ok(items.keys().cloned().collect()),
      Self::Directory(dir) => {
        let entries = fs::read_dir(dir).map_err(|source| ArchiveError::Io {
          path: dir.clone(),
          source,
        })?;
        let mut keys = Vec::new();
        for entry in entries {
          let entry = entry.map_err(|source| ArchiveError::Io {
            path: dir.clone(),
            source,
          })?;
          let path = entry.path();
          if path.extension().is_some_and(|ext| ext == "json")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
          {
            keys.push(stem.to_owned());
          }
        }
        keys.sort();
        Ok(keys)
      }
    }
  }

  fn read(&self, key: &str) -> Result<ArrayD<f32>, Self::Error> {
    match self {
      Self::Bundle(items) => items
        .get(key)
        .cloned()
        .ok_or_else(|| ArchiveError::Missing(key.to_owned())),
      Self::Directory(dir) => {
        let path = Self::item_path(dir, key);
        let text = fs::read_to_string(&path).map_err(|source| {
          if source.kind() == std::io::ErrorKind::NotFound {
            ArchiveError::Missing(key.to_owned())
          } else {
            ArchiveError::Io { path: path.clone(), source }
          }
        })?;
        serde_json::from_str(&text)
          .map_err(|source| ArchiveError::Json { path, source })
      }
    }
  }
}
