//! The `Archive` trait — the source of item keys and pixel data.
//!
//! An archive lists every reviewable item once, in a stable order, and hands
//! back an n-dimensional block for any listed key. The navigation controller
//! is responsible for rejecting blocks of the wrong dimensionality.

use std::collections::BTreeMap;

use ndarray::ArrayD;
use thiserror::Error;

pub trait Archive {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every item key in the archive, in a stable order.
  fn keys(&self) -> Result<Vec<String>, Self::Error>;

  /// Read the data block stored under `key`.
  fn read(&self, key: &str) -> Result<ArrayD<f32>, Self::Error>;
}

#[derive(Debug, Error)]
#[error("no item {0:?} in archive")]
pub struct MissingItem(pub String);

/// An archive held entirely in memory, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
  items: BTreeMap<String, ArrayD<f32>>,
}

impl MemoryArchive {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, key: impl Into<String>, block: ArrayD<f32>) {
    self.items.insert(key.into(), block);
  }
}

impl FromIterator<(String, ArrayD<f32>)> for MemoryArchive {
  fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
    Self { items: iter.into_iter().collect() }
  }
}

impl Archive for MemoryArchive {
  type Error = MissingItem;

  fn keys(&self) -> Result<Vec<String>, Self::Error> {
    Ok(self.items.keys().cloned().collect())
  }

  fn read(&self, key: &str) -> Result<ArrayD<f32>, Self::Error> {
    self
      .items
      .get(key)
      .cloned()
      .ok_or_else(|| MissingItem(key.to_owned()))
  }
}
