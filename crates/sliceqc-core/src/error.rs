//! Error types for `sliceqc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("archive contains no items")]
  EmptyArchive,

  #[error("position {index} out of range for {len} items")]
  OutOfRange { index: usize, len: usize },

  #[error("item {key:?} is not 3-D (rows, cols, timepoints): shape {shape:?}")]
  DataShape { key: String, shape: Vec<usize> },

  #[error("archive error: {0}")]
  Archive(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
