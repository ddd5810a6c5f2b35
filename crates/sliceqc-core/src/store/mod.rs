//! The `AnnotationStore` trait.
//!
//! Implemented by storage backends (e.g. `sliceqc-store-csv`). The navigation
//! controller depends on this abstraction, not on any concrete backend.
//!
//! Reads never fail: an unknown key reads as an unviewed record with the
//! default rating. Mutations are infallible in memory; only [`flush`] touches
//! durable storage and can fail.
//!
//! [`flush`]: AnnotationStore::flush

pub mod memory;

use crate::record::{AnnotationRecord, Rating};

pub use memory::MemoryStore;

pub trait AnnotationStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `true` iff a record exists for `key`.
  fn has(&self, key: &str) -> bool;

  /// The stored rating, or the default rating when `key` has no record.
  fn get_rating(&self, key: &str) -> Rating;

  /// The stored viewed flag, or `false` when `key` has no record.
  fn is_viewed(&self, key: &str) -> bool;

  fn record(&self, key: &str) -> Option<&AnnotationRecord>;

  /// Mark `key` viewed, creating its record on first sight. Idempotent apart
  /// from refreshing `last_updated_at`.
  fn mark_viewed(&mut self, key: &str);

  /// Clamp `rating` into range and store it, marking `key` viewed first if
  /// it has no record.
  fn set_rating(&mut self, key: &str, rating: i64);

  /// Persist the entire record set, replacing whatever was stored before.
  ///
  /// On failure the in-memory records are untouched, so the caller can
  /// retry.
  fn flush(&self) -> Result<(), Self::Error>;
}
