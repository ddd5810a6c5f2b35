//! In-memory [`AnnotationStore`] for tests and dry runs.
//!
//! `flush` persists nothing; it only counts calls so tests can check the
//! controller's persistence discipline.

use std::{cell::Cell, convert::Infallible};

use crate::{
  clock::{Clock, SystemClock},
  record::{AnnotationRecord, Rating, RecordSet},
};

use super::AnnotationStore;

pub struct MemoryStore<C = SystemClock> {
  records: RecordSet,
  clock:   C,
  flushes: Cell<usize>,
}

impl MemoryStore<SystemClock> {
  pub fn new() -> Self { Self::with_clock(SystemClock::new()) }
}

impl Default for MemoryStore<SystemClock> {
  fn default() -> Self { Self::new() }
}

impl<C: Clock> MemoryStore<C> {
  pub fn with_clock(clock: C) -> Self {
    Self { records: RecordSet::new(), clock, flushes: Cell::new(0) }
  }

  /// How many times [`AnnotationStore::flush`] has been called.
  pub fn flush_count(&self) -> usize { self.flushes.get() }

  pub fn records(&self) -> &RecordSet { &self.records }
}

impl<C: Clock> AnnotationStore for MemoryStore<C> {
  type Error = Infallible;

  fn has(&self, key: &str) -> bool { self.records.has(key) }

  fn get_rating(&self, key: &str) -> Rating { self.records.rating(key) }

  fn is_viewed(&self, key: &str) -> bool { self.records.is_viewed(key) }

  fn record(&self, key: &str) -> Option<&AnnotationRecord> {
    self.records.get(key)
  }

  fn mark_viewed(&mut self, key: &str) {
    let now = self.clock.now();
    self.records.mark_viewed(key, now);
  }

  fn set_rating(&mut self, key: &str, rating: i64) {
    let now = self.clock.now();
    self.records.set_rating(key, rating, now);
  }

  fn flush(&self) -> Result<(), Self::Error> {
    self.flushes.set(self.flushes.get() + 1);
    Ok(())
  }
}
