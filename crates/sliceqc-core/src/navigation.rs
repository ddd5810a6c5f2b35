//! The navigation controller — a state machine over the archive's key list.
//!
//! Every transition persists the store twice: once before moving (so nothing
//! pending is lost if the next item fails to load) and once after the new
//! item has been marked viewed. Rating input is only accepted while the
//! controller is [`Phase::Ready`]; during a transition it is dropped rather
//! than applied to whichever key happens to be current.

use ndarray::{Array3, ArrayView2, Axis, Ix3};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  archive::Archive,
  record::Rating,
  store::AnnotationStore,
};

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Constructed; no item has been loaded yet.
  Starting,
  /// A transition to `target` is in progress.
  Loading { target: usize },
  /// An item is loaded and rating input is accepted.
  Ready,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// What the UI shows for the current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
  pub key:      String,
  pub viewed:   bool,
  pub rating:   Rating,
  /// 1-based.
  pub position: usize,
  pub total:    usize,
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let viewed = if self.viewed { "VIEWED" } else { "NOT viewed" };
    write!(
      f,
      "Status: {viewed} | Rating: {} | {}/{} | {}",
      self.rating, self.position, self.total, self.key
    )
  }
}

// ─── Navigator ───────────────────────────────────────────────────────────────

pub struct Navigator<S, A> {
  store:    S,
  archive:  A,
  keys:     Vec<String>,
  position: usize,
  volume:   Option<Array3<f32>>,
  phase:    Phase,
}

impl<S: AnnotationStore, A: Archive> Navigator<S, A> {
  /// Build a controller over every key in `archive`.
  ///
  /// Keys are sorted and deduplicated. An archive with no keys is
  /// [`Error::EmptyArchive`]. No item is loaded until [`start`] is called.
  ///
  /// [`start`]: Navigator::start
  pub fn new(store: S, archive: A) -> Result<Self> {
    let mut keys = archive
      .keys()
      .map_err(|e| Error::Archive(Box::new(e)))?;
    keys.sort();
    keys.dedup();

    if keys.is_empty() {
      return Err(Error::EmptyArchive);
    }

    Ok(Self {
      store,
      archive,
      keys,
      position: 0,
      volume: None,
      phase: Phase::Starting,
    })
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn keys(&self) -> &[String] { &self.keys }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn position(&self) -> usize { self.position }

  pub fn phase(&self) -> Phase { self.phase }

  pub fn current_key(&self) -> &str { &self.keys[self.position] }

  pub fn store(&self) -> &S { &self.store }

  /// The loaded item as `(rows, cols, timepoints)`, once [`start`] succeeded.
  ///
  /// [`start`]: Navigator::start
  pub fn volume(&self) -> Option<&Array3<f32>> { self.volume.as_ref() }

  /// One timepoint of the loaded item as a `(rows, cols)` view.
  pub fn frame(&self, timepoint: usize) -> Option<ArrayView2<'_, f32>> {
    let volume = self.volume.as_ref()?;
    (timepoint < volume.len_of(Axis(2)))
      .then(|| volume.index_axis(Axis(2), timepoint))
  }

  pub fn status(&self) -> Status {
    let key = self.current_key();
    Status {
      key:      key.to_owned(),
      viewed:   self.store.is_viewed(key),
      rating:   self.store.get_rating(key),
      position: self.position + 1,
      total:    self.keys.len(),
    }
  }

  /// Per-key viewed flags in presentation order, for list coloring.
  pub fn viewed_flags(&self) -> Vec<bool> {
    self.keys.iter().map(|k| self.store.is_viewed(k)).collect()
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Load the first item. Equivalent to `goto(0)` except that it runs even
  /// though the position is already 0.
  pub fn start(&mut self) -> Result<()> { self.transition(0) }

  /// Move to `index`. A no-op if `index` is already loaded.
  ///
  /// On a shape or archive error the position and loaded item are left as
  /// they were.
  pub fn goto(&mut self, index: usize) -> Result<()> {
    if index >= self.keys.len() {
      return Err(Error::OutOfRange { index, len: self.keys.len() });
    }
    if self.phase == Phase::Ready && index == self.position {
      return Ok(());
    }
    self.transition(index)
  }

  pub fn prev(&mut self) -> Result<()> {
    if self.position == 0 {
      return Ok(());
    }
    self.goto(self.position - 1)
  }

  pub fn next(&mut self) -> Result<()> {
    if self.position + 1 >= self.keys.len() {
      return Ok(());
    }
    self.goto(self.position + 1)
  }

  /// Rate the current item and persist. Returns `Ok(false)` when the input
  /// was ignored because no item is ready.
  pub fn set_rating(&mut self, rating: i64) -> Result<bool> {
    if self.phase != Phase::Ready {
      debug!(phase = ?self.phase, rating, "rating ignored outside ready phase");
      return Ok(false);
    }
    let key = &self.keys[self.position];
    self.store.set_rating(key, rating);
    debug!(key = %key, rating, "rating set");
    self.flush()?;
    Ok(true)
  }

  /// Final persist at shutdown.
  pub fn close(self) -> Result<()> { self.flush() }

  fn transition(&mut self, index: usize) -> Result<()> {
    let prior = self.phase;
    self.phase = Phase::Loading { target: index };

    let volume = match self.fetch(index) {
      Ok(volume) => volume,
      Err(e) => {
        warn!(index, error = %e, "navigation aborted");
        self.phase = prior;
        return Err(e);
      }
    };

    self.position = index;
    self.volume = Some(volume);
    let key = &self.keys[index];
    self.store.mark_viewed(key);
    debug!(key = %key, position = index, "item loaded");

    let flushed = self.flush();
    self.phase = Phase::Ready;
    flushed
  }

  /// Checkpoint the store, then read and shape-check the block at `index`.
  fn fetch(&self, index: usize) -> Result<Array3<f32>> {
    self.flush()?;

    let key = &self.keys[index];
    let block = self
      .archive
      .read(key)
      .map_err(|e| Error::Archive(Box::new(e)))?;

    let shape = block.shape().to_vec();
    block
      .into_dimensionality::<Ix3>()
      .map_err(|_| Error::DataShape { key: key.clone(), shape })
  }

  fn flush(&self) -> Result<()> {
    self.store.flush().map_err(|e| Error::Store(Box::new(e)))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use ndarray::{ArrayD, IxDyn};

  use super::*;
  use crate::{archive::MemoryArchive, store::MemoryStore};

  fn cube() -> ArrayD<f32> { ArrayD::zeros(IxDyn(&[2, 2, 3])) }

  fn archive(keys: &[&str]) -> MemoryArchive {
    keys.iter().map(|k| (k.to_string(), cube())).collect()
  }

  fn started(keys: &[&str]) -> Navigator<MemoryStore, MemoryArchive> {
    let mut nav = Navigator::new(MemoryStore::new(), archive(keys)).unwrap();
    nav.start().unwrap();
    nav
  }

  #[test]
  fn empty_archive_is_fatal() {
    let r = Navigator::new(MemoryStore::new(), MemoryArchive::new());
    assert!(matches!(r, Err(Error::EmptyArchive)));
  }

  #[test]
  fn start_views_first_item() {
    let nav = started(&["k1", "k2"]);
    assert_eq!(nav.position(), 0);
    assert_eq!(nav.phase(), Phase::Ready);
    assert!(nav.store().is_viewed("k1"));
    assert!(!nav.store().is_viewed("k2"));
    assert_eq!(nav.volume().unwrap().dim(), (2, 2, 3));
  }

  #[test]
  fn next_and_prev_stop_at_the_ends() {
    let mut nav = started(&["k1", "k2", "k3"]);

    nav.next().unwrap();
    nav.next().unwrap();
    assert_eq!(nav.position(), 2);
    nav.next().unwrap();
    assert_eq!(nav.position(), 2);

    for _ in 0..3 {
      nav.prev().unwrap();
    }
    assert_eq!(nav.position(), 0);
    assert_eq!(nav.viewed_flags(), [true, true, true]);
  }

  #[test]
  fn keys_are_sorted() {
    let nav = started(&["b", "c", "a"]);
    assert_eq!(nav.keys(), ["a", "b", "c"]);
  }

  #[test]
  fn goto_out_of_range_is_rejected() {
    let mut nav = started(&["k1", "k2"]);
    let r = nav.goto(2);
    assert!(matches!(r, Err(Error::OutOfRange { index: 2, len: 2 })));
    assert_eq!(nav.position(), 0);
  }

  #[test]
  fn goto_current_position_does_not_persist() {
    let mut nav = started(&["k1", "k2"]);
    let before = nav.store().flush_count();
    nav.goto(0).unwrap();
    assert_eq!(nav.store().flush_count(), before);
  }

  #[test]
  fn transition_persists_before_and_after() {
    let mut nav = started(&["k1", "k2"]);
    let before = nav.store().flush_count();
    nav.next().unwrap();
    assert_eq!(nav.store().flush_count(), before + 2);
  }

  #[test]
  fn wrong_dimensionality_leaves_position() {
    let mut archive = archive(&["k1", "k3"]);
    archive.insert("k2", ArrayD::zeros(IxDyn(&[4, 4])));
    let mut nav = Navigator::new(MemoryStore::new(), archive).unwrap();
    nav.start().unwrap();

    let r = nav.goto(1);
    match r {
      Err(Error::DataShape { key, shape }) => {
        assert_eq!(key, "k2");
        assert_eq!(shape, [4, 4]);
      }
      other => panic!("expected DataShape, got {other:?}"),
    }
    assert_eq!(nav.position(), 0);
    assert_eq!(nav.phase(), Phase::Ready);
    assert!(!nav.store().is_viewed("k2"));

    // Skipping past the bad item still works.
    nav.goto(2).unwrap();
    assert_eq!(nav.position(), 2);
  }

  #[test]
  fn bad_first_item_keeps_starting_phase() {
    let mut archive = MemoryArchive::new();
    archive.insert("k1", ArrayD::zeros(IxDyn(&[1, 1, 1, 1])));
    let mut nav = Navigator::new(MemoryStore::new(), archive).unwrap();

    assert!(nav.start().is_err());
    assert_eq!(nav.phase(), Phase::Starting);
    assert_eq!(nav.set_rating(2).unwrap(), false);
  }

  #[test]
  fn rating_before_start_is_ignored() {
    let mut nav = Navigator::new(MemoryStore::new(), archive(&["k1"])).unwrap();
    assert_eq!(nav.set_rating(3).unwrap(), false);
    assert!(!nav.store().has("k1"));
  }

  #[test]
  fn set_rating_applies_to_current_key() {
    let mut nav = started(&["k1", "k2"]);
    nav.next().unwrap();
    let before = nav.store().flush_count();

    assert!(nav.set_rating(9).unwrap());
    assert_eq!(nav.store().get_rating("k2"), Rating::MAX);
    assert_eq!(nav.store().get_rating("k1"), Rating::MIN);
    assert_eq!(nav.store().flush_count(), before + 1);
  }

  #[test]
  fn status_reports_one_based_position() {
    let mut nav = started(&["a_b_slice_1", "a_b_slice_2"]);
    nav.next().unwrap();
    nav.set_rating(2).unwrap();

    let status = nav.status();
    assert_eq!(status.position, 2);
    assert_eq!(status.total, 2);
    assert_eq!(
      status.to_string(),
      "Status: VIEWED | Rating: 2 | 2/2 | a_b_slice_2"
    );
  }

  /// Wraps a `MemoryStore`; flushes fail while `broken` is set.
  struct FlakyStore {
    inner:  MemoryStore,
    broken: std::cell::Cell<bool>,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("disk full")]
  struct DiskFull;

  impl AnnotationStore for FlakyStore {
    type Error = DiskFull;

    fn has(&self, key: &str) -> bool { self.inner.has(key) }

    fn get_rating(&self, key: &str) -> Rating { self.inner.get_rating(key) }

    fn is_viewed(&self, key: &str) -> bool { self.inner.is_viewed(key) }

    fn record(&self, key: &str) -> Option<&crate::record::AnnotationRecord> {
      self.inner.record(key)
    }

    fn mark_viewed(&mut self, key: &str) { self.inner.mark_viewed(key) }

    fn set_rating(&mut self, key: &str, rating: i64) {
      self.inner.set_rating(key, rating)
    }

    fn flush(&self) -> Result<(), DiskFull> {
      if self.broken.get() { Err(DiskFull) } else { Ok(()) }
    }
  }

  #[test]
  fn failed_flush_before_move_aborts_navigation() {
    let store = FlakyStore { inner: MemoryStore::new(), broken: false.into() };
    let mut nav = Navigator::new(store, archive(&["k1", "k2"])).unwrap();
    nav.start().unwrap();

    nav.store().broken.set(true);
    assert!(matches!(nav.next(), Err(Error::Store(_))));
    assert_eq!(nav.position(), 0);
    assert!(!nav.store().is_viewed("k2"));

    // Rating still lands in memory; only the save is reported.
    assert!(matches!(nav.set_rating(2), Err(Error::Store(_))));
    assert_eq!(nav.store().get_rating("k1").get(), 2);

    nav.store().broken.set(false);
    nav.next().unwrap();
    assert_eq!(nav.position(), 1);
  }

  #[test]
  fn frame_selects_timepoint() {
    let mut archive = MemoryArchive::new();
    let mut block = ArrayD::<f32>::zeros(IxDyn(&[2, 3, 4]));
    block[[1, 2, 3]] = 7.0;
    archive.insert("k", block);
    let mut nav = Navigator::new(MemoryStore::new(), archive).unwrap();
    nav.start().unwrap();

    let frame = nav.frame(3).unwrap();
    assert_eq!(frame.dim(), (2, 3));
    assert_eq!(frame[[1, 2]], 7.0);
    assert!(nav.frame(4).is_none());
  }
}
