//! Annotation records — the persisted review state for one item key.
//!
//! Records are created lazily the first time a key is viewed or rated and are
//! never deleted. Every update replaces the record value as a whole; nothing
//! outside this module mutates individual fields.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::identity::parse_key;

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A quality score in the closed range `0..=3`.
///
/// The only way to build one is [`Rating::clamped`], so every value in the
/// system is in range.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: Rating = Rating(0);
  pub const MAX: Rating = Rating(3);

  /// Saturate `value` into `0..=3`. Out-of-range input is never rejected.
  pub fn clamped(value: i64) -> Self {
    Self(value.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
  }

  pub fn get(self) -> u8 { self.0 }
}

impl From<i64> for Rating {
  fn from(value: i64) -> Self { Self::clamped(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

impl std::fmt::Display for Rating {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── AnnotationRecord ────────────────────────────────────────────────────────

/// One row of the backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
  pub key:             String,
  pub group_id:        String,
  pub series_id:       String,
  pub ordinal:         Option<u32>,
  pub rating:          Rating,
  pub viewed:          bool,
  /// Write-once: set on the first transition to viewed.
  pub first_viewed_at: Option<NaiveDateTime>,
  /// Absent only for rows loaded from a file that lacked the column.
  pub last_updated_at: Option<NaiveDateTime>,
}

impl AnnotationRecord {
  /// A freshly viewed record for `key`, with identity fields derived from the
  /// key itself.
  pub fn first_view(key: &str, now: NaiveDateTime) -> Self {
    let identity = parse_key(key);
    Self {
      key:             key.to_owned(),
      group_id:        identity.group_id,
      series_id:       identity.series_id,
      ordinal:         identity.ordinal,
      rating:          Rating::default(),
      viewed:          true,
      first_viewed_at: Some(now),
      last_updated_at: Some(now),
    }
  }

  /// This record after being viewed (again) at `now`.
  fn viewed_at(&self, now: NaiveDateTime) -> Self {
    Self {
      viewed: true,
      first_viewed_at: self.first_viewed_at.or(Some(now)),
      last_updated_at: Some(now),
      ..self.clone()
    }
  }

  /// This record with `rating` applied at `now`.
  fn rated_at(&self, rating: Rating, now: NaiveDateTime) -> Self {
    Self { rating, last_updated_at: Some(now), ..self.clone() }
  }
}

// ─── RecordSet ───────────────────────────────────────────────────────────────

/// The full set of annotation records, keyed by item key.
///
/// Storage order is irrelevant; presentation order comes from the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
  records: HashMap<String, AnnotationRecord>,
}

impl RecordSet {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn has(&self, key: &str) -> bool { self.records.contains_key(key) }

  pub fn get(&self, key: &str) -> Option<&AnnotationRecord> {
    self.records.get(key)
  }

  /// Stored rating, or the default when no record exists.
  pub fn rating(&self, key: &str) -> Rating {
    self.get(key).map(|r| r.rating).unwrap_or_default()
  }

  pub fn is_viewed(&self, key: &str) -> bool {
    self.get(key).is_some_and(|r| r.viewed)
  }

  /// Idempotently mark `key` as viewed, creating its record if needed.
  pub fn mark_viewed(&mut self, key: &str, now: NaiveDateTime) {
    let next = match self.records.get(key) {
      Some(existing) => existing.viewed_at(now),
      None => AnnotationRecord::first_view(key, now),
    };
    self.records.insert(key.to_owned(), next);
  }

  /// Clamp and store `rating` for `key`. An unseen key is first marked
  /// viewed.
  pub fn set_rating(&mut self, key: &str, rating: i64, now: NaiveDateTime) {
    let rating = Rating::clamped(rating);
    let next = match self.records.get(key) {
      Some(existing) => existing.rated_at(rating, now),
      None => AnnotationRecord::first_view(key, now).rated_at(rating, now),
    };
    self.records.insert(key.to_owned(), next);
  }

  /// Insert a record as-is, replacing any record with the same key. Used by
  /// loaders; returns the replaced record, if any.
  pub fn insert(&mut self, record: AnnotationRecord) -> Option<AnnotationRecord> {
    self.records.insert(record.key.clone(), record)
  }

  pub fn iter(&self) -> impl Iterator<Item = &AnnotationRecord> {
    self.records.values()
  }

  /// Records ordered by key.
  pub fn sorted(&self) -> Vec<&AnnotationRecord> {
    let mut rows: Vec<_> = self.records.values().collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
  }
}

impl FromIterator<AnnotationRecord> for RecordSet {
  fn from_iter<I: IntoIterator<Item = AnnotationRecord>>(iter: I) -> Self {
    let mut set = Self::new();
    for record in iter {
      set.insert(record);
    }
    set
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use pretty_assertions::assert_eq;

  use super::*;

  fn at(secs: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
      .unwrap()
      .and_hms_opt(12, 0, secs)
      .unwrap()
  }

  // ── Rating ────────────────────────────────────────────────────────────────

  #[test]
  fn clamp_saturates_at_bounds() {
    assert_eq!(Rating::clamped(-5).get(), 0);
    assert_eq!(Rating::clamped(99).get(), 3);
    assert_eq!(Rating::clamped(2).get(), 2);
    assert_eq!(Rating::clamped(i64::MIN).get(), 0);
    assert_eq!(Rating::clamped(i64::MAX).get(), 3);
  }

  #[test]
  fn clamp_is_always_in_range() {
    for r in -20..20 {
      assert!(Rating::clamped(r) <= Rating::MAX);
    }
  }

  // ── mark_viewed ───────────────────────────────────────────────────────────

  #[test]
  fn mark_viewed_creates_record_from_key() {
    let mut set = RecordSet::new();
    set.mark_viewed("p01_T1_slice_7", at(0));

    let rec = set.get("p01_T1_slice_7").unwrap();
    assert_eq!(rec, &AnnotationRecord {
      key:             "p01_T1_slice_7".into(),
      group_id:        "p01".into(),
      series_id:       "T1".into(),
      ordinal:         Some(7),
      rating:          Rating::MIN,
      viewed:          true,
      first_viewed_at: Some(at(0)),
      last_updated_at: Some(at(0)),
    });
  }

  #[test]
  fn mark_viewed_is_idempotent() {
    let mut set = RecordSet::new();
    set.set_rating("k", 2, at(0));
    set.mark_viewed("k", at(10));
    set.mark_viewed("k", at(20));

    let rec = set.get("k").unwrap();
    assert_eq!(rec.rating.get(), 2);
    assert_eq!(rec.first_viewed_at, Some(at(0)));
    assert_eq!(rec.last_updated_at, Some(at(20)));
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn mark_viewed_fills_missing_first_view() {
    let mut set = RecordSet::new();
    set.insert(AnnotationRecord {
      key:             "k".into(),
      group_id:        "k".into(),
      series_id:       String::new(),
      ordinal:         None,
      rating:          Rating::clamped(1),
      viewed:          false,
      first_viewed_at: None,
      last_updated_at: None,
    });

    set.mark_viewed("k", at(3));
    let rec = set.get("k").unwrap();
    assert!(rec.viewed);
    assert_eq!(rec.first_viewed_at, Some(at(3)));
    assert_eq!(rec.rating.get(), 1);
  }

  // ── set_rating ────────────────────────────────────────────────────────────

  #[test]
  fn set_rating_on_unseen_key_views_it() {
    let mut set = RecordSet::new();
    set.set_rating("a_b_slice_1", 2, at(0));

    assert!(set.has("a_b_slice_1"));
    assert!(set.is_viewed("a_b_slice_1"));
    assert_eq!(set.rating("a_b_slice_1").get(), 2);
  }

  #[test]
  fn set_rating_clamps_and_refreshes_timestamp() {
    let mut set = RecordSet::new();
    set.mark_viewed("k", at(0));
    set.set_rating("k", 42, at(9));

    let rec = set.get("k").unwrap();
    assert_eq!(rec.rating, Rating::MAX);
    assert_eq!(rec.first_viewed_at, Some(at(0)));
    assert_eq!(rec.last_updated_at, Some(at(9)));
  }

  #[test]
  fn reads_default_for_unknown_keys() {
    let set = RecordSet::new();
    assert!(!set.has("nope"));
    assert!(!set.is_viewed("nope"));
    assert_eq!(set.rating("nope"), Rating::MIN);
  }

  #[test]
  fn sorted_orders_by_key() {
    let mut set = RecordSet::new();
    for key in ["c", "a", "b"] {
      set.mark_viewed(key, at(0));
    }
    let keys: Vec<_> = set.sorted().into_iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["a", "b", "c"]);
  }
}
