//! `slice-qc summary` — counts over a saved annotation file.

use std::fmt;

use sliceqc_core::record::{Rating, RecordSet};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
  pub records:   usize,
  pub viewed:    usize,
  /// Record count per rating, indexed by rating value.
  pub by_rating: [usize; 4],
}

impl Summary {
  pub fn of(records: &RecordSet) -> Self {
    let mut summary = Self { records: records.len(), ..Self::default() };
    for rec in records.iter() {
      if rec.viewed {
        summary.viewed += 1;
      }
      summary.by_rating[usize::from(rec.rating.get())] += 1;
    }
    summary
  }
}

impl fmt::Display for Summary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "records  {}", self.records)?;
    writeln!(f, "viewed   {}", self.viewed)?;
    for (rating, count) in self.by_rating.iter().enumerate() {
      writeln!(f, "rating {}  {count}", Rating::clamped(rating as i64))?;
    }
    Ok(())
  }
}
