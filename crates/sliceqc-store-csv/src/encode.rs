//! Encoding and decoding between [`AnnotationRecord`] and CSV cells.
//!
//! Decoding is tolerant: every field has a table of accepted spellings and a
//! default for anything else, so the ambiguity of hand-edited or foreign
//! files stops at the load boundary. Encoding always produces the canonical
//! form.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, SubsecRound as _};
use sliceqc_core::record::{AnnotationRecord, Rating};

use crate::{Error, Result};

/// Column order written on save.
pub const COLUMNS: [&str; 8] = [
  "key",
  "group_id",
  "series_id",
  "ordinal",
  "rating",
  "viewed",
  "first_viewed_at",
  "last_updated_at",
];

/// Header names written by earlier versions of the tool, accepted on load.
const ALIASES: [(&str, &str); 3] = [
  ("phonetic_id", "group_id"),
  ("series", "series_id"),
  ("slice_number", "ordinal"),
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── Booleans ────────────────────────────────────────────────────────────────

const TRUE_SPELLINGS: [&str; 5] = ["true", "yes", "y", "1", "t"];
const FALSE_SPELLINGS: [&str; 5] = ["false", "no", "n", "0", "f"];

/// Decode a viewed flag. Unknown spellings and empty cells are `false`.
pub fn decode_bool(s: &str) -> bool {
  let s = s.trim().to_ascii_lowercase();
  if TRUE_SPELLINGS.contains(&s.as_str()) {
    return true;
  }
  if FALSE_SPELLINGS.contains(&s.as_str()) {
    return false;
  }
  // Numeric forms such as `1.0` written by spreadsheet tools.
  s.parse::<f64>().is_ok_and(|v| v.is_finite() && v != 0.0)
}

pub fn encode_bool(b: bool) -> &'static str {
  if b { "true" } else { "false" }
}

// ─── Numbers ─────────────────────────────────────────────────────────────────

/// Parse an integer, also accepting float spellings (`2.0`, `2.7` → 2).
fn decode_integer(s: &str) -> Option<i64> {
  let s = s.trim();
  if let Ok(v) = s.parse::<i64>() {
    return Some(v);
  }
  let v = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
  Some(v.trunc() as i64)
}

/// Decode a rating, clamping into range. Unreadable cells are the default.
pub fn decode_rating(s: &str) -> Rating {
  decode_integer(s).map(Rating::clamped).unwrap_or_default()
}

pub fn decode_ordinal(s: &str) -> Option<u32> {
  decode_integer(s).and_then(|v| u32::try_from(v).ok())
}

pub fn encode_ordinal(ordinal: Option<u32>) -> String {
  ordinal.map(|o| o.to_string()).unwrap_or_default()
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Decode a timestamp. Accepts the canonical form, a space separator,
/// fractional seconds, and RFC 3339 with an offset (which is dropped).
pub fn decode_timestamp(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  let parsed = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))?;
  Some(parsed.trunc_subsecs(0))
}

pub fn encode_timestamp(ts: Option<NaiveDateTime>) -> String {
  ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    .unwrap_or_default()
}

// ─── Header ──────────────────────────────────────────────────────────────────

/// Maps canonical column names to their position in a loaded file.
pub struct Header {
  index: HashMap<&'static str, usize>,
}

impl Header {
  /// Resolve column positions by name. A file without a `key` column is
  /// malformed; every other column is optional.
  pub fn parse(names: &[String]) -> Result<Self> {
    let mut index = HashMap::new();
    for (pos, name) in names.iter().enumerate() {
      let name = name.trim();
      let canonical = COLUMNS
        .iter()
        .copied()
        .find(|c| *c == name)
        .or_else(|| {
          ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, c)| *c)
        });
      if let Some(c) = canonical {
        // First matching column wins.
        index.entry(c).or_insert(pos);
      }
    }

    if !index.contains_key("key") {
      return Err(Error::Malformed("no `key` column in header".into()));
    }
    Ok(Self { index })
  }

  /// The columns this header does not provide.
  pub fn missing(&self) -> Vec<&'static str> {
    COLUMNS
      .iter()
      .copied()
      .filter(|c| !self.index.contains_key(c))
      .collect()
  }

  /// Borrow the cells of `row` by column name. Absent columns and short rows
  /// read as empty.
  pub fn raw<'a>(&self, row: &'a [String]) -> RawRecord<'a> {
    let cell = |name: &str| -> &'a str {
      self
        .index
        .get(name)
        .and_then(|&i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
    };
    RawRecord {
      key:             cell("key"),
      group_id:        cell("group_id"),
      series_id:       cell("series_id"),
      ordinal:         cell("ordinal"),
      rating:          cell("rating"),
      viewed:          cell("viewed"),
      first_viewed_at: cell("first_viewed_at"),
      last_updated_at: cell("last_updated_at"),
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw cells of one data row, before decoding.
pub struct RawRecord<'a> {
  pub key:             &'a str,
  pub group_id:        &'a str,
  pub series_id:       &'a str,
  pub ordinal:         &'a str,
  pub rating:          &'a str,
  pub viewed:          &'a str,
  pub first_viewed_at: &'a str,
  pub last_updated_at: &'a str,
}

impl RawRecord<'_> {
  /// Decode into a typed record. `None` for rows whose key cell is empty.
  ///
  /// The key is taken exactly as written; surrounding whitespace is part of
  /// it.
  pub fn into_record(self) -> Option<AnnotationRecord> {
    if self.key.is_empty() {
      return None;
    }
    Some(AnnotationRecord {
      key:             self.key.to_owned(),
      group_id:        self.group_id.to_owned(),
      series_id:       self.series_id.to_owned(),
      ordinal:         decode_ordinal(self.ordinal),
      rating:          decode_rating(self.rating),
      viewed:          decode_bool(self.viewed),
      first_viewed_at: decode_timestamp(self.first_viewed_at),
      last_updated_at: decode_timestamp(self.last_updated_at),
    })
  }
}

/// Encode `record` as cells in [`COLUMNS`] order.
pub fn encode_record(record: &AnnotationRecord) -> [String; 8] {
  [
    record.key.clone(),
    record.group_id.clone(),
    record.series_id.clone(),
    encode_ordinal(record.ordinal),
    record.rating.to_string(),
    encode_bool(record.viewed).to_owned(),
    encode_timestamp(record.first_viewed_at),
    encode_timestamp(record.last_updated_at),
  ]
}
