//! Identity parsing for item keys.
//!
//! Keys produced by the slice extractor look like
//! `<group>_<series>_slice_<n>`. Both prefix segments may themselves contain
//! underscores; the literal `slice` marker anchors the split.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?P<group>.+?)_(?P<series>.+?)_slice_(?P<ordinal>\d+)$")
    .expect("key pattern is valid")
});

/// The structured identity derived from an item key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub group_id:  String,
  pub series_id: String,
  /// Position within the series; `None` when the key does not encode one.
  pub ordinal:   Option<u32>,
}

/// Derive an [`Identity`] from `key`.
///
/// Never fails: a key that does not match the expected shape yields the
/// whole key as `group_id`, an empty `series_id` and no ordinal.
pub fn parse_key(key: &str) -> Identity {
  let parsed = KEY_RE.captures(key).and_then(|caps| {
    let ordinal = caps["ordinal"].parse::<u32>().ok()?;
    Some(Identity {
      group_id:  caps["group"].to_owned(),
      series_id: caps["series"].to_owned(),
      ordinal:   Some(ordinal),
    })
  });

  parsed.unwrap_or_else(|| Identity {
    group_id:  key.to_owned(),
    series_id: String::new(),
    ordinal:   None,
  })
}
