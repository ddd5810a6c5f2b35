//! [`CsvStore`] — the CSV implementation of [`AnnotationStore`].

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use sliceqc_core::{
  clock::{Clock, SystemClock},
  record::{AnnotationRecord, Rating, RecordSet},
  store::AnnotationStore,
};
use tracing::{debug, warn};

use crate::{
  Error, Result, codec,
  encode::{COLUMNS, Header, encode_record},
};

// ─── Load ────────────────────────────────────────────────────────────────────

/// Read the record set stored at `path`.
///
/// Never fails. A missing or empty file is an empty set; so is a file that
/// cannot be read or parsed, after logging a warning.
pub fn load(path: impl AsRef<Path>) -> RecordSet {
  let path = path.as_ref();
  match try_load(path) {
    Ok(records) => {
      debug!(path = %path.display(), records = records.len(), "loaded annotations");
      records
    }
    Err(e) => {
      warn!(path = %path.display(), error = %e, "ignoring unreadable annotation file");
      RecordSet::new()
    }
  }
}

fn try_load(path: &Path) -> Result<RecordSet> {
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecordSet::new()),
    Err(e) => return Err(Error::Malformed(e.to_string())),
  };
  decode(&text)
}

/// Decode a full file body into a record set.
pub(crate) fn decode(text: &str) -> Result<RecordSet> {
  let rows = codec::parse(text)?;
  let Some((names, data)) = rows.split_first() else {
    return Ok(RecordSet::new());
  };

  let header = Header::parse(names)?;
  let missing = header.missing();
  if !missing.is_empty() {
    debug!(?missing, "backfilling missing columns with defaults");
  }

  let mut records = RecordSet::new();
  for row in data {
    let Some(record) = header.raw(row).into_record() else {
      continue;
    };
    if let Some(previous) = records.insert(record) {
      debug!(key = %previous.key, "duplicate key; keeping the later row");
    }
  }
  Ok(records)
}

// ─── Save ────────────────────────────────────────────────────────────────────

/// Render `records` as a full file body, header included, rows ordered by
/// key.
///
/// A record with an empty key is not written: an empty key cell marks a row
/// to skip on load, so it could not be read back.
pub(crate) fn encode(records: &RecordSet) -> String {
  let mut out = String::new();
  codec::write_row(&mut out, COLUMNS);
  for record in records.sorted() {
    if record.key.is_empty() {
      warn!("not saving a record with an empty key");
      continue;
    }
    let cells = encode_record(record);
    codec::write_row(&mut out, cells.iter().map(String::as_str));
  }
  out
}

/// Write `records` to `path`, replacing any previous content.
///
/// Parent directories are created as needed. The body is written to a
/// sibling temporary file and renamed over `path`, so a failed save leaves
/// the previous file intact.
pub fn save(records: &RecordSet, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  let write_err = |source: io::Error| Error::Write { path: path.to_path_buf(), source };

  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    fs::create_dir_all(dir).map_err(write_err)?;
  }

  let tmp = temp_path(path);
  let body = encode(records);
  if let Err(e) = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, path)) {
    fs::remove_file(&tmp).ok();
    return Err(write_err(e));
  }
  Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An annotation store backed by a single CSV file.
///
/// Every [`flush`](AnnotationStore::flush) rewrites the whole file.
pub struct CsvStore<C = SystemClock> {
  path:    PathBuf,
  records: RecordSet,
  clock:   C,
}

impl CsvStore<SystemClock> {
  /// Open the store at `path`, merging in whatever a previous run saved.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    Self::open_with_clock(path, SystemClock::new())
  }

  /// A store at `path` that ignores any existing content. The file is
  /// overwritten on the first flush.
  pub fn fresh(path: impl Into<PathBuf>) -> Self {
    Self::with_records(path, RecordSet::new(), SystemClock::new())
  }
}

impl<C: Clock> CsvStore<C> {
  pub fn open_with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
    let path = path.into();
    let records = load(&path);
    Self::with_records(path, records, clock)
  }

  pub fn with_records(
    path: impl Into<PathBuf>,
    records: RecordSet,
    clock: C,
  ) -> Self {
    Self { path: path.into(), records, clock }
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn records(&self) -> &RecordSet { &self.records }

  /// Write the record set to `path` (which need not be the store's own).
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    save(&self.records, path)
  }
}

impl<C: Clock> AnnotationStore for CsvStore<C> {
  type Error = Error;

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

  fn flush(&self) -> Result<()> { save(&self.records, &self.path) }
}
