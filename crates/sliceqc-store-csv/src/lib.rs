//! CSV backend for the slice-qc annotation store.
//!
//! The whole record set lives in one comma-separated file that is rewritten
//! from scratch on every save. Loading is maximally tolerant: a missing,
//! empty or unparseable file yields an empty record set, and missing columns
//! are backfilled with defaults. Saving is strict: every failure is returned
//! to the caller.

mod codec;
mod encode;
mod store;

pub mod error;

pub use encode::COLUMNS;
pub use error::{Error, Result};
pub use store::{CsvStore, load, save};
