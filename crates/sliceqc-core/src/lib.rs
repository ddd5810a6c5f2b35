//! Core types and trait definitions for the slice-qc annotation tool.
//!
//! This crate is free of file-format and terminal dependencies. The backing
//! file codec lives in `sliceqc-store-csv`; the viewer lives in
//! `sliceqc-cli`. Both depend on the abstractions defined here.

pub mod archive;
pub mod clock;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod record;
pub mod store;

pub use error::{Error, Result};
