//! # cpdl-core
//!
//! A library for recovering the record layout of undocumented `.pdl` map data files.
//!
//! The files hold fixed-size records, each starting with a 32-bit type tag
//! and three 32-bit float coordinates. The record size, header length, and
//! byte order are unknown, and some files are AES-encrypted. This crate
//! provides:
//! - A brute-force layout search scored by runs of plausible coordinates
//! - An optional AES-128-ECB decryption stage in front of the search
//! - Console and flat-file reports of the decoded records
//!
//! ## Architecture
//!
//! - [`search`]: Field decoding, plausibility filtering and the layout search
//! - [`cipher`]: ECB block decryption
//! - [`pipeline`]: File loading and preprocess-then-search composition
//! - [`report`]: Type names and output sinks
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use cpdl_core::{load_file, write_console_report, FormatSearch, Pipeline, TypeNameTable};
//!
//! let buffer = load_file("map.pdl")?;
//! let analysis = Pipeline::new(FormatSearch::new()).run(buffer)?;
//!
//! write_console_report(std::io::stdout(), &analysis.result, &TypeNameTable::plain_epoch())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`Preprocessor`]: Plug in another whole-buffer transform
//! - [`TypeNames`]: Supply type labels for a different data build
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod cipher;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod search;

// Re-export primary types for convenience
pub use cipher::EcbCipher;
pub use error::{Error, Result};
pub use pipeline::{load_file, Analysis, Pipeline, Preprocessor};
pub use report::{
    export_file, write_console_report, write_export, TypeNameTable, TypeNames,
};
pub use search::{
    ByteOrder, ByteOrders, FormatCandidate, FormatSearch, Record, SearchConfig, SearchResult,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
