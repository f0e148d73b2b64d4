//! Console and flat-file sinks.

use super::TypeNames;
use crate::error::{Error, Result};
use crate::search::{Record, SearchResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Decimal places for coordinates in the console report
pub const CONSOLE_PRECISION: usize = 2;

/// Decimal places for coordinates in exported files
pub const EXPORT_PRECISION: usize = 6;

/// First line of every exported file
pub const EXPORT_HEADER: &str = "# type_id type_name x y z";

/// Count records per type tag, ordered by tag.
pub fn type_frequencies(records: &[Record]) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.type_tag).or_insert(0) += 1;
    }
    counts
}

/// Write the human-readable report for `result`.
pub fn write_console_report<W: Write>(
    mut out: W,
    result: &SearchResult,
    names: &dyn TypeNames,
) -> io::Result<()> {
    writeln!(out, "[cpdl] Detected record size: {} bytes", result.record_size)?;
    writeln!(out, "[cpdl] Skipped header bytes: {}", result.header_skip)?;
    writeln!(out, "[cpdl] Byte order: {}", result.byte_order)?;
    writeln!(out, "[cpdl] Parsed {} objects:", result.records.len())?;
    writeln!(out)?;

    let p = CONSOLE_PRECISION;
    for (i, record) in result.records.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. Offset: 0x{:>6x} | Type ID: {} ({}) | Pos: ({:.p$}, {:.p$}, {:.p$})",
            i,
            record.offset,
            record.type_tag,
            names.type_name(record.type_tag),
            record.x,
            record.y,
            record.z,
        )?;
    }

    writeln!(out)?;
    writeln!(out, "[cpdl] Type Frequencies:")?;
    for (tag, count) in type_frequencies(&result.records) {
        writeln!(
            out,
            "  Type {} ({}): {} objects",
            tag,
            names.type_name(tag),
            count
        )?;
    }

    out.flush()
}

/// Write `records` in the `type_id type_name x y z` flat format.
pub fn write_export<W: Write>(
    mut out: W,
    records: &[Record],
    names: &dyn TypeNames,
) -> io::Result<()> {
    writeln!(out, "{}", EXPORT_HEADER)?;

    let p = EXPORT_PRECISION;
    for record in records {
        writeln!(
            out,
            "{} {} {:.p$} {:.p$} {:.p$}",
            record.type_tag,
            names.type_name(record.type_tag),
            record.x,
            record.y,
            record.z,
        )?;
    }

    out.flush()
}

/// Export `records` to a file, replacing any existing content.
pub fn export_file(
    path: impl AsRef<Path>,
    records: &[Record],
    names: &dyn TypeNames,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::file_write(path, e))?;
    write_export(BufWriter::new(file), records, names).map_err(|e| Error::file_write(path, e))
}
