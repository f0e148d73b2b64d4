//! cpdl - Recover the record layout of `.pdl` map data files
//!
//! This tool searches a map file for the record size, header length and byte
//! order that decode the longest run of plausible objects, optionally after
//! decrypting it, and prints or exports the objects it finds.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cpdl_core::search::{DEFAULT_RECORD_SIZES, PLAUSIBILITY_LIMIT};
use cpdl_core::{
    export_file, load_file, write_console_report, ByteOrder, ByteOrders, EcbCipher, FormatSearch,
    Pipeline, SearchConfig, TypeNameTable,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Recover the record layout of .pdl map data files
#[derive(Parser, Debug)]
#[command(name = "cpdl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Map data file to analyze
    #[arg(short, long, env = "CPDL_INPUT", default_value = "map.pdl")]
    input: PathBuf,

    /// Also write decoded objects to this file as `type_id type_name x y z` lines
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Decrypt the input with AES-128-ECB using this key (at most 16 bytes, zero-padded)
    #[arg(short, long, env = "CPDL_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Byte orders to try
    #[arg(long, value_enum, default_value = "both")]
    endian: Endian,

    /// Candidate record sizes, tried in the given order
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_RECORD_SIZES)]
    record_sizes: Vec<usize>,

    /// Coordinates with a magnitude at or above this end a run
    #[arg(long, default_value_t = PLAUSIBILITY_LIMIT)]
    plausibility_limit: f32,

    /// Type name table [default: encrypted when --key is given, plain otherwise]
    #[arg(long, value_enum)]
    tag_table: Option<TagTable>,

    /// Extra type label as TAG=NAME (repeatable)
    #[arg(long = "type-name", value_name = "TAG=NAME", value_parser = parse_type_name)]
    type_names: Vec<(u32, String)>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Byte orders to search
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Endian {
    /// Big-endian only
    Big,
    /// Little-endian only
    Little,
    /// Big-endian, then little-endian
    Both,
}

impl From<Endian> for ByteOrders {
    fn from(endian: Endian) -> Self {
        match endian {
            Endian::Big => ByteOrders::Single(ByteOrder::Big),
            Endian::Little => ByteOrders::Single(ByteOrder::Little),
            Endian::Both => ByteOrders::Both,
        }
    }
}

/// Known type tag sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TagTable {
    /// Tags from unencrypted map files
    Plain,
    /// Tags from encrypted map files
    Encrypted,
}

/// Parse a `TAG=NAME` label override
fn parse_type_name(s: &str) -> Result<(u32, String), String> {
    let (tag, name) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=NAME, got '{}'", s))?;
    let tag = tag
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid type tag '{}': {}", tag, e))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty type name for tag {}", tag));
    }
    Ok((tag, name.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[cpdl] Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Load, search and report one map file
fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let config = SearchConfig::new()
        .record_sizes(cli.record_sizes.clone())
        .byte_orders(cli.endian)
        .plausibility_limit(cli.plausibility_limit);
    let search = FormatSearch::with_config(config)?;

    let mut pipeline = Pipeline::new(search);
    if let Some(key) = &cli.key {
        let cipher = EcbCipher::new(key.as_bytes()).context("Invalid decryption key")?;
        pipeline = pipeline.with_preprocessor(cipher);
    }

    let buffer = load_file(&cli.input)?;
    debug!("Loaded {} bytes from {}", buffer.len(), cli.input.display());

    let analysis = pipeline
        .run(buffer)
        .with_context(|| format!("Failed to analyze {}", cli.input.display()))?;
    let result = &analysis.result;
    info!(
        "Probed {} layouts, best decodes {} objects",
        result.hypotheses,
        result.records.len()
    );

    let names = type_names(cli);
    write_console_report(&mut *out, result, &names).context("Failed to write report")?;

    if let Some(path) = &cli.export {
        export_file(path, &result.records, &names)?;
        writeln!(
            out,
            "\n[cpdl] Exported {} objects to {}",
            result.records.len(),
            path.display()
        )?;
    }

    Ok(())
}

/// Build the type name table from the preset and any overrides
fn type_names(cli: &Cli) -> TypeNameTable {
    let preset = cli.tag_table.unwrap_or(if cli.key.is_some() {
        TagTable::Encrypted
    } else {
        TagTable::Plain
    });

    let mut table = match preset {
        TagTable::Plain => TypeNameTable::plain_epoch(),
        TagTable::Encrypted => TypeNameTable::encrypted_epoch(),
    };
    for (tag, name) in &cli.type_names {
        table.insert(*tag, name.clone());
    }
    table
}
