//! Heuristic record layout search.
//!
//! The layout of a `.pdl` file is not known up front: its record size, the
//! number of header bytes before the first record, and its byte order all
//! have to be guessed. Every record starts with a 32-bit type tag followed by
//! three 32-bit float coordinates; whatever follows in the record is ignored.
//!
//! ## Algorithm Overview
//!
//! 1. For one (record size, header skip, byte order) hypothesis, decode
//!    consecutive records until one has an implausible coordinate
//!    ([`FormatSearch::probe`]). The length of that run is the score.
//! 2. For one (record size, byte order) pair, try every header skip in
//!    `0, 4, .. 60` and keep the longest run ([`FormatSearch::scan_headers`]).
//! 3. Repeat step 2 for every candidate record size and byte order and keep
//!    the longest run overall ([`FormatSearch::search`]).
//!
//! Ties always go to the hypothesis tried first: record sizes ascending,
//! big-endian before little-endian, header skip ascending.
//!
//! A run stops at the first bad record, so one corrupt record in the middle
//! of a file truncates the run even if the rest of the file decodes cleanly.

mod reader;

use crate::error::{Error, Result};
use tracing::{debug, trace};

pub use reader::{is_plausible, read_f32, read_u32, ByteOrder, FIELD_WIDTH};

/// Record sizes tried by default, in search order
pub const DEFAULT_RECORD_SIZES: [usize; 4] = [16, 20, 24, 32];

/// Exclusive upper bound on the header skips tried
pub const HEADER_SEARCH_LIMIT: usize = 64;

/// Distance between consecutive header skips
pub const HEADER_STRIDE: usize = 4;

/// Coordinates with a magnitude at or above this are treated as noise
pub const PLAUSIBILITY_LIMIT: f32 = 100_000.0;

/// Bytes taken by the type tag and the three coordinates
pub const RECORD_FIELDS_LEN: usize = 4 * FIELD_WIDTH;

const TYPE_OFFSET: usize = 0;
const X_OFFSET: usize = 4;
const Y_OFFSET: usize = 8;
const Z_OFFSET: usize = 12;

/// A single decoded record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Numeric object type
    pub type_tag: u32,
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
    /// Absolute position of the record in the buffer it was decoded from
    pub offset: usize,
}

impl Record {
    /// Decode the record starting at `offset`.
    pub fn decode(data: &[u8], offset: usize, order: ByteOrder) -> Result<Self> {
        let at = |field: usize| {
            offset
                .checked_add(field)
                .ok_or_else(|| Error::out_of_bounds(offset, RECORD_FIELDS_LEN, data.len()))
        };

        Ok(Self {
            type_tag: read_u32(data, at(TYPE_OFFSET)?, order)?,
            x: read_f32(data, at(X_OFFSET)?, order)?,
            y: read_f32(data, at(Y_OFFSET)?, order)?,
            z: read_f32(data, at(Z_OFFSET)?, order)?,
            offset,
        })
    }

    /// Whether all three coordinates pass the plausibility filter
    pub fn is_plausible(&self, limit: f32) -> bool {
        is_plausible(self.x, limit) && is_plausible(self.y, limit) && is_plausible(self.z, limit)
    }

    /// The coordinates as an array
    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Which byte orders a search tries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrders {
    /// Only the given order
    Single(ByteOrder),
    /// Big-endian, then little-endian
    #[default]
    Both,
}

impl ByteOrders {
    /// The orders to try, in search order
    pub fn orders(self) -> &'static [ByteOrder] {
        match self {
            ByteOrders::Single(ByteOrder::Big) => &ByteOrder::ALL[..1],
            ByteOrders::Single(ByteOrder::Little) => &ByteOrder::ALL[1..],
            ByteOrders::Both => &ByteOrder::ALL,
        }
    }
}

impl From<ByteOrder> for ByteOrders {
    fn from(order: ByteOrder) -> Self {
        ByteOrders::Single(order)
    }
}

/// A layout hypothesis together with the run it decodes
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCandidate {
    /// Record size in bytes
    pub record_size: usize,
    /// Leading bytes skipped before the first record
    pub header_skip: usize,
    /// Byte order of every field
    pub byte_order: ByteOrder,
    /// Records decoded under this hypothesis
    pub records: Vec<Record>,
}

impl FormatCandidate {
    /// Number of records in the run
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the run is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Strictly longer run wins; equal runs keep the earlier candidate.
    fn beats(&self, other: &FormatCandidate) -> bool {
        self.len() > other.len()
    }
}

/// Best layout found by a full search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Record size in bytes
    pub record_size: usize,
    /// Leading bytes skipped before the first record
    pub header_skip: usize,
    /// Byte order of every field
    pub byte_order: ByteOrder,
    /// Decoded records, in file order
    pub records: Vec<Record>,
    /// Number of (record size, byte order, header skip) hypotheses probed
    pub hypotheses: usize,
}

impl SearchResult {
    fn from_candidate(candidate: FormatCandidate, hypotheses: usize) -> Self {
        Self {
            record_size: candidate.record_size,
            header_skip: candidate.header_skip,
            byte_order: candidate.byte_order,
            records: candidate.records,
            hypotheses,
        }
    }

    /// Whether no plausible record was found
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Configuration for the layout search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Record sizes to try, in order
    pub record_sizes: Vec<usize>,
    /// Byte orders to try
    pub byte_orders: ByteOrders,
    /// Exclusive upper bound on header skips
    pub header_search_limit: usize,
    /// Step between header skips
    pub header_stride: usize,
    /// Plausibility bound on coordinate magnitude
    pub plausibility_limit: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            record_sizes: DEFAULT_RECORD_SIZES.to_vec(),
            byte_orders: ByteOrders::Both,
            header_search_limit: HEADER_SEARCH_LIMIT,
            header_stride: HEADER_STRIDE,
            plausibility_limit: PLAUSIBILITY_LIMIT,
        }
    }
}

impl SearchConfig {
    /// Creates a new search config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record sizes to try
    pub fn record_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.record_sizes = sizes.into();
        self
    }

    /// Sets the byte orders to try
    pub fn byte_orders(mut self, orders: impl Into<ByteOrders>) -> Self {
        self.byte_orders = orders.into();
        self
    }

    /// Sets the exclusive upper bound on header skips
    pub fn header_search_limit(mut self, limit: usize) -> Self {
        self.header_search_limit = limit;
        self
    }

    /// Sets the step between header skips
    pub fn header_stride(mut self, stride: usize) -> Self {
        self.header_stride = stride;
        self
    }

    /// Sets the coordinate plausibility bound
    pub fn plausibility_limit(mut self, limit: f32) -> Self {
        self.plausibility_limit = limit;
        self
    }

    /// Check that the configuration describes a non-empty search
    pub fn validate(&self) -> Result<()> {
        if self.record_sizes.is_empty() {
            return Err(Error::invalid_config("no record sizes to try"));
        }
        if let Some(size) = self
            .record_sizes
            .iter()
            .find(|&&size| size < RECORD_FIELDS_LEN)
        {
            return Err(Error::invalid_config(format!(
                "record size {} is smaller than the {} bytes of fixed fields",
                size, RECORD_FIELDS_LEN
            )));
        }
        if self.header_stride == 0 {
            return Err(Error::invalid_config("header stride must be non-zero"));
        }
        if self.header_search_limit == 0 {
            return Err(Error::invalid_config("header search limit must be non-zero"));
        }
        if self.plausibility_limit.is_nan() || self.plausibility_limit <= 0.0 {
            return Err(Error::invalid_config(format!(
                "plausibility limit must be positive, got {}",
                self.plausibility_limit
            )));
        }
        Ok(())
    }

    fn header_skips(&self) -> impl Iterator<Item = usize> {
        (0..self.header_search_limit).step_by(self.header_stride)
    }
}

/// Brute-force search for the record layout of a buffer
#[derive(Debug, Clone)]
pub struct FormatSearch {
    config: SearchConfig,
}

impl Default for FormatSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatSearch {
    /// Creates a new search with default configuration
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Creates a new search with custom configuration
    pub fn with_config(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Decode the run of plausible records for one hypothesis.
    ///
    /// The run ends before the first implausible record or when fewer than
    /// `record_size` bytes remain.
    pub fn probe(
        &self,
        data: &[u8],
        record_size: usize,
        header_skip: usize,
        order: ByteOrder,
    ) -> Result<Vec<Record>> {
        if record_size < RECORD_FIELDS_LEN {
            return Err(Error::invalid_config(format!(
                "record size {} is smaller than the {} bytes of fixed fields",
                record_size, RECORD_FIELDS_LEN
            )));
        }

        let mut records = Vec::new();
        let mut offset = header_skip;

        while offset
            .checked_add(record_size)
            .is_some_and(|end| end <= data.len())
        {
            let record = Record::decode(data, offset, order)?;
            if !record.is_plausible(self.config.plausibility_limit) {
                trace!(
                    "Implausible record at offset {:#x}: ({}, {}, {})",
                    offset,
                    record.x,
                    record.y,
                    record.z
                );
                break;
            }

            records.push(record);
            offset += record_size;
        }

        trace!(
            "Probe size={} skip={} order={}: {} records",
            record_size,
            header_skip,
            order,
            records.len()
        );
        Ok(records)
    }

    /// Find the header skip giving the longest run for one record size and order.
    pub fn scan_headers(
        &self,
        data: &[u8],
        record_size: usize,
        order: ByteOrder,
    ) -> Result<FormatCandidate> {
        let mut best: Option<FormatCandidate> = None;

        for header_skip in self.config.header_skips() {
            let candidate = FormatCandidate {
                record_size,
                header_skip,
                byte_order: order,
                records: self.probe(data, record_size, header_skip, order)?,
            };

            if best.as_ref().map_or(true, |best| candidate.beats(best)) {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| Error::invalid_config("no header skips to try"))
    }

    /// Search every configured hypothesis and return the best one.
    ///
    /// Finding nothing is not an error: the result then has no records and
    /// reports the first hypothesis tried.
    pub fn search(&self, data: &[u8]) -> Result<SearchResult> {
        let orders = self.config.byte_orders.orders();
        let pairs: Vec<(usize, ByteOrder)> = self
            .config
            .record_sizes
            .iter()
            .flat_map(|&size| orders.iter().map(move |&order| (size, order)))
            .collect();

        debug!(
            "Searching {} bytes across {} record size/byte order pairs",
            data.len(),
            pairs.len()
        );

        let mut best: Option<FormatCandidate> = None;
        for candidate in self.scan_pairs(data, &pairs)? {
            debug!(
                "Best for size={} order={}: {} records at skip {}",
                candidate.record_size,
                candidate.byte_order,
                candidate.len(),
                candidate.header_skip
            );
            if best.as_ref().map_or(true, |best| candidate.beats(best)) {
                best = Some(candidate);
            }
        }

        let best = best.ok_or_else(|| Error::invalid_config("no record sizes to try"))?;
        let hypotheses = pairs.len() * self.config.header_skips().count();

        debug!(
            "Selected size={} skip={} order={} with {} records",
            best.record_size,
            best.header_skip,
            best.byte_order,
            best.len()
        );
        Ok(SearchResult::from_candidate(best, hypotheses))
    }

    #[cfg(not(feature = "parallel"))]
    fn scan_pairs(
        &self,
        data: &[u8],
        pairs: &[(usize, ByteOrder)],
    ) -> Result<Vec<FormatCandidate>> {
        pairs
            .iter()
            .map(|&(size, order)| self.scan_headers(data, size, order))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn scan_pairs(
        &self,
        data: &[u8],
        pairs: &[(usize, ByteOrder)],
    ) -> Result<Vec<FormatCandidate>> {
        use rayon::prelude::*;

        // Indexed collect keeps the fixed order the tie-break depends on.
        pairs
            .par_iter()
            .map(|&(size, order)| self.scan_headers(data, size, order))
            .collect()
    }
}
