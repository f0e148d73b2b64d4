//! Report rendering for search results.
//!
//! Type tags are labelled through the [`TypeNames`] trait so the tag values
//! of a particular data build stay out of the engine. [`TypeNameTable`] is
//! the usual implementation; its presets cover the builds seen so far.
//!
//! Two sinks are provided in [`writer`]: a console report and a flat-file
//! export.

mod writer;

use std::collections::BTreeMap;

pub use writer::{
    export_file, type_frequencies, write_console_report, write_export, CONSOLE_PRECISION,
    EXPORT_HEADER, EXPORT_PRECISION,
};

/// Label used for tags with no known name
pub const FALLBACK_TYPE_NAME: &str = "Object";

/// Source of human-readable names for type tags
pub trait TypeNames {
    /// The display label for `tag`
    fn type_name(&self, tag: u32) -> &str;
}

/// Tag-to-label mapping with a fallback for unknown tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameTable {
    names: BTreeMap<u32, String>,
    fallback: String,
}

impl Default for TypeNameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeNameTable {
    /// Creates an empty table; every tag maps to the fallback
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
            fallback: FALLBACK_TYPE_NAME.to_string(),
        }
    }

    /// Tags seen in unencrypted map files
    pub fn plain_epoch() -> Self {
        Self::new()
            .with(3_437_124_069, "Vehicle")
            .with(1_462_988_517, "Road")
    }

    /// Tags seen in encrypted map files
    pub fn encrypted_epoch() -> Self {
        Self::new().with(3_274_399_645, "Vehicle")
    }

    /// Adds or replaces a label
    pub fn with(mut self, tag: u32, name: impl Into<String>) -> Self {
        self.insert(tag, name);
        self
    }

    /// Adds or replaces a label in place
    pub fn insert(&mut self, tag: u32, name: impl Into<String>) {
        self.names.insert(tag, name.into());
    }

    /// Sets the label for unknown tags
    pub fn fallback(mut self, name: impl Into<String>) -> Self {
        self.fallback = name.into();
        self
    }

    /// Number of known tags
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no tag has a label
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TypeNames for TypeNameTable {
    fn type_name(&self, tag: u32) -> &str {
        self.names.get(&tag).map_or(self.fallback.as_str(), String::as_str)
    }
}
