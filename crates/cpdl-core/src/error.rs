//! Error types for the cpdl-core library.
//!
//! Every fallible operation in the engine returns [`Result`]. A search that
//! finds no plausible records is not an error; it yields an empty
//! [`SearchResult`](crate::SearchResult).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cpdl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all cpdl operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A field read ran past the end of the buffer
    #[error("read of {needed} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        /// Byte offset of the attempted read
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Length of the buffer
        available: usize,
    },

    /// Decryption key does not fit the cipher's key block
    #[error("decryption key is {len} bytes, key block holds at most {max}")]
    KeyTooLong {
        /// Length of the supplied key
        len: usize,
        /// Size of the key block
        max: usize,
    },

    /// Search configuration rejected before scanning
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new out-of-bounds read error
    pub fn out_of_bounds(offset: usize, needed: usize, available: usize) -> Self {
        Self::OutOfBounds {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new key length error
    pub fn key_too_long(len: usize, max: usize) -> Self {
        Self::KeyTooLong { len, max }
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns true for failures at the file boundaries
    pub fn is_io(&self) -> bool {
        matches!(self, Self::FileRead { .. } | Self::FileWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::out_of_bounds(12, 4, 14);
        assert!(err.to_string().contains("offset 12"));
        assert!(err.to_string().contains("14 bytes"));

        let err = Error::key_too_long(20, 16);
        assert_eq!(
            err.to_string(),
            "decryption key is 20 bytes, key block holds at most 16"
        );
    }

    #[test]
    fn test_is_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(Error::file_read("map.pdl", io).is_io());
        assert!(!Error::invalid_config("empty").is_io());
    }
}
