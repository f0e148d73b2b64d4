//! Buffer loading and the preprocess-then-search pipeline.
//!
//! ```no_run
//! use cpdl_core::{load_file, EcbCipher, FormatSearch, Pipeline};
//!
//! let pipeline = Pipeline::new(FormatSearch::new())
//!     .with_preprocessor(EcbCipher::new(b"secret")?);
//! let analysis = pipeline.run(load_file("map.pdl")?)?;
//! println!("{} records", analysis.result.records.len());
//! # Ok::<(), cpdl_core::Error>(())
//! ```

use crate::cipher::EcbCipher;
use crate::error::{Error, Result};
use crate::search::{FormatSearch, SearchResult};
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, trace};

/// A whole-buffer transform applied before the search.
///
/// Implementations produce a new buffer and never modify their input.
pub trait Preprocessor: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Transform the buffer
    fn process(&self, data: &[u8]) -> Result<Bytes>;
}

impl Preprocessor for EcbCipher {
    fn name(&self) -> &str {
        "aes-128-ecb"
    }

    fn process(&self, data: &[u8]) -> Result<Bytes> {
        Ok(self.decrypt(data))
    }
}

/// Output of a pipeline run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The buffer that was searched; record offsets index into it
    pub buffer: Bytes,
    /// The best layout found
    pub result: SearchResult,
}

/// Optional preprocessing stage followed by a [`FormatSearch`]
pub struct Pipeline {
    preprocessor: Option<Box<dyn Preprocessor>>,
    search: FormatSearch,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FormatSearch::new())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("preprocessor", &self.preprocessor.as_ref().map(|p| p.name()))
            .field("search", &self.search)
            .finish()
    }
}

impl Pipeline {
    /// Creates a pipeline that searches the buffer as loaded
    pub fn new(search: FormatSearch) -> Self {
        Self {
            preprocessor: None,
            search,
        }
    }

    /// Adds a stage that runs before the search
    pub fn with_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// The search this pipeline runs
    pub fn search(&self) -> &FormatSearch {
        &self.search
    }

    /// Run the pipeline over `buffer`.
    pub fn run(&self, buffer: Bytes) -> Result<Analysis> {
        let buffer = match &self.preprocessor {
            Some(stage) => {
                debug!("Running {} over {} bytes", stage.name(), buffer.len());
                stage.process(&buffer)?
            }
            None => buffer,
        };

        let result = self.search.search(&buffer)?;
        Ok(Analysis { buffer, result })
    }
}

/// Read a whole file into a buffer.
pub fn load_file(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    trace!("Reading {}", path.display());
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    trace!("Read {} bytes from {}", data.len(), path.display());
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ByteOrder, SearchConfig};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..4u32 {
            data.extend_from_slice(&(100 + i).to_le_bytes());
            for v in [1.0f32, 2.0, 3.0] {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        data
    }

    fn little_endian() -> FormatSearch {
        FormatSearch::with_config(SearchConfig::new().byte_orders(ByteOrder::Little)).unwrap()
    }

    #[test]
    fn test_plain_run() {
        let analysis = Pipeline::new(little_endian())
            .run(Bytes::from(sample()))
            .unwrap();
        assert_eq!(analysis.result.records.len(), 4);
        assert_eq!(&analysis.buffer[..], &sample()[..]);
    }

    #[test]
    fn test_encrypted_run_matches_plain() {
        let cipher = EcbCipher::new(b"map-key").unwrap();
        let encrypted = cipher.encrypt(&sample());

        let plain = Pipeline::new(little_endian())
            .run(Bytes::from(sample()))
            .unwrap();
        let decrypted = Pipeline::new(little_endian())
            .with_preprocessor(cipher)
            .run(encrypted)
            .unwrap();

        assert_eq!(decrypted.result, plain.result);
        assert_eq!(decrypted.buffer, plain.buffer);
    }

    #[test]
    fn test_wrong_key_does_not_error() {
        let encrypted = EcbCipher::new(b"right").unwrap().encrypt(&sample());
        let analysis = Pipeline::default()
            .with_preprocessor(EcbCipher::new(b"wrong").unwrap())
            .run(encrypted)
            .unwrap();
        assert_eq!(analysis.buffer.len(), sample().len());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample()).unwrap();

        let buffer = load_file(file.path()).unwrap();
        assert_eq!(&buffer[..], &sample()[..]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("missing.pdl")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("missing.pdl"));
    }
}
