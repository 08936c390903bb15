use std::fmt::Display;
use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::constants::{VERSION_BASE, VERSION_DEFLATE};
use crate::error::ArchiveError;

pub const STORE: u16 = 0;
pub const DEFLATE: u16 = 8;

/// Compression applied to every entry of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression, the payload is stored as is.
    Store(),
    /// Raw deflate, [RFC 1951](https://www.rfc-editor.org/rfc/rfc1951).
    Deflate(),
}

impl Default for CompressionMethod {
    fn default() -> Self {
        CompressionMethod::Deflate()
    }
}

/// Compression level, only meaningful for [`CompressionMethod::Deflate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    Fastest,
    #[default]
    Default,
    Best,
    None,
    /// An explicit level between 0 and 9.
    Precise(u32),
}

impl From<Level> for Compression {
    fn from(level: Level) -> Self {
        match level {
            Level::Fastest => Compression::fast(),
            Level::Best => Compression::best(),
            Level::Default => Compression::new(6),
            Level::Precise(val) => Compression::new(val),
            Level::None => Compression::none(),
        }
    }
}

impl CompressionMethod {
    /// The ZIP "compression method" code.
    pub fn zip_code(&self) -> u16 {
        match self {
            CompressionMethod::Store() => STORE,
            CompressionMethod::Deflate() => DEFLATE,
        }
    }

    /// Minimum ZIP version a reader needs to extract entries written with this method.
    pub fn version_needed(&self) -> u16 {
        match self {
            CompressionMethod::Store() => VERSION_BASE,
            CompressionMethod::Deflate() => VERSION_DEFLATE,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CompressionMethod::Store() => "store",
            CompressionMethod::Deflate() => "deflate",
        }
    }

    /// Build a fresh compressor for one entry.
    pub fn compressor(&self, level: Level) -> Result<Box<dyn Compressor + Send>, ArchiveError> {
        match self {
            CompressionMethod::Store() => Ok(Box::new(StoreCompressor)),
            CompressionMethod::Deflate() => Ok(Box::new(DeflateCompressor::new(level)?)),
        }
    }
}

impl Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A per-entry streaming transform.
///
/// `compress` is fed every chunk in order and returns the bytes that are ready to be written.
/// `finish` is called once after the last chunk and returns whatever the transform still holds.
pub trait Compressor {
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ArchiveError>;

    fn finish(&mut self) -> Result<Vec<u8>, ArchiveError>;
}

#[derive(Debug, Default)]
pub struct StoreCompressor;

impl Compressor for StoreCompressor {
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        Ok(chunk.to_vec())
    }

    fn finish(&mut self) -> Result<Vec<u8>, ArchiveError> {
        Ok(Vec::new())
    }
}

/// Raw deflate over an in-memory buffer drained after every call.
pub struct DeflateCompressor {
    encoder: DeflateEncoder<Vec<u8>>,
}

impl DeflateCompressor {
    pub fn new(level: Level) -> Result<Self, ArchiveError> {
        if let Level::Precise(val) = level {
            if val > 9 {
                return Err(ArchiveError::InvalidCompressor(format!(
                    "deflate level {} is out of the 0-9 range",
                    val
                )));
            }
        }

        Ok(Self {
            encoder: DeflateEncoder::new(Vec::new(), level.into()),
        })
    }

    fn drain(&mut self) -> Vec<u8> {
        std::mem::take(self.encoder.get_mut())
    }
}

impl Compressor for DeflateCompressor {
    fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        self.encoder.write_all(chunk)?;
        Ok(self.drain())
    }

    fn finish(&mut self) -> Result<Vec<u8>, ArchiveError> {
        self.encoder.try_finish()?;
        Ok(self.drain())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    fn run(compressor: &mut dyn Compressor, content: &[u8], chunk_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in content.chunks(chunk_size) {
            out.extend(compressor.compress(chunk).unwrap());
        }
        out.extend(compressor.finish().unwrap());
        out
    }

    #[test]
    fn store_is_identity() {
        let mut compressor = CompressionMethod::Store().compressor(Level::Default).unwrap();

        let out = run(&mut *compressor, b"Hello World!!", 4);

        assert_eq!(out, b"Hello World!!");
    }

    #[test]
    fn deflate_round_trip() {
        let content = "lorem ipsum dolor sit amet ".repeat(500);
        let mut compressor = CompressionMethod::Deflate().compressor(Level::Default).unwrap();

        let out = run(&mut *compressor, content.as_bytes(), 100);
        assert!(out.len() < content.len());

        let mut decoded = String::new();
        DeflateDecoder::new(out.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn deflate_of_nothing_still_terminates_the_stream() {
        let mut compressor = DeflateCompressor::new(Level::Best).unwrap();

        let out = run(&mut compressor, b"", 16);

        assert!(!out.is_empty());
        let mut decoded = Vec::new();
        DeflateDecoder::new(out.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        assert!(matches!(
            CompressionMethod::Deflate().compressor(Level::Precise(12)),
            Err(ArchiveError::InvalidCompressor(_))
        ));
        assert!(CompressionMethod::Deflate()
            .compressor(Level::Precise(9))
            .is_ok());
    }

    #[test]
    fn method_metadata() {
        assert_eq!(CompressionMethod::Deflate().zip_code(), 8);
        assert_eq!(CompressionMethod::Deflate().version_needed(), 20);
        assert_eq!(CompressionMethod::Store().version_needed(), 10);
        assert_eq!(CompressionMethod::Store().to_string(), "store");
    }
}
