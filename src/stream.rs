//! Byte sources and sinks consumed and produced by the archive writers.
//!
//! A [`ReadStream`] hands out a file's content chunk by chunk; a [`WriteStream`] accepts the
//! archive bytes and keeps count of them, since the writers derive every offset they record
//! from that count instead of seeking.

mod input;
mod output;
#[cfg(feature = "tokio")]
pub mod tokio;

pub use input::InputStream;
pub use output::{FanOutStream, GzOutputStream, HeaderOutputStream, Headers, OutputStream};

use crate::error::ArchiveError;

/// A finite, non-restartable sequence of byte chunks.
pub trait ReadStream {
    /// The next chunk, `None` once the source is exhausted.
    fn read_chunk(&mut self) -> Result<Option<&[u8]>, ArchiveError>;

    /// Total length of the content, when known before reading it.
    fn size(&self) -> Option<u64>;

    fn close(&mut self) -> Result<(), ArchiveError>;
}

/// A sequential byte sink.
pub trait WriteStream {
    /// Write the whole of `bytes`, returning its length.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError>;

    /// Running total of the bytes accepted so far.
    fn bytes_written(&self) -> u64;

    /// Flush and release the destination.
    fn close(&mut self) -> Result<(), ArchiveError>;
}

impl<S: WriteStream + ?Sized> WriteStream for Box<S> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        (**self).write(bytes)
    }

    fn bytes_written(&self) -> u64 {
        (**self).bytes_written()
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        (**self).close()
    }
}

impl<R: ReadStream + ?Sized> ReadStream for Box<R> {
    fn read_chunk(&mut self) -> Result<Option<&[u8]>, ArchiveError> {
        (**self).read_chunk()
    }

    fn size(&self) -> Option<u64> {
        (**self).size()
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        (**self).close()
    }
}
