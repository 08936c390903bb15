//! Bridge from the blocking writers to a tokio [`AsyncWrite`].
//!
//! The writers are synchronous; to stream an archive into an async destination (an HTTP body,
//! a [`tokio::io::duplex`] pipe) run the writer inside [`tokio::task::spawn_blocking`] over a
//! [`TokioOutputStream`].
//!
//! ```no_run
//! use archstream::compress::zip::ZipWriter;
//! use archstream::compress::{ArchiveOptions, ArchiveWriter};
//! use archstream::stream::{tokio::TokioOutputStream, InputStream};
//! use tokio::io::AsyncReadExt;
//!
//! # async fn run() -> Result<(), archstream::error::ArchiveError> {
//! let (writer, mut reader) = tokio::io::duplex(4096);
//! let sink = TokioOutputStream::current(writer)?;
//!
//! let producer = tokio::task::spawn_blocking(move || {
//!     let mut archive = ZipWriter::new(sink, ArchiveOptions::default());
//!     archive.add_file("hello.txt", &mut InputStream::from_content("hello", 4096))?;
//!     archive.finish()
//! });
//!
//! let mut body = Vec::new();
//! reader.read_to_end(&mut body).await?;
//! # let _ = producer.await;
//! # Ok(())
//! # }
//! ```

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;

use super::WriteStream;
use crate::error::ArchiveError;

/// Counts and forwards writes to an [`AsyncWrite`], blocking the calling thread on each one.
///
/// Must not be used from an async task: call it from a blocking thread.
#[derive(Debug)]
pub struct TokioOutputStream<W: AsyncWrite + Unpin> {
    writer: W,
    handle: Handle,
    written_bytes_count: u64,
}

impl<W: AsyncWrite + Unpin> TokioOutputStream<W> {
    pub fn new(writer: W, handle: Handle) -> Self {
        Self {
            writer,
            handle,
            written_bytes_count: 0,
        }
    }

    /// Bind to the runtime of the calling context.
    pub fn current(writer: W) -> Result<Self, ArchiveError> {
        let handle = Handle::try_current().map_err(|error| {
            ArchiveError::Io(std::io::Error::new(std::io::ErrorKind::Other, error))
        })?;
        Ok(Self::new(writer, handle))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin> WriteStream for TokioOutputStream<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        let writer = &mut self.writer;
        self.handle
            .block_on(writer.write_all(bytes))
            .map_err(ArchiveError::StreamWriteFailure)?;
        self.written_bytes_count += bytes.len() as u64;
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.written_bytes_count
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        let writer = &mut self.writer;
        self.handle
            .block_on(async {
                writer.flush().await?;
                writer.shutdown().await
            })
            .map_err(ArchiveError::StreamWriteFailure)
    }
}
