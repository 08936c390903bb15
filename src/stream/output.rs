use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use super::WriteStream;
use crate::constants::TAR_BLOCK_SIZE;
use crate::error::ArchiveError;

/// A [`Write`] destination that counts the bytes written through it.
#[derive(Debug)]
pub struct OutputStream<W: Write> {
    writer: W,
    written_bytes_count: u64,
}

impl OutputStream<File> {
    /// Create (or truncate) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|error| ArchiveError::StreamOpenFailure(path.to_path_buf(), error))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> OutputStream<W> {
    pub fn new(writer: W) -> OutputStream<W> {
        Self {
            writer,
            written_bytes_count: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> WriteStream for OutputStream<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        self.writer
            .write_all(bytes)
            .map_err(ArchiveError::StreamWriteFailure)?;
        self.written_bytes_count += bytes.len() as u64;
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.written_bytes_count
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.writer.flush().map_err(ArchiveError::StreamWriteFailure)
    }
}

/// Exposes a [`WriteStream`] as a [`Write`] for encoders.
#[derive(Debug)]
struct StreamWriter<S: WriteStream>(S);

impl<S: WriteStream> Write for StreamWriter<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf).map_err(into_io_error)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn into_io_error(error: ArchiveError) -> std::io::Error {
    match error {
        ArchiveError::Io(error) | ArchiveError::StreamWriteFailure(error) => error,
        other => std::io::Error::new(ErrorKind::Other, other),
    }
}

/// Gzip compresses everything written to it into an inner [`WriteStream`].
///
/// Every write is zero padded up to a multiple of 512 bytes before compression, so the
/// decompressed stream keeps TAR block alignment. [`bytes_written`](WriteStream::bytes_written)
/// counts those padded, uncompressed bytes.
pub struct GzOutputStream<S: WriteStream> {
    encoder: GzEncoder<StreamWriter<S>>,
    written_bytes_count: u64,
}

impl<S: WriteStream> GzOutputStream<S> {
    pub fn new(sink: S) -> Self {
        Self::with_compression(sink, Compression::default())
    }

    pub fn with_compression(sink: S, compression: Compression) -> Self {
        Self {
            encoder: GzEncoder::new(StreamWriter(sink), compression),
            written_bytes_count: 0,
        }
    }

    /// Compressed bytes handed to the inner sink so far.
    pub fn compressed_bytes_written(&self) -> u64 {
        self.encoder.get_ref().0.bytes_written()
    }

    /// Finish the gzip member if needed and return the inner sink.
    pub fn into_inner(self) -> Result<S, ArchiveError> {
        let writer = self
            .encoder
            .finish()
            .map_err(ArchiveError::StreamWriteFailure)?;
        Ok(writer.0)
    }
}

impl<S: WriteStream> WriteStream for GzOutputStream<S> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        let padding = (TAR_BLOCK_SIZE - bytes.len() % TAR_BLOCK_SIZE) % TAR_BLOCK_SIZE;

        self.encoder
            .write_all(bytes)
            .and_then(|_| self.encoder.write_all(&[0u8; TAR_BLOCK_SIZE][..padding]))
            .map_err(ArchiveError::StreamWriteFailure)?;

        self.written_bytes_count += (bytes.len() + padding) as u64;
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.written_bytes_count
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.encoder
            .try_finish()
            .map_err(ArchiveError::StreamWriteFailure)?;
        self.encoder.get_mut().0.close()
    }
}

/// Writes the same bytes to several sinks.
pub struct FanOutStream {
    sinks: Vec<Box<dyn WriteStream + Send>>,
    written_bytes_count: u64,
}

impl FanOutStream {
    /// Fails with [`ArchiveError::NoDestinations`] when `sinks` is empty.
    pub fn new(sinks: Vec<Box<dyn WriteStream + Send>>) -> Result<Self, ArchiveError> {
        if sinks.is_empty() {
            return Err(ArchiveError::NoDestinations);
        }

        Ok(Self {
            sinks,
            written_bytes_count: 0,
        })
    }

    pub fn push<S: WriteStream + Send + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn into_inner(self) -> Vec<Box<dyn WriteStream + Send>> {
        self.sinks
    }
}

impl WriteStream for FanOutStream {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        for sink in self.sinks.iter_mut() {
            sink.write(bytes)?;
        }
        self.written_bytes_count += bytes.len() as u64;
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.written_bytes_count
    }

    /// Close every sink, even when one of them fails; the first failure is returned.
    fn close(&mut self) -> Result<(), ArchiveError> {
        let mut first_error = None;
        for sink in self.sinks.iter_mut() {
            if let Err(error) = sink.close() {
                warn!(%error, "closing a fan-out destination failed");
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Response headers as `(name, value)` pairs.
pub type Headers = Vec<(String, String)>;

/// Hands its headers to `send_headers` once, right before the first byte reaches the inner
/// sink; an HTTP response thus only commits once the archive starts.
pub struct HeaderOutputStream<S, F>
where
    S: WriteStream,
    F: FnOnce(&[(String, String)]) -> Result<(), ArchiveError>,
{
    sink: S,
    headers: Headers,
    send_headers: Option<F>,
}

impl<S, F> HeaderOutputStream<S, F>
where
    S: WriteStream,
    F: FnOnce(&[(String, String)]) -> Result<(), ArchiveError>,
{
    pub fn new(sink: S, headers: Headers, send_headers: F) -> Self {
        Self {
            sink,
            headers,
            send_headers: Some(send_headers),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn headers_sent(&self) -> bool {
        self.send_headers.is_none()
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S, F> WriteStream for HeaderOutputStream<S, F>
where
    S: WriteStream,
    F: FnOnce(&[(String, String)]) -> Result<(), ArchiveError>,
{
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        if let Some(send_headers) = self.send_headers.take() {
            debug!(count = self.headers.len(), "sending headers");
            send_headers(&self.headers)?;
        }
        self.sink.write(bytes)
    }

    fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.sink.close()
    }
}
