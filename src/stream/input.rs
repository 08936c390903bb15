use std::fs::File;
use std::io::{Cursor, ErrorKind, Read};
use std::path::Path;

use super::ReadStream;
use crate::error::ArchiveError;

/// Reads any [`Read`] in fixed size chunks.
///
/// Every chunk but the last one is exactly `chunk_size` bytes long, so content of length `L`
/// comes out as `ceil(L / chunk_size)` chunks.
#[derive(Debug)]
pub struct InputStream<R: Read> {
    reader: Option<R>,
    buffer: Vec<u8>,
    size: Option<u64>,
    exhausted: bool,
}

impl InputStream<File> {
    /// Open the file at `path`; its size is taken from the file metadata.
    pub fn from_path<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let open_failure = |error| ArchiveError::StreamOpenFailure(path.to_path_buf(), error);

        let file = File::open(path).map_err(open_failure)?;
        let metadata = file.metadata().map_err(open_failure)?;

        Ok(Self::from_reader(file, Some(metadata.len()), chunk_size))
    }
}

impl InputStream<Cursor<Vec<u8>>> {
    pub fn from_content<C: Into<Vec<u8>>>(content: C, chunk_size: usize) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self::from_reader(Cursor::new(content), Some(size), chunk_size)
    }
}

impl<R: Read> InputStream<R> {
    /// Wrap `reader`. `size` is the content length when known; writers that need it up front
    /// (TAR) refuse a source without one.
    pub fn from_reader(reader: R, size: Option<u64>, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            buffer: vec![0; chunk_size.max(1)],
            size,
            exhausted: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: Read> ReadStream for InputStream<R> {
    fn read_chunk(&mut self) -> Result<Option<&[u8]>, ArchiveError> {
        let reader = match self.reader.as_mut() {
            Some(reader) if !self.exhausted => reader,
            _ => return Ok(None),
        };

        let mut filled = 0;
        while filled < self.buffer.len() {
            match reader.read(&mut self.buffer[filled..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(read) => filled += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Ok(None);
        }

        Ok(Some(&self.buffer[..filled]))
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn chunk_lengths<R: Read>(stream: &mut InputStream<R>) -> Vec<usize> {
        let mut lengths = Vec::new();
        while let Some(chunk) = stream.read_chunk().unwrap() {
            lengths.push(chunk.len());
        }
        lengths
    }

    #[test]
    fn chunks_are_full_but_the_last() {
        let mut stream = InputStream::from_content(vec![7u8; 10_000], 4096);

        assert_eq!(stream.size(), Some(10_000));
        assert_eq!(chunk_lengths(&mut stream), vec![4096, 4096, 1808]);
        assert!(stream.read_chunk().unwrap().is_none());
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let mut stream = InputStream::from_content(vec![1u8; 1024], 512);

        assert_eq!(chunk_lengths(&mut stream), vec![512, 512]);
    }

    #[test]
    fn empty_content_has_no_chunk() {
        let mut stream = InputStream::from_content("", 512);

        assert!(chunk_lengths(&mut stream).is_empty());
        assert_eq!(stream.size(), Some(0));
    }

    /// Hands out at most 3 bytes per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(3).min(self.0.len());
            buf[..len].copy_from_slice(&self.0[..len]);
            self.0 = &self.0[len..];
            Ok(len)
        }
    }

    #[test]
    fn short_reads_are_coalesced() {
        let mut stream = InputStream::from_reader(Trickle(b"Hello World!!"), None, 5);

        assert_eq!(stream.size(), None);
        assert_eq!(chunk_lengths(&mut stream), vec![5, 5, 3]);
    }

    #[test]
    fn closed_stream_yields_nothing() {
        let mut stream = InputStream::from_content("abc", 2);
        stream.close().unwrap();

        assert!(stream.is_closed());
        assert!(stream.read_chunk().unwrap().is_none());
    }

    #[test]
    fn file_source_knows_its_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let mut stream = InputStream::from_path(file.path(), 4).unwrap();

        assert_eq!(stream.size(), Some(10));
        assert_eq!(chunk_lengths(&mut stream), vec![4, 4, 2]);
    }

    #[test]
    fn missing_file_is_an_open_failure() {
        let error = InputStream::from_path("/definitely/not/here.txt", 512).unwrap_err();

        assert!(matches!(error, ArchiveError::StreamOpenFailure(..)));
        assert_eq!(
            error.to_string(),
            "Could not open file at path: /definitely/not/here.txt"
        );
    }
}
