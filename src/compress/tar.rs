//! Streaming ustar archive.
//!
//! Every entry is a 512 bytes header followed by its content padded to a whole number of
//! 512 bytes blocks; the archive ends with two zero blocks. The header holds the content size,
//! so sources must report it before being read.

use tracing::{debug, trace};

use super::common::{with_source, ArchiveWriter, WriterState};
use super::ArchiveOptions;
use crate::constants::{
    TAR_BLOCK_SIZE, TAR_CHECKSUM_OFFSET, TAR_CHECKSUM_SIZE, TAR_MAX_OCTAL_SIZE, TAR_NAME_SIZE,
    TAR_PREFIX_SIZE, TAR_TRAILER_BLOCKS,
};
use crate::error::ArchiveError;
use crate::stream::{ReadStream, WriteStream};

const MODE_OFFSET: usize = 100;
const UID_OFFSET: usize = 108;
const GID_OFFSET: usize = 116;
const SIZE_OFFSET: usize = 124;
const MTIME_OFFSET: usize = 136;
const TYPEFLAG_OFFSET: usize = 156;
const MAGIC_OFFSET: usize = 257;
const VERSION_OFFSET: usize = 263;
const DEVMAJOR_OFFSET: usize = 329;
const DEVMINOR_OFFSET: usize = 337;
const PREFIX_OFFSET: usize = 345;

const REGULAR_FILE: u8 = b'0';

/// The header block of one regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader<'a> {
    pub name: &'a str,
    pub prefix: &'a str,
    pub mode: u32,
    pub size: u64,
    pub mtime: u64,
}

impl<'a> TarHeader<'a> {
    /// Split `path` at its last `/` into prefix and name, checking both fit their fields.
    /// Only the permission and set-id bits of `mode` are kept.
    pub fn new(path: &'a str, size: u64, mode: u32, mtime: u64) -> Result<Self, ArchiveError> {
        let (prefix, name) = split_path(path)?;
        Ok(Self {
            name,
            prefix,
            mode: mode & 0o7777,
            size,
            mtime,
        })
    }

    /// The 512 bytes block, or [`ArchiveError::FieldOverflow`] when a value set directly on the
    /// struct does not fit its field.
    pub fn encode(&self) -> Result<[u8; TAR_BLOCK_SIZE], ArchiveError> {
        if self.name.len() > TAR_NAME_SIZE || self.prefix.len() > TAR_PREFIX_SIZE {
            return Err(ArchiveError::PathTooLong(format!("{}/{}", self.prefix, self.name)));
        }

        let mut block = [0u8; TAR_BLOCK_SIZE];

        block[..self.name.len()].copy_from_slice(self.name.as_bytes());
        write_octal(&mut block[MODE_OFFSET..UID_OFFSET], self.mode as u64, "mode")?;
        write_octal(&mut block[UID_OFFSET..GID_OFFSET], 0, "uid")?;
        write_octal(&mut block[GID_OFFSET..SIZE_OFFSET], 0, "gid")?;
        write_size(&mut block[SIZE_OFFSET..MTIME_OFFSET], self.size)?;
        write_octal(
            &mut block[MTIME_OFFSET..TAR_CHECKSUM_OFFSET],
            self.mtime.min(TAR_MAX_OCTAL_SIZE),
            "mtime",
        )?;
        block[TYPEFLAG_OFFSET] = REGULAR_FILE;
        block[MAGIC_OFFSET..VERSION_OFFSET].copy_from_slice(b"ustar\0");
        block[VERSION_OFFSET..VERSION_OFFSET + 2].copy_from_slice(b"00");
        write_octal(&mut block[DEVMAJOR_OFFSET..DEVMINOR_OFFSET], 0, "devmajor")?;
        write_octal(&mut block[DEVMINOR_OFFSET..PREFIX_OFFSET], 0, "devminor")?;
        block[PREFIX_OFFSET..PREFIX_OFFSET + self.prefix.len()]
            .copy_from_slice(self.prefix.as_bytes());

        let sum = checksum(&block);
        let field = format!("{:06o}\0 ", sum);
        block[TAR_CHECKSUM_OFFSET..TAR_CHECKSUM_OFFSET + TAR_CHECKSUM_SIZE]
            .copy_from_slice(field.as_bytes());

        Ok(block)
    }
}

/// `(prefix, name)` of a ustar header; the prefix is empty for a bare name.
pub fn split_path(path: &str) -> Result<(&str, &str), ArchiveError> {
    let (prefix, name) = path.rsplit_once('/').unwrap_or(("", path));

    if name.is_empty() {
        return Err(ArchiveError::InvalidPath(path.to_owned()));
    }
    if name.len() > TAR_NAME_SIZE || prefix.len() > TAR_PREFIX_SIZE {
        return Err(ArchiveError::PathTooLong(path.to_owned()));
    }
    Ok((prefix, name))
}

/// Unsigned sum of the block's bytes, the checksum field counting as spaces.
pub fn checksum(block: &[u8; TAR_BLOCK_SIZE]) -> u32 {
    let checksum_field = TAR_CHECKSUM_OFFSET..TAR_CHECKSUM_OFFSET + TAR_CHECKSUM_SIZE;

    block
        .iter()
        .enumerate()
        .map(|(index, byte)| {
            if checksum_field.contains(&index) {
                b' ' as u32
            } else {
                *byte as u32
            }
        })
        .sum()
}

/// Zero padded octal digits filling all of `field` but a trailing NUL.
fn write_octal(field: &mut [u8], value: u64, name: &'static str) -> Result<(), ArchiveError> {
    let digits = format!("{:0width$o}\0", value, width = field.len() - 1);
    if digits.len() != field.len() {
        return Err(ArchiveError::FieldOverflow { field: name, value });
    }

    field.copy_from_slice(digits.as_bytes());
    Ok(())
}

/// Octal when it fits, GNU base-256 otherwise: high bit set, big-endian value.
fn write_size(field: &mut [u8], size: u64) -> Result<(), ArchiveError> {
    if size <= TAR_MAX_OCTAL_SIZE {
        return write_octal(field, size, "size");
    }

    field.fill(0);
    field[0] = 0x80;
    let start = field.len() - 8;
    field[start..].copy_from_slice(&size.to_be_bytes());
    Ok(())
}

/// A tar archive written front to back into a [`WriteStream`].
///
/// Every write handed to the sink is a whole number of blocks, so the sink can be a
/// [`GzOutputStream`](crate::stream::GzOutputStream) for `.tar.gz` output.
pub struct TarWriter<S: WriteStream> {
    sink: S,
    options: ArchiveOptions,
    carry: Vec<u8>,
    entry_count: usize,
    state: WriterState,
}

impl<S: WriteStream> TarWriter<S> {
    pub fn new(sink: S, options: ArchiveOptions) -> Self {
        Self {
            sink,
            options,
            carry: Vec::with_capacity(TAR_BLOCK_SIZE),
            entry_count: 0,
            state: WriterState::Open,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn append(&mut self, file_name: &str, source: &mut dyn ReadStream) -> Result<(), ArchiveError> {
        let size = source
            .size()
            .ok_or_else(|| ArchiveError::UnknownSize(file_name.to_owned()))?;

        let header = TarHeader::new(
            file_name,
            size,
            self.options.unix_permissions,
            self.options.last_modified_time.unix_timestamp(),
        )?;

        debug!(file_name, size, offset = self.sink.bytes_written(), "adding tar entry");
        trace!(?header, "tar header");
        self.sink.write(&header.encode()?)?;

        let mut actual = 0u64;
        while let Some(chunk) = source.read_chunk()? {
            actual += chunk.len() as u64;
            write_blocks(&mut self.sink, &mut self.carry, chunk)?;
        }

        if !self.carry.is_empty() {
            self.carry.resize(TAR_BLOCK_SIZE, 0);
            self.sink.write(&self.carry)?;
            self.carry.clear();
        }

        if actual != size {
            return Err(ArchiveError::SizeMismatch {
                name: file_name.to_owned(),
                expected: size,
                actual,
            });
        }

        self.entry_count += 1;
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<u64, ArchiveError> {
        self.sink
            .write(&[0u8; TAR_BLOCK_SIZE * TAR_TRAILER_BLOCKS])?;
        self.sink.close()?;

        let archive_size = self.sink.bytes_written();
        debug!(entries = self.entry_count, archive_size, "tar archive finished");

        Ok(archive_size)
    }
}

/// Write `chunk` to `sink` in whole blocks, keeping the incomplete tail in `carry`.
fn write_blocks<S: WriteStream + ?Sized>(
    sink: &mut S,
    carry: &mut Vec<u8>,
    mut chunk: &[u8],
) -> Result<(), ArchiveError> {
    if !carry.is_empty() {
        let missing = (TAR_BLOCK_SIZE - carry.len()).min(chunk.len());
        carry.extend_from_slice(&chunk[..missing]);
        chunk = &chunk[missing..];

        if carry.len() < TAR_BLOCK_SIZE {
            return Ok(());
        }
        sink.write(carry)?;
        carry.clear();
    }

    let whole = chunk.len() - chunk.len() % TAR_BLOCK_SIZE;
    if whole > 0 {
        sink.write(&chunk[..whole])?;
    }
    carry.extend_from_slice(&chunk[whole..]);

    Ok(())
}

impl<S: WriteStream> ArchiveWriter for TarWriter<S> {
    fn add_file(
        &mut self,
        file_name: &str,
        source: &mut dyn ReadStream,
    ) -> Result<(), ArchiveError> {
        if self.state != WriterState::Open {
            return with_source(source, |_| Err(ArchiveError::ArchiveClosed));
        }

        let result = with_source(source, |source| self.append(file_name, source));
        if matches!(&result, Err(error) if error.is_fatal()) {
            self.state = WriterState::Closed;
        }
        result
    }

    /// Write the two zero blocks and close the sink. Returns the bytes accepted by the sink,
    /// before any compression it applies.
    fn finish(&mut self) -> Result<u64, ArchiveError> {
        if self.state != WriterState::Open {
            return Err(ArchiveError::ArchiveClosed);
        }

        self.state = WriterState::Finishing;
        let result = self.write_trailer();
        self.state = WriterState::Closed;
        result
    }

    fn state(&self) -> WriterState {
        self.state
    }

    fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }
}
