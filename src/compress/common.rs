use tracing::{trace, warn};

use super::records::{CentralDirectoryFileHeader, Zip64ExtraField};
use super::ArchiveOptions;
use crate::binary::{checked_u16, checked_u32, clamp_u32};
use crate::checksum::Crc32;
use crate::compression::{CompressionMethod, Compressor};
use crate::constants::{EXTENDED_LOCAL_HEADER_FLAG, HOST_UNIX, VERSION_DEFLATE};
use crate::error::ArchiveError;
use crate::stream::{ReadStream, WriteStream};

/// Lifecycle of a writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Entries can be added.
    Open,
    /// The trailer is being written.
    Finishing,
    /// Terminal: finished, or a failure made the output unusable.
    Closed,
}

/// What every archive writer offers.
pub trait ArchiveWriter {
    /// Stream `source` into the archive under `file_name`. The source is closed afterwards,
    /// whatever the outcome.
    fn add_file(&mut self, file_name: &str, source: &mut dyn ReadStream)
        -> Result<(), ArchiveError>;

    /// Write the trailer and close the sink. Returns the archive size.
    fn finish(&mut self) -> Result<u64, ArchiveError>;

    fn state(&self) -> WriterState;

    /// Bytes accepted by the sink so far.
    fn bytes_written(&self) -> u64;
}

/// One ZIP entry, known completely once its payload has been streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub offset: u64,
    pub general_purpose_flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl ArchiveEntry {
    /// `true` when the offset or a size does not fit a 32-bit field.
    pub fn is_zip64(&self) -> bool {
        self.offset >= u32::MAX as u64
            || self.compressed_size >= u32::MAX as u64
            || self.uncompressed_size >= u32::MAX as u64
    }

    /// The ZIP64 extra field of the central directory header: only the overflowing values.
    pub fn zip64_extra_field(&self) -> Zip64ExtraField {
        let overflowing = |value: u64| (value >= u32::MAX as u64).then_some(value);

        Zip64ExtraField {
            original_size: overflowing(self.uncompressed_size),
            compressed_size: overflowing(self.compressed_size),
            local_header_offset: overflowing(self.offset),
            disk_start_number: None,
        }
    }
}

/// Bit 3 (sizes in a data descriptor) plus the method's code.
pub(crate) fn general_purpose_flags(method: CompressionMethod) -> u16 {
    EXTENDED_LOCAL_HEADER_FLAG | method.zip_code()
}

pub(crate) fn version_made_by(version: u16) -> u16 {
    HOST_UNIX << 8 | version
}

/// Entries are regular files: the name must be non-empty and not end with `/`.
pub(crate) fn check_file_name(file_name: &str) -> Result<(), ArchiveError> {
    if file_name.is_empty() || file_name.ends_with('/') {
        return Err(ArchiveError::InvalidPath(file_name.to_owned()));
    }
    if file_name.len() >= u16::MAX as usize {
        return Err(ArchiveError::PathTooLong(file_name.to_owned()));
    }
    Ok(())
}

/// Central directory header of the 32-bit writer; fails on any overflowing value.
pub(crate) fn build_central_directory_file_header(
    entry: &ArchiveEntry,
    options: &ArchiveOptions,
    version_needed: u16,
) -> Result<Vec<u8>, ArchiveError> {
    let header = CentralDirectoryFileHeader {
        version_made_by: version_made_by(VERSION_DEFLATE),
        version_needed,
        general_purpose_flags: entry.general_purpose_flags,
        compression_method: entry.compression_method.zip_code(),
        last_mod_file_time: entry.last_mod_file_time,
        last_mod_file_date: entry.last_mod_file_date,
        crc32: entry.crc32,
        compressed_size: checked_u32(entry.compressed_size, "compressed size")?,
        uncompressed_size: checked_u32(entry.uncompressed_size, "uncompressed size")?,
        disk_number_start: 0,
        internal_file_attributes: 0,
        external_file_attributes: options.external_attributes(),
        local_header_offset: checked_u32(entry.offset, "local header offset")?,
        file_name: entry.file_name.as_bytes(),
        extra_field: &[],
        file_comment: &[],
    };

    Ok(header.encode())
}

/// Central directory header of the ZIP64 writer: overflowing values are replaced by
/// 0xFFFFFFFF and carried in a ZIP64 extra field.
pub(crate) fn build_zip64_central_directory_file_header(
    entry: &ArchiveEntry,
    options: &ArchiveOptions,
    version: u16,
) -> Vec<u8> {
    let extra_field = entry.zip64_extra_field().encode();

    let header = CentralDirectoryFileHeader {
        version_made_by: version_made_by(version),
        version_needed: version,
        general_purpose_flags: entry.general_purpose_flags,
        compression_method: entry.compression_method.zip_code(),
        last_mod_file_time: entry.last_mod_file_time,
        last_mod_file_date: entry.last_mod_file_date,
        crc32: entry.crc32,
        compressed_size: clamp_u32(entry.compressed_size),
        uncompressed_size: clamp_u32(entry.uncompressed_size),
        disk_number_start: 0,
        internal_file_attributes: 0,
        external_file_attributes: options.external_attributes(),
        local_header_offset: clamp_u32(entry.offset),
        file_name: entry.file_name.as_bytes(),
        extra_field: &extra_field,
        file_comment: &[],
    };

    header.encode()
}

/// Totals of one streamed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamedPayload {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Pull every chunk of `source` through the CRC and `compressor` into `sink`.
pub(crate) fn stream_payload<S: WriteStream + ?Sized>(
    sink: &mut S,
    source: &mut dyn ReadStream,
    compressor: &mut dyn Compressor,
) -> Result<StreamedPayload, ArchiveError> {
    let mut crc = Crc32::new();
    let mut compressed_size = 0u64;

    while let Some(chunk) = source.read_chunk()? {
        crc.update(chunk);
        let compressed = compressor.compress(chunk)?;
        if !compressed.is_empty() {
            compressed_size += sink.write(&compressed)? as u64;
        }
    }

    let tail = compressor.finish()?;
    if !tail.is_empty() {
        compressed_size += sink.write(&tail)? as u64;
    }

    trace!(chunks = crc.updates(), "payload streamed");

    let uncompressed_size = crc.bytes();
    Ok(StreamedPayload {
        crc32: crc.finalize(),
        compressed_size,
        uncompressed_size,
    })
}

/// Run `append` then close `source`, on success and on failure alike.
pub(crate) fn with_source<T>(
    source: &mut dyn ReadStream,
    append: impl FnOnce(&mut dyn ReadStream) -> Result<T, ArchiveError>,
) -> Result<T, ArchiveError> {
    let result = append(&mut *source);
    let closed = source.close();

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) => Err(error),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            warn!(%close_error, "source could not be closed after a failure");
            Err(error)
        }
    }
}

/// Entry count of the 32-bit end of central directory record.
pub(crate) fn checked_entry_count(count: usize) -> Result<u16, ArchiveError> {
    checked_u16(count as u64, "entry count")
}
