//! Streaming ZIP archive limited to 32-bit records.

use tracing::{debug, trace};

use super::common::{
    build_central_directory_file_header, check_file_name, checked_entry_count,
    general_purpose_flags, stream_payload, with_source, ArchiveEntry, ArchiveWriter, WriterState,
};
use super::records::{DataDescriptor, EndOfCentralDirectoryRecord, LocalFileHeader};
use super::ArchiveOptions;
use crate::binary::checked_u32;
use crate::error::ArchiveError;
use crate::stream::{ReadStream, WriteStream};

/// A zip archive written front to back into a [`WriteStream`].
///
/// Each entry is a local file header with its CRC and sizes left at 0, the payload, then a data
/// descriptor with the real values. The central directory is kept in memory and written by
/// [`finish`](ArchiveWriter::finish).
///
/// Any value that does not fit the 32-bit records (an offset or a size of 4 GiB, 65535 entries)
/// fails with [`ArchiveError::Zip64Required`]; use
/// [`Zip64Writer`](super::zip64::Zip64Writer) for such archives.
///
/// ```
/// use archstream::compress::{zip::ZipWriter, ArchiveOptions, ArchiveWriter};
/// use archstream::stream::{InputStream, OutputStream};
///
/// let mut archive = ZipWriter::new(OutputStream::new(Vec::new()), ArchiveOptions::default());
/// archive.add_file("hello.txt", &mut InputStream::from_content("Hello", 4096))?;
/// let size = archive.finish()?;
///
/// assert_eq!(size as usize, archive.into_inner().into_inner().len());
/// # Ok::<(), archstream::error::ArchiveError>(())
/// ```
pub struct ZipWriter<S: WriteStream> {
    sink: S,
    options: ArchiveOptions,
    entries: Vec<ArchiveEntry>,
    central_directory: Vec<Vec<u8>>,
    state: WriterState,
}

impl<S: WriteStream> ZipWriter<S> {
    pub fn new(sink: S, options: ArchiveOptions) -> Self {
        Self {
            sink,
            options,
            entries: Vec::new(),
            central_directory: Vec::new(),
            state: WriterState::Open,
        }
    }

    /// The entries added so far, in order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn append(&mut self, file_name: &str, source: &mut dyn ReadStream) -> Result<(), ArchiveError> {
        check_file_name(file_name)?;

        let method = self.options.compression_method;
        let mut compressor = method.compressor(self.options.compression_level)?;
        let version_needed = method.version_needed();

        let offset = self.sink.bytes_written();
        checked_u32(offset, "local header offset")?;

        let (last_mod_file_date, last_mod_file_time) = self.options.last_modified_time.ms_dos();

        let file_header = LocalFileHeader {
            version_needed,
            general_purpose_flags: general_purpose_flags(method),
            compression_method: method.zip_code(),
            last_mod_file_time,
            last_mod_file_date,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            file_name: file_name.as_bytes(),
            extra_field: &[],
        };

        debug!(file_name, offset, %method, "adding zip entry");
        self.sink.write(&file_header.encode())?;

        let payload = stream_payload(&mut self.sink, source, &mut *compressor)?;

        let descriptor = DataDescriptor {
            crc32: payload.crc32,
            compressed_size: checked_u32(payload.compressed_size, "compressed size")?,
            uncompressed_size: checked_u32(payload.uncompressed_size, "uncompressed size")?,
        };
        trace!(?descriptor, "data descriptor");
        self.sink.write(&descriptor.encode())?;

        let entry = ArchiveEntry {
            file_name: file_name.to_owned(),
            offset,
            general_purpose_flags: general_purpose_flags(method),
            compression_method: method,
            last_mod_file_time,
            last_mod_file_date,
            crc32: payload.crc32,
            compressed_size: payload.compressed_size,
            uncompressed_size: payload.uncompressed_size,
        };

        let header = build_central_directory_file_header(&entry, &self.options, version_needed)?;
        self.central_directory.push(header);

        debug!(
            file_name,
            crc32 = entry.crc32,
            compressed_size = entry.compressed_size,
            uncompressed_size = entry.uncompressed_size,
            "zip entry added"
        );
        self.entries.push(entry);

        Ok(())
    }

    fn write_trailer(&mut self) -> Result<u64, ArchiveError> {
        let central_directory_offset = self.sink.bytes_written();
        let central_directory_size: u64 = self
            .central_directory
            .iter()
            .map(|header| header.len() as u64)
            .sum();

        // Validate before the first trailer byte is written.
        let entry_count = checked_entry_count(self.central_directory.len())?;
        let offset = checked_u32(central_directory_offset, "central directory offset")?;
        let size = checked_u32(central_directory_size, "central directory size")?;

        for header in &self.central_directory {
            self.sink.write(header)?;
        }

        let end_of_central_directory = EndOfCentralDirectoryRecord {
            total_number_of_entries_on_this_disk: entry_count,
            total_number_of_entries_in_the_central_directory: entry_count,
            central_directory_size: size,
            offset_of_start_of_central_directory: offset,
            archive_comment: self.options.comment_bytes(),
            ..Default::default()
        };
        self.sink.write(&end_of_central_directory.encode())?;
        self.sink.close()?;

        let archive_size = self.sink.bytes_written();
        debug!(entries = entry_count, archive_size, "zip archive finished");

        Ok(archive_size)
    }
}

impl<S: WriteStream> ArchiveWriter for ZipWriter<S> {
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
