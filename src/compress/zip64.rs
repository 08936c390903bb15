//! Streaming ZIP archive with the ZIP64 extensions.

use tracing::{debug, trace};

use super::common::{
    build_zip64_central_directory_file_header, check_file_name, general_purpose_flags,
    stream_payload, version_made_by, with_source, ArchiveEntry, ArchiveWriter, WriterState,
};
use super::records::{
    EndOfCentralDirectoryRecord, LocalFileHeader, Zip64DataDescriptor,
    Zip64EndOfCentralDirectoryLocator, Zip64EndOfCentralDirectoryRecord, Zip64ExtraField,
};
use super::ArchiveOptions;
use crate::binary::{clamp_u16, clamp_u32};
use crate::constants::VERSION_ZIP64;
use crate::error::ArchiveError;
use crate::stream::{ReadStream, WriteStream};

/// A zip archive without the 4 GiB and 65535 entries limits.
///
/// Entries always end with a 64-bit data descriptor. Offsets and sizes reaching `u32::MAX` are
/// written as `0xFFFFFFFF` in the central directory, their value moving to a ZIP64 extra field;
/// the ZIP64 end of central directory record and its locator are added only when the entry
/// count, or the central directory offset or size, overflows the standard record.
pub struct Zip64Writer<S: WriteStream> {
    sink: S,
    options: ArchiveOptions,
    entries: Vec<ArchiveEntry>,
    central_directory: Vec<Vec<u8>>,
    state: WriterState,
}

impl<S: WriteStream> Zip64Writer<S> {
    pub fn new(sink: S, options: ArchiveOptions) -> Self {
        Self {
            sink,
            options,
            entries: Vec::new(),
            central_directory: Vec::new(),
            state: WriterState::Open,
        }
    }

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

        let offset = self.sink.bytes_written();
        let (last_mod_file_date, last_mod_file_time) = self.options.last_modified_time.ms_dos();

        // Sizes are unknown here, only an overflowing offset can be declared.
        let extra_field = Zip64ExtraField {
            local_header_offset: (offset >= u32::MAX as u64).then_some(offset),
            ..Default::default()
        }
        .encode();

        let file_header = LocalFileHeader {
            version_needed: VERSION_ZIP64,
            general_purpose_flags: general_purpose_flags(method),
            compression_method: method.zip_code(),
            last_mod_file_time,
            last_mod_file_date,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            file_name: file_name.as_bytes(),
            extra_field: &extra_field,
        };

        debug!(file_name, offset, %method, "adding zip64 entry");
        self.sink.write(&file_header.encode())?;

        let payload = stream_payload(&mut self.sink, source, &mut *compressor)?;

        let descriptor = Zip64DataDescriptor {
            crc32: payload.crc32,
            compressed_size: payload.compressed_size,
            uncompressed_size: payload.uncompressed_size,
        };
        trace!(?descriptor, "zip64 data descriptor");
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

        self.central_directory
            .push(build_zip64_central_directory_file_header(
                &entry,
                &self.options,
                VERSION_ZIP64,
            ));

        debug!(
            file_name,
            crc32 = entry.crc32,
            compressed_size = entry.compressed_size,
            uncompressed_size = entry.uncompressed_size,
            zip64 = entry.is_zip64(),
            "zip64 entry added"
        );
        self.entries.push(entry);

        Ok(())
    }

    fn write_trailer(&mut self) -> Result<u64, ArchiveError> {
        let central_directory_offset = self.sink.bytes_written();
        let entry_count = self.central_directory.len() as u64;

        for header in &self.central_directory {
            self.sink.write(header)?;
        }

        let central_directory_size = self.sink.bytes_written() - central_directory_offset;

        let needs_zip64_records = entry_count >= u16::MAX as u64
            || central_directory_offset >= u32::MAX as u64
            || central_directory_size >= u32::MAX as u64;

        if needs_zip64_records {
            let zip64_end_of_central_directory = Zip64EndOfCentralDirectoryRecord {
                version_made_by: version_made_by(VERSION_ZIP64),
                version_needed: VERSION_ZIP64,
                total_number_of_entries_on_this_disk: entry_count,
                total_number_of_entries_in_the_central_directory: entry_count,
                central_directory_size,
                offset_of_start_of_central_directory: central_directory_offset,
                ..Default::default()
            };
            let locator = Zip64EndOfCentralDirectoryLocator::new(
                central_directory_offset + central_directory_size,
            );

            debug!(
                entry_count,
                central_directory_offset, central_directory_size, "writing zip64 end records"
            );
            self.sink.write(&zip64_end_of_central_directory.encode())?;
            self.sink.write(&locator.encode())?;
        }

        let end_of_central_directory = EndOfCentralDirectoryRecord {
            total_number_of_entries_on_this_disk: clamp_u16(entry_count),
            total_number_of_entries_in_the_central_directory: clamp_u16(entry_count),
            central_directory_size: clamp_u32(central_directory_size),
            offset_of_start_of_central_directory: clamp_u32(central_directory_offset),
            archive_comment: self.options.comment_bytes(),
            ..Default::default()
        };
        self.sink.write(&end_of_central_directory.encode())?;
        self.sink.close()?;

        let archive_size = self.sink.bytes_written();
        debug!(entries = entry_count, archive_size, "zip64 archive finished");

        Ok(archive_size)
    }
}

impl<S: WriteStream> ArchiveWriter for Zip64Writer<S> {
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
