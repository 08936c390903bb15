//! Byte layout of the ZIP records.
//!
//! Each record is a plain struct whose `encode` concatenates its fields, little-endian, in the
//! order of [APPNOTE.TXT](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT) section 4.3.
//! Encoding is pure: the same struct always gives the same bytes.

use crate::binary::{Field, RecordBuffer};
use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, CENTRAL_DIRECTORY_ENTRY_BASE_SIZE,
    CENTRAL_DIRECTORY_ENTRY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE, DESCRIPTOR_SIZE,
    DESCRIPTOR_ZIP64_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE,
    LOCAL_FILE_HEADER_SIGNATURE, ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE,
    ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE, ZIP64_END_OF_CENTRAL_DIRECTORY_RECORD_SIZE,
    ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE, ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE,
    ZIP64_EXTRA_FIELD_HEADER_ID,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader<'a> {
    pub version_needed: u16,
    pub general_purpose_flags: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: &'a [u8],
    pub extra_field: &'a [u8],
}

impl LocalFileHeader<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = RecordBuffer::new(
            FILE_HEADER_BASE_SIZE + self.file_name.len() + self.extra_field.len(),
        );

        header.write_fields(&[
            Field::U32(LOCAL_FILE_HEADER_SIGNATURE),
            Field::U16(self.version_needed),
            Field::U16(self.general_purpose_flags),
            Field::U16(self.compression_method),
            Field::U16(self.last_mod_file_time),
            Field::U16(self.last_mod_file_date),
            Field::U32(self.crc32),
            Field::U32(self.compressed_size),
            Field::U32(self.uncompressed_size),
            Field::U16(self.file_name.len() as u16),
            Field::U16(self.extra_field.len() as u16),
        ]);
        header.write_bytes(self.file_name);
        header.write_bytes(self.extra_field);

        header.finish()
    }
}

/// Trails an entry's payload with the values its local header could not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = RecordBuffer::new(DESCRIPTOR_SIZE);
        descriptor.write_fields(&[
            Field::U32(DATA_DESCRIPTOR_SIGNATURE),
            Field::U32(self.crc32),
            Field::U32(self.compressed_size),
            Field::U32(self.uncompressed_size),
        ]);
        descriptor.finish()
    }
}

/// Same signature as [`DataDescriptor`], with 64-bit sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl Zip64DataDescriptor {
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = RecordBuffer::new(DESCRIPTOR_ZIP64_SIZE);
        descriptor.write_fields(&[
            Field::U32(DATA_DESCRIPTOR_SIGNATURE),
            Field::U32(self.crc32),
            Field::U64(self.compressed_size),
            Field::U64(self.uncompressed_size),
        ]);
        descriptor.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryFileHeader<'a> {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub general_purpose_flags: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_number_start: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub local_header_offset: u32,
    pub file_name: &'a [u8],
    pub extra_field: &'a [u8],
    pub file_comment: &'a [u8],
}

impl CentralDirectoryFileHeader<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = RecordBuffer::new(
            CENTRAL_DIRECTORY_ENTRY_BASE_SIZE
                + self.file_name.len()
                + self.extra_field.len()
                + self.file_comment.len(),
        );

        header.write_fields(&[
            Field::U32(CENTRAL_DIRECTORY_ENTRY_SIGNATURE),
            Field::U16(self.version_made_by),
            Field::U16(self.version_needed),
            Field::U16(self.general_purpose_flags),
            Field::U16(self.compression_method),
            Field::U16(self.last_mod_file_time),
            Field::U16(self.last_mod_file_date),
            Field::U32(self.crc32),
            Field::U32(self.compressed_size),
            Field::U32(self.uncompressed_size),
            Field::U16(self.file_name.len() as u16),
            Field::U16(self.extra_field.len() as u16),
            Field::U16(self.file_comment.len() as u16),
            Field::U16(self.disk_number_start),
            Field::U16(self.internal_file_attributes),
            Field::U32(self.external_file_attributes),
            Field::U32(self.local_header_offset),
        ]);
        header.write_bytes(self.file_name);
        header.write_bytes(self.extra_field);
        header.write_bytes(self.file_comment);

        header.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectoryRecord<'a> {
    pub number_of_this_disk: u16,
    pub number_of_the_disk_with_central_directory: u16,
    pub total_number_of_entries_on_this_disk: u16,
    pub total_number_of_entries_in_the_central_directory: u16,
    pub central_directory_size: u32,
    pub offset_of_start_of_central_directory: u32,
    pub archive_comment: &'a [u8],
}

impl EndOfCentralDirectoryRecord<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut record =
            RecordBuffer::new(END_OF_CENTRAL_DIRECTORY_SIZE + self.archive_comment.len());

        record.write_fields(&[
            Field::U32(CENTRAL_DIRECTORY_END_SIGNATURE),
            Field::U16(self.number_of_this_disk),
            Field::U16(self.number_of_the_disk_with_central_directory),
            Field::U16(self.total_number_of_entries_on_this_disk),
            Field::U16(self.total_number_of_entries_in_the_central_directory),
            Field::U32(self.central_directory_size),
            Field::U32(self.offset_of_start_of_central_directory),
            Field::U16(self.archive_comment.len() as u16),
        ]);
        record.write_bytes(self.archive_comment);

        record.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Zip64EndOfCentralDirectoryRecord<'a> {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub number_of_this_disk: u32,
    pub number_of_the_disk_with_central_directory: u32,
    pub total_number_of_entries_on_this_disk: u64,
    pub total_number_of_entries_in_the_central_directory: u64,
    pub central_directory_size: u64,
    pub offset_of_start_of_central_directory: u64,
    pub extensible_data: &'a [u8],
}

impl Zip64EndOfCentralDirectoryRecord<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut record =
            RecordBuffer::new(ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE + self.extensible_data.len());

        record.write_fields(&[
            Field::U32(ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE),
            Field::U64(
                ZIP64_END_OF_CENTRAL_DIRECTORY_RECORD_SIZE + self.extensible_data.len() as u64,
            ),
            Field::U16(self.version_made_by),
            Field::U16(self.version_needed),
            Field::U32(self.number_of_this_disk),
            Field::U32(self.number_of_the_disk_with_central_directory),
            Field::U64(self.total_number_of_entries_on_this_disk),
            Field::U64(self.total_number_of_entries_in_the_central_directory),
            Field::U64(self.central_directory_size),
            Field::U64(self.offset_of_start_of_central_directory),
        ]);
        record.write_bytes(self.extensible_data);

        record.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectoryLocator {
    pub number_of_the_disk_with_zip64_end_of_central_directory: u32,
    pub zip64_end_of_central_directory_offset: u64,
    pub total_number_of_disks: u32,
}

impl Zip64EndOfCentralDirectoryLocator {
    pub fn new(zip64_end_of_central_directory_offset: u64) -> Self {
        Self {
            number_of_the_disk_with_zip64_end_of_central_directory: 0,
            zip64_end_of_central_directory_offset,
            total_number_of_disks: 1,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut locator = RecordBuffer::new(ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE);
        locator.write_fields(&[
            Field::U32(ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE),
            Field::U32(self.number_of_the_disk_with_zip64_end_of_central_directory),
            Field::U64(self.zip64_end_of_central_directory_offset),
            Field::U32(self.total_number_of_disks),
        ]);
        locator.finish()
    }
}

/// The ZIP64 extended information extra field (header id 0x0001).
///
/// Only the values that are set are written, in the fixed order original size, compressed size,
/// local header offset, disk start number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Zip64ExtraField {
    pub original_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub local_header_offset: Option<u64>,
    pub disk_start_number: Option<u32>,
}

impl Zip64ExtraField {
    pub const HEADER_ID: u16 = ZIP64_EXTRA_FIELD_HEADER_ID;

    fn fields(&self) -> impl Iterator<Item = Field> {
        [
            self.original_size.map(Field::U64),
            self.compressed_size.map(Field::U64),
            self.local_header_offset.map(Field::U64),
            self.disk_start_number.map(Field::U32),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Size of the data following the 4 bytes of id and size.
    pub fn data_size(&self) -> u16 {
        self.fields().map(|field| field.width() as u16).sum()
    }

    /// The whole extra field, or nothing when no value is set.
    pub fn encode(&self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut extra_field = RecordBuffer::new(4 + self.data_size() as usize);
        extra_field.write_u16(Self::HEADER_ID);
        extra_field.write_u16(self.data_size());
        for field in self.fields() {
            extra_field.write_field(field);
        }
        extra_field.finish()
    }
}

#[cfg(test)]
#[path = "../tests/records.rs"]
mod records_tests;
