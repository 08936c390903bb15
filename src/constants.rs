use std::mem::size_of;

pub const FILE_HEADER_BASE_SIZE: usize = 7 * size_of::<u16>() + 4 * size_of::<u32>();
pub const DESCRIPTOR_SIZE: usize = 4 * size_of::<u32>();
pub const DESCRIPTOR_ZIP64_SIZE: usize = 2 * size_of::<u32>() + 2 * size_of::<u64>();
pub const CENTRAL_DIRECTORY_ENTRY_BASE_SIZE: usize = 11 * size_of::<u16>() + 6 * size_of::<u32>();
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 5 * size_of::<u16>() + 3 * size_of::<u32>();
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE: usize = 56;
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE: usize = 20;

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub const CENTRAL_DIRECTORY_ENTRY_SIGNATURE: u32 = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06054b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06064b50;
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// Size of the ZIP64 end of central directory record, not counting the leading 12 bytes.
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_RECORD_SIZE: u64 = 44;

pub const ZIP64_EXTRA_FIELD_HEADER_ID: u16 = 0x0001;

pub const EXTENDED_LOCAL_HEADER_FLAG: u16 = 1 << 3;

pub const VERSION_BASE: u16 = 10;
pub const VERSION_DEFLATE: u16 = 20;
pub const VERSION_ZIP64: u16 = 45;

/// Host system stored in the upper byte of "version made by".
pub const HOST_UNIX: u16 = 3;

pub const DEFAULT_UNIX_PERMISSIONS: u32 = 0o644;
pub const S_IFREG: u32 = 0o100000;

pub const ZIP_DEFAULT_CHUNK_SIZE: usize = 4096;
pub const TAR_DEFAULT_CHUNK_SIZE: usize = 512;

pub const TAR_BLOCK_SIZE: usize = 512;
pub const TAR_NAME_SIZE: usize = 100;
pub const TAR_PREFIX_SIZE: usize = 155;
pub const TAR_CHECKSUM_OFFSET: usize = 148;
pub const TAR_CHECKSUM_SIZE: usize = 8;
/// Largest value an 11 digit octal field can hold.
pub const TAR_MAX_OCTAL_SIZE: u64 = 0o77777777777;
pub const TAR_TRAILER_BLOCKS: usize = 2;
