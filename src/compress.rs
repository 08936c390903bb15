//! The archive writers.
//!
//! <table>
//! <tr><th>Writer</th><th>Per entry</th><th>Trailer</th></tr>
//! <tr><td><a href="zip/struct.ZipWriter.html">ZipWriter</a></td>
//! <td>
//! <p>Local file header with CRC and sizes set to 0, bit 3 set</p>
//! <p>Payload</p>
//! <p>Data descriptor (32-bit sizes)</p>
//! </td>
//! <td>
//! <p>Central directory</p>
//! <p>End of central directory record</p>
//! <p>Fails if any value needs ZIP64</p>
//! </td></tr>
//! <tr><td><a href="zip64/struct.Zip64Writer.html">Zip64Writer</a></td>
//! <td>
//! <p>Local file header, ZIP64 extra field if offset >= u32::MAX</p>
//! <p>Payload</p>
//! <p>Data descriptor (64-bit sizes)</p>
//! </td>
//! <td>
//! <p>Central directory, sizes and offsets >= u32::MAX moved to a ZIP64 extra field</p>
//! <p>ZIP64 end of central directory record and locator if
//! <ul>
//! <li>Number of entries >= u16::MAX OR</li>
//! <li>Central directory offset or size >= u32::MAX</li>
//! </ul>
//! </p>
//! <p>End of central directory record</p>
//! </td></tr>
//! <tr><td><a href="tar/struct.TarWriter.html">TarWriter</a></td>
//! <td>
//! <p>512 bytes ustar header</p>
//! <p>Payload padded to 512 bytes</p>
//! </td>
//! <td><p>Two zero blocks</p></td></tr>
//! </table>

pub mod records;
pub mod tar;
pub mod zip;
pub mod zip64;

mod common;

pub use common::{ArchiveEntry, ArchiveWriter, WriterState};

use crate::{
    compression::{CompressionMethod, Level},
    constants::{DEFAULT_UNIX_PERMISSIONS, S_IFREG},
    types::FileDateTime,
};

/// Settings shared by every entry of an archive.
///
/// Built with the setters below, which keep every value within what the formats can encode.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// The compression method applied to every entry. ZIP only.
    pub(crate) compression_method: CompressionMethod,

    /// The compression method's level.
    pub(crate) compression_level: Level,

    /// The entries' modified time.
    pub(crate) last_modified_time: FileDateTime,

    /// Unix permissions.
    pub(crate) unix_permissions: u32,

    /// Size of the chunks read from each source, `None` for the format's default.
    pub(crate) chunk_size: Option<usize>,

    /// ZIP archive comment.
    pub(crate) archive_comment: Option<Vec<u8>>,

    /// Write `.zip` destinations with the ZIP64 writer.
    pub(crate) zip64: bool,
}

impl ArchiveOptions {
    /// Set the compression method.
    ///
    /// The default is `CompressionMethod::Deflate()`.
    pub fn compression_method(mut self, method: CompressionMethod) -> ArchiveOptions {
        self.compression_method = method;
        self
    }

    /// Set the compression level.
    pub fn compression_level(mut self, level: Level) -> ArchiveOptions {
        self.compression_level = level;
        self
    }

    /// Set the last modified time
    ///
    /// The default is the time each entry is added.
    pub fn last_modified_time(mut self, mod_time: FileDateTime) -> ArchiveOptions {
        self.last_modified_time = mod_time;
        self
    }

    /// Set the permissions of the entries.
    ///
    /// The format is represented with unix-style permissions.
    /// The default is `0o644`, which represents `rw-r--r--`.
    ///
    /// Only the permission bits are kept (via a `& 0o777`).
    pub fn unix_permissions(mut self, mode: u32) -> ArchiveOptions {
        self.unix_permissions = mode & 0o777;
        self
    }

    /// Set the size of the chunks read from sources.
    pub fn chunk_size(mut self, chunk_size: usize) -> ArchiveOptions {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Set the ZIP archive comment. The comment is truncated to 0xFFFF bytes.
    pub fn archive_comment(mut self, comment: &str) -> ArchiveOptions {
        let bytes = comment.as_bytes();
        let len = std::cmp::min(bytes.len(), u16::MAX as usize);
        self.archive_comment = Some(bytes[..len].to_owned());
        self
    }

    /// Write `.zip` destinations in ZIP64 format.
    pub fn zip64(mut self, zip64: bool) -> ArchiveOptions {
        self.zip64 = zip64;
        self
    }

    /// `true` when `.zip` destinations use the ZIP64 writer.
    pub fn is_zip64(&self) -> bool {
        self.zip64
    }

    pub(crate) fn chunk_size_or(&self, default: usize) -> usize {
        self.chunk_size.unwrap_or(default)
    }

    /// Regular file type and permissions in the upper half, as unix hosts store them.
    pub(crate) fn external_attributes(&self) -> u32 {
        (S_IFREG | self.unix_permissions) << 16
    }

    pub(crate) fn comment_bytes(&self) -> &[u8] {
        self.archive_comment.as_deref().unwrap_or_default()
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_method: CompressionMethod::Deflate(),
            compression_level: Level::Default,
            last_modified_time: FileDateTime::Now,
            unix_permissions: DEFAULT_UNIX_PERMISSIONS,
            chunk_size: None,
            archive_comment: None,
            zip64: false,
        }
    }
}
