use std::path::PathBuf;

/// Every failure the archive writers can report.
///
/// See [`is_fatal`](ArchiveError::is_fatal) for the failures that leave the output truncated.
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// A source or a sink could not be acquired.
    #[error("Could not open file at path: {}", .0.display())]
    StreamOpenFailure(PathBuf, #[source] std::io::Error),

    /// A write to the sink did not complete.
    #[error("Could not write to stream")]
    StreamWriteFailure(#[source] std::io::Error),

    #[error("Invalid compressor: {0}")]
    InvalidCompressor(String),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchiveFormat(String),

    /// The archive was finished, or a previous failure made it unusable.
    #[error("The archive is closed")]
    ArchiveClosed,

    /// A value does not fit in the 16 or 32 bits of a plain ZIP record.
    #[error("{field} value {value} requires ZIP64")]
    Zip64Required { field: &'static str, value: u64 },

    #[error("Path too long for the archive format: {0}")]
    PathTooLong(String),

    /// The entry name is empty or names a directory.
    #[error("Invalid entry path: {0:?}")]
    InvalidPath(String),

    /// A header value has no representation in its fixed-width field.
    #[error("{field} value {value} does not fit its header field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("A fan-out stream needs at least one destination")]
    NoDestinations,

    #[error("Size of entry {0} is unknown")]
    UnknownSize(String),

    #[error("Entry {name} declared {expected} bytes but its source produced {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// `true` when the error leaves the writer unusable.
    ///
    /// Failures raised before anything reached the sink (bad path, unknown size, a source that
    /// cannot be opened) keep the writer open.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ArchiveError::StreamOpenFailure(..)
                | ArchiveError::PathTooLong(_)
                | ArchiveError::InvalidPath(_)
                | ArchiveError::FieldOverflow { .. }
                | ArchiveError::NoDestinations
                | ArchiveError::UnknownSize(_)
                | ArchiveError::InvalidCompressor(_)
                | ArchiveError::ArchiveClosed
        )
    }
}
