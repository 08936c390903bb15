//! One archive, one destination, any supported format.
//!
//! ```no_run
//! use archstream::archive::Archive;
//! use archstream::compress::ArchiveOptions;
//!
//! let mut archive = Archive::create("/tmp/report.tar.gz", ArchiveOptions::default())?;
//! archive.add_file_from_content_string("summary.txt", "all good\n")?;
//! archive.add_file_from_path("data.csv", "/var/data/data.csv")?;
//! archive.finish()?;
//! # Ok::<(), archstream::error::ArchiveError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use flate2::Compression;
use tracing::debug;

use crate::compress::tar::TarWriter;
use crate::compress::zip::ZipWriter;
use crate::compress::zip64::Zip64Writer;
use crate::compress::{ArchiveOptions, ArchiveWriter, WriterState};
use crate::constants::{TAR_DEFAULT_CHUNK_SIZE, ZIP_DEFAULT_CHUNK_SIZE};
use crate::error::ArchiveError;
use crate::stream::{
    GzOutputStream, Headers, InputStream, OutputStream, ReadStream, WriteStream,
};

/// The supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Zip64,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Resolve the format from the extension of `path`, ignoring case.
    ///
    /// `.zip` gives [`Zip`](Self::Zip), or [`Zip64`](Self::Zip64) when `zip64` is set.
    pub fn from_path<P: AsRef<Path>>(path: P, zip64: bool) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else if file_name.ends_with(".tar") {
            Ok(ArchiveFormat::Tar)
        } else if file_name.ends_with(".zip") {
            Ok(if zip64 {
                ArchiveFormat::Zip64
            } else {
                ArchiveFormat::Zip
            })
        } else {
            Err(ArchiveError::UnsupportedArchiveFormat(
                path.display().to_string(),
            ))
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip | ArchiveFormat::Zip64 => "application/zip",
            ArchiveFormat::Tar => "application/x-tar",
            ArchiveFormat::TarGz => "application/gzip",
        }
    }

    /// `Content-Type` and an attachment `Content-Disposition` for a download named `file_name`,
    /// ready for a [`HeaderOutputStream`](crate::stream::HeaderOutputStream).
    pub fn http_headers(&self, file_name: &str) -> Headers {
        let file_name = file_name.replace(&['"', '\\'][..], "_");
        vec![
            ("Content-Type".to_owned(), self.content_type().to_owned()),
            (
                "Content-Disposition".to_owned(),
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ]
    }

    /// File extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip | ArchiveFormat::Zip64 => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }

    fn default_chunk_size(&self) -> usize {
        match self {
            ArchiveFormat::Zip | ArchiveFormat::Zip64 => ZIP_DEFAULT_CHUNK_SIZE,
            ArchiveFormat::Tar | ArchiveFormat::TarGz => TAR_DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    /// Parse a format tag: `zip`, `zip64`, `tar`, `tar.gz` or `tgz`.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "zip64" => Ok(ArchiveFormat::Zip64),
            "tar" => Ok(ArchiveFormat::Tar),
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            _ => Err(ArchiveError::UnsupportedArchiveFormat(tag.to_owned())),
        }
    }
}

enum Writer<S: WriteStream> {
    Zip(ZipWriter<S>),
    Zip64(Zip64Writer<S>),
    Tar(TarWriter<S>),
    TarGz(TarWriter<GzOutputStream<S>>),
}

impl<S: WriteStream> Writer<S> {
    fn as_writer(&self) -> &dyn ArchiveWriter {
        match self {
            Writer::Zip(writer) => writer,
            Writer::Zip64(writer) => writer,
            Writer::Tar(writer) => writer,
            Writer::TarGz(writer) => writer,
        }
    }

    fn as_mut_writer(&mut self) -> &mut dyn ArchiveWriter {
        match self {
            Writer::Zip(writer) => writer,
            Writer::Zip64(writer) => writer,
            Writer::Tar(writer) => writer,
            Writer::TarGz(writer) => writer,
        }
    }
}

/// An archive being written to a single destination.
pub struct Archive<S: WriteStream> {
    format: ArchiveFormat,
    chunk_size: usize,
    writer: Writer<S>,
}

impl Archive<OutputStream<File>> {
    /// Create the file at `path`, the format following its extension.
    pub fn create<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let format = ArchiveFormat::from_path(path, options.is_zip64())?;
        let sink = OutputStream::create(path)?;

        debug!(path = %path.display(), ?format, "creating archive");
        Ok(Archive::new(format, sink, options))
    }
}

impl<S: WriteStream> Archive<S> {
    pub fn new(format: ArchiveFormat, sink: S, options: ArchiveOptions) -> Self {
        let chunk_size = options.chunk_size_or(format.default_chunk_size());

        let writer = match format {
            ArchiveFormat::Zip => Writer::Zip(ZipWriter::new(sink, options)),
            ArchiveFormat::Zip64 => Writer::Zip64(Zip64Writer::new(sink, options)),
            ArchiveFormat::Tar => Writer::Tar(TarWriter::new(sink, options)),
            ArchiveFormat::TarGz => {
                let level = Compression::from(options.compression_level).level().min(9);
                let sink = GzOutputStream::with_compression(sink, Compression::new(level));
                Writer::TarGz(TarWriter::new(sink, options))
            }
        };

        Self {
            format,
            chunk_size,
            writer,
        }
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn state(&self) -> WriterState {
        self.writer.as_writer().state()
    }

    /// Bytes written so far, before gzip compression for `.tar.gz`.
    pub fn bytes_written(&self) -> u64 {
        self.writer.as_writer().bytes_written()
    }

    pub fn add_file(
        &mut self,
        file_name: &str,
        source: &mut dyn ReadStream,
    ) -> Result<(), ArchiveError> {
        self.writer.as_mut_writer().add_file(file_name, source)
    }

    /// Add the content of the file at `path`.
    pub fn add_file_from_path<P: AsRef<Path>>(
        &mut self,
        file_name: &str,
        path: P,
    ) -> Result<(), ArchiveError> {
        self.ensure_open()?;
        let mut source = InputStream::from_path(path, self.chunk_size)?;
        self.add_file(file_name, &mut source)
    }

    /// Add everything `reader` yields. TAR formats need `size`.
    pub fn add_file_from_stream<R: Read>(
        &mut self,
        file_name: &str,
        reader: R,
        size: Option<u64>,
    ) -> Result<(), ArchiveError> {
        self.ensure_open()?;
        let mut source = InputStream::from_reader(reader, size, self.chunk_size);
        self.add_file(file_name, &mut source)
    }

    pub fn add_file_from_content_string(
        &mut self,
        file_name: &str,
        content: &str,
    ) -> Result<(), ArchiveError> {
        self.ensure_open()?;
        let mut source = InputStream::from_content(content, self.chunk_size);
        self.add_file(file_name, &mut source)
    }

    /// Write the trailer and close the destination.
    ///
    /// Returns the size of the archive as written to the destination, compressed for `.tar.gz`.
    pub fn finish(&mut self) -> Result<u64, ArchiveError> {
        let size = self.writer.as_mut_writer().finish()?;

        match &self.writer {
            Writer::TarGz(writer) => Ok(writer.get_ref().compressed_bytes_written()),
            _ => Ok(size),
        }
    }

    /// Release the destination.
    pub fn into_inner(self) -> Result<S, ArchiveError> {
        match self.writer {
            Writer::Zip(writer) => Ok(writer.into_inner()),
            Writer::Zip64(writer) => Ok(writer.into_inner()),
            Writer::Tar(writer) => Ok(writer.into_inner()),
            Writer::TarGz(writer) => writer.into_inner().into_inner(),
        }
    }

    fn ensure_open(&self) -> Result<(), ArchiveError> {
        match self.state() {
            WriterState::Open => Ok(()),
            _ => Err(ArchiveError::ArchiveClosed),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ArchiveFormat::from_path("a/b.zip", false).unwrap(),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::from_path("b.ZIP", true).unwrap(),
            ArchiveFormat::Zip64
        );
        assert_eq!(
            ArchiveFormat::from_path("b.tar", false).unwrap(),
            ArchiveFormat::Tar
        );
        assert_eq!(
            ArchiveFormat::from_path("b.tar.gz", false).unwrap(),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ArchiveFormat::from_path("b.Tgz", false).unwrap(),
            ArchiveFormat::TarGz
        );
    }

    #[test]
    fn unknown_extension() {
        for path in ["b.gz", "b.rar", "zip", "b.zip.bak"] {
            assert!(matches!(
                ArchiveFormat::from_path(path, false),
                Err(ArchiveError::UnsupportedArchiveFormat(_))
            ));
        }
    }

    #[test]
    fn format_tags() {
        assert_eq!("TGZ".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert_eq!("zip64".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip64);
        assert!("7z".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn http_decoration() {
        assert_eq!(ArchiveFormat::Zip64.content_type(), "application/zip");
        assert_eq!(ArchiveFormat::TarGz.content_type(), "application/gzip");
        assert_eq!(ArchiveFormat::TarGz.extension(), "tar.gz");
        assert_eq!(ArchiveFormat::Tar.extension(), "tar");

        let headers = ArchiveFormat::Tar.http_headers("logs \"today\".tar");
        assert_eq!(headers[0], ("Content-Type".to_owned(), "application/x-tar".to_owned()));
        assert_eq!(headers[1].1, "attachment; filename=\"logs _today_.tar\"");
    }

    #[test]
    fn add_after_finish() {
        let mut archive = Archive::new(
            ArchiveFormat::Tar,
            OutputStream::new(Vec::new()),
            ArchiveOptions::default(),
        );
        archive.add_file_from_content_string("a.txt", "a").unwrap();
        archive.finish().unwrap();

        assert!(matches!(
            archive.add_file_from_content_string("b.txt", "b"),
            Err(ArchiveError::ArchiveClosed)
        ));
        assert!(matches!(
            archive.add_file_from_path("c.txt", "/does/not/matter"),
            Err(ArchiveError::ArchiveClosed)
        ));
        assert!(matches!(archive.finish(), Err(ArchiveError::ArchiveClosed)));
    }
}
