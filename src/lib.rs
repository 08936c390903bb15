//! A library writing ZIP, ZIP64, TAR and TAR.GZ archives in one pass. This is useful when it is
//! not possible to *seek* in the output such as stdout, a socket or an HTTP response body.
//!
//! Each file is read chunk by chunk and its bytes go straight to the output: nothing is
//! buffered beyond one chunk, and nothing already written is ever rewritten. ZIP entries carry
//! their CRC and sizes in a trailing data descriptor; TAR entries need their size up front.
//!
//! The ZIP records follow
//! [PKWARE's APPNOTE.TXT v6.3.10](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT),
//! the TAR headers follow the POSIX ustar layout.
//!
//! ## Features
//!
//! Feature  | Description
//! ---------|------
//! tokio    | [`stream::tokio::TokioOutputStream`], to write into a [tokio::io::AsyncWrite]
//!
//! ## Examples
//!
//! Write an archive file, the format following the extension:
//!
//!```rust
//! use archstream::{archive::Archive, compress::ArchiveOptions, compression::CompressionMethod};
//!
//! # fn main() -> Result<(), archstream::error::ArchiveError> {
//! let options = ArchiveOptions::default().compression_method(CompressionMethod::Deflate());
//! let path = std::env::temp_dir().join("archstream_doc.zip");
//!
//! let mut archive = Archive::create(&path, options)?;
//! archive.add_file_from_content_string("file1.txt", "hello\n")?;
//! archive.add_file_from_stream("file2.txt", "world\n".as_bytes(), None)?;
//! archive.finish()?;
//! # Ok(())
//! # }
//!```
//!
//! Or drive a writer directly over any [`stream::WriteStream`]:
//!
//!```rust
//! use archstream::compress::{tar::TarWriter, ArchiveOptions, ArchiveWriter};
//! use archstream::stream::{InputStream, OutputStream};
//!
//! # fn main() -> Result<(), archstream::error::ArchiveError> {
//! let mut archive = TarWriter::new(OutputStream::new(Vec::new()), ArchiveOptions::default());
//! archive.add_file("notes/a.txt", &mut InputStream::from_content("a", 512))?;
//! assert_eq!(archive.finish()?, 512 * 4);
//! # Ok(())
//! # }
//!```

mod constants;

pub mod archive;
pub mod binary;
pub mod checksum;
pub mod compress;
pub mod compression;
pub mod error;
pub mod stream;
pub mod types;
