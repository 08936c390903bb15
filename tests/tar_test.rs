use std::fs::{self, File};
use std::io::Read;

use archstream::{
    archive::{Archive, ArchiveFormat},
    compress::{tar::TarWriter, ArchiveOptions, ArchiveWriter, WriterState},
    error::ArchiveError,
    stream::{GzOutputStream, InputStream, OutputStream},
    types::FileDateTime,
};
use flate2::read::GzDecoder;

mod common;
use common::{clean_output_path, FILE_TO_COMPRESS};

fn read_entries<R: Read>(reader: R) -> Vec<(String, Vec<u8>)> {
    let mut archive = ::tar::Archive::new(reader);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (path, content)
        })
        .collect()
}

#[test]
fn tar_file_from_extension() {
    let path = clean_output_path("test_archive.tar");

    let mut archive = Archive::create(&path, ArchiveOptions::default()).unwrap();
    assert_eq!(archive.format(), ArchiveFormat::Tar);
    archive
        .add_file_from_path("resources/file1.txt", FILE_TO_COMPRESS)
        .unwrap();
    archive
        .add_file_from_content_string("hello.txt", "Hello World!!")
        .unwrap();
    let size = archive.finish().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(size, bytes.len() as u64);
    assert_eq!(bytes.len() % 512, 0);

    let entries = read_entries(bytes.as_slice());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "resources/file1.txt");
    assert_eq!(entries[0].1, fs::read(FILE_TO_COMPRESS).unwrap());
    assert_eq!(entries[1], ("hello.txt".to_owned(), b"Hello World!!".to_vec()));
}

#[test]
fn ten_byte_file_ends_with_two_zero_blocks() {
    let mut archive = TarWriter::new(OutputStream::new(Vec::new()), ArchiveOptions::default());
    archive
        .add_file("ten.bin", &mut InputStream::from_content(vec![0xAB; 10], 512))
        .unwrap();
    archive.finish().unwrap();

    let bytes = archive.into_inner().into_inner();
    assert_eq!(bytes.len(), 512 + 512 + 1024);
    assert_eq!(&bytes[512..522], &[0xAB; 10]);
    assert!(bytes[bytes.len() - 1024..].iter().all(|byte| *byte == 0));
}

#[test]
fn tar_gz_file_from_extension() {
    let path = clean_output_path("test_archive.tgz");

    let mut archive = Archive::create(&path, ArchiveOptions::default()).unwrap();
    assert_eq!(archive.format(), ArchiveFormat::TarGz);
    archive
        .add_file_from_path("file1.txt", FILE_TO_COMPRESS)
        .unwrap();
    archive
        .add_file_from_stream("stream.txt", "from a reader".as_bytes(), Some(13))
        .unwrap();
    let size = archive.finish().unwrap();

    assert_eq!(size, fs::metadata(&path).unwrap().len());

    let mut decompressed = Vec::new();
    GzDecoder::new(File::open(&path).unwrap())
        .read_to_end(&mut decompressed)
        .unwrap();
    assert_eq!(decompressed.len() % 512, 0);
    assert!(decompressed[decompressed.len() - 1024..]
        .iter()
        .all(|byte| *byte == 0));

    let entries = read_entries(decompressed.as_slice());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].1, fs::read(FILE_TO_COMPRESS).unwrap());
    assert_eq!(entries[1].1, b"from a reader");
}

#[test]
fn gzip_sink_matches_plain_tar() {
    let options = ArchiveOptions::default().last_modified_time(FileDateTime::Zero);
    let content = "gzip me\n".repeat(300);

    let mut plain = TarWriter::new(OutputStream::new(Vec::new()), options.clone());
    plain
        .add_file("a.txt", &mut InputStream::from_content(content.clone(), 100))
        .unwrap();
    plain.finish().unwrap();

    let mut gzipped = TarWriter::new(GzOutputStream::new(OutputStream::new(Vec::new())), options);
    gzipped
        .add_file("a.txt", &mut InputStream::from_content(content, 100))
        .unwrap();
    gzipped.finish().unwrap();

    let compressed = gzipped.into_inner().into_inner().unwrap().into_inner();
    let mut decompressed = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut decompressed)
        .unwrap();

    let plain = plain.into_inner().into_inner();
    assert_eq!(decompressed, plain);
}

#[test]
fn stream_without_size_is_refused() {
    let mut archive = Archive::new(
        ArchiveFormat::Tar,
        OutputStream::new(Vec::new()),
        ArchiveOptions::default(),
    );

    assert!(matches!(
        archive.add_file_from_stream("unknown.txt", "abc".as_bytes(), None),
        Err(ArchiveError::UnknownSize(_))
    ));
    assert_eq!(archive.state(), WriterState::Open);

    archive
        .add_file_from_content_string("known.txt", "abc")
        .unwrap();
    archive.finish().unwrap();

    let bytes = archive.into_inner().unwrap().into_inner();
    let entries = read_entries(bytes.as_slice());
    assert_eq!(entries, vec![("known.txt".to_owned(), b"abc".to_vec())]);
}

#[test]
fn long_path_is_refused() {
    let mut archive = Archive::new(
        ArchiveFormat::Tar,
        OutputStream::new(Vec::new()),
        ArchiveOptions::default(),
    );
    let name = format!("dir/{}", "n".repeat(101));

    assert!(matches!(
        archive.add_file_from_content_string(&name, "abc"),
        Err(ArchiveError::PathTooLong(_))
    ));
    assert_eq!(archive.bytes_written(), 0);
}
