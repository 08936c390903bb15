use std::fs::{self, File};
use std::io::Read;

use archstream::{
    archive::{Archive, ArchiveFormat},
    compress::{zip::ZipWriter, ArchiveOptions, ArchiveWriter, WriterState},
    compression::CompressionMethod,
    error::ArchiveError,
    stream::{FanOutStream, InputStream, OutputStream},
};

mod common;
use common::{clean_output_path, create_new_clean_file, OffsetSink, FILE_TO_COMPRESS};

fn compress_file(compressor: CompressionMethod, out_file_name: &str) {
    let path = clean_output_path(out_file_name);

    let options = ArchiveOptions::default().compression_method(compressor);
    let mut archive = Archive::create(&path, options).unwrap();
    assert_eq!(archive.format(), ArchiveFormat::Zip);

    archive
        .add_file_from_path("file1.txt", FILE_TO_COMPRESS)
        .unwrap();
    archive
        .add_file_from_content_string("dir/file2.txt", "world\n")
        .unwrap();
    let size = archive.finish().unwrap();

    assert_eq!(size, fs::metadata(&path).unwrap().len());

    let expected = fs::read_to_string(FILE_TO_COMPRESS).unwrap();
    let mut zip = ::zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);

    let mut file = zip.by_index(0).unwrap();
    assert_eq!(file.name(), "file1.txt");
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    assert_eq!(content, expected);
    assert_eq!(file.crc32(), crc32fast::hash(expected.as_bytes()));
}

#[test]
fn archive_structure_compress_store() {
    let compressor = CompressionMethod::Store();
    let out_file_name = ["test_", &compressor.to_string(), ".zip"].join("");

    compress_file(compressor, &out_file_name);
}

#[test]
fn archive_structure_compress_deflate() {
    let compressor = CompressionMethod::Deflate();
    let out_file_name = ["test_", &compressor.to_string(), ".zip"].join("");

    compress_file(compressor, &out_file_name);
}

#[test]
fn local_header_offset_overflow_fails() {
    let mut archive = ZipWriter::new(
        OffsetSink::new(u32::MAX as u64),
        ArchiveOptions::default(),
    );

    let result = archive.add_file("late.txt", &mut InputStream::from_content("late", 16));

    match result {
        Err(ArchiveError::Zip64Required { field, value }) => {
            assert_eq!(field, "local header offset");
            assert_eq!(value, u32::MAX as u64);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(archive.state(), WriterState::Closed);
    assert!(archive.get_ref().bytes.is_empty());
}

#[test]
fn central_directory_offset_overflow_fails_before_writing() {
    let base = u32::MAX as u64 - 50;
    let options = ArchiveOptions::default().compression_method(CompressionMethod::Store());
    let mut archive = ZipWriter::new(OffsetSink::new(base), options);

    archive
        .add_file("x.txt", &mut InputStream::from_content("Hello World!!", 16))
        .unwrap();
    let written = archive.get_ref().bytes.len();
    assert_eq!(written, 35 + 13 + 16);

    assert!(matches!(
        archive.finish(),
        Err(ArchiveError::Zip64Required {
            field: "central directory offset",
            ..
        })
    ));
    assert_eq!(archive.get_ref().bytes.len(), written);
    assert!(!archive.get_ref().closed);
}

#[test]
fn too_many_entries_fails() {
    let options = ArchiveOptions::default().compression_method(CompressionMethod::Store());
    let mut archive = ZipWriter::new(OutputStream::new(Vec::new()), options);

    for index in 0..u16::MAX {
        archive
            .add_file(&index.to_string(), &mut InputStream::from_content("", 16))
            .unwrap();
    }

    assert!(matches!(
        archive.finish(),
        Err(ArchiveError::Zip64Required {
            field: "entry count",
            value: 65535
        })
    ));
}

#[test]
fn fan_out_writes_identical_archives() {
    let first = clean_output_path("fan_out_1.zip");
    let second = clean_output_path("fan_out_2.zip");

    let mut sink =
        FanOutStream::new(vec![Box::new(OutputStream::create(&first).unwrap())]).unwrap();
    sink.push(OutputStream::create(&second).unwrap());

    let mut archive = Archive::new(ArchiveFormat::Zip, sink, ArchiveOptions::default());
    archive
        .add_file_from_path("file1.txt", FILE_TO_COMPRESS)
        .unwrap();
    archive.finish().unwrap();

    let first = fs::read(first).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, fs::read(second).unwrap());
}

#[test]
fn writer_over_file() {
    let file = create_new_clean_file("writer_over_file.zip");
    let mut archive = ZipWriter::new(OutputStream::new(file), ArchiveOptions::default());

    archive
        .add_file(
            "file1.txt",
            &mut InputStream::from_path(FILE_TO_COMPRESS, 1024).unwrap(),
        )
        .unwrap();
    let size = archive.finish().unwrap();

    let file = archive.into_inner().into_inner();
    assert_eq!(file.metadata().unwrap().len(), size);
}
