#![allow(dead_code)]

use std::{
    fs::{create_dir_all, remove_file, File},
    path::{Path, PathBuf},
};

use archstream::{
    error::ArchiveError,
    stream::{ReadStream, WriteStream},
};

pub const FILE_TO_COMPRESS: &str = "tests/resources/file1.txt";

/// A path under the scratch directory, with any previous file removed.
pub fn clean_output_path(file_name: &str) -> PathBuf {
    let dir_prefix = "/tmp/archstream";
    let out_dir = Path::new(dir_prefix);
    if !out_dir.exists() {
        create_dir_all(out_dir).unwrap_or_else(|error| {
            panic!("creating dir {:?} failed, because {:?}", dir_prefix, error);
        })
    }

    let out_path = out_dir.join(file_name);

    if out_path.exists() {
        remove_file(&out_path).unwrap_or_else(|error| {
            panic!("deleting file {:?} failed, because {:?}", &out_path, error);
        });
    }
    out_path
}

pub fn create_new_clean_file(file_name: &str) -> File {
    let out_path = clean_output_path(file_name);
    File::create(&out_path).unwrap_or_else(|error| {
        panic!("creating file {:?} failed, because {:?}", &out_path, error);
    })
}

/// `len` zero bytes, without holding them in memory.
pub struct ZeroStream {
    remaining: u64,
    len: u64,
    chunk: Vec<u8>,
}

impl ZeroStream {
    pub fn new(len: u64, chunk_size: usize) -> Self {
        Self {
            remaining: len,
            len,
            chunk: vec![0; chunk_size],
        }
    }
}

impl ReadStream for ZeroStream {
    fn read_chunk(&mut self) -> Result<Option<&[u8]>, ArchiveError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let len = self.remaining.min(self.chunk.len() as u64) as usize;
        self.remaining -= len as u64;
        Ok(Some(&self.chunk[..len]))
    }

    fn size(&self) -> Option<u64> {
        Some(self.len)
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}

/// A sink pretending `base` bytes were already written before its content.
pub struct OffsetSink {
    pub base: u64,
    pub bytes: Vec<u8>,
    pub closed: bool,
}

impl OffsetSink {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            bytes: Vec::new(),
            closed: false,
        }
    }
}

impl WriteStream for OffsetSink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        self.bytes.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        self.closed = true;
        Ok(())
    }
}

/// Counts everything but only keeps the last `window` bytes.
pub struct TailSink {
    pub window: usize,
    pub tail: Vec<u8>,
    pub total: u64,
}

impl TailSink {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            tail: Vec::with_capacity(window * 2),
            total: 0,
        }
    }

    /// Archive offset of the first byte kept.
    pub fn tail_start(&self) -> u64 {
        self.total - self.tail.len() as u64
    }
}

impl WriteStream for TailSink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ArchiveError> {
        self.total += bytes.len() as u64;

        let keep = bytes.len().min(self.window);
        self.tail.extend_from_slice(&bytes[bytes.len() - keep..]);
        if self.tail.len() > self.window {
            let excess = self.tail.len() - self.window;
            self.tail.drain(..excess);
        }
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> u64 {
        self.total
    }

    fn close(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}

pub fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

pub fn le_u64(bytes: &[u8], at: usize) -> u64 {
    let mut value = [0u8; 8];
    value.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(value)
}
