use crc32fast::Hasher;

/// Streaming CRC-32 over the uncompressed bytes of one entry.
///
/// Besides the checksum it keeps the number of bytes hashed, which is the entry's uncompressed
/// size, and the number of chunks seen.
#[derive(Debug, Default, Clone)]
pub struct Crc32 {
    hasher: Hasher,
    bytes: u64,
    updates: u64,
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
        self.updates += 1;
    }

    /// Bytes hashed so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Number of [`update`](Self::update) calls so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}
