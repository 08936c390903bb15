//! Fixed width little-endian fields and the buffer records are assembled in.

use crate::error::ArchiveError;

/// An unsigned integer of a fixed on-disk width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    U16(u16),
    U32(u32),
    U64(u64),
}

/// `value` as 16 bits, `0xFFFF` when it does not fit.
pub fn clamp_u16(value: u64) -> u16 {
    value.min(u16::MAX as u64) as u16
}

/// `value` as 32 bits, `0xFFFFFFFF` when it does not fit.
pub fn clamp_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}

/// `value` as 16 bits. `0xFFFF` and above are refused: readers take `0xFFFF` as a ZIP64 marker.
pub fn checked_u16(value: u64, field: &'static str) -> Result<u16, ArchiveError> {
    if value >= u16::MAX as u64 {
        return Err(ArchiveError::Zip64Required { field, value });
    }
    Ok(value as u16)
}

/// 32-bit counterpart of [`checked_u16`].
pub fn checked_u32(value: u64, field: &'static str) -> Result<u32, ArchiveError> {
    if value >= u32::MAX as u64 {
        return Err(ArchiveError::Zip64Required { field, value });
    }
    Ok(value as u32)
}

impl Field {
    pub fn width(&self) -> usize {
        match self {
            Field::U16(_) => 2,
            Field::U32(_) => 4,
            Field::U64(_) => 8,
        }
    }

    pub fn write_le(&self, out: &mut Vec<u8>) {
        match self {
            Field::U16(val) => out.extend_from_slice(&val.to_le_bytes()),
            Field::U32(val) => out.extend_from_slice(&val.to_le_bytes()),
            Field::U64(val) => out.extend_from_slice(&val.to_le_bytes()),
        }
    }
}

/// Serialize `fields` in order.
pub fn pack(fields: &[Field]) -> Vec<u8> {
    let mut buffer = RecordBuffer::new(fields.iter().map(Field::width).sum());
    buffer.write_fields(fields);
    buffer.finish()
}

/// Growable byte buffer a record is encoded into.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buffer: Vec<u8>,
}

impl RecordBuffer {
    pub fn new(capacity: usize) -> RecordBuffer {
        RecordBuffer {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_field(&mut self, field: Field) {
        field.write_le(&mut self.buffer);
    }

    pub fn write_fields(&mut self, fields: &[Field]) {
        for field in fields {
            field.write_le(&mut self.buffer);
        }
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        self.buffer.extend_from_slice(val);
    }

    pub fn write_zeros(&mut self, len: usize) {
        self.buffer.resize(self.len() + len, 0);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}
