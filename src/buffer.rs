//! Checksummed page buffers.
//!
//! A [`FileBuffer`] is the unit of transfer between memory and the database
//! file. The leading 8 bytes of the on-disk image hold a checksum over the
//! rest; every read validates it and every write stamps it. This is the sole
//! integrity gate for all on-disk data.

use crate::checksum::checksum;
use crate::error::{Error, Result};
use crate::file::FileHandle;

/// Width of the checksum header at the front of every buffer.
pub const FILE_BUFFER_HEADER_SIZE: u64 = 8;

/// A fixed-size byte buffer with an embedded checksum header.
///
/// Layout on disk:
///
/// ```text
/// [checksum: u64 LE] [payload: total_size - 8 bytes]
/// ```
pub struct FileBuffer {
    /// The full buffer, checksum header included. Its length is the size
    /// that is read from or written to disk.
    buffer: Vec<u8>,
}

impl FileBuffer {
    /// Allocates a zeroed buffer of `total_size` bytes; the writable payload
    /// is `total_size - 8`.
    pub fn new(total_size: u64) -> Self {
        assert!(total_size > FILE_BUFFER_HEADER_SIZE);
        Self { buffer: vec![0u8; total_size as usize] }
    }

    /// The user-writable payload size.
    pub fn size(&self) -> u64 {
        self.buffer.len() as u64 - FILE_BUFFER_HEADER_SIZE
    }

    /// The payload region, excluding the checksum header.
    pub fn payload(&self) -> &[u8] {
        &self.buffer[FILE_BUFFER_HEADER_SIZE as usize..]
    }

    /// Mutable view of the payload region.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[FILE_BUFFER_HEADER_SIZE as usize..]
    }

    /// Zeroes the entire buffer, checksum header included.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Reads the full buffer from `offset` and validates the checksum.
    pub fn read(&mut self, handle: &mut FileHandle, offset: u64) -> Result<()> {
        handle.read_at(&mut self.buffer, offset)?;

        let stored =
            u64::from_le_bytes(self.buffer[..FILE_BUFFER_HEADER_SIZE as usize].try_into().unwrap());
        let computed = checksum(self.payload());

        if stored != computed {
            return Err(Error::ChecksumMismatch { expected: stored, actual: computed });
        }
        Ok(())
    }

    /// Stamps the checksum over the current payload, then writes the full
    /// buffer to `offset`.
    pub fn write(&mut self, handle: &mut FileHandle, offset: u64) -> Result<()> {
        let computed = checksum(self.payload());
        self.buffer[..FILE_BUFFER_HEADER_SIZE as usize].copy_from_slice(&computed.to_le_bytes());
        handle.write_at(&self.buffer, offset)
    }
}
