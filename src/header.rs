//! On-disk header formats and their codecs.
//!
//! The file starts with three checksummed header pages:
//!
//! ```text
//! offset 0              MainHeader      version + reserved flags, written once
//! offset HEADER_SIZE    DatabaseHeader  slot H1
//! offset 2*HEADER_SIZE  DatabaseHeader  slot H2
//! offset 3*HEADER_SIZE  block data      block i at BLOCK_START + i * BLOCK_SIZE
//! ```
//!
//! Exactly one of H1/H2 is active at any time; a checkpoint writes the other
//! slot and flips, so a crash mid-checkpoint always leaves one valid header.
//! All fields are little-endian; the leading 8-byte checksum of each page is
//! handled by [`FileBuffer`](crate::buffer::FileBuffer), not here.

use crate::block::{BlockId, INVALID_BLOCK};
use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Size of one header page, one disk sector.
pub const HEADER_SIZE: u64 = 4096;

/// File offset where block data begins, past the main header and both
/// database header slots.
pub const BLOCK_START: u64 = HEADER_SIZE * 3;

/// The storage format version this build reads and writes.
pub const VERSION_NUMBER: u64 = 1;

/// The first header in the storage file, written only once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainHeader {
    /// The storage format version of the file.
    pub version: u64,
    /// Reserved flag words.
    pub flags: [u64; 4],
}

impl MainHeader {
    /// Encoded size within a header page payload.
    pub const ENCODED_SIZE: usize = 40;

    /// A main header for a newly created file.
    pub fn new() -> Self {
        Self { version: VERSION_NUMBER, flags: [0; 4] }
    }

    /// Encodes into the front of a header page payload.
    pub fn encode(&self, mut out: &mut [u8]) {
        out.put_u64_le(self.version);
        for flag in self.flags {
            out.put_u64_le(flag);
        }
    }

    /// Decodes from a header page payload.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::ENCODED_SIZE {
            return Err(Error::corruption("main header truncated"));
        }
        let version = buf.get_u64_le();
        let mut flags = [0u64; 4];
        for flag in &mut flags {
            *flag = buf.get_u64_le();
        }
        Ok(Self { version, flags })
    }
}

impl Default for MainHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// One self-consistent snapshot of the database's block-allocation state.
///
/// Every storage file has two of these; on startup the one with the higher
/// iteration count is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHeader {
    /// Increases by one every checkpoint.
    pub iteration: u64,
    /// Root of the catalog/metadata chain, or [`INVALID_BLOCK`].
    pub meta_block: BlockId,
    /// Head of the persisted free-list chain, or [`INVALID_BLOCK`].
    pub free_list: BlockId,
    /// Number of blocks accounted for by this header. Blocks past this count
    /// are implicitly part of the free list.
    pub block_count: u64,
}

impl DatabaseHeader {
    /// Encoded size within a header page payload.
    pub const ENCODED_SIZE: usize = 32;

    /// A header for an empty file: no metadata, no free list, no blocks.
    pub fn new() -> Self {
        Self { iteration: 0, meta_block: INVALID_BLOCK, free_list: INVALID_BLOCK, block_count: 0 }
    }

    /// Encodes into the front of a header page payload.
    pub fn encode(&self, mut out: &mut [u8]) {
        out.put_u64_le(self.iteration);
        out.put_i64_le(self.meta_block);
        out.put_i64_le(self.free_list);
        out.put_u64_le(self.block_count);
    }

    /// Decodes from a header page payload.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::ENCODED_SIZE {
            return Err(Error::corruption("database header truncated"));
        }
        Ok(Self {
            iteration: buf.get_u64_le(),
            meta_block: buf.get_i64_le(),
            free_list: buf.get_i64_le(),
            block_count: buf.get_u64_le(),
        })
    }
}

impl Default for DatabaseHeader {
    fn default() -> Self {
        Self::new()
    }
}
