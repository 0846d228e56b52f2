//! Stream-style writer for chained meta blocks.

use super::CHAIN_POINTER_SIZE;
use crate::block::{Block, BlockId, BlockManager, INVALID_BLOCK};
use crate::error::Result;

/// Writes an arbitrary-length byte stream across a chain of meta blocks.
///
/// The writer only uses the manager's public contract: block allocation and
/// checksummed writes. The owner must call [`flush`](Self::flush) after the
/// last write; it is not automatic.
pub struct MetaBlockWriter<'a, M: BlockManager> {
    manager: &'a mut M,
    block: Block,
    first_block: BlockId,
    offset: u64,
}

impl<'a, M: BlockManager> MetaBlockWriter<'a, M> {
    /// Starts a new chain on a freshly allocated block.
    pub fn new(manager: &'a mut M) -> Self {
        let mut block = manager.create_block();
        // No successor yet; terminate the chain.
        block.buffer.payload_mut()[..CHAIN_POINTER_SIZE as usize]
            .copy_from_slice(&INVALID_BLOCK.to_le_bytes());
        let first_block = block.id;

        Self { manager, block, first_block, offset: CHAIN_POINTER_SIZE }
    }

    /// The id of the first block of the chain, to be stored wherever the
    /// stream is later read from.
    pub fn first_block(&self) -> BlockId {
        self.first_block
    }

    /// Appends raw bytes to the stream, chaining to new blocks as the current
    /// one fills up.
    pub fn write_data(&mut self, mut data: &[u8]) -> Result<()> {
        while self.offset + data.len() as u64 > self.block.buffer.size() {
            // Copy what still fits into the current block.
            let fits = (self.block.buffer.size() - self.offset) as usize;
            if fits > 0 {
                let (head, rest) = data.split_at(fits);
                self.block.buffer.payload_mut()[self.offset as usize..][..fits]
                    .copy_from_slice(head);
                self.offset += fits as u64;
                data = rest;
            }

            // Allocate the successor and link the current block to it.
            let next = self.manager.get_free_block_id();
            self.block.buffer.payload_mut()[..CHAIN_POINTER_SIZE as usize]
                .copy_from_slice(&next.to_le_bytes());
            self.flush()?;

            // Retarget to the successor, with no stale bytes and a
            // terminated chain pointer.
            self.block.id = next;
            self.block.buffer.clear();
            self.block.buffer.payload_mut()[..CHAIN_POINTER_SIZE as usize]
                .copy_from_slice(&INVALID_BLOCK.to_le_bytes());
        }

        self.block.buffer.payload_mut()[self.offset as usize..][..data.len()]
            .copy_from_slice(data);
        self.offset += data.len() as u64;
        Ok(())
    }

    /// Persists the current block if any bytes past the chain pointer were
    /// written; a no-op otherwise.
    pub fn flush(&mut self) -> Result<()> {
        if self.offset > CHAIN_POINTER_SIZE {
            self.manager.write(&mut self.block)?;
            self.offset = CHAIN_POINTER_SIZE;
        }
        Ok(())
    }

    /// Writes a `u8`.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes a `u16`, little-endian.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes a `u32`, little-endian.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes a `u64`, little-endian.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes an `i8`.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes an `i16`, little-endian.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes an `i32`, little-endian.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }

    /// Writes an `i64`, little-endian. Block ids travel through this.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_data(&value.to_le_bytes())
    }
}
