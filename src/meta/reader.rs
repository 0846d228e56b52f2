//! Stream-style reader for chained meta blocks.

use super::CHAIN_POINTER_SIZE;
use crate::block::{Block, BlockId, BlockManager, INVALID_BLOCK};
use crate::error::{Error, Result};

/// Reads a byte stream back from a chain of meta blocks.
///
/// There is no self-describing schema: callers must decode values in the exact
/// order and with the exact types they were written.
pub struct MetaBlockReader<'a, M: BlockManager> {
    manager: &'a mut M,
    block: Block,
    offset: u64,
    next_block: BlockId,
}

impl<'a, M: BlockManager> MetaBlockReader<'a, M> {
    /// Opens the chain starting at `block_id`.
    pub fn new(manager: &'a mut M, block_id: BlockId) -> Result<Self> {
        let mut reader = Self {
            manager,
            block: Block::new(INVALID_BLOCK),
            offset: 0,
            next_block: INVALID_BLOCK,
        };
        reader.read_new_block(block_id)?;
        Ok(reader)
    }

    fn read_new_block(&mut self, block_id: BlockId) -> Result<()> {
        if block_id == INVALID_BLOCK {
            return Err(Error::corruption("meta block chain ended before the requested length"));
        }

        self.block.id = block_id;
        self.manager.read(&mut self.block)?;
        self.next_block = i64::from_le_bytes(
            self.block.buffer.payload()[..CHAIN_POINTER_SIZE as usize].try_into().unwrap(),
        );
        self.offset = CHAIN_POINTER_SIZE;
        Ok(())
    }

    /// Fills `out` from the stream, following chain pointers across block
    /// boundaries as needed.
    pub fn read_data(&mut self, mut out: &mut [u8]) -> Result<()> {
        while self.offset + out.len() as u64 > self.block.buffer.size() {
            // Take what is left in this block, then move to the next.
            let available = (self.block.buffer.size() - self.offset) as usize;
            if available > 0 {
                out[..available].copy_from_slice(
                    &self.block.buffer.payload()[self.offset as usize..][..available],
                );
                out = &mut out[available..];
            }

            let next = self.next_block;
            self.read_new_block(next)?;
        }

        out.copy_from_slice(&self.block.buffer.payload()[self.offset as usize..][..out.len()]);
        self.offset += out.len() as u64;
        Ok(())
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_data(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a `u16`, little-endian.
    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_data(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Reads a `u32`, little-endian.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_data(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads a `u64`, little-endian.
    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_data(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads an `i8`.
    pub fn read_i8(&mut self) -> Result<i8> {
        let mut buf = [0u8; 1];
        self.read_data(&mut buf)?;
        Ok(i8::from_le_bytes(buf))
    }

    /// Reads an `i16`, little-endian.
    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_data(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    /// Reads an `i32`, little-endian.
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_data(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads an `i64`, little-endian. Block ids travel through this.
    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_data(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }
}
