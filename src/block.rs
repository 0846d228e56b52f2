//! Blocks and the block manager contract.

use crate::buffer::FileBuffer;
use crate::error::Result;
use crate::header::DatabaseHeader;

/// Persistent identity of a block. Negative values are sentinels.
pub type BlockId = i64;

/// Sentinel id denoting "no block".
pub const INVALID_BLOCK: BlockId = -1;

/// Size of a storage slot managed by the block manager. This is the quantum of
/// allocation for blocks; 256KB amortizes I/O for analytical scans.
pub const BLOCK_SIZE: u64 = 1 << 18;

/// A checksummed page buffer tagged with its persistent block id.
pub struct Block {
    /// The block id; immutable from the perspective of higher layers, but the
    /// meta-block components retarget their scratch block as a chain advances.
    pub id: BlockId,
    /// The backing buffer, sized to the block quantum.
    pub buffer: FileBuffer,
}

impl Block {
    /// Allocates a zeroed block-quantum buffer with the given identity.
    pub fn new(id: BlockId) -> Self {
        Self { id, buffer: FileBuffer::new(BLOCK_SIZE) }
    }
}

/// The contract higher layers rely on for block-level storage.
///
/// A manager instance is the sole owner of its file and allocation state; it
/// is deliberately not `Clone`, and sharing one across threads requires an
/// external mutex supplied by the caller.
pub trait BlockManager {
    /// Allocates a fresh logical block, reusing a free id if one is
    /// available. The returned block is not persisted.
    fn create_block(&mut self) -> Block;

    /// Returns the next free block id: LIFO from the free list, else the
    /// high-water mark.
    fn get_free_block_id(&mut self) -> BlockId;

    /// The root of the metadata chain as of the active header.
    fn get_meta_block(&self) -> BlockId;

    /// Reads the block's content from disk, validating its checksum.
    fn read(&mut self, block: &mut Block) -> Result<()>;

    /// Writes the block to disk, stamping its checksum.
    fn write(&mut self, block: &mut Block) -> Result<()>;

    /// Performs a checkpoint; should be the final step of one.
    fn write_header(&mut self, header: DatabaseHeader) -> Result<()>;
}
