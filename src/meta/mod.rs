//! Chained meta-block streams.
//!
//! Metadata larger than one block (the free list today, catalog data later) is
//! written and read as a flat byte stream while being physically stored as a
//! linked list of blocks. The first 8 bytes of every meta block's payload hold
//! the id of the next block in the chain, [`INVALID_BLOCK`] terminated; stream
//! offsets always start past this pointer.
//!
//! [`INVALID_BLOCK`]: crate::block::INVALID_BLOCK

mod reader;
mod writer;

pub use reader::MetaBlockReader;
pub use writer::MetaBlockWriter;

/// Width of the chain pointer at the front of every meta block's payload.
pub(crate) const CHAIN_POINTER_SIZE: u64 = 8;
