//! # MallarDB — single-file block storage for an embedded analytical database
//!
//! MallarDB manages one data file as a sequence of fixed-size, checksummed
//! blocks and makes the file's logical state move atomically across
//! checkpoints with a double-buffered database header.
//!
//! ## Architecture
//!
//! - **FileBuffer**: checksummed page buffer; validates on read, stamps on write
//! - **Block**: a page buffer at the block quantum, tagged with its `BlockId`
//! - **SingleFileBlockManager**: owns the file, the LIFO free list and the
//!   double-buffered header; implements the [`BlockManager`] contract
//! - **MetaBlockWriter / MetaBlockReader**: stream arbitrary-length metadata
//!   across chained blocks, using only the manager's public contract
//! - **Header codec**: the fixed little-endian main/database header layouts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mallardb::{BlockManager, DatabaseHeader, Options, SingleFileBlockManager};
//!
//! # fn main() -> Result<(), mallardb::Error> {
//! let mut manager = SingleFileBlockManager::open("analytics.db", Options::default())?;
//!
//! // Allocate a block, fill it, persist it.
//! let mut block = manager.create_block();
//! block.buffer.payload_mut()[..5].copy_from_slice(b"hello");
//! manager.write(&mut block)?;
//!
//! // Make the new state durable and authoritative.
//! let mut header = DatabaseHeader::new();
//! header.meta_block = block.id;
//! manager.write_header(header)?;
//! # Ok(())
//! # }
//! ```
//!
//! The manager is synchronous and single-owner by design: it is not `Clone`,
//! and sharing it across threads requires an external mutex.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod block;
pub mod buffer;
pub mod checksum;
pub mod config;
pub mod error;
pub mod file;
pub mod header;
pub mod manager;
pub mod meta;

// Re-exports
pub use block::{Block, BlockId, BlockManager, BLOCK_SIZE, INVALID_BLOCK};
pub use buffer::FileBuffer;
pub use config::Options;
pub use error::{Error, Result};
pub use file::FileHandle;
pub use header::{DatabaseHeader, MainHeader, BLOCK_START, HEADER_SIZE, VERSION_NUMBER};
pub use manager::SingleFileBlockManager;
pub use meta::{MetaBlockReader, MetaBlockWriter};
