//! The single-file block manager.
//!
//! Owns the database file, the in-memory free list, the allocation high-water
//! mark, and the double-buffered database header. All block I/O in the crate
//! funnels through this type; the meta-block reader and writer sit above it
//! and only use the [`BlockManager`] contract.

use crate::block::{Block, BlockId, BlockManager, BLOCK_SIZE, INVALID_BLOCK};
use crate::buffer::FileBuffer;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::file::FileHandle;
use crate::header::{DatabaseHeader, MainHeader, BLOCK_START, HEADER_SIZE, VERSION_NUMBER};
use crate::meta::{MetaBlockReader, MetaBlockWriter};
use std::path::{Path, PathBuf};

/// A [`BlockManager`] that stores all blocks in a single file.
///
/// The instance is the sole owner of the file handle and the allocation
/// state. It is deliberately not `Clone`; concurrent use from multiple
/// threads requires an external mutex supplied by the caller.
pub struct SingleFileBlockManager {
    path: PathBuf,
    handle: FileHandle,
    /// Scratch buffer for reading and writing the three header pages.
    header_buffer: FileBuffer,
    /// Which database header slot is authoritative: 0 for H1, 1 for H2.
    active_header: u8,
    /// Block ids eligible for reuse, popped LIFO.
    free_list: Vec<BlockId>,
    /// Block ids read since the last checkpoint; persisted as the next free
    /// list when the header flips.
    used_blocks: Vec<BlockId>,
    /// Root of the metadata chain as of the active header.
    meta_block: BlockId,
    /// High-water mark handed out once the free list runs dry.
    max_block: BlockId,
    /// The currently authoritative iteration; a checkpoint stamps
    /// `iteration_count + 1`.
    iteration_count: u64,
}

impl SingleFileBlockManager {
    /// Opens the database file at `path`, creating it when allowed by
    /// `options`.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            Self::open_existing(path, options.read_only)
        } else if options.read_only {
            Err(Error::not_found(format!(
                "cannot open {:?} read-only: file does not exist",
                path
            )))
        } else if options.create_if_missing {
            Self::create_new(path)
        } else {
            Err(Error::not_found(format!("database file does not exist: {:?}", path)))
        }
    }

    /// Creates a fresh database file: main header at offset 0, then both
    /// database header slots (iterations 0 and 1) with no content, followed
    /// by a sync. H2, carrying the higher iteration, starts out active.
    fn create_new(path: PathBuf) -> Result<Self> {
        let mut handle = FileHandle::open(&path, false, true)?;
        let mut header_buffer = FileBuffer::new(HEADER_SIZE);

        header_buffer.clear();
        MainHeader::new().encode(header_buffer.payload_mut());
        header_buffer.write(&mut handle, 0)?;

        let mut header = DatabaseHeader::new();
        header_buffer.clear();
        header.encode(header_buffer.payload_mut());
        header_buffer.write(&mut handle, HEADER_SIZE)?;

        header.iteration = 1;
        header_buffer.clear();
        header.encode(header_buffer.payload_mut());
        header_buffer.write(&mut handle, HEADER_SIZE * 2)?;

        // The headers must be durable before the file is used.
        handle.sync()?;

        log::info!("created new database file {:?}", path);

        Ok(Self {
            path,
            handle,
            header_buffer,
            active_header: 1,
            free_list: Vec::new(),
            used_blocks: Vec::new(),
            meta_block: INVALID_BLOCK,
            max_block: 0,
            iteration_count: 1,
        })
    }

    /// Opens an existing file: validates the main-header version, then adopts
    /// the database header slot with the strictly higher iteration.
    fn open_existing(path: PathBuf, read_only: bool) -> Result<Self> {
        let mut handle = FileHandle::open(&path, read_only, false)?;
        let mut header_buffer = FileBuffer::new(HEADER_SIZE);

        header_buffer.read(&mut handle, 0)?;
        let main_header = MainHeader::decode(header_buffer.payload())?;
        if main_header.version != VERSION_NUMBER {
            return Err(Error::VersionMismatch {
                found: main_header.version,
                supported: VERSION_NUMBER,
            });
        }

        header_buffer.read(&mut handle, HEADER_SIZE)?;
        let header1 = DatabaseHeader::decode(header_buffer.payload())?;
        header_buffer.read(&mut handle, HEADER_SIZE * 2)?;
        let header2 = DatabaseHeader::decode(header_buffer.payload())?;

        let mut manager = Self {
            path,
            handle,
            header_buffer,
            active_header: 0,
            free_list: Vec::new(),
            used_blocks: Vec::new(),
            meta_block: INVALID_BLOCK,
            max_block: 0,
            iteration_count: 0,
        };

        if header1.iteration > header2.iteration {
            manager.initialize(&header1)?;
        } else {
            manager.active_header = 1;
            manager.initialize(&header2)?;
        }

        log::info!(
            "opened database file {:?} at iteration {} with {} free blocks",
            manager.path,
            manager.iteration_count,
            manager.free_list.len()
        );

        Ok(manager)
    }

    /// Adopts the state of the active header, reconstructing the free list
    /// from its on-disk chain.
    fn initialize(&mut self, header: &DatabaseHeader) -> Result<()> {
        self.meta_block = header.meta_block;
        self.iteration_count = header.iteration;
        self.max_block = header.block_count as BlockId;

        if header.free_list != INVALID_BLOCK {
            let mut reader = MetaBlockReader::new(&mut *self, header.free_list)?;
            let count = reader.read_u64()?;
            let mut free_list = Vec::with_capacity(count as usize);
            for _ in 0..count {
                free_list.push(reader.read_i64()?);
            }
            drop(reader);
            // The chain blocks themselves were just read, so they are already
            // tracked for reclamation at the next checkpoint.
            self.free_list = free_list;
        }

        Ok(())
    }

    fn block_offset(id: BlockId) -> u64 {
        BLOCK_START + id as u64 * BLOCK_SIZE
    }
}

impl BlockManager for SingleFileBlockManager {
    fn create_block(&mut self) -> Block {
        Block::new(self.get_free_block_id())
    }

    fn get_free_block_id(&mut self) -> BlockId {
        if let Some(id) = self.free_list.pop() {
            id
        } else {
            let id = self.max_block;
            self.max_block += 1;
            id
        }
    }

    fn get_meta_block(&self) -> BlockId {
        self.meta_block
    }

    fn read(&mut self, block: &mut Block) -> Result<()> {
        if block.id < 0 {
            return Err(Error::invalid_argument(format!("cannot read block {}", block.id)));
        }
        if !self.used_blocks.contains(&block.id) {
            self.used_blocks.push(block.id);
        }
        block.buffer.read(&mut self.handle, Self::block_offset(block.id))
    }

    fn write(&mut self, block: &mut Block) -> Result<()> {
        if block.id < 0 {
            return Err(Error::invalid_argument(format!("cannot write block {}", block.id)));
        }
        block.buffer.write(&mut self.handle, Self::block_offset(block.id))
    }

    /// Performs a checkpoint.
    ///
    /// The free-list chain is persisted before a single header byte is
    /// written, the header lands in the inactive slot, and the sync completes
    /// before the flip takes effect. A crash at any point leaves the previous
    /// header authoritative.
    fn write_header(&mut self, mut header: DatabaseHeader) -> Result<()> {
        self.iteration_count += 1;
        header.iteration = self.iteration_count;

        if self.used_blocks.is_empty() {
            header.free_list = INVALID_BLOCK;
        } else {
            // Persist the blocks touched this iteration as the next free
            // list: once this header is authoritative, the superseded
            // iteration no longer references them.
            let free_blocks = self.used_blocks.clone();
            let mut writer = MetaBlockWriter::new(&mut *self);
            header.free_list = writer.first_block();
            writer.write_u64(free_blocks.len() as u64)?;
            for id in &free_blocks {
                writer.write_i64(*id)?;
            }
            writer.flush()?;
        }

        // Cover any chain blocks allocated above in the high-water mark.
        header.block_count = self.max_block as u64;

        self.header_buffer.clear();
        header.encode(self.header_buffer.payload_mut());
        // Write the slot that is NOT active; the only other valid snapshot is
        // never overwritten before the new one is durable.
        let offset = if self.active_header == 1 { HEADER_SIZE } else { HEADER_SIZE * 2 };
        self.header_buffer.write(&mut self.handle, offset)?;
        self.active_header = 1 - self.active_header;
        self.handle.sync()?;

        log::debug!(
            "checkpointed {:?} at iteration {}, {} blocks reclaimable",
            self.path,
            header.iteration,
            self.used_blocks.len()
        );

        self.meta_block = header.meta_block;
        // Blocks used by the finished iteration become reusable in the next.
        self.free_list = std::mem::take(&mut self.used_blocks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db_path(dir: &TempDir) -> PathBuf {
        dir.path().join("test.db")
    }

    #[test]
    fn test_create_new_file() {
        let dir = TempDir::new().unwrap();
        let manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        assert_eq!(manager.active_header, 1);
        assert_eq!(manager.iteration_count, 1);
        assert_eq!(manager.get_meta_block(), INVALID_BLOCK);
        assert!(manager.free_list.is_empty());
    }

    #[test]
    fn test_open_missing_without_create() {
        let dir = TempDir::new().unwrap();
        let options = Options::new().create_if_missing(false);
        let result = SingleFileBlockManager::open(db_path(&dir), options);
        assert!(matches!(result, Err(Error::NotFound(_))));

        let options = Options::new().read_only(true);
        let result = SingleFileBlockManager::open(db_path(&dir), options);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reopen_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        drop(SingleFileBlockManager::open(&path, Options::default()).unwrap());

        let manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();
        // H2 (iteration 1) wins over H1 (iteration 0).
        assert_eq!(manager.active_header, 1);
        assert_eq!(manager.iteration_count, 1);
        assert_eq!(manager.max_block, 0);
    }

    #[test]
    fn test_version_guard() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);
        drop(SingleFileBlockManager::open(&path, Options::default()).unwrap());

        // Rewrite the main header with an unsupported version (and a valid
        // checksum, so only the version check can fire).
        let mut handle = FileHandle::open(&path, false, false).unwrap();
        let mut buffer = FileBuffer::new(HEADER_SIZE);
        let mut main_header = MainHeader::new();
        main_header.version = 2;
        main_header.encode(buffer.payload_mut());
        buffer.write(&mut handle, 0).unwrap();
        handle.sync().unwrap();

        let result = SingleFileBlockManager::open(&path, Options::default());
        assert!(matches!(result, Err(Error::VersionMismatch { found: 2, supported: 1 })));
    }

    #[test]
    fn test_allocation_sequence() {
        let dir = TempDir::new().unwrap();
        let mut manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        assert_eq!(manager.get_free_block_id(), 0);
        assert_eq!(manager.get_free_block_id(), 1);
        let block = manager.create_block();
        assert_eq!(block.id, 2);
        assert_eq!(manager.max_block, 3);
    }

    #[test]
    fn test_free_list_lifo() {
        let dir = TempDir::new().unwrap();
        let mut manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        // Blocks 5, 9 and 2 were touched this iteration; the checkpoint
        // frees them in that order.
        manager.used_blocks = vec![5, 9, 2];
        manager.max_block = 10;
        manager.write_header(DatabaseHeader::new()).unwrap();

        assert_eq!(manager.free_list, vec![5, 9, 2]);
        assert_eq!(manager.get_free_block_id(), 2);
        assert_eq!(manager.get_free_block_id(), 9);
        assert_eq!(manager.get_free_block_id(), 5);
        // The free-list chain itself consumed id 10, so the high-water mark
        // resumes at 11.
        assert_eq!(manager.get_free_block_id(), 11);
    }

    #[test]
    fn test_used_blocks_deduplicated() {
        let dir = TempDir::new().unwrap();
        let mut manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        let mut block = manager.create_block();
        block.buffer.payload_mut()[0] = 1;
        manager.write(&mut block).unwrap();
        manager.read(&mut block).unwrap();
        manager.read(&mut block).unwrap();

        assert_eq!(manager.used_blocks, vec![block.id]);
    }

    #[test]
    fn test_read_write_invalid_block() {
        let dir = TempDir::new().unwrap();
        let mut manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        let mut block = Block::new(INVALID_BLOCK);
        assert!(matches!(manager.read(&mut block), Err(Error::InvalidArgument(_))));
        assert!(matches!(manager.write(&mut block), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_checkpoint_flips_header_slots() {
        let dir = TempDir::new().unwrap();
        let mut manager = SingleFileBlockManager::open(db_path(&dir), Options::default()).unwrap();

        assert_eq!(manager.active_header, 1);
        manager.write_header(DatabaseHeader::new()).unwrap();
        assert_eq!(manager.active_header, 0);
        assert_eq!(manager.iteration_count, 2);

        manager.write_header(DatabaseHeader::new()).unwrap();
        assert_eq!(manager.active_header, 1);
        assert_eq!(manager.iteration_count, 3);
    }

    #[test]
    fn test_checkpoint_atomicity_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        {
            let mut manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();

            let mut block = manager.create_block();
            block.buffer.payload_mut()[..3].copy_from_slice(b"one");
            manager.write(&mut block).unwrap();
            manager.read(&mut block).unwrap();
            manager.write_header(DatabaseHeader::new()).unwrap();

            // Second iteration reuses the freed block and checkpoints again.
            let mut block = manager.create_block();
            assert_eq!(block.id, 0);
            block.buffer.payload_mut()[..3].copy_from_slice(b"two");
            manager.write(&mut block).unwrap();
            manager.read(&mut block).unwrap();
            manager.write_header(DatabaseHeader::new()).unwrap();

            assert_eq!(manager.iteration_count, 3);
        }

        let manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();
        // The header stamped last (higher iteration) is authoritative, and
        // the free list matches the blocks used when it was written.
        assert_eq!(manager.iteration_count, 3);
        assert_eq!(manager.free_list, vec![0]);
    }

    #[test]
    fn test_end_to_end_hello_world() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);
        let payload = b"Hello World!";

        {
            let mut manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();

            let mut block = manager.create_block();
            assert_eq!(block.id, 0);
            block.buffer.payload_mut()[..payload.len()].copy_from_slice(payload);
            manager.write(&mut block).unwrap();

            let mut header = DatabaseHeader::new();
            header.meta_block = block.id;
            manager.write_header(header).unwrap();
        }

        let mut manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();
        assert_eq!(manager.get_meta_block(), 0);
        assert!(manager.free_list.is_empty());

        let mut block = Block::new(manager.get_meta_block());
        manager.read(&mut block).unwrap();
        assert_eq!(&block.buffer.payload()[..payload.len()], payload);
    }

    #[test]
    fn test_read_only_reopen() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        {
            let mut manager = SingleFileBlockManager::open(&path, Options::default()).unwrap();
            let mut block = manager.create_block();
            block.buffer.payload_mut()[..4].copy_from_slice(b"data");
            manager.write(&mut block).unwrap();
            let mut header = DatabaseHeader::new();
            header.meta_block = block.id;
            manager.write_header(header).unwrap();
        }

        let options = Options::new().read_only(true);
        let mut manager = SingleFileBlockManager::open(&path, options).unwrap();
        let mut block = Block::new(manager.get_meta_block());
        manager.read(&mut block).unwrap();
        assert_eq!(&block.buffer.payload()[..4], b"data");
    }
}
