//! File I/O collaborator: offset-addressed, exact-length access to the
//! database file.
//!
//! Every transfer is all-or-nothing; a short read or write surfaces as an
//! [`Error::Io`](crate::Error::Io). Retry policy, if any, belongs here and not
//! in the block layer above.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A handle to the single database file.
pub struct FileHandle {
    file: File,
    path: PathBuf,
}

impl FileHandle {
    /// Opens the file at `path`.
    ///
    /// A read-only handle never creates the file; a read-write handle creates
    /// it when `create` is set.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool, create: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true);
        if !read_only {
            options.write(true);
            if create {
                options.create(true);
            }
        }

        let file = options.open(&path)?;
        Ok(Self { file, path })
    }

    /// Reads exactly `buffer.len()` bytes at `offset`.
    pub fn read_at(&mut self, buffer: &mut [u8], offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buffer)?;
        Ok(())
    }

    /// Writes the whole buffer at `offset`.
    pub fn write_at(&mut self, buffer: &[u8], offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buffer)?;
        Ok(())
    }

    /// Forces durable write-back of all written data.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// The path this handle was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
