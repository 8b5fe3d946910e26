//! Byte storage addressable by path.
//!
//! A [`Storage`] owns the bytes of every virtual file; callers get shared
//! [`StoredFile`] nodes back from [`Storage::open`] and keep their own
//! cursors. Nothing here tracks offsets or open handles, that is the job of
//! the resource table built on top.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

mod mem_store;

pub use mem_store::{MAX_FILE_SIZE, MemFile, MemStore};

pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptionsConfig {
    read: bool,
    write: bool,
    create_new: bool,
    create: bool,
    append: bool,
    truncate: bool,
}

impl OpenOptionsConfig {
    pub const fn read(&self) -> bool {
        self.read
    }

    pub const fn write(&self) -> bool {
        self.write
    }

    pub const fn create_new(&self) -> bool {
        self.create_new
    }

    pub const fn create(&self) -> bool {
        self.create
    }

    pub const fn append(&self) -> bool {
        self.append
    }

    pub const fn truncate(&self) -> bool {
        self.truncate
    }

    /// `true` when at least one flag is set.
    pub const fn any(&self) -> bool {
        self.read || self.write || self.append || self.truncate || self.create || self.create_new
    }
}

/// Builder for [`OpenOptionsConfig`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    conf: OpenOptionsConfig,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&mut self, read: bool) -> &mut Self {
        self.conf.read = read;
        self
    }

    pub fn write(&mut self, write: bool) -> &mut Self {
        self.conf.write = write;
        self
    }

    pub fn append(&mut self, append: bool) -> &mut Self {
        self.conf.append = append;
        self
    }

    pub fn truncate(&mut self, truncate: bool) -> &mut Self {
        self.conf.truncate = truncate;
        self
    }

    pub fn create(&mut self, create: bool) -> &mut Self {
        self.conf.create = create;
        self
    }

    pub fn create_new(&mut self, create_new: bool) -> &mut Self {
        self.conf.create_new = create_new;
        self
    }

    pub fn config(&self) -> OpenOptionsConfig {
        self.conf
    }

    pub fn open<P: AsRef<Path>>(&self, storage: &dyn Storage, path: P) -> Result<Arc<dyn StoredFile>> {
        storage.open(path.as_ref(), &self.conf)
    }
}

/// A path-addressed byte store.
///
/// `open` only applies existence semantics (create, create-new, truncate);
/// access-mode checks belong to the caller.
pub trait Storage: fmt::Debug + Send + Sync {
    fn open(&self, path: &Path, conf: &OpenOptionsConfig) -> Result<Arc<dyn StoredFile>>;

    fn exists(&self, path: &Path) -> bool;

    /// Unlinks `path`. Nodes still held open stay alive until released.
    fn remove(&self, path: &Path) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Full byte copy, creating or replacing `to`. Returns the number of
    /// bytes copied.
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;

    fn paths(&self) -> Vec<PathBuf>;

    /// Forgets unlinked nodes that nobody holds anymore and returns how many
    /// were dropped.
    fn reclaim(&self) -> usize;

    /// Unlinked nodes that are still held open by someone.
    fn live_orphans(&self) -> usize;
}

/// The bytes behind one path.
pub trait StoredFile: fmt::Debug + Send + Sync {
    /// Reads at `offset`; returns `0` at or past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Writes at `offset`, zero-filling any gap past the current end.
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize>;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets the length to `new_size`, zero-filling growth. Stores may refuse
    /// sizes they cannot hold with [`FsError::InvalidInput`].
    fn set_len(&self, new_size: u64) -> Result<()>;
}

/// Failures reported by a [`Storage`] and the files it hands out.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    /// Expected a file but found not a file
    #[error("not a file")]
    NotAFile,
    /// File exists
    #[error("file exists")]
    AlreadyExists,
    /// The provided data is invalid
    #[error("invalid input")]
    InvalidInput,
    /// The requested file or directory could not be found
    #[error("entity not found")]
    EntityNotFound,
    /// Caller was not allowed to perform this operation
    #[error("permission denied")]
    PermissionDenied,
    /// A call to write returned 0
    #[error("write returned 0")]
    WriteZero,
}
