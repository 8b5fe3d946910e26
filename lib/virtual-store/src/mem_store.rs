//! An in-memory [`Storage`], the default backing for the shim.

use crate::{FsError, OpenOptionsConfig, Result, Storage, StoredFile};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};

/// The largest size, in bytes, a [`MemFile`] will grow to.
pub const MAX_FILE_SIZE: u64 = 1 << 32;

#[derive(Debug, Default)]
pub struct MemFile {
    data: RwLock<Vec<u8>>,
}

impl MemFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    fn replace(&self, data: Vec<u8>) {
        *self.data.write() = data;
    }
}

impl StoredFile for MemFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.read();
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let end = u64::try_from(buf.len())
            .ok()
            .and_then(|len| offset.checked_add(len))
            .ok_or(FsError::InvalidInput)?;
        let mut data = self.data.write();
        if (data.len() as u64) < end {
            resize(&mut data, end)?;
        }
        let start = usize::try_from(offset).map_err(|_| FsError::InvalidInput)?;
        data[start..start + buf.len()].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn len(&self) -> u64 {
        self.data.read().len() as u64
    }

    fn set_len(&self, new_size: u64) -> Result<()> {
        resize(&mut self.data.write(), new_size)
    }
}

/// Resizes `data` to `new_len`, zero-filling growth. Lengths past
/// [`MAX_FILE_SIZE`] or that cannot be allocated are `InvalidInput`.
fn resize(data: &mut Vec<u8>, new_len: u64) -> Result<()> {
    if new_len > MAX_FILE_SIZE {
        return Err(FsError::InvalidInput);
    }
    let new_len = usize::try_from(new_len).map_err(|_| FsError::InvalidInput)?;
    if let Some(extra) = new_len.checked_sub(data.len()) {
        data.try_reserve_exact(extra).map_err(|_| FsError::InvalidInput)?;
    }
    data.resize(new_len, 0);
    Ok(())
}

#[derive(Debug, Default)]
struct MemStoreInner {
    nodes: BTreeMap<PathBuf, Arc<MemFile>>,
    unlinked: Vec<Weak<MemFile>>,
}

impl MemStoreInner {
    fn unlink(&mut self, path: &Path) -> Option<Arc<MemFile>> {
        let node = self.nodes.remove(path)?;
        self.unlinked.push(Arc::downgrade(&node));
        Some(node)
    }
}

/// Flat map from normalized absolute paths to file nodes.
///
/// Directories are implicit: any path with a file name can hold a file.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RwLock<MemStoreInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) `path` with `data`.
    pub fn insert<P: AsRef<Path>>(&self, path: P, data: Vec<u8>) -> Result<()> {
        let path = normalize(path.as_ref())?;
        let mut inner = self.inner.write();
        inner.unlink(&path);
        inner.nodes.insert(path, Arc::new(MemFile::with_contents(data)));
        Ok(())
    }

    /// Snapshot of the bytes stored at `path`.
    pub fn contents<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = normalize(path.as_ref())?;
        let inner = self.inner.read();
        let node = inner.nodes.get(&path).ok_or(FsError::EntityNotFound)?;
        Ok(node.contents())
    }
}

impl Storage for MemStore {
    fn open(&self, path: &Path, conf: &OpenOptionsConfig) -> Result<Arc<dyn StoredFile>> {
        let path = normalize(path)?;
        let mut inner = self.inner.write();

        match inner.nodes.get(&path) {
            // `createNew` never reuses a node.
            Some(_) if conf.create_new() => Err(FsError::AlreadyExists),
            Some(node) => {
                if conf.truncate() {
                    node.set_len(0)?;
                }
                Ok(node.clone())
            }
            None if conf.create() || conf.create_new() => {
                let node = Arc::new(MemFile::new());
                inner.nodes.insert(path, node.clone());
                Ok(node)
            }
            None => Err(FsError::EntityNotFound),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        match normalize(path) {
            Ok(path) => self.inner.read().nodes.contains_key(&path),
            Err(_) => false,
        }
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let path = normalize(path)?;
        self.inner
            .write()
            .unlink(&path)
            .map(|_| ())
            .ok_or(FsError::EntityNotFound)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        if from == to {
            return Ok(());
        }
        let mut inner = self.inner.write();
        let node = inner.nodes.remove(&from).ok_or(FsError::EntityNotFound)?;
        inner.unlink(&to);
        inner.nodes.insert(to, node);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        let mut inner = self.inner.write();
        let data = inner
            .nodes
            .get(&from)
            .ok_or(FsError::EntityNotFound)?
            .contents();
        let len = data.len() as u64;
        match inner.nodes.get(&to) {
            // Replace in place so handles already open on `to` see the copy.
            Some(node) => node.replace(data),
            None => {
                inner.nodes.insert(to, Arc::new(MemFile::with_contents(data)));
            }
        }
        Ok(len)
    }

    fn paths(&self) -> Vec<PathBuf> {
        self.inner.read().nodes.keys().cloned().collect()
    }

    fn reclaim(&self) -> usize {
        let mut inner = self.inner.write();
        let before = inner.unlinked.len();
        inner.unlinked.retain(|node| node.strong_count() > 0);
        let reclaimed = before - inner.unlinked.len();
        tracing::trace!(reclaimed, "reclaimed unlinked nodes");
        reclaimed
    }

    fn live_orphans(&self) -> usize {
        self.inner
            .read()
            .unlinked
            .iter()
            .filter(|node| node.strong_count() > 0)
            .count()
    }
}

/// Folds `.` and `..` and anchors relative paths at `/`.
fn normalize(path: &Path) -> Result<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) => return Err(FsError::InvalidInput),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part),
        }
    }
    if parts.is_empty() {
        return Err(FsError::NotAFile);
    }
    let mut normalized = PathBuf::from("/");
    normalized.extend(parts);
    Ok(normalized)
}
