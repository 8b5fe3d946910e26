//! The resource table: small integer ids mapped to open virtual files.
//!
//! Ids start at 1 and the lowest free id is handed out first, so an id is
//! reused only after its resource has been closed. Closing a resource keeps
//! its storage node referenced until [`ResourceTable::purge_resources`] is
//! called; this is what lets a host decide when bytes of unlinked files can
//! actually be dropped.

use crate::error::{Result, ShimError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};
use virtual_store::{FsError, OpenOptionsConfig, Storage, StoredFile};

pub type Rid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    Start = 0,
    Current = 1,
    End = 2,
}

impl TryFrom<f64> for SeekMode {
    type Error = ShimError;

    fn try_from(whence: f64) -> Result<Self> {
        match whence {
            w if w == 0.0 => Ok(Self::Start),
            w if w == 1.0 => Ok(Self::Current),
            w if w == 2.0 => Ok(Self::End),
            other => Err(ShimError::TypeError(format!("invalid seek mode: {other}"))),
        }
    }
}

/// Coarse label reported by [`ResourceTable::resources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    FsFile,
    Stdin,
    Stdout,
    Stderr,
}

impl ResourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FsFile => "fsFile",
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

#[derive(Debug)]
struct Resource {
    kind: ResourceKind,
    path: PathBuf,
    node: Arc<dyn StoredFile>,
    offset: u64,
    mode: OpenOptionsConfig,
}

impl Resource {
    fn can_write(&self) -> bool {
        self.mode.write() || self.mode.append()
    }
}

#[derive(Debug, Default)]
struct Entries {
    open: BTreeMap<Rid, Resource>,
    closed: Vec<Arc<dyn StoredFile>>,
}

impl Entries {
    fn get_mut(&mut self, rid: Rid) -> Result<&mut Resource> {
        self.open.get_mut(&rid).ok_or(ShimError::BadResource(rid))
    }

    fn next_rid(&self) -> Rid {
        let mut candidate = 1;
        for rid in self.open.keys() {
            if *rid != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }
}

#[derive(Debug)]
pub struct ResourceTable {
    storage: Arc<dyn Storage>,
    entries: Mutex<Entries>,
}

impl ResourceTable {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Rejects option sets that grant no capability or combine flags
    /// inconsistently.
    pub fn check_open_options(conf: &OpenOptionsConfig) -> Result<()> {
        if !conf.any() {
            return Err(ShimError::InvalidArgs(
                "requires at least one option to be true".to_owned(),
            ));
        }
        if conf.truncate() && !conf.write() {
            return Err(ShimError::InvalidArgs(
                "'truncate' option requires 'write' option".to_owned(),
            ));
        }
        if (conf.create() || conf.create_new()) && !(conf.write() || conf.append()) {
            return Err(ShimError::InvalidArgs(
                "'create' or 'createNew' options require 'write' or 'append' option".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn open(&self, path: impl AsRef<Path>, conf: &OpenOptionsConfig) -> Result<Rid> {
        self.open_as(path.as_ref(), conf, ResourceKind::FsFile)
    }

    pub(crate) fn open_as(
        &self,
        path: &Path,
        conf: &OpenOptionsConfig,
        kind: ResourceKind,
    ) -> Result<Rid> {
        Self::check_open_options(conf)?;
        let node = self.storage.open(path, conf)?;

        let mut entries = self.entries.lock();
        let rid = entries.next_rid();
        entries.open.insert(
            rid,
            Resource {
                kind,
                path: path.to_path_buf(),
                node,
                offset: 0,
                mode: *conf,
            },
        );
        debug!(rid, path = %path.display(), kind = kind.label(), "opened resource");
        Ok(rid)
    }

    /// Reads into `buf` from the current offset. `None` marks end of file;
    /// an empty `buf` reads `Some(0)`.
    pub fn read(&self, rid: Rid, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut entries = self.entries.lock();
        let resource = entries.get_mut(rid)?;
        if !resource.mode.read() {
            return Err(FsError::PermissionDenied.into());
        }
        if buf.is_empty() {
            return Ok(Some(0));
        }
        let n = resource.node.read_at(resource.offset, buf)?;
        trace!(rid, n, offset = resource.offset, "read");
        if n == 0 {
            return Ok(None);
        }
        resource.offset += n as u64;
        Ok(Some(n))
    }

    pub fn write(&self, rid: Rid, buf: &[u8]) -> Result<usize> {
        let mut entries = self.entries.lock();
        let resource = entries.get_mut(rid)?;
        if !resource.can_write() {
            return Err(FsError::PermissionDenied.into());
        }
        if resource.mode.append() {
            resource.offset = resource.node.len();
        }
        let n = resource.node.write_at(resource.offset, buf)?;
        trace!(rid, n, offset = resource.offset, "write");
        resource.offset += n as u64;
        Ok(n)
    }

    pub fn seek(&self, rid: Rid, offset: i64, whence: SeekMode) -> Result<u64> {
        let mut entries = self.entries.lock();
        let resource = entries.get_mut(rid)?;
        let base = match whence {
            SeekMode::Start => 0,
            SeekMode::Current => resource.offset,
            SeekMode::End => resource.node.len(),
        };
        let target = i128::from(base) + i128::from(offset);
        let target = u64::try_from(target).map_err(|_| FsError::InvalidInput)?;
        trace!(rid, target, "seek");
        resource.offset = target;
        Ok(target)
    }

    /// Sets the length of the file behind `rid` (default 0). The offset is
    /// left where it was.
    pub fn truncate(&self, rid: Rid, len: Option<u64>) -> Result<()> {
        let mut entries = self.entries.lock();
        let resource = entries.get_mut(rid)?;
        if !resource.can_write() {
            return Err(FsError::PermissionDenied.into());
        }
        resource.node.set_len(len.unwrap_or(0))?;
        Ok(())
    }

    pub fn close(&self, rid: Rid) -> Result<()> {
        let mut entries = self.entries.lock();
        let resource = entries
            .open
            .remove(&rid)
            .ok_or(ShimError::BadResource(rid))?;
        debug!(rid, path = %resource.path.display(), "closed resource");
        entries.closed.push(resource.node);
        Ok(())
    }

    pub fn copy_file(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
        Ok(self.storage.copy(from.as_ref(), to.as_ref())?)
    }

    /// Snapshot of the currently open ids and their kind labels.
    pub fn resources(&self) -> BTreeMap<Rid, &'static str> {
        self.entries
            .lock()
            .open
            .iter()
            .map(|(rid, resource)| (*rid, resource.kind.label()))
            .collect()
    }

    /// Releases the storage nodes of closed resources and lets the storage
    /// reclaim unlinked files nothing holds anymore. Returns the number of
    /// reclaimed files.
    pub fn purge_resources(&self) -> usize {
        let released = {
            let mut entries = self.entries.lock();
            let released = entries.closed.len();
            entries.closed.clear();
            released
        };
        let reclaimed = self.storage.reclaim();
        debug!(released, reclaimed, "purged closed resources");
        reclaimed
    }

    pub fn is_open(&self, rid: Rid) -> bool {
        self.entries.lock().open.contains_key(&rid)
    }

    pub fn path(&self, rid: Rid) -> Result<PathBuf> {
        let mut entries = self.entries.lock();
        Ok(entries.get_mut(rid)?.path.clone())
    }
}
