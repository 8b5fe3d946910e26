use crate::config::ShimConfig;
use crate::error::Result;
use crate::file::FsFile;
use crate::resources::{ResourceKind, ResourceTable};
use std::path::Path;
use std::sync::Arc;
use virtual_store::OpenOptions;

/// The three standard stream handles, opened once per polyfill instance.
#[derive(Debug, Clone)]
pub struct Stdio {
    pub stdin: FsFile,
    pub stdout: FsFile,
    pub stderr: FsFile,
}

impl Stdio {
    /// stdin is read-only over a pre-created empty node; stdout and stderr
    /// are append-only.
    pub fn open(table: &Arc<ResourceTable>, config: &ShimConfig) -> Result<Self> {
        let stdin_path = Path::new(&config.stdin_path);
        if !table.storage().exists(stdin_path) {
            OpenOptions::new()
                .write(true)
                .create(true)
                .open(table.storage().as_ref(), stdin_path)?;
        }

        let read = OpenOptions::new().read(true).config();
        let append = OpenOptions::new().append(true).create(true).config();

        let stdin = table.open_as(stdin_path, &read, ResourceKind::Stdin)?;
        let stdout = table.open_as(Path::new(&config.stdout_path), &append, ResourceKind::Stdout)?;
        let stderr = table.open_as(Path::new(&config.stderr_path), &append, ResourceKind::Stderr)?;

        Ok(Self {
            stdin: FsFile::new(table.clone(), stdin),
            stdout: FsFile::new(table.clone(), stdout),
            stderr: FsFile::new(table.clone(), stderr),
        })
    }
}

/// There is never a terminal behind a resource.
pub fn isatty(_rid: crate::resources::Rid) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use virtual_store::MemStore;

    #[test]
    fn streams_take_the_first_rids() {
        let store = Arc::new(MemStore::new());
        let table = Arc::new(ResourceTable::new(store.clone()));
        let stdio = Stdio::open(&table, &ShimConfig::default()).unwrap();

        assert_eq!(
            (stdio.stdin.rid(), stdio.stdout.rid(), stdio.stderr.rid()),
            (1, 2, 3)
        );
        let labels: Vec<_> = table.resources().into_values().collect();
        assert_eq!(labels, vec!["stdin", "stdout", "stderr"]);

        let mut buf = [0u8; 4];
        assert_eq!(stdio.stdin.read_sync(&mut buf), Ok(None));
        assert!(stdio.stdin.write_sync(b"x").is_err());

        stdio.stdout.write_all_sync(b"out").unwrap();
        stdio.stdout.write_all_sync(b"put").unwrap();
        assert_eq!(store.contents("/dev/stdout").unwrap(), b"output".to_vec());
        assert!(stdio.stderr.read_sync(&mut buf).is_err());
        assert!(!isatty(stdio.stdout.rid()));
    }

    #[test]
    fn existing_stdin_contents_are_readable() {
        let store = Arc::new(MemStore::new());
        store.insert("/dev/stdin", b"typed".to_vec()).unwrap();
        let table = Arc::new(ResourceTable::new(store));
        let stdio = Stdio::open(&table, &ShimConfig::default()).unwrap();
        assert_eq!(stdio.stdin.read_all_sync().unwrap(), b"typed".to_vec());
    }
}
