//! File handles over the resource table.
//!
//! The promise-returning forms do their work before the first poll, so
//! operations on one handle always complete in program order.

use crate::error::{Result, ShimError};
use crate::resources::{ResourceTable, Rid, SeekMode};
use crate::value::{Function, Object, Value};
use std::path::Path;
use std::sync::Arc;
use virtual_store::{FsError, OpenOptions, OpenOptionsConfig};

const READ_CHUNK: usize = 16 * 1024;

/// One open resource id. Cloning a handle does not duplicate the resource.
#[derive(Debug, Clone)]
pub struct FsFile {
    rid: Rid,
    table: Arc<ResourceTable>,
}

impl FsFile {
    /// Wraps an already open `rid`.
    pub fn new(table: Arc<ResourceTable>, rid: Rid) -> Self {
        Self { rid, table }
    }

    pub fn rid(&self) -> Rid {
        self.rid
    }

    pub fn read_sync(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.table.read(self.rid, buf)
    }

    pub async fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.read_sync(buf)
    }

    pub fn write_sync(&self, buf: &[u8]) -> Result<usize> {
        self.table.write(self.rid, buf)
    }

    pub async fn write(&self, buf: &[u8]) -> Result<usize> {
        self.write_sync(buf)
    }

    pub fn seek_sync(&self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.table.seek(self.rid, offset, whence)
    }

    pub async fn seek(&self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.seek_sync(offset, whence)
    }

    pub fn truncate_sync(&self, len: Option<u64>) -> Result<()> {
        self.table.truncate(self.rid, len)
    }

    pub fn close(&self) -> Result<()> {
        self.table.close(self.rid)
    }

    /// Reads until end of file.
    pub fn read_all_sync(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        while let Some(n) = self.read_sync(&mut chunk)? {
            contents.extend_from_slice(&chunk[..n]);
        }
        Ok(contents)
    }

    pub async fn read_all(&self) -> Result<Vec<u8>> {
        self.read_all_sync()
    }

    /// Writes every byte of `data`.
    pub fn write_all_sync(&self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let n = self.write_sync(data)?;
            if n == 0 {
                return Err(FsError::WriteZero.into());
            }
            data = &data[n..];
        }
        Ok(())
    }

    pub async fn write_all(&self, data: &[u8]) -> Result<()> {
        self.write_all_sync(data)
    }

    /// The script-facing `File` object: `rid` plus the handle methods.
    pub fn to_value(&self) -> Value {
        let read = self.clone();
        let read_sync = self.clone();
        let write = self.clone();
        let write_sync = self.clone();
        let seek = self.clone();
        let seek_sync = self.clone();
        let close = self.clone();

        Object::builder()
            .class("File")
            .property("rid", self.rid)
            .method(Function::deferred("read", move |args| {
                read_into(&read, args.bytes(0, "buffer")?)
            }))
            .method(Function::sync("readSync", move |args| {
                read_into(&read_sync, args.bytes(0, "buffer")?)
            }))
            .method(Function::deferred("write", move |args| {
                write_from(&write, args.bytes(0, "data")?)
            }))
            .method(Function::sync("writeSync", move |args| {
                write_from(&write_sync, args.bytes(0, "data")?)
            }))
            .method(Function::deferred("seek", move |args| {
                seek_with(&seek, args.number(0, "offset")?, args.number(1, "whence")?)
            }))
            .method(Function::sync("seekSync", move |args| {
                seek_with(&seek_sync, args.number(0, "offset")?, args.number(1, "whence")?)
            }))
            .method(Function::sync("close", move |_| {
                close.close().map(|()| Value::Undefined)
            }))
            .into_value()
    }

    /// Recovers a handle from any object carrying a numeric `rid`.
    pub fn from_value(table: &Arc<ResourceTable>, value: &Value) -> Result<Self> {
        let rid = value
            .as_object()
            .and_then(|object| object.opt_number("rid").ok().flatten())
            .ok_or_else(|| ShimError::TypeError("expected an object with a `rid`".to_owned()))?;
        Ok(Self::new(table.clone(), crate::value::to_rid(rid)?))
    }
}

pub(crate) fn read_into(file: &FsFile, buffer: &crate::value::SharedBytes) -> Result<Value> {
    let n = buffer.with_mut(|buf| file.read_sync(buf))?;
    Ok(n.into())
}

pub(crate) fn write_from(file: &FsFile, data: &crate::value::SharedBytes) -> Result<Value> {
    let n = data.with(|buf| file.write_sync(buf))?;
    Ok(n.into())
}

pub(crate) fn seek_with(file: &FsFile, offset: f64, whence: f64) -> Result<Value> {
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    let in_range = offset >= i64::MIN as f64 && offset < i64::MAX as f64;
    if offset.fract() != 0.0 || !offset.is_finite() || !in_range {
        return Err(ShimError::TypeError(format!("invalid seek offset: {offset}")));
    }
    let position = file.seek_sync(offset as i64, SeekMode::try_from(whence)?)?;
    Ok(position.into())
}

/// Opens `path`. With no options the file is opened read-only.
pub fn open_sync(
    table: &Arc<ResourceTable>,
    path: impl AsRef<Path>,
    options: Option<OpenOptionsConfig>,
) -> Result<FsFile> {
    let options = options.unwrap_or_else(|| OpenOptions::new().read(true).config());
    let rid = table.open(path, &options)?;
    Ok(FsFile::new(table.clone(), rid))
}

pub async fn open(
    table: &Arc<ResourceTable>,
    path: impl AsRef<Path>,
    options: Option<OpenOptionsConfig>,
) -> Result<FsFile> {
    open_sync(table, path, options)
}

/// Options used by `create`: read, write, truncate, create.
pub fn create_options() -> OpenOptionsConfig {
    OpenOptions::new()
        .read(true)
        .write(true)
        .truncate(true)
        .create(true)
        .config()
}

pub fn create_sync(table: &Arc<ResourceTable>, path: impl AsRef<Path>) -> Result<FsFile> {
    open_sync(table, path, Some(create_options()))
}

pub async fn create(table: &Arc<ResourceTable>, path: impl AsRef<Path>) -> Result<FsFile> {
    create_sync(table, path)
}

/// Copies everything `src` has left to read into `dst`.
pub fn copy_sync(src: &FsFile, dst: &FsFile) -> Result<u64> {
    let mut copied = 0u64;
    let mut chunk = vec![0u8; READ_CHUNK];
    while let Some(n) = src.read_sync(&mut chunk)? {
        dst.write_all_sync(&chunk[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

/// Parses a script-side options object into flags; `undefined` means none
/// were given.
pub fn open_options_from(options: Option<&Object>) -> Result<Option<OpenOptionsConfig>> {
    let Some(options) = options else {
        return Ok(None);
    };
    Ok(Some(
        OpenOptions::new()
            .read(options.flag("read")?)
            .write(options.flag("write")?)
            .append(options.flag("append")?)
            .truncate(options.flag("truncate")?)
            .create(options.flag("create")?)
            .create_new(options.flag("createNew")?)
            .config(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use virtual_store::MemStore;

    fn table() -> Arc<ResourceTable> {
        Arc::new(ResourceTable::new(Arc::new(MemStore::new())))
    }

    #[test]
    fn open_defaults_to_read_only() {
        let table = table();
        assert!(
            matches!(open_sync(&table, "/nope", None), Err(ShimError::Fs(FsError::EntityNotFound))),
            "read-only open does not create",
        );

        let file = create_sync(&table, "/yes").unwrap();
        file.write_all_sync(b"abc").unwrap();
        file.close().unwrap();

        let file = open_sync(&table, "/yes", None).unwrap();
        assert_eq!(file.read_all_sync().unwrap(), b"abc".to_vec());
        assert!(file.write_sync(b"x").is_err());
    }

    #[test]
    fn create_truncates() {
        let table = table();
        let file = create_sync(&table, "/c").unwrap();
        file.write_all_sync(b"long contents").unwrap();
        file.close().unwrap();

        let file = create_sync(&table, "/c").unwrap();
        assert_eq!(file.read_all_sync().unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn async_open_rejects_invalid_options() {
        let table = table();
        let empty = open_options_from(Some(&Object::default())).unwrap();
        assert!(matches!(
            open(&table, "/x", empty).await,
            Err(ShimError::InvalidArgs(_))
        ));
        assert!(table.resources().is_empty(), "nothing was allocated");
    }

    #[tokio::test]
    async fn handle_round_trip() {
        let table = table();
        let file = create(&table, "/round").await.unwrap();
        assert_eq!(file.write(b"hello world!").await, Ok(12));
        assert_eq!(file.seek(0, SeekMode::Start).await, Ok(0));

        let mut buf = [0u8; 32];
        assert_eq!(file.read(&mut buf).await, Ok(Some(12)));
        assert_eq!(&buf[..12], b"hello world!");
        assert_eq!(file.read(&mut buf).await, Ok(None));
        file.close().unwrap();
        assert_eq!(file.close(), Err(ShimError::BadResource(file.rid())));
    }

    #[test]
    fn copy_between_handles() {
        let table = table();
        let src = create_sync(&table, "/src").unwrap();
        src.write_all_sync(&vec![7u8; READ_CHUNK + 10]).unwrap();
        src.seek_sync(0, SeekMode::Start).unwrap();

        let dst = create_sync(&table, "/dst").unwrap();
        assert_eq!(copy_sync(&src, &dst), Ok(READ_CHUNK as u64 + 10));
        dst.seek_sync(0, SeekMode::Start).unwrap();
        assert_eq!(dst.read_all_sync().unwrap().len(), READ_CHUNK + 10);
    }

    #[test]
    fn file_object_methods() {
        let table = table();
        let file = create_sync(&table, "/obj").unwrap();
        let value = file.to_value();
        let object = value.as_object().unwrap();
        assert_eq!(object.class(), Some("File"));
        assert_eq!(object.get("rid"), Some(&Value::Number(f64::from(file.rid()))));

        let write = object.get("writeSync").and_then(Value::as_function).unwrap();
        assert_eq!(write.call(&[Value::from(b"xyz".to_vec())]), Ok(Value::Number(3.0)));

        let seek = object.get("seekSync").and_then(Value::as_function).unwrap();
        assert_eq!(
            seek.call(&[Value::Number(0.0), Value::Number(0.0)]),
            Ok(Value::Number(0.0))
        );

        let buffer = crate::value::SharedBytes::zeroed(8);
        let read = object.get("readSync").and_then(Value::as_function).unwrap();
        assert_eq!(read.call(&[Value::Bytes(buffer.clone())]), Ok(Value::Number(3.0)));
        assert_eq!(read.call(&[Value::Bytes(buffer.clone())]), Ok(Value::Null));
        assert_eq!(&buffer.to_vec()[..3], b"xyz");

        let same = FsFile::from_value(&table, &value).unwrap();
        assert_eq!(same.rid(), file.rid());
    }
}
