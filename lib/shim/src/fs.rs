//! Whole-file convenience operations built from open, drain or fill, close.

use crate::context::Context;
use crate::error::Result;
use crate::file::{self, FsFile};
use crate::temp::{self, TempOptions};
use crate::value::Object;
use std::path::Path;
use virtual_store::{OpenOptions, OpenOptionsConfig};

/// Options accepted by `writeFile` and `writeTextFile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFileOptions {
    pub append: bool,
    pub create: bool,
}

impl Default for WriteFileOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
        }
    }
}

impl WriteFileOptions {
    pub fn from_object(options: Option<&Object>) -> Result<Self> {
        let defaults = Self::default();
        let Some(options) = options else {
            return Ok(defaults);
        };
        Ok(Self {
            append: options.opt_flag("append")?.unwrap_or(defaults.append),
            create: options.opt_flag("create")?.unwrap_or(defaults.create),
        })
    }

    fn open_options(&self) -> OpenOptionsConfig {
        OpenOptions::new()
            .write(true)
            .create(self.create)
            .truncate(!self.append)
            .append(self.append)
            .config()
    }
}

/// Runs `f` over a freshly opened file and closes it afterwards, whether or
/// not `f` succeeded.
fn with_file<T>(
    ctx: &Context,
    path: &Path,
    options: OpenOptionsConfig,
    f: impl FnOnce(&FsFile) -> Result<T>,
) -> Result<T> {
    let file = file::open_sync(ctx.resources(), path, Some(options))?;
    let result = f(&file);
    let closed = file.close();
    let value = result?;
    closed?;
    Ok(value)
}

pub fn read_file_sync(ctx: &Context, path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let read = OpenOptions::new().read(true).config();
    with_file(ctx, path.as_ref(), read, FsFile::read_all_sync)
}

pub async fn read_file(ctx: &Context, path: impl AsRef<Path>) -> Result<Vec<u8>> {
    read_file_sync(ctx, path)
}

/// Invalid UTF-8 sequences decode to U+FFFD.
pub fn read_text_file_sync(ctx: &Context, path: impl AsRef<Path>) -> Result<String> {
    let bytes = read_file_sync(ctx, path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn read_text_file(ctx: &Context, path: impl AsRef<Path>) -> Result<String> {
    read_text_file_sync(ctx, path)
}

pub fn write_file_sync(
    ctx: &Context,
    path: impl AsRef<Path>,
    data: &[u8],
    options: WriteFileOptions,
) -> Result<()> {
    with_file(ctx, path.as_ref(), options.open_options(), |file| {
        file.write_all_sync(data)
    })
}

pub async fn write_file(
    ctx: &Context,
    path: impl AsRef<Path>,
    data: &[u8],
    options: WriteFileOptions,
) -> Result<()> {
    write_file_sync(ctx, path, data, options)
}

pub fn write_text_file_sync(
    ctx: &Context,
    path: impl AsRef<Path>,
    text: &str,
    options: WriteFileOptions,
) -> Result<()> {
    write_file_sync(ctx, path, text.as_bytes(), options)
}

pub async fn write_text_file(
    ctx: &Context,
    path: impl AsRef<Path>,
    text: &str,
    options: WriteFileOptions,
) -> Result<()> {
    write_text_file_sync(ctx, path, text, options)
}

/// Only synthesizes a path; directories are implicit in the store.
pub fn make_temp_dir_sync(ctx: &Context, options: &TempOptions) -> String {
    temp::temp_path(&ctx.config().temp_dir, options)
}

pub async fn make_temp_dir(ctx: &Context, options: &TempOptions) -> String {
    make_temp_dir_sync(ctx, options)
}

/// Synthesizes a path and materializes it as an empty file.
pub fn make_temp_file_sync(ctx: &Context, options: &TempOptions) -> Result<String> {
    let path = temp::temp_path(&ctx.config().temp_dir, options);
    let create_new = OpenOptions::new().write(true).create_new(true).config();
    with_file(ctx, Path::new(&path), create_new, |_| Ok(()))?;
    Ok(path)
}

pub async fn make_temp_file(ctx: &Context, options: &TempOptions) -> Result<String> {
    make_temp_file_sync(ctx, options)
}

pub fn copy_file_sync(ctx: &Context, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    ctx.resources().copy_file(from, to)
}

pub async fn copy_file(ctx: &Context, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    copy_file_sync(ctx, from, to)
}

/// Unlinks `path`. Handles that are still open keep their bytes.
pub fn remove_sync(ctx: &Context, path: impl AsRef<Path>) -> Result<()> {
    Ok(ctx.resources().storage().remove(path.as_ref())?)
}

pub fn rename_sync(ctx: &Context, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    Ok(ctx.resources().storage().rename(from.as_ref(), to.as_ref())?)
}

/// Sets the length of the file at `path`, 0 when `len` is `None`.
pub fn truncate_sync(ctx: &Context, path: impl AsRef<Path>, len: Option<u64>) -> Result<()> {
    let write = OpenOptions::new().write(true).config();
    with_file(ctx, path.as_ref(), write, |file| file.truncate_sync(len))
}
