use super::{deferred, sync};
use crate::context::Context;
use crate::error::{Result, ShimError};
use crate::file::{self, FsFile};
use crate::stdio;
use crate::value::{Args, Value};
use std::sync::Arc;

pub(super) fn resolve(ctx: &Arc<Context>, name: &str) -> Option<Value> {
    let member = match name {
        "open" => deferred(ctx, name, open),
        "openSync" => sync(ctx, name, open),
        "create" => deferred(ctx, name, create),
        "createSync" => sync(ctx, name, create),
        "read" => deferred(ctx, name, read),
        "readSync" => sync(ctx, name, read),
        "write" => deferred(ctx, name, write),
        "writeSync" => sync(ctx, name, write),
        "seek" => deferred(ctx, name, seek),
        "seekSync" => sync(ctx, name, seek),
        "close" => sync(ctx, name, close),
        "File" => sync(ctx, name, file_from_rid),
        "isatty" => sync(ctx, name, isatty),
        "readAll" => deferred(ctx, name, read_all),
        "readAllSync" => sync(ctx, name, read_all),
        "writeAll" => deferred(ctx, name, write_all),
        "writeAllSync" => sync(ctx, name, write_all),
        "copy" => deferred(ctx, name, copy),
        "stdin" => ctx.stdio().stdin.to_value(),
        "stdout" => ctx.stdio().stdout.to_value(),
        "stderr" => ctx.stdio().stderr.to_value(),
        _ => return None,
    };
    Some(member)
}

fn handle(ctx: &Context, args: &Args<'_>) -> Result<FsFile> {
    Ok(FsFile::new(ctx.resources().clone(), args.rid(0)?))
}

fn open(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let options = file::open_options_from(args.opt_object(1, "options")?)?;
    let file = file::open_sync(ctx.resources(), args.string(0, "path")?, options)?;
    Ok(file.to_value())
}

fn create(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let file = file::create_sync(ctx.resources(), args.string(0, "path")?)?;
    Ok(file.to_value())
}

fn read(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    file::read_into(&handle(ctx, args)?, args.bytes(1, "buffer")?)
}

fn write(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    file::write_from(&handle(ctx, args)?, args.bytes(1, "data")?)
}

fn seek(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    file::seek_with(
        &handle(ctx, args)?,
        args.number(1, "offset")?,
        args.number(2, "whence")?,
    )
}

fn close(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    handle(ctx, args)?.close()?;
    Ok(Value::Undefined)
}

/// `File(rid)` wraps an id that is already open.
fn file_from_rid(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let file = handle(ctx, args)?;
    if !ctx.resources().is_open(file.rid()) {
        return Err(ShimError::BadResource(file.rid()));
    }
    Ok(file.to_value())
}

fn isatty(_: &Context, args: &Args<'_>) -> Result<Value> {
    Ok(stdio::isatty(args.rid(0)?).into())
}

fn read_all(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let reader = FsFile::from_value(ctx.resources(), args.get(0))?;
    Ok(reader.read_all_sync()?.into())
}

fn write_all(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let writer = FsFile::from_value(ctx.resources(), args.get(0))?;
    args.bytes(1, "data")?.with(|data| writer.write_all_sync(data))?;
    Ok(Value::Undefined)
}

fn copy(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let src = FsFile::from_value(ctx.resources(), args.get(0))?;
    let dst = FsFile::from_value(ctx.resources(), args.get(1))?;
    Ok(file::copy_sync(&src, &dst)?.into())
}
