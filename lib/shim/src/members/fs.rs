use super::{deferred, noop, opt_len, sync};
use crate::context::Context;
use crate::error::Result;
use crate::fs::{self, WriteFileOptions};
use crate::temp::TempOptions;
use crate::value::{Args, Value};
use std::sync::Arc;

pub(super) fn resolve(ctx: &Arc<Context>, name: &str) -> Option<Value> {
    let member = match name {
        "makeTempDir" => deferred(ctx, name, make_temp_dir),
        "makeTempDirSync" => sync(ctx, name, make_temp_dir),
        "makeTempFile" => deferred(ctx, name, make_temp_file),
        "makeTempFileSync" => sync(ctx, name, make_temp_file),
        "readFile" => deferred(ctx, name, read_file),
        "readFileSync" => sync(ctx, name, read_file),
        "readTextFile" => deferred(ctx, name, read_text_file),
        "readTextFileSync" => sync(ctx, name, read_text_file),
        "writeFile" => deferred(ctx, name, write_file),
        "writeFileSync" => sync(ctx, name, write_file),
        "writeTextFile" => deferred(ctx, name, write_text_file),
        "writeTextFileSync" => sync(ctx, name, write_text_file),
        "copyFile" => deferred(ctx, name, copy_file),
        "copyFileSync" => sync(ctx, name, copy_file),
        "remove" => deferred(ctx, name, remove),
        "removeSync" => sync(ctx, name, remove),
        "rename" => deferred(ctx, name, rename),
        "renameSync" => sync(ctx, name, rename),
        "truncate" => deferred(ctx, name, truncate),
        "truncateSync" => sync(ctx, name, truncate),
        // Modes and owners are not modelled by the store.
        "chmod" | "chown" => deferred(ctx, name, noop),
        "chmodSync" | "chownSync" => sync(ctx, name, noop),
        _ => return None,
    };
    Some(member)
}

fn make_temp_dir(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let options = TempOptions::from_object(args.opt_object(0, "options")?)?;
    Ok(fs::make_temp_dir_sync(ctx, &options).into())
}

fn make_temp_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let options = TempOptions::from_object(args.opt_object(0, "options")?)?;
    Ok(fs::make_temp_file_sync(ctx, &options)?.into())
}

fn read_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    Ok(fs::read_file_sync(ctx, args.string(0, "path")?)?.into())
}

fn read_text_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    Ok(fs::read_text_file_sync(ctx, args.string(0, "path")?)?.into())
}

fn write_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let path = args.string(0, "path")?;
    let options = WriteFileOptions::from_object(args.opt_object(2, "options")?)?;
    args.bytes(1, "data")?
        .with(|data| fs::write_file_sync(ctx, path, data, options))?;
    Ok(Value::Undefined)
}

fn write_text_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let options = WriteFileOptions::from_object(args.opt_object(2, "options")?)?;
    fs::write_text_file_sync(ctx, args.string(0, "path")?, args.string(1, "text")?, options)?;
    Ok(Value::Undefined)
}

fn copy_file(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    fs::copy_file_sync(ctx, args.string(0, "from")?, args.string(1, "to")?)?;
    Ok(Value::Undefined)
}

fn remove(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    fs::remove_sync(ctx, args.string(0, "path")?)?;
    Ok(Value::Undefined)
}

fn rename(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    fs::rename_sync(ctx, args.string(0, "oldpath")?, args.string(1, "newpath")?)?;
    Ok(Value::Undefined)
}

fn truncate(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    fs::truncate_sync(ctx, args.string(0, "path")?, opt_len(args, 1)?)?;
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use crate::error::ShimError;
    use crate::members::tests::{member, shared_context};
    use crate::value::{Object, Value};
    use pretty_assertions::assert_eq;
    use virtual_store::FsError;

    #[tokio::test]
    async fn text_round_trip_through_members() {
        let ctx = shared_context();
        for text in ["hello world!", ""] {
            let path = member(&ctx, "makeTempFile").invoke(vec![]).await.unwrap();
            member(&ctx, "writeTextFile")
                .invoke(vec![path.clone(), Value::from(text)])
                .await
                .unwrap();
            assert_eq!(
                member(&ctx, "readTextFile").invoke(vec![path]).await,
                Ok(Value::from(text))
            );
        }
    }

    #[test]
    fn binary_append() {
        let ctx = shared_context();
        let path = Value::from("/bin.dat");
        let write = member(&ctx, "writeFileSync");
        write.call(&[path.clone(), Value::from(vec![1u8, 2])]).unwrap();
        let append = Object::builder().property("append", true).build();
        write
            .call(&[path.clone(), Value::from(vec![3u8]), append.into()])
            .unwrap();

        let bytes = member(&ctx, "readFileSync").call(&[path]).unwrap();
        assert_eq!(bytes.as_bytes().map(|b| b.to_vec()), Some(vec![1, 2, 3]));
    }

    #[test]
    fn temp_options_are_honoured() {
        let ctx = shared_context();
        let options = Object::builder()
            .property("dir", "/scratch")
            .property("suffix", ".log")
            .build();
        let path = member(&ctx, "makeTempDirSync").call(&[options.into()]).unwrap();
        let path = path.as_str().unwrap();
        assert!(path.starts_with("/scratch/") && path.ends_with(".log"), "{path}");
    }

    #[test]
    fn path_members() {
        let ctx = shared_context();
        member(&ctx, "writeTextFileSync")
            .call(&[Value::from("/p"), Value::from("abcdef")])
            .unwrap();
        member(&ctx, "truncateSync")
            .call(&[Value::from("/p"), Value::Number(3.0)])
            .unwrap();
        member(&ctx, "copyFileSync")
            .call(&[Value::from("/p"), Value::from("/q")])
            .unwrap();
        member(&ctx, "renameSync")
            .call(&[Value::from("/q"), Value::from("/r")])
            .unwrap();
        member(&ctx, "chmodSync")
            .call(&[Value::from("/r"), Value::Number(0o644 as f64)])
            .unwrap();
        assert_eq!(
            member(&ctx, "readTextFileSync").call(&[Value::from("/r")]),
            Ok(Value::from("abc"))
        );

        member(&ctx, "removeSync").call(&[Value::from("/r")]).unwrap();
        let missing = member(&ctx, "readTextFileSync").call(&[Value::from("/r")]);
        assert_eq!(missing, Err(ShimError::Fs(FsError::EntityNotFound)));
        assert_eq!(missing.unwrap_err().class(), "NotFound");
    }
}
