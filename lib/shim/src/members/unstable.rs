use super::{deferred, noop, opt_len, sync};
use super::stubs::not_implemented;
use crate::context::Context;
use crate::error::{Result, ShimError};
use crate::value::{Args, Object, Value};
use std::sync::Arc;

/// Linux signal numbers.
const SIGNALS: [(&str, u32); 31] = [
    ("SIGHUP", 1),
    ("SIGINT", 2),
    ("SIGQUIT", 3),
    ("SIGILL", 4),
    ("SIGTRAP", 5),
    ("SIGABRT", 6),
    ("SIGBUS", 7),
    ("SIGFPE", 8),
    ("SIGKILL", 9),
    ("SIGUSR1", 10),
    ("SIGSEGV", 11),
    ("SIGUSR2", 12),
    ("SIGPIPE", 13),
    ("SIGALRM", 14),
    ("SIGTERM", 15),
    ("SIGSTKFLT", 16),
    ("SIGCHLD", 17),
    ("SIGCONT", 18),
    ("SIGSTOP", 19),
    ("SIGTSTP", 20),
    ("SIGTTIN", 21),
    ("SIGTTOU", 22),
    ("SIGURG", 23),
    ("SIGXCPU", 24),
    ("SIGXFSZ", 25),
    ("SIGVTALRM", 26),
    ("SIGPROF", 27),
    ("SIGWINCH", 28),
    ("SIGIO", 29),
    ("SIGPWR", 30),
    ("SIGSYS", 31),
];

const SIGNAL_STREAMS: [&str; 11] = [
    "alarm",
    "child",
    "hungup",
    "interrupt",
    "io",
    "pipe",
    "quit",
    "terminate",
    "userDefined1",
    "userDefined2",
    "windowChange",
];

pub(super) fn resolve(ctx: &Arc<Context>, name: &str) -> Option<Value> {
    let member = match name {
        "umask" => sync(ctx, name, umask),
        "hostname" => sync(ctx, name, hostname),
        "mainModule" => ctx.main_module().into(),
        "ftruncate" => deferred(ctx, name, ftruncate),
        "ftruncateSync" => sync(ctx, name, ftruncate),
        "fsync" | "fdatasync" => deferred(ctx, name, sync_rid),
        "fsyncSync" | "fdatasyncSync" => sync(ctx, name, sync_rid),
        // Links, times and raw mode have no observable effect on the store.
        "link" | "symlink" | "utime" => deferred(ctx, name, noop),
        "linkSync" | "symlinkSync" | "utimeSync" | "setRaw" => sync(ctx, name, noop),
        "Signal" => numbered(SIGNALS.into_iter()),
        "ShutdownMode" => numbered([("Read", 0), ("Write", 1), ("ReadWrite", 2)].into_iter()),
        "DiagnosticCategory" => numbered(
            [
                ("Log", 0),
                ("Debug", 1),
                ("Info", 2),
                ("Error", 3),
                ("Warning", 4),
                ("Suggestion", 5),
            ]
            .into_iter(),
        ),
        "permissions" => ["query", "request", "revoke"]
            .into_iter()
            .fold(Object::builder().class("Permissions"), |b, method| {
                b.method(not_implemented(format!("permissions.{method}"), method))
            })
            .into_value(),
        "signals" => SIGNAL_STREAMS
            .into_iter()
            .fold(Object::builder(), |b, stream| {
                b.method(not_implemented(format!("signals.{stream}"), stream))
            })
            .into_value(),
        _ => return None,
    };
    Some(member)
}

fn numbered(entries: impl Iterator<Item = (&'static str, u32)>) -> Value {
    entries
        .fold(Object::builder(), |b, (key, n)| b.property(key, n))
        .into_value()
}

/// `umask(mask?)` returns the previous mask.
fn umask(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let mask = match args.opt_number(0, "mask")? {
        None => None,
        Some(mask) if (0.0..=f64::from(u32::MAX)).contains(&mask) && mask.fract() == 0.0 => {
            Some(mask as u32)
        }
        Some(mask) => return Err(ShimError::TypeError(format!("{mask} is not a valid mask"))),
    };
    Ok(ctx.umask(mask).into())
}

fn hostname(ctx: &Context, _: &Args<'_>) -> Result<Value> {
    Ok(ctx.hostname().into())
}

fn ftruncate(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    ctx.resources().truncate(args.rid(0)?, opt_len(args, 1)?)?;
    Ok(Value::Undefined)
}

/// Nothing is buffered, so syncing only checks the id.
fn sync_rid(ctx: &Context, args: &Args<'_>) -> Result<Value> {
    let rid = args.rid(0)?;
    if !ctx.resources().is_open(rid) {
        return Err(ShimError::BadResource(rid));
    }
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_with;
    use crate::global::DocumentHost;
    use crate::members::tests::{member, shared_context};
    use pretty_assertions::assert_eq;

    #[test]
    fn umask_holds_a_mask() {
        let ctx = shared_context();
        let umask = member(&ctx, "umask");
        assert_eq!(umask.call(&[]), Ok(Value::Number(f64::from(0o022))));
        assert_eq!(
            umask.call(&[Value::Number(f64::from(0o077))]),
            Ok(Value::Number(f64::from(0o022)))
        );
        assert_eq!(umask.call(&[]), Ok(Value::Number(f64::from(0o077))));
        assert!(umask.call(&[Value::Number(-1.0)]).is_err());
    }

    #[test]
    fn location_members() {
        let ctx = Arc::new(context_with(
            DocumentHost::parse("https://deno.land/std/main.ts").unwrap(),
        ));
        assert_eq!(member(&ctx, "hostname").call(&[]), Ok(Value::from("deno.land")));
        assert_eq!(
            resolve(&ctx, "mainModule"),
            Some(Value::from("https://deno.land/std/main.ts"))
        );
    }

    #[test]
    fn sync_and_ftruncate_check_the_rid() {
        let ctx = shared_context();
        let stdout = Value::Number(2.0);
        assert_eq!(member(&ctx, "fsyncSync").call(&[stdout.clone()]), Ok(Value::Undefined));
        assert_eq!(
            member(&ctx, "fdatasyncSync").call(&[Value::Number(99.0)]),
            Err(ShimError::BadResource(99))
        );
        assert_eq!(
            member(&ctx, "ftruncateSync").call(&[Value::Number(99.0)]),
            Err(ShimError::BadResource(99))
        );
        assert_eq!(member(&ctx, "ftruncateSync").call(&[stdout]), Ok(Value::Undefined));
    }

    #[test]
    fn signal_numbers_and_stub_objects() {
        let ctx = shared_context();
        let signal = resolve(&ctx, "Signal").unwrap();
        assert_eq!(
            signal.as_object().and_then(|o| o.get("SIGTERM")),
            Some(&Value::Number(15.0))
        );

        let permissions = resolve(&ctx, "permissions").unwrap();
        let query = permissions
            .as_object()
            .and_then(|o| o.get("query"))
            .and_then(Value::as_function)
            .unwrap();
        assert_eq!(
            query.call(&[]),
            Err(ShimError::NotImplemented("permissions.query".to_owned()))
        );
    }
}
