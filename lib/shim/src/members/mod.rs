//! Member implementations, looked up by their namespace name.
//!
//! The surface table decides which names exist; this module only knows how
//! to build a value for a name. Anything it does not know is left to the
//! builders.

use crate::context::Context;
use crate::error::{Result, ShimError};
use crate::value::{Args, Function, Value};
use std::sync::Arc;

mod fs;
mod io;
mod runtime;
pub(crate) mod stubs;
mod unstable;

type Op = fn(&Context, &Args<'_>) -> Result<Value>;

/// The implementation of `name`, if this crate has one.
pub(crate) fn resolve(ctx: &Arc<Context>, name: &str) -> Option<Value> {
    io::resolve(ctx, name)
        .or_else(|| fs::resolve(ctx, name))
        .or_else(|| runtime::resolve(ctx, name))
        .or_else(|| unstable::resolve(ctx, name))
        .or_else(|| stubs::resolve(name))
}

fn sync(ctx: &Arc<Context>, name: &str, op: Op) -> Value {
    let ctx = ctx.clone();
    Function::sync(name.to_owned(), move |args| op(&ctx, args)).into()
}

fn deferred(ctx: &Arc<Context>, name: &str, op: Op) -> Value {
    let ctx = ctx.clone();
    Function::deferred(name.to_owned(), move |args| op(&ctx, args)).into()
}

fn noop(_: &Context, _: &Args<'_>) -> Result<Value> {
    Ok(Value::Undefined)
}

/// Converts an optional length argument to a byte count.
fn opt_len(args: &Args<'_>, index: usize) -> Result<Option<u64>> {
    match args.opt_number(index, "len")? {
        None => Ok(None),
        Some(len) if len >= 0.0 && len.fract() == 0.0 && len.is_finite() => Ok(Some(len as u64)),
        Some(len) => Err(ShimError::TypeError(format!("{len} is not a valid length"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::context::tests::context;

    pub(crate) fn member(ctx: &Arc<Context>, name: &str) -> Function {
        resolve(ctx, name)
            .and_then(|value| value.as_function().cloned())
            .unwrap_or_else(|| panic!("`{name}` has no function implementation"))
    }

    pub(crate) fn shared_context() -> Arc<Context> {
        Arc::new(context())
    }

    #[test]
    fn unknown_names_have_no_implementation() {
        assert!(resolve(&shared_context(), "definitelyNotAMember").is_none());
    }

    #[test]
    fn lengths() {
        let values = [Value::Number(3.0), Value::Number(-1.0), Value::Number(0.5)];
        let args = Args::new(&values);
        assert_eq!(opt_len(&args, 0), Ok(Some(3)));
        assert!(opt_len(&args, 1).is_err());
        assert!(opt_len(&args, 2).is_err());
        assert_eq!(opt_len(&args, 3), Ok(None));
    }
}
