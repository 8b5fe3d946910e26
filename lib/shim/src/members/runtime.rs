use super::sync;
use crate::context::Context;
use crate::error::{Result, ShimError};
use crate::resources::SeekMode;
use crate::value::{Args, Function, Object, Value};
use std::sync::Arc;

/// Counters reported by `metrics()`; nothing is dispatched, so they stay 0.
const METRICS: [&str; 11] = [
    "opsDispatched",
    "opsDispatchedSync",
    "opsDispatchedAsync",
    "opsDispatchedAsyncUnref",
    "opsCompleted",
    "opsCompletedSync",
    "opsCompletedAsync",
    "opsCompletedAsyncUnref",
    "bytesSentControl",
    "bytesSentData",
    "bytesReceived",
];

const ERROR_CLASSES: [&str; 18] = [
    "NotFound",
    "PermissionDenied",
    "ConnectionRefused",
    "ConnectionReset",
    "ConnectionAborted",
    "NotConnected",
    "AddrInUse",
    "AddrNotAvailable",
    "BrokenPipe",
    "AlreadyExists",
    "InvalidData",
    "TimedOut",
    "Interrupted",
    "WriteZero",
    "UnexpectedEof",
    "BadResource",
    "Http",
    "Busy",
];

pub(super) fn resolve(ctx: &Arc<Context>, name: &str) -> Option<Value> {
    let config = ctx.config();
    let member = match name {
        "pid" => Value::Number(0.0),
        "noColor" => Value::Bool(true),
        "build" => Object::builder()
            .property("target", config.build.target.as_str())
            .property("arch", config.build.arch.as_str())
            .property("os", config.build.os.as_str())
            .property("vendor", config.build.vendor.as_str())
            .into_value(),
        "version" => Object::builder()
            .property("deno", config.version.deno.as_str())
            .property("v8", config.version.v8.as_str())
            .property("typescript", config.version.typescript.as_str())
            .into_value(),
        "args" => array(config.args.iter().map(|arg| Value::from(arg.as_str()))),
        "env" => ctx.env().to_value(),
        "cwd" => sync(ctx, name, cwd),
        "metrics" => sync(ctx, name, metrics),
        "resources" => sync(ctx, name, resources),
        "inspect" => sync(ctx, name, inspect),
        "errors" => errors(),
        "SeekMode" => Object::builder()
            .property("Start", SeekMode::Start as u32)
            .property("Current", SeekMode::Current as u32)
            .property("End", SeekMode::End as u32)
            .into_value(),
        "customInspect" => Value::symbol("Deno.customInspect"),
        _ => return None,
    };
    Some(member)
}

/// An array-like object: index keys plus `length`.
fn array(items: impl Iterator<Item = Value>) -> Value {
    let (builder, len) = items.fold((Object::builder().class("Array"), 0usize), |(b, i), item| {
        (b.property(i.to_string(), item), i + 1)
    });
    builder.property("length", len).into_value()
}

fn cwd(ctx: &Context, _: &Args<'_>) -> Result<Value> {
    Ok(ctx.cwd().into())
}

fn metrics(_: &Context, _: &Args<'_>) -> Result<Value> {
    Ok(METRICS
        .into_iter()
        .fold(Object::builder(), |builder, counter| builder.property(counter, 0u32))
        .into_value())
}

fn resources(ctx: &Context, _: &Args<'_>) -> Result<Value> {
    Ok(ctx
        .resources()
        .resources()
        .into_iter()
        .fold(Object::builder(), |builder, (rid, label)| {
            builder.property(rid.to_string(), label)
        })
        .into_value())
}

fn inspect(_: &Context, args: &Args<'_>) -> Result<Value> {
    Ok(args.get(0).to_string().into())
}

/// `errors.X(message)` produces an error value of class `X`.
fn errors() -> Value {
    ERROR_CLASSES
        .into_iter()
        .fold(Object::builder(), |builder, class| {
            builder.method(Function::sync(class, move |args| {
                let message = args.opt_string(0, "message")?.unwrap_or_default();
                Ok(Value::Error(ShimError::Thrown {
                    class: class.to_owned(),
                    message: message.to_owned(),
                }))
            }))
        })
        .into_value()
}
