use crate::error::ShimError;
use crate::value::{Function, Value};
use std::borrow::Cow;

/// Members that exist only so the surface is complete. Each one fails when
/// called.
const NOT_IMPLEMENTED: &[&str] = &[
    "test",
    "exit",
    "execPath",
    "chdir",
    "mkdir",
    "mkdirSync",
    "readDir",
    "readDirSync",
    "stat",
    "statSync",
    "lstat",
    "lstatSync",
    "fstat",
    "fstatSync",
    "realPath",
    "realPathSync",
    "readLink",
    "readLinkSync",
    "watchFs",
    "run",
    "Process",
    "listen",
    "connect",
    "listenTls",
    "connectTls",
    "iter",
    "iterSync",
    "Buffer",
    "signal",
    "SignalStream",
    "Permissions",
    "PermissionStatus",
    "shutdown",
    "listenDatagram",
    "startTls",
    "kill",
    "loadavg",
    "osRelease",
    "consoleSize",
    "systemMemoryInfo",
    "openPlugin",
    "transpileOnly",
    "compile",
    "bundle",
    "applySourceMap",
    "formatDiagnostics",
];

/// A function named `name` that fails with not-implemented, reporting
/// `label`.
pub(crate) fn not_implemented(
    label: impl Into<String>,
    name: impl Into<Cow<'static, str>>,
) -> Function {
    let label = label.into();
    Function::sync(name, move |_| Err(ShimError::NotImplemented(label.clone())))
}

pub(super) fn resolve(name: &str) -> Option<Value> {
    NOT_IMPLEMENTED
        .contains(&name)
        .then(|| not_implemented(name, name.to_owned()).into())
}
