//! An in-process emulation of the Deno runtime namespace for hosts that do
//! not provide one.
//!
//! A [`Polyfill`] builds a frozen [`Namespace`] whose member names, `typeof`
//! kinds and property descriptors follow a versioned [`Surface`] table. File
//! members are backed by a [`ResourceTable`] over a [`virtual_store::Storage`];
//! unstable members are merged in by [`Polyfill::augment`].
//!
//! ```
//! use deno_shim::{DocumentHost, Polyfill, Value};
//! use std::sync::Arc;
//!
//! let polyfill = Polyfill::new(Arc::new(DocumentHost::new()));
//! let deno = polyfill.init().unwrap();
//! deno.call("writeTextFileSync", &[Value::from("/hello.txt"), Value::from("hi")])
//!     .unwrap();
//! let text = deno.call("readTextFileSync", &[Value::from("/hello.txt")]).unwrap();
//! assert_eq!(text, Value::from("hi"));
//! ```

pub mod augment;
pub mod builder;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod file;
pub mod fs;
pub mod global;
mod members;
pub mod namespace;
pub mod polyfill;
pub mod resources;
pub mod stdio;
pub mod surface;
pub mod temp;
pub mod value;

pub use crate::config::ShimConfig;
pub use crate::context::Context;
pub use crate::descriptor::{DescriptorMap, PropertyDescriptor};
pub use crate::env::EnvStore;
pub use crate::error::{Result, ShimError};
pub use crate::file::FsFile;
pub use crate::global::{Bound, DocumentHost, GlobalScope, Host};
pub use crate::namespace::Namespace;
pub use crate::polyfill::{default_polyfill, Polyfill};
pub use crate::resources::{ResourceTable, Rid, SeekMode};
pub use crate::surface::{Stability, Surface};
pub use crate::value::{Args, Function, Object, SharedBytes, Value, ValueKind};
