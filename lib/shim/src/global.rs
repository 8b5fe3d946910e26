//! The host side: where the polyfill runs and the global scope it binds into.

use crate::error::{Result, ShimError};
use crate::namespace::Namespace;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// The environment a polyfill instance is hosted in.
pub trait Host: fmt::Debug + Send + Sync {
    /// Location of the hosting document, when there is one.
    fn location(&self) -> Option<Url> {
        None
    }

    fn global(&self) -> &GlobalScope;
}

/// A document-like host with an optional location and its own global scope.
#[derive(Debug, Default)]
pub struct DocumentHost {
    location: Option<Url>,
    global: GlobalScope,
}

impl DocumentHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: Url) -> Self {
        Self {
            location: Some(location),
            global: GlobalScope::default(),
        }
    }

    pub fn parse(location: &str) -> Result<Self> {
        let location = Url::parse(location)
            .map_err(|err| ShimError::Config(format!("invalid location {location:?}: {err}")))?;
        Ok(Self::with_location(location))
    }
}

impl Host for DocumentHost {
    fn location(&self) -> Option<Url> {
        self.location.clone()
    }

    fn global(&self) -> &GlobalScope {
        &self.global
    }
}

/// What a global binding refers to.
#[derive(Debug, Clone)]
pub enum Bound {
    /// A namespace installed by a polyfill.
    Polyfill(Arc<Namespace>),
    /// Anything the host defined itself, such as a real runtime namespace.
    Native(Value),
}

impl Bound {
    pub fn as_polyfill(&self) -> Option<&Arc<Namespace>> {
        match self {
            Self::Polyfill(namespace) => Some(namespace),
            Self::Native(_) => None,
        }
    }
}

/// Attributes of a global binding. Bindings are never writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Debug, Clone)]
struct Binding {
    target: Bound,
    configurable: bool,
}

#[derive(Debug, Default)]
pub struct GlobalScope {
    bindings: RwLock<IndexMap<String, Binding>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `namespace` under `name`. The binding is read-only and can be
    /// reinstalled exactly once.
    pub fn install(&self, name: &str, namespace: Arc<Namespace>) -> Result<()> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(name) {
            return Err(ShimError::AlreadyInstalled(name.to_owned()));
        }
        bindings.insert(
            name.to_owned(),
            Binding {
                target: Bound::Polyfill(namespace),
                configurable: true,
            },
        );
        debug!(binding = name, "installed namespace");
        Ok(())
    }

    /// Replaces a binding made by [`install`](Self::install) and locks it.
    pub fn reinstall(&self, name: &str, namespace: Arc<Namespace>) -> Result<()> {
        let mut bindings = self.bindings.write();
        match bindings.get_mut(name) {
            Some(binding) if binding.configurable => {
                binding.target = Bound::Polyfill(namespace);
                binding.configurable = false;
                debug!(binding = name, "reinstalled namespace");
                Ok(())
            }
            _ => Err(ShimError::NotInstalled(name.to_owned())),
        }
    }

    /// Defines a non-configurable binding owned by the host.
    pub fn define(&self, name: &str, value: Value) -> Result<()> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(name) {
            return Err(ShimError::AlreadyInstalled(name.to_owned()));
        }
        bindings.insert(
            name.to_owned(),
            Binding {
                target: Bound::Native(value),
                configurable: false,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Bound> {
        self.bindings.read().get(name).map(|b| b.target.clone())
    }

    /// The polyfill namespace bound under `name`, if that is what is bound.
    pub fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.get(name)
            .and_then(|bound| bound.as_polyfill().cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
    }

    pub fn attributes(&self, name: &str) -> Option<BindingAttributes> {
        self.bindings.read().get(name).map(|b| BindingAttributes {
            writable: false,
            enumerable: true,
            configurable: b.configurable,
        })
    }
}
