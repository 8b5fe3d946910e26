//! Namespace construction as an explicit two-phase state machine.
//!
//! ```text
//! Uninit --namespace()--> Stable --augment()--> Augmented
//! ```
//!
//! There is no way back to `Uninit`. Every transition happens under one
//! lock, so concurrent first calls build the namespace once.

use crate::augment;
use crate::builder;
use crate::config::ShimConfig;
use crate::context::Context;
use crate::descriptor::DescriptorMap;
use crate::error::{Result, ShimError};
use crate::global::{DocumentHost, Host};
use crate::namespace::Namespace;
use crate::surface::Surface;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use virtual_store::{MemStore, Storage};

static DEFAULT: Lazy<Polyfill> = Lazy::new(|| Polyfill::new(Arc::new(DocumentHost::new())));

/// The process-wide polyfill, hosted by a document without a location.
pub fn default_polyfill() -> &'static Polyfill {
    &DEFAULT
}

#[derive(Debug, Clone)]
struct Built {
    ctx: Arc<Context>,
    descriptors: DescriptorMap,
    namespace: Arc<Namespace>,
}

impl Built {
    fn new(ctx: Arc<Context>, descriptors: DescriptorMap) -> Self {
        let namespace = Arc::new(Namespace::freeze(descriptors.clone()));
        Self {
            ctx,
            descriptors,
            namespace,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Uninit,
    Stable(Built),
    Augmented(Built),
}

impl Phase {
    fn built(&self) -> Option<&Built> {
        match self {
            Self::Uninit => None,
            Self::Stable(built) | Self::Augmented(built) => Some(built),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Uninit => "uninit",
            Self::Stable(_) => "stable",
            Self::Augmented(_) => "augmented",
        }
    }
}

#[derive(Debug)]
struct State {
    phase: Phase,
    /// Whether this instance bound the namespace into the global scope.
    installed: bool,
}

pub struct Polyfill {
    config: ShimConfig,
    host: Arc<dyn Host>,
    storage: Arc<dyn Storage>,
    surface: Option<Surface>,
    state: Mutex<State>,
}

impl fmt::Debug for Polyfill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Polyfill")
            .field("binding", &self.config.binding)
            .field("phase", &state.phase.name())
            .field("installed", &state.installed)
            .finish()
    }
}

impl Polyfill {
    /// A polyfill over an in-memory store with the default configuration and
    /// the bundled surface table.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            config: ShimConfig::default(),
            host,
            storage: Arc::new(MemStore::new()),
            surface: None,
            state: Mutex::new(State {
                phase: Phase::Uninit,
                installed: false,
            }),
        }
    }

    pub fn with_config(mut self, config: ShimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    fn surface(&self) -> Result<&Surface> {
        match &self.surface {
            Some(surface) => Ok(surface),
            None => Surface::bundled(),
        }
    }

    fn build_stable(&self) -> Result<Built> {
        let ctx = Arc::new(Context::new(
            self.config.clone(),
            self.host.clone(),
            self.storage.clone(),
        )?);
        let descriptors = builder::build_stable(&ctx, self.surface()?)?;
        Ok(Built::new(ctx, descriptors))
    }

    fn ensure_built<'s>(&self, state: &'s mut State) -> Result<&'s Built> {
        if let Phase::Uninit = state.phase {
            state.phase = Phase::Stable(self.build_stable()?);
            debug!(phase = "stable", "namespace constructed");
        }
        state
            .phase
            .built()
            .ok_or_else(|| ShimError::Surface("namespace was not built".to_owned()))
    }

    /// The current namespace, building the stable one on first use. After
    /// augmentation this is the augmented namespace.
    pub fn namespace(&self) -> Result<Arc<Namespace>> {
        let mut state = self.state.lock();
        Ok(self.ensure_built(&mut state)?.namespace.clone())
    }

    /// The shared state behind every member.
    pub fn context(&self) -> Result<Arc<Context>> {
        let mut state = self.state.lock();
        Ok(self.ensure_built(&mut state)?.ctx.clone())
    }

    pub fn is_augmented(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Augmented(_))
    }

    pub fn is_installed(&self) -> bool {
        self.state.lock().installed
    }

    /// Merges the unstable members in. Runs at most once; later calls return
    /// the augmented namespace. When this instance installed the global
    /// binding, the binding is replaced by the augmented namespace. On error
    /// nothing changes.
    pub fn augment(&self) -> Result<Arc<Namespace>> {
        let mut state = self.state.lock();
        let stable = match &state.phase {
            Phase::Augmented(built) => return Ok(built.namespace.clone()),
            Phase::Stable(built) => built.clone(),
            Phase::Uninit => self.build_stable()?,
        };

        let merged = augment::merge_unstable(&stable.ctx, &stable.descriptors, self.surface()?)?;
        let augmented = Built::new(stable.ctx, merged);
        if state.installed {
            self.host
                .global()
                .reinstall(&self.config.binding, augmented.namespace.clone())?;
        }

        let namespace = augmented.namespace.clone();
        debug!(
            phase = "augmented",
            members = augmented.descriptors.len(),
            "namespace augmented"
        );
        state.phase = Phase::Augmented(augmented);
        Ok(namespace)
    }

    /// Binds the namespace globally unless the host already has a binding
    /// under that name. Returns the polyfill namespace either way.
    pub fn init(&self) -> Result<Arc<Namespace>> {
        let mut state = self.state.lock();
        let namespace = self.ensure_built(&mut state)?.namespace.clone();
        if state.installed {
            return Ok(namespace);
        }

        let global = self.host.global();
        let binding = &self.config.binding;
        if global.contains(binding) {
            debug!(binding = %binding, "global namespace already present, not installing");
            return Ok(namespace);
        }
        global.install(binding, namespace.clone())?;
        state.installed = true;
        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueKind};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn polyfill() -> (Arc<DocumentHost>, Polyfill) {
        let host = Arc::new(DocumentHost::new());
        let polyfill = Polyfill::new(host.clone());
        (host, polyfill)
    }

    #[test]
    fn namespace_is_cached() {
        let (_, polyfill) = polyfill();
        let a = polyfill.namespace().unwrap();
        let b = polyfill.namespace().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!polyfill.is_augmented());
        assert_eq!(a.type_of("umask"), ValueKind::Undefined);
    }

    #[test]
    fn augment_supersedes_but_keeps_the_old_object_valid() {
        let (_, polyfill) = polyfill();
        let stable = polyfill.namespace().unwrap();
        let augmented = polyfill.augment().unwrap();

        assert!(!Arc::ptr_eq(&stable, &augmented));
        assert!(Arc::ptr_eq(&polyfill.namespace().unwrap(), &augmented));
        assert_eq!(augmented.type_of("umask"), ValueKind::Function);
        assert_eq!(stable.type_of("umask"), ValueKind::Undefined);
        assert_eq!(stable.get("open"), augmented.get("open"));

        let again = polyfill.augment().unwrap();
        assert!(Arc::ptr_eq(&again, &augmented));
    }

    #[test]
    fn augment_from_uninit_builds_stable_first() {
        let (_, polyfill) = polyfill();
        let augmented = polyfill.augment().unwrap();
        assert!(augmented.contains("open") && augmented.contains("umask"));
    }

    #[test]
    fn concurrent_first_calls_build_once() {
        let (_, polyfill) = polyfill();
        let (stable, augmented): (Vec<_>, Vec<_>) = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let polyfill = &polyfill;
                    scope.spawn(move || {
                        if i % 2 == 0 {
                            polyfill.namespace().unwrap()
                        } else {
                            polyfill.augment().unwrap()
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .partition(|ns| !ns.contains("umask"))
        });

        let current = polyfill.namespace().unwrap();
        assert!(augmented.len() >= 4);
        for ns in &augmented {
            assert!(Arc::ptr_eq(ns, &current));
        }
        for pair in stable.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }

        let rids: Vec<_> = polyfill
            .context()
            .unwrap()
            .resources()
            .resources()
            .into_keys()
            .collect();
        assert_eq!(rids, vec![1, 2, 3], "stdio opened once");
    }

    #[test]
    fn members_share_one_context() {
        let (_, polyfill) = polyfill();
        let ns = polyfill.augment().unwrap();
        ns.call("writeTextFileSync", &[Value::from("/shared"), Value::from("x")])
            .unwrap();
        let ctx = polyfill.context().unwrap();
        assert!(ctx.resources().storage().exists(std::path::Path::new("/shared")));
    }

    #[test]
    #[traced_test]
    fn init_installs_and_augment_reinstalls() {
        let (host, polyfill) = polyfill();
        let stable = polyfill.init().unwrap();
        assert!(polyfill.is_installed());
        assert!(Arc::ptr_eq(&host.global().namespace("Deno").unwrap(), &stable));
        assert!(logs_contain("installed namespace"));

        let augmented = polyfill.augment().unwrap();
        assert!(Arc::ptr_eq(&host.global().namespace("Deno").unwrap(), &augmented));
        assert!(logs_contain("reinstalled namespace"));
        assert_eq!(
            host.global().attributes("Deno").map(|a| a.configurable),
            Some(false)
        );

        assert!(Arc::ptr_eq(&polyfill.init().unwrap(), &augmented));
    }

    #[test]
    fn init_leaves_a_native_namespace_alone() {
        let (host, polyfill) = polyfill();
        host.global().define("Deno", Value::Null).unwrap();
        polyfill.init().unwrap();
        assert!(!polyfill.is_installed());
        assert!(host.global().namespace("Deno").is_none());

        polyfill.augment().unwrap();
        assert!(host.global().namespace("Deno").is_none());
    }

    #[test]
    fn failed_augmentation_changes_nothing() {
        let surface = Surface::from_toml_str(
            r#"
            runtime = "test"
            [stable]
            pid = "number"
            [unstable]
            somethingNew = "string"
            "#,
        )
        .unwrap();
        let polyfill = Polyfill::new(Arc::new(DocumentHost::new())).with_surface(surface);
        let stable = polyfill.namespace().unwrap();
        assert!(matches!(polyfill.augment(), Err(ShimError::Surface(_))));
        assert!(!polyfill.is_augmented());
        assert!(Arc::ptr_eq(&polyfill.namespace().unwrap(), &stable));
    }

    #[test]
    fn custom_binding_name() {
        let host = Arc::new(DocumentHost::new());
        let config = ShimConfig {
            binding: "Runtime".to_owned(),
            ..ShimConfig::default()
        };
        let polyfill = Polyfill::new(host.clone()).with_config(config);
        polyfill.init().unwrap();
        assert!(host.global().contains("Runtime"));
        assert!(!host.global().contains("Deno"));
    }

    #[test]
    fn default_instance_is_shared() {
        let a = default_polyfill().namespace().unwrap();
        let b = default_polyfill().namespace().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
