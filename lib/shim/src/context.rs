use crate::config::ShimConfig;
use crate::env::EnvStore;
use crate::error::Result;
use crate::global::Host;
use crate::resources::ResourceTable;
use crate::stdio::Stdio;
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;
use virtual_store::Storage;

/// State shared by every member of one polyfill instance.
#[derive(Debug)]
pub struct Context {
    config: ShimConfig,
    host: Arc<dyn Host>,
    resources: Arc<ResourceTable>,
    env: EnvStore,
    stdio: Stdio,
    umask: Mutex<u32>,
}

impl Context {
    pub fn new(config: ShimConfig, host: Arc<dyn Host>, storage: Arc<dyn Storage>) -> Result<Self> {
        let resources = Arc::new(ResourceTable::new(storage));
        let stdio = Stdio::open(&resources, &config)?;
        Ok(Self {
            env: EnvStore::with_vars(config.env.clone()),
            umask: Mutex::new(config.umask),
            config,
            host,
            resources,
            stdio,
        })
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn resources(&self) -> &Arc<ResourceTable> {
        &self.resources
    }

    pub fn env(&self) -> &EnvStore {
        &self.env
    }

    pub fn stdio(&self) -> &Stdio {
        &self.stdio
    }

    pub fn location(&self) -> Option<Url> {
        self.host.location()
    }

    /// Returns the current mask, replacing it with `mask` when given.
    pub fn umask(&self, mask: Option<u32>) -> u32 {
        let mut current = self.umask.lock();
        match mask {
            Some(mask) => std::mem::replace(&mut *current, mask & 0o777),
            None => *current,
        }
    }

    /// Directory part of the location path, or empty without a location.
    pub fn cwd(&self) -> String {
        let Some(location) = self.location() else {
            return String::new();
        };
        let path = location.path();
        match path.rfind('/') {
            Some(0) | None => "/".to_owned(),
            Some(end) => path[..end].to_owned(),
        }
    }

    pub fn hostname(&self) -> String {
        self.location()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn main_module(&self) -> String {
        self.location().map(String::from).unwrap_or_default()
    }
}
