use crate::error::{Result, ShimError};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Host-level settings for a polyfill instance.
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ShimConfig {
    /// Name the namespace is bound under in the global scope.
    pub binding: String,
    /// Directory used by the temp-path helpers when the caller gives none.
    pub temp_dir: String,
    pub stdin_path: String,
    pub stdout_path: String,
    pub stderr_path: String,
    /// Initial value of the emulated file-mode creation mask.
    pub umask: u32,
    pub args: Vec<String>,
    /// Entries the environment store starts with.
    pub env: BTreeMap<String, String>,
    pub version: VersionInfo,
    pub build: BuildInfo,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            binding: "Deno".to_owned(),
            temp_dir: "/tmp".to_owned(),
            stdin_path: "/dev/stdin".to_owned(),
            stdout_path: "/dev/stdout".to_owned(),
            stderr_path: "/dev/stderr".to_owned(),
            umask: 0o022,
            args: Vec::new(),
            env: BTreeMap::new(),
            version: VersionInfo::default(),
            build: BuildInfo::default(),
        }
    }
}

impl ShimConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| ShimError::Config(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionInfo {
    pub deno: String,
    pub v8: String,
    pub typescript: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            deno: "1.2.0".to_owned(),
            v8: "8.5.216".to_owned(),
            typescript: "3.9.2".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildInfo {
    pub target: String,
    pub arch: String,
    pub os: String,
    pub vendor: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            target: "x86_64-unknown-linux-gnu".to_owned(),
            arch: "x86_64".to_owned(),
            os: "linux".to_owned(),
            vendor: "unknown".to_owned(),
        }
    }
}
