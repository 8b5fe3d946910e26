//! The namespace surface contract: which member names exist, what `typeof`
//! each one reports, and whether it is part of the stable or the unstable
//! surface.
//!
//! The table is data, not code. The bundled copy lives in `surface.toml` at
//! the crate root; hosts tracking another runtime release can load their own
//! with [`Surface::from_toml_str`].

use crate::error::{Result, ShimError};
use crate::value::ValueKind;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Deserialize;

const BUNDLED: &str = include_str!("../surface.toml");

static BUNDLED_SURFACE: Lazy<Result<Surface>> = Lazy::new(|| Surface::from_toml_str(BUNDLED));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable,
    Unstable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member<'a> {
    pub name: &'a str,
    pub kind: ValueKind,
    pub stability: Stability,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Surface {
    runtime: String,
    #[serde(default)]
    stable: IndexMap<String, ValueKind>,
    #[serde(default)]
    unstable: IndexMap<String, ValueKind>,
}

impl Surface {
    pub fn bundled() -> Result<&'static Surface> {
        BUNDLED_SURFACE.as_ref().map_err(Clone::clone)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let surface: Self =
            toml::from_str(source).map_err(|err| ShimError::Surface(err.to_string()))?;
        surface.validate()?;
        Ok(surface)
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = self.stable.keys().find(|k| self.unstable.contains_key(*k)) {
            return Err(ShimError::Surface(format!(
                "`{name}` is listed as both stable and unstable"
            )));
        }
        let mut all = self.stable.iter().chain(self.unstable.iter());
        if let Some((name, _)) = all.find(|(_, kind)| **kind == ValueKind::Undefined) {
            return Err(ShimError::Surface(format!("`{name}` cannot be undefined")));
        }
        Ok(())
    }

    /// Release of the runtime this table was taken from.
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn stable(&self) -> impl Iterator<Item = Member<'_>> {
        members(&self.stable, Stability::Stable)
    }

    pub fn unstable(&self) -> impl Iterator<Item = Member<'_>> {
        members(&self.unstable, Stability::Unstable)
    }

    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        self.stable()
            .chain(self.unstable())
            .find(|member| member.name == name)
    }

    pub fn len(&self) -> usize {
        self.stable.len() + self.unstable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn members(
    table: &IndexMap<String, ValueKind>,
    stability: Stability,
) -> impl Iterator<Item = Member<'_>> {
    table.iter().map(move |(name, kind)| Member {
        name,
        kind: *kind,
        stability,
    })
}
