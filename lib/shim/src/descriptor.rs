use crate::error::{Result, ShimError};
use crate::value::Value;
use indexmap::IndexMap;

/// A data property descriptor.
///
/// Namespace members are only ever created through [`frozen`](Self::frozen),
/// so every member reads `{writable: false, enumerable: true,
/// configurable: false}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    value: Value,
    writable: bool,
    enumerable: bool,
    configurable: bool,
}

impl PropertyDescriptor {
    pub fn frozen(value: Value) -> Self {
        Self {
            value,
            writable: false,
            enumerable: true,
            configurable: false,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    pub fn is_configurable(&self) -> bool {
        self.configurable
    }
}

/// Member name to descriptor, in definition order.
#[derive(Debug, Clone, Default)]
pub struct DescriptorMap {
    entries: IndexMap<String, PropertyDescriptor>,
}

impl DescriptorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ShimError::Surface(format!("`{name}` is defined twice")));
        }
        self.entries.insert(name, PropertyDescriptor::frozen(value));
        Ok(())
    }

    /// Adds every entry of `other`. Existing members are never replaced: any
    /// collision fails the whole merge and leaves `self` untouched.
    pub fn merge(&mut self, other: DescriptorMap) -> Result<()> {
        if let Some(name) = other.entries.keys().find(|k| self.entries.contains_key(*k)) {
            return Err(ShimError::Surface(format!(
                "`{name}` is already part of the namespace"
            )));
        }
        self.entries.extend(other.entries);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_is_additive() {
        let mut base = DescriptorMap::new();
        base.define("pid", Value::from(0u32)).unwrap();

        let mut extra = DescriptorMap::new();
        extra.define("hostname", Value::from("")).unwrap();
        base.merge(extra).unwrap();

        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["pid", "hostname"]);
        let pid = base.get("pid").unwrap();
        assert!(!pid.is_writable());
        assert!(pid.is_enumerable());
        assert!(!pid.is_configurable());
    }

    #[test]
    fn merge_rejects_collisions_atomically() {
        let mut base = DescriptorMap::new();
        base.define("pid", Value::from(0u32)).unwrap();

        let mut extra = DescriptorMap::new();
        extra.define("umask", Value::from(0u32)).unwrap();
        extra.define("pid", Value::from(7u32)).unwrap();

        assert!(matches!(base.merge(extra), Err(ShimError::Surface(_))));
        assert_eq!(base.len(), 1);
        assert_eq!(base.get("pid").unwrap().value(), &Value::Number(0.0));
    }

    #[test]
    fn define_twice_fails() {
        let mut map = DescriptorMap::new();
        map.define("cwd", Value::from("")).unwrap();
        assert!(map.define("cwd", Value::from("/")).is_err());
    }
}
