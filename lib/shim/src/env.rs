use crate::error::{Result, ShimError};
use crate::value::{Function, Object, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Environment variables private to one polyfill instance.
#[derive(Debug, Clone, Default)]
pub struct EnvStore {
    vars: Arc<RwLock<BTreeMap<String, String>>>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars: Arc::new(RwLock::new(vars)),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains(['=', '\0']) {
            return Err(ShimError::InvalidArgs(format!(
                "invalid environment variable name: {key:?}"
            )));
        }
        if value.contains('\0') {
            return Err(ShimError::InvalidArgs(format!(
                "invalid value for environment variable {key:?}"
            )));
        }
        self.vars.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.vars.write().remove(key).is_some()
    }

    /// A detached copy of every entry.
    pub fn to_object(&self) -> BTreeMap<String, String> {
        self.vars.read().clone()
    }

    /// The script-facing `env` object.
    pub fn to_value(&self) -> Value {
        let get = self.clone();
        let set = self.clone();
        let delete = self.clone();
        let snapshot = self.clone();

        Object::builder()
            .method(Function::sync("get", move |args| {
                Ok(get
                    .get(args.string(0, "key")?)
                    .map_or(Value::Undefined, Value::from))
            }))
            .method(Function::sync("set", move |args| {
                set.set(args.string(0, "key")?, args.string(1, "value")?)?;
                Ok(Value::Undefined)
            }))
            .method(Function::sync("delete", move |args| {
                delete.delete(args.string(0, "key")?);
                Ok(Value::Undefined)
            }))
            .method(Function::sync("toObject", move |_| {
                let object = snapshot
                    .to_object()
                    .into_iter()
                    .fold(Object::builder(), |builder, (key, value)| {
                        builder.property(key, value)
                    });
                Ok(object.into_value())
            }))
            .into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_set_delete() {
        let env = EnvStore::new();
        assert_eq!(env.get("HOME"), None);
        env.set("HOME", "/home/web").unwrap();
        env.set("HOME", "/root").unwrap();
        assert_eq!(env.get("HOME").as_deref(), Some("/root"));
        assert!(env.delete("HOME"));
        assert!(!env.delete("HOME"));
        assert_eq!(env.get("HOME"), None);
    }

    #[test]
    fn invalid_names_are_rejected() {
        let env = EnvStore::new();
        for key in ["", "A=B", "nul\0"] {
            assert!(
                matches!(env.set(key, "v"), Err(ShimError::InvalidArgs(_))),
                "{key:?}"
            );
        }
    }

    #[test]
    fn snapshots_are_detached() {
        let env = EnvStore::with_vars(BTreeMap::from([("A".to_owned(), "1".to_owned())]));
        let mut snapshot = env.to_object();
        snapshot.insert("B".to_owned(), "2".to_owned());
        assert_eq!(env.get("B"), None);

        let value = env.to_value();
        let to_object = value
            .as_object()
            .and_then(|o| o.get("toObject"))
            .and_then(Value::as_function)
            .unwrap();
        let object = to_object.call(&[]).unwrap();
        env.set("C", "3").unwrap();
        assert_eq!(object.to_string(), r#"{ A: "1" }"#);
    }

    #[test]
    fn stores_are_isolated() {
        let a = EnvStore::new();
        let b = EnvStore::new();
        a.set("ONLY_A", "x").unwrap();
        assert_eq!(b.get("ONLY_A"), None);

        let env = b.to_value();
        let env = env.as_object().unwrap();
        let get = env.get("get").and_then(Value::as_function).unwrap();
        assert_eq!(get.call(&[Value::from("ONLY_A")]), Ok(Value::Undefined));
    }
}
