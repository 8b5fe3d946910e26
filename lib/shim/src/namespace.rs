use crate::descriptor::{DescriptorMap, PropertyDescriptor};
use crate::error::{Result, ShimError};
use crate::value::{Function, Value, ValueKind};

/// The frozen namespace object handed to every caller.
///
/// It is a snapshot of a [`DescriptorMap`]: augmentation produces a new
/// `Namespace` instead of changing this one, so anyone still holding an
/// older object keeps a consistent surface.
#[derive(Debug)]
pub struct Namespace {
    descriptors: DescriptorMap,
}

impl Namespace {
    pub(crate) fn freeze(descriptors: DescriptorMap) -> Self {
        Self { descriptors }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.descriptors.get(name).map(PropertyDescriptor::value)
    }

    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors.get(name)
    }

    pub fn descriptors(&self) -> &DescriptorMap {
        &self.descriptors
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        true
    }

    /// `typeof ns[name]`; missing members are `undefined`.
    pub fn type_of(&self, name: &str) -> ValueKind {
        self.get(name).map_or(ValueKind::Undefined, Value::kind)
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        match self.get(name) {
            Some(Value::Function(function)) => Ok(function),
            Some(other) => Err(ShimError::TypeError(format!(
                "`{name}` is not a function, it is {}",
                other.kind()
            ))),
            None => Err(ShimError::TypeError(format!("`{name}` is not defined"))),
        }
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.function(name)?.call(args)
    }

    pub async fn call_async(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.function(name)?.invoke(args).await
    }

    /// Always fails: the namespace is frozen.
    pub fn define_property(&self, name: &str, _value: Value) -> Result<()> {
        Err(ShimError::TypeError(format!(
            "cannot define property `{name}`, object is not extensible"
        )))
    }
}
