//! The dynamic value model the namespace is made of.
//!
//! Members are looked up by name and called with positional [`Value`]
//! arguments, the same way script code sees them. Typed Rust entry points
//! live next to each component (`file`, `fs`, `env`, ...); the values here
//! are thin adapters over those.

use crate::error::{Result, ShimError};
use crate::resources::Rid;
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What `typeof` reports for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Undefined,
    Object,
    Boolean,
    Number,
    String,
    Symbol,
    Function,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte buffer shared by reference, like a typed array.
#[derive(Clone, Default)]
pub struct SharedBytes(Arc<Mutex<Vec<u8>>>);

impl SharedBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.0.lock())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl fmt::Debug for SharedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedBytes({})", self.len())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Arc<str>),
    Bytes(SharedBytes),
    Object(Arc<Object>),
    Function(Function),
    Error(ShimError),
}

static UNDEFINED: Value = Value::Undefined;

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Undefined,
            Self::Null | Self::Bytes(_) | Self::Object(_) | Self::Error(_) => ValueKind::Object,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Symbol(_) => ValueKind::Symbol,
            Self::Function(_) => ValueKind::Function,
        }
    }

    pub fn symbol(description: &str) -> Self {
        Self::Symbol(Arc::from(description))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&SharedBytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => Arc::ptr_eq(a, b),
            (Self::Bytes(a), Self::Bytes(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => a.same_function(b),
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Symbol(description) => write!(f, "Symbol({description})"),
            Self::Bytes(bytes) => write!(f, "Uint8Array({})", bytes.len()),
            Self::Object(object) => write!(f, "{object}"),
            Self::Function(function) => write!(f, "[Function: {}]", function.name()),
            Self::Error(err) => write!(f, "{}: {err}", err.class()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

/// Integers past 2^53 round to the nearest `f64`, as script numbers do.
impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

/// Rounds like the `u64` conversion.
impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(SharedBytes::new(value))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(Arc::new(value))
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A plain record with an optional class tag. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Object {
    class: Option<&'static str>,
    properties: IndexMap<String, Value>,
}

impl Object {
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::default()
    }

    pub fn class(&self) -> Option<&'static str> {
        self.class
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Reads an optional boolean option; absent and `undefined` read as `false`.
    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None | Some(Value::Undefined) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ShimError::TypeError(format!(
                "option `{key}` must be a boolean, got {}",
                other.kind()
            ))),
        }
    }

    pub fn opt_flag(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None | Some(Value::Undefined) => Ok(None),
            Some(_) => self.flag(key).map(Some),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None | Some(Value::Undefined) | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ShimError::TypeError(format!(
                "option `{key}` must be a string, got {}",
                other.kind()
            ))),
        }
    }

    pub fn opt_number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None | Some(Value::Undefined) | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(ShimError::TypeError(format!(
                "option `{key}` must be a number, got {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = self.class {
            write!(f, "{class} ")?;
        }
        if self.properties.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: ")?;
            value.fmt_nested(f)?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, Default)]
pub struct ObjectBuilder {
    class: Option<&'static str>,
    properties: IndexMap<String, Value>,
}

impl ObjectBuilder {
    pub fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds `function` under its own name.
    pub fn method(mut self, function: Function) -> Self {
        self.properties
            .insert(function.name().to_owned(), Value::Function(function));
        self
    }

    pub fn build(self) -> Object {
        Object {
            class: self.class,
            properties: self.properties,
        }
    }

    pub fn into_value(self) -> Value {
        self.build().into()
    }
}

type SyncCall = dyn Fn(&Args<'_>) -> Result<Value> + Send + Sync;
type PromiseCall = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;

#[derive(Clone)]
enum Callable {
    Sync(Arc<SyncCall>),
    Promise(Arc<PromiseCall>),
}

/// A named native function.
#[derive(Clone)]
pub struct Function {
    name: Cow<'static, str>,
    callable: Callable,
}

impl Function {
    pub fn sync<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callable: Callable::Sync(Arc::new(f)),
        }
    }

    pub fn promise<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            callable: Callable::Promise(Arc::new(move |args| f(args).boxed())),
        }
    }

    /// A promise-returning function whose work runs to completion when it is
    /// called; the returned future is already settled.
    pub fn deferred<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::promise(name, move |args: Vec<Value>| {
            future::ready(f(&Args::new(&args)))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn returns_promise(&self) -> bool {
        matches!(self.callable, Callable::Promise(_))
    }

    /// Calls a synchronous function.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match &self.callable {
            Callable::Sync(f) => f(&Args::new(args)),
            Callable::Promise(_) => Err(ShimError::TypeError(format!(
                "`{}` returns a promise and must be invoked asynchronously",
                self.name
            ))),
        }
    }

    /// Calls either kind of function, settling synchronous results immediately.
    pub fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, Result<Value>> {
        match &self.callable {
            Callable::Sync(f) => future::ready(f(&Args::new(&args))).boxed(),
            Callable::Promise(f) => f(args),
        }
    }

    fn same_function(&self, other: &Self) -> bool {
        match (&self.callable, &other.callable) {
            (Callable::Sync(a), Callable::Sync(b)) => Arc::ptr_eq(a, b),
            (Callable::Promise(a), Callable::Promise(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("returns_promise", &self.returns_promise())
            .finish()
    }
}

/// Positional call arguments. Missing trailing arguments read as `undefined`.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> &'a Value {
        self.values.get(index).unwrap_or(&UNDEFINED)
    }

    pub fn string(&self, index: usize, what: &str) -> Result<&'a str> {
        match self.get(index) {
            Value::String(s) => Ok(s),
            other => Err(expected(what, "a string", other)),
        }
    }

    pub fn opt_string(&self, index: usize, what: &str) -> Result<Option<&'a str>> {
        match self.get(index) {
            Value::Undefined | Value::Null => Ok(None),
            _ => self.string(index, what).map(Some),
        }
    }

    pub fn number(&self, index: usize, what: &str) -> Result<f64> {
        match self.get(index) {
            Value::Number(n) => Ok(*n),
            other => Err(expected(what, "a number", other)),
        }
    }

    pub fn opt_number(&self, index: usize, what: &str) -> Result<Option<f64>> {
        match self.get(index) {
            Value::Undefined | Value::Null => Ok(None),
            _ => self.number(index, what).map(Some),
        }
    }

    pub fn rid(&self, index: usize) -> Result<Rid> {
        to_rid(self.number(index, "rid")?)
    }

    pub fn bytes(&self, index: usize, what: &str) -> Result<&'a SharedBytes> {
        match self.get(index) {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(expected(what, "a Uint8Array", other)),
        }
    }

    pub fn object(&self, index: usize, what: &str) -> Result<&'a Object> {
        match self.get(index) {
            Value::Object(object) => Ok(object),
            other => Err(expected(what, "an object", other)),
        }
    }

    pub fn opt_object(&self, index: usize, what: &str) -> Result<Option<&'a Object>> {
        match self.get(index) {
            Value::Undefined | Value::Null => Ok(None),
            _ => self.object(index, what).map(Some),
        }
    }
}

fn expected(what: &str, shape: &str, got: &Value) -> ShimError {
    ShimError::TypeError(format!("{what} must be {shape}, got {}", got.kind()))
}

/// Resource ids are positive integers; `0` is never handed out.
pub(crate) fn to_rid(n: f64) -> Result<Rid> {
    if n.fract() != 0.0 || n < 0.0 || n > f64::from(Rid::MAX) {
        return Err(ShimError::TypeError(format!("{n} is not a valid rid")));
    }
    match n as Rid {
        0 => Err(ShimError::BadResource(0)),
        rid => Ok(rid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typeof_matches_runtime_conventions() {
        assert_eq!(Value::Null.kind(), ValueKind::Object);
        assert_eq!(Value::from(vec![1u8]).kind(), ValueKind::Object);
        assert_eq!(Value::symbol("x").kind(), ValueKind::Symbol);
        assert_eq!(
            Value::from(Function::sync("f", |_| Ok(Value::Undefined))).kind(),
            ValueKind::Function
        );
        assert_eq!(ValueKind::Function.to_string(), "function");
    }

    #[test]
    fn display_nests_strings_quoted() {
        let value = Object::builder()
            .property("a", 1u32)
            .property("b", "two")
            .method(Function::sync("c", |_| Ok(Value::Undefined)))
            .into_value();
        assert_eq!(value.to_string(), r#"{ a: 1, b: "two", c: [Function: c] }"#);
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Object::default().to_string(), "{}");
    }

    #[test]
    fn args_default_to_undefined() {
        let values = [Value::from("p")];
        let args = Args::new(&values);
        assert_eq!(args.string(0, "path"), Ok("p"));
        assert_eq!(args.get(3), &Value::Undefined);
        assert_eq!(args.opt_object(1, "options").map(|o| o.is_none()), Ok(true));
        assert!(matches!(
            args.number(0, "len"),
            Err(ShimError::TypeError(msg)) if msg == "len must be a number, got string"
        ));
    }

    #[test]
    fn rid_must_be_a_positive_integer() {
        assert_eq!(to_rid(3.0), Ok(3));
        assert_eq!(to_rid(0.0), Err(ShimError::BadResource(0)));
        assert!(to_rid(-1.0).is_err());
        assert!(to_rid(1.5).is_err());
    }

    #[test]
    fn large_integers_round_like_numbers() {
        assert_eq!(Value::from(1u64 << 53), Value::Number(9_007_199_254_740_992.0));
        assert_eq!(Value::from((1u64 << 53) + 1), Value::Number(9_007_199_254_740_992.0));
    }

    #[test]
    fn object_flags() {
        let options = Object::builder()
            .property("read", true)
            .property("write", "yes")
            .build();
        assert_eq!(options.flag("read"), Ok(true));
        assert_eq!(options.flag("append"), Ok(false));
        assert_eq!(options.opt_flag("create"), Ok(None));
        assert!(options.flag("write").is_err());
    }

    #[tokio::test]
    async fn deferred_functions_settle_when_called() {
        let f = Function::deferred("answer", |_| Ok(Value::from(42u32)));
        assert!(f.returns_promise());
        assert!(f.call(&[]).is_err());
        assert_eq!(f.invoke(vec![]).await, Ok(Value::Number(42.0)));

        let g = Function::sync("sync", |args| Ok(args.get(0).clone()));
        assert_eq!(g.invoke(vec![Value::Bool(true)]).await, Ok(Value::Bool(true)));
    }
}
