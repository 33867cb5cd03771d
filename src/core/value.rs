// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core value types for expressions
//!
//! Values are what identifiers resolve to, what member reads return and what
//! host functions receive and produce. Containers (arrays, namespaces) are
//! reference counted so cloning a value never deep-copies host data.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::error::Result;
use super::pattern::Pattern;
use super::string_methods::string_method;

/// A function supplied by the host through the context
///
/// Implementations may complete asynchronously; the evaluator awaits the
/// returned future before using the result.
#[async_trait]
pub trait HostFunction: Send + Sync {
    /// Invoke the function with an optional bound receiver
    async fn call(&self, this: Option<&Value>, args: Vec<Value>) -> Result<Value>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "anonymous"
    }
}

type NativeFn = dyn Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync;

/// Adapter turning a synchronous closure into a [`HostFunction`]
pub struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl HostFunction for NativeFunction {
    async fn call(&self, this: Option<&Value>, args: Vec<Value>) -> Result<Value> {
        (self.func)(this, &args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An invocable value, optionally bound to the container it was read from
#[derive(Clone)]
pub struct Callable {
    function: Arc<dyn HostFunction>,
    receiver: Option<Box<Value>>,
}

impl Callable {
    pub fn new(function: Arc<dyn HostFunction>) -> Self {
        Self {
            function,
            receiver: None,
        }
    }

    /// Bind the function to the container it was read from
    pub fn bind(&self, receiver: Value) -> Self {
        Self {
            function: self.function.clone(),
            receiver: Some(Box::new(receiver)),
        }
    }

    /// The bound receiver, if any
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    /// Invoke the function with its bound receiver
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Value> {
        self.function.call(self.receiver(), args).await
    }

    /// Identity comparison of the underlying host function
    pub fn same_function(&self, other: &Callable) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.function), Arc::as_ptr(&other.function))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name())
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

/// Name-to-value mapping used for the context and for nested helper libraries
#[derive(Clone, Default, PartialEq)]
pub struct Namespace(Arc<IndexMap<String, Value>>);

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a member, copying the map only if it is shared
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.0).insert(key.into(), value.into());
    }

    /// Own-key lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Merge another namespace into this one; later keys win
    pub fn extend(&mut self, other: &Namespace) {
        let map = Arc::make_mut(&mut self.0);
        for (key, value) in other.iter() {
            map.insert(key.clone(), value.clone());
        }
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}

/// Key used for a member read
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    String(String),
    Number(f64),
}

impl PropertyKey {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
        }
    }

    /// Text form used for namespace lookups
    pub fn to_key_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }

    /// Integral, non-negative index if the key is numeric
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= usize::MAX as f64 => {
                Some(*n as usize)
            }
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for PropertyKey {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Runtime value of an expression
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent member or explicit "no value" placeholder
    #[default]
    Undefined,
    Number(f64),
    String(String),
    Boolean(bool),
    Array(Arc<Vec<Value>>),
    Namespace(Namespace),
    Function(Callable),
    /// Compiled regular expression
    Pattern(Pattern),
}

impl Value {
    /// Wrap a synchronous closure as a function value
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Callable::new(Arc::new(NativeFunction::new(
            name,
            move |_, args| func(args),
        ))))
    }

    /// Wrap a synchronous closure that also receives its bound receiver
    pub fn method<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Callable::new(Arc::new(NativeFunction::new(name, func))))
    }

    /// Wrap any host function implementation
    pub fn host_function(function: Arc<dyn HostFunction>) -> Self {
        Self::Function(Callable::new(function))
    }

    pub fn array(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Arc::new(values.into_iter().collect()))
    }

    /// `typeof`-style name used in diagnostics and signature checks
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Array(_) | Self::Namespace(_) | Self::Pattern(_) => "object",
            Self::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
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

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(callable) => Some(callable),
            _ => None,
        }
    }

    /// Truthiness: undefined, false, 0, NaN and "" are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Boolean(b) => *b,
            Self::Array(_) | Self::Namespace(_) | Self::Function(_) | Self::Pattern(_) => true,
        }
    }

    /// Strict equality: primitives by value, containers and functions by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Namespace(a), Self::Namespace(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => a.same_function(b),
            (Self::Pattern(a), Self::Pattern(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Read a member without any policy check
    ///
    /// Functions read from a container come back bound to that container.
    /// Strings expose their characters by index and the methods listed in
    /// [`string_methods`](super::string_methods) by name.
    pub fn get_member(&self, key: &PropertyKey) -> Value {
        let value = match (self, key) {
            (Self::Namespace(ns), _) => ns.get(&key.to_key_string()).cloned(),
            (Self::Array(items), _) => key.as_index().and_then(|i| items.get(i).cloned()),
            (Self::String(_), PropertyKey::String(name)) => string_method(name),
            (Self::String(s), PropertyKey::Number(_)) => key
                .as_index()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string())),
            _ => None,
        };

        match value {
            Some(Value::Function(callable)) => Value::Function(callable.bind(self.clone())),
            Some(value) => value,
            None => Value::Undefined,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Namespace(a), Self::Namespace(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.same_function(b),
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_undefined() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Namespace(_) => f.write_str("[object Object]"),
            Self::Function(callable) => write!(f, "function {}()", callable.name()),
            Self::Pattern(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// Canonical text form of a number (`1` not `1.0`, `1e+21` not 22 digits)
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        String::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(Arc::new(values))
    }
}

impl From<Namespace> for Value {
    fn from(namespace: Namespace) -> Self {
        Self::Namespace(namespace)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Undefined,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::array(items.into_iter().map(Value::from))
            }
            serde_json::Value::Object(map) => Self::Namespace(map.into_iter().collect()),
        }
    }
}
