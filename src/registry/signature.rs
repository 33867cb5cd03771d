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

//! Function signatures for call-site validation
//!
//! A [`SignatureTable`] maps a key to the expected shape of one host
//! function: its name, the static path leading to it and its argument types.
//! Tables can be built in code or loaded from JSON such as
//!
//! ```json
//! {
//!   "Math.max": { "path": ["Math"], "name": "max", "args": ["number[]"] },
//!   "fn": { "args": ["number", "number", "string"], "requiredArgsCount": 2 }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::analyzer::{FunctionArg, FunctionCall, PathSegment};
use crate::core::Value;

/// Check applied to a single argument
pub type ArgPredicate = Arc<dyn Fn(&FunctionArg) -> bool + Send + Sync>;

/// Check applied to the whole argument list
pub type ArgsPredicate = Arc<dyn Fn(&[FunctionArg]) -> bool + Send + Sync>;

/// Expected type of one argument
#[derive(Clone)]
pub enum ArgType {
    Any,
    String,
    Number,
    Boolean,
    AnyArray,
    StringArray,
    NumberArray,
    BooleanArray,
    /// Custom check receiving the argument
    Predicate(ArgPredicate),
}

impl ArgType {
    /// Parse a type tag such as `"number"` or `"string[]"`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "any" => Some(Self::Any),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "any[]" => Some(Self::AnyArray),
            "string[]" => Some(Self::StringArray),
            "number[]" => Some(Self::NumberArray),
            "boolean[]" => Some(Self::BooleanArray),
            _ => None,
        }
    }

    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&FunctionArg) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(check))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::AnyArray => "any[]",
            Self::StringArray => "string[]",
            Self::NumberArray => "number[]",
            Self::BooleanArray => "boolean[]",
            Self::Predicate(_) => "<predicate>",
        }
    }

    /// Check a resolved argument against this type
    pub fn accepts(&self, arg: &FunctionArg) -> bool {
        match self {
            Self::Any => true,
            Self::AnyArray => matches!(
                arg,
                FunctionArg::Array(_) | FunctionArg::Value(Value::Array(_))
            ),
            Self::String | Self::Number | Self::Boolean => {
                arg.as_value().is_some_and(|value| value.type_name() == self.tag())
            }
            Self::StringArray => every_element(arg, "string"),
            Self::NumberArray => every_element(arg, "number"),
            Self::BooleanArray => every_element(arg, "boolean"),
            Self::Predicate(check) => check(arg),
        }
    }
}

fn every_element(arg: &FunctionArg, type_name: &str) -> bool {
    match arg {
        FunctionArg::Value(Value::Array(items)) => {
            items.iter().all(|item| item.type_name() == type_name)
        }
        FunctionArg::Array(items) => items.iter().all(|item| {
            item.as_value()
                .is_some_and(|value| value.type_name() == type_name)
        }),
        _ => false,
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ArgType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::from_tag(&tag)
            .ok_or_else(|| de::Error::custom(format!("unknown argument type tag '{tag}'")))
    }
}

/// Argument specification of a signature
#[derive(Clone)]
pub enum ArgSpec {
    /// One type per position
    Positional(Vec<ArgType>),
    /// One check over the full argument list; no positional logic runs
    Predicate(ArgsPredicate),
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(types) => f.debug_list().entries(types).finish(),
            Self::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

/// Static path segment of a signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl PathKey {
    pub fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (Self::String(a), PathSegment::String(b)) => a == b,
            (Self::Number(a), PathSegment::Number(b)) => a == b,
            (Self::Boolean(a), PathSegment::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for PathKey {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for PathKey {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PathKey {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Expected shape of one host function
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Function name; the table key is used when absent
    pub name: Option<String>,
    /// Static path leading to the function
    pub path: Vec<PathKey>,
    /// Argument types
    pub args: ArgSpec,
    /// Number of leading arguments that must be present; defaults to the
    /// number of positional types
    pub required_args_count: Option<usize>,
    /// Accept unresolved nested calls as arguments
    pub function_call_arg_valid: bool,
    /// Accept arguments only known at runtime
    pub runtime_value_valid: bool,
}

impl FunctionSignature {
    /// Create a signature with positional argument types
    pub fn new(args: Vec<ArgType>) -> Self {
        Self::with_spec(ArgSpec::Positional(args))
    }

    /// Create a signature whose arguments are checked by one predicate
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&[FunctionArg]) -> bool + Send + Sync + 'static,
    {
        Self::with_spec(ArgSpec::Predicate(Arc::new(check)))
    }

    fn with_spec(args: ArgSpec) -> Self {
        Self {
            name: None,
            path: Vec::new(),
            args,
            required_args_count: None,
            function_call_arg_valid: false,
            runtime_value_valid: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path<K: Into<PathKey>>(mut self, path: impl IntoIterator<Item = K>) -> Self {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_args(mut self, count: usize) -> Self {
        self.required_args_count = Some(count);
        self
    }

    pub fn with_function_call_args(mut self, valid: bool) -> Self {
        self.function_call_arg_valid = valid;
        self
    }

    pub fn with_runtime_values(mut self, valid: bool) -> Self {
        self.runtime_value_valid = valid;
        self
    }

    /// Number of arguments a call needs
    pub fn required_args(&self) -> usize {
        match (&self.args, self.required_args_count) {
            (_, Some(count)) => count,
            (ArgSpec::Positional(types), None) => types.len(),
            (ArgSpec::Predicate(_), None) => 0,
        }
    }

    /// Check whether a call site targets this function
    ///
    /// The name and every path segment must match exactly.
    pub fn matches_call(&self, key: &str, call: &FunctionCall) -> bool {
        let name = self.name.as_deref().unwrap_or(key);
        call.name == name
            && call.path.len() == self.path.len()
            && self
                .path
                .iter()
                .zip(&call.path)
                .all(|(expected, segment)| expected.matches(segment))
    }

    /// Check the arguments of a matching call site
    pub fn accepts(&self, args: &[FunctionArg]) -> bool {
        let types = match &self.args {
            ArgSpec::Predicate(check) => return check(args),
            ArgSpec::Positional(types) => types,
        };

        let required = self.required_args();
        if args.len() < required {
            return false;
        }

        args.iter().zip(types).enumerate().all(|(i, (arg, ty))| match arg {
            FunctionArg::Value(Value::Undefined) if i >= required => true,
            FunctionArg::Call(_) => self.function_call_arg_valid,
            FunctionArg::Runtime(_) => self.runtime_value_valid,
            _ => ty.accepts(arg),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureDef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Vec<PathKey>,
    args: Vec<ArgType>,
    #[serde(default)]
    required_args_count: Option<usize>,
    #[serde(default)]
    function_call_arg_valid: bool,
    #[serde(default)]
    runtime_value_valid: bool,
}

impl From<SignatureDef> for FunctionSignature {
    fn from(def: SignatureDef) -> Self {
        Self {
            name: def.name,
            path: def.path,
            args: ArgSpec::Positional(def.args),
            required_args_count: def.required_args_count,
            function_call_arg_valid: def.function_call_arg_valid,
            runtime_value_valid: def.runtime_value_valid,
        }
    }
}

impl<'de> Deserialize<'de> for FunctionSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SignatureDef::deserialize(deserializer).map(Self::from)
    }
}

/// Ordered table of signatures keyed by name
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    signatures: IndexMap<String, FunctionSignature>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from JSON
    pub fn from_json(json: &serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(json.clone())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, signature: FunctionSignature) -> Self {
        self.insert(key, signature);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, signature: FunctionSignature) {
        self.signatures.insert(key.into(), signature);
    }

    pub fn get(&self, key: &str) -> Option<&FunctionSignature> {
        self.signatures.get(key)
    }

    /// Add every entry of `other`; later keys win
    pub fn extend(&mut self, other: SignatureTable) {
        self.signatures.extend(other.signatures);
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FunctionSignature> {
        self.signatures.iter()
    }
}

impl<'de> Deserialize<'de> for SignatureTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::deserialize(deserializer).map(|signatures| Self { signatures })
    }
}

impl<K: Into<String>> FromIterator<(K, FunctionSignature)> for SignatureTable {
    fn from_iter<I: IntoIterator<Item = (K, FunctionSignature)>>(iter: I) -> Self {
        Self {
            signatures: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
