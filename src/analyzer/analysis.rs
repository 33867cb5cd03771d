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

//! Analysis result types
//!
//! A [`FunctionCall`] describes a call site found without executing
//! anything. Whatever could not be worked out statically is carried as a
//! [`RuntimeValue`].

use std::fmt;

use crate::core::{ExpressionError, Value, format_number};

/// Marker for a value that is only known at runtime
///
/// Two markers never compare equal, not even to themselves, so an unknown
/// value can never be mistaken for a known one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeValue;

impl PartialEq for RuntimeValue {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

/// Statically resolved argument of a call site
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArg {
    /// Fully resolved value, including arrays of literals
    Value(Value),
    /// Array literal holding at least one nested call
    Array(Vec<FunctionArg>),
    /// Nested call that was not executed
    Call(FunctionCall),
    /// Anything else
    Runtime(RuntimeValue),
}

impl FunctionArg {
    pub fn runtime() -> Self {
        Self::Runtime(RuntimeValue)
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&FunctionCall> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }
}

impl From<Value> for FunctionArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<FunctionCall> for FunctionArg {
    fn from(call: FunctionCall) -> Self {
        Self::Call(call)
    }
}

impl fmt::Display for FunctionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::String(s)) => write!(f, "{s:?}"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Call(call) => write!(f, "{call}"),
            Self::Runtime(_) => write!(f, "<runtime>"),
        }
    }
}

/// One static segment of the member chain leading to a function
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Part of the chain that could not be resolved
    Runtime(RuntimeValue),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl PathSegment {
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// Segment for a resolved key value, if it is a string, number or boolean
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(*n)),
            Value::Boolean(b) => Some(Self::Boolean(*b)),
            _ => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime(_) => write!(f, "<runtime>"),
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// A statically detected call site
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Resolved function name
    pub name: String,
    /// Arguments; nested calls are kept for reference only, the inventory
    /// lists them separately as well
    pub args: Vec<FunctionArg>,
    /// Member chain leading to the function; empty for root-level calls
    ///
    /// `value()` gives `[]`, `Math.min()` gives `["Math"]` and
    /// `a[b || c].d.e()` gives `[<runtime>, "d"]`.
    pub path: Vec<PathSegment>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<FunctionArg>, path: Vec<PathSegment>) -> Self {
        Self {
            name: name.into(),
            args,
            path,
        }
    }

    /// Dotted name including the static path (e.g., "Math.max")
    pub fn qualified_name(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(self.name.clone()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.qualified_name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// Inventory of call sites and static errors of one expression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionAnalysis {
    /// Every call site found, in tree order; nested calls appear both inside
    /// their parent's arguments and on their own
    pub function_calls: Vec<FunctionCall>,
    /// Static errors, each reported once per tree node
    pub errors: Vec<ExpressionError>,
}

impl ExpressionAnalysis {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_call(call: FunctionCall) -> Self {
        Self {
            function_calls: vec![call],
            errors: Vec::new(),
        }
    }

    pub fn with_errors(errors: Vec<ExpressionError>) -> Self {
        Self {
            function_calls: Vec::new(),
            errors,
        }
    }

    /// Concatenate results in the given order
    pub fn merge(parts: impl IntoIterator<Item = ExpressionAnalysis>) -> Self {
        parts.into_iter().fold(Self::empty(), |mut acc, part| {
            acc.append(part);
            acc
        })
    }

    pub fn append(&mut self, other: ExpressionAnalysis) {
        self.function_calls.extend(other.function_calls);
        self.errors.extend(other.errors);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
