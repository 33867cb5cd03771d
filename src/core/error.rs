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

//! Core error type with error codes
//!
//! The evaluator raises these as faults; the analyzer collects the same
//! values as data.

use thiserror::Error;

pub use super::error_code::*;

/// Faults produced while evaluating or statically resolving an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// Identifier is not an own key of the context
    #[error("{}: Identifier ({name}) not found", EX0001)]
    NotFound { name: String },

    /// Member access on an undefined value
    #[error("{}: Cannot index {type_name}", EX0002)]
    NullIndex { type_name: &'static str },

    /// Member key is neither a string nor a number
    #[error("{}: Cannot index with type {type_name}", EX0003)]
    InvalidIndexType { type_name: &'static str },

    /// The access policy rejected the member read
    #[error(
        "{}: Not allowed to index {container} (type: {container_type}) with {key} (type: {key_type})",
        EX0004
    )]
    AccessDenied {
        container: String,
        container_type: &'static str,
        key: String,
        key_type: &'static str,
    },

    /// Callee did not resolve to a function
    #[error("{}: Cannot call a non-function (type: {type_name})", EX0020)]
    NotCallable { type_name: &'static str },

    /// Operand types are not valid for the operator
    #[error("{}: Cannot perform operation {operator}: {message}", EX0021)]
    TypeMismatch { operator: String, message: String },

    /// Operator text not understood by the evaluator
    #[error("{}: Operator {operator} is unknown", EX0022)]
    UnknownOperator { operator: String },

    /// Compound expression without elements
    #[error("{}: Compound expression cannot be empty", EX0040)]
    EmptyCompound,

    /// Node kind or shape not supported
    #[error("{}: Expression type {kind} is invalid", EX0041)]
    InvalidNodeKind { kind: String },

    /// A host function returned an error
    #[error("{}: Function {function} failed: {message}", EX0060)]
    FunctionFailed { function: String, message: String },
}

impl ExpressionError {
    /// Create a type mismatch error
    pub fn type_mismatch(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            operator: operator.into(),
        }
    }

    /// Create a host function failure
    pub fn function_failed(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionFailed {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => EX0001,
            Self::NullIndex { .. } => EX0002,
            Self::InvalidIndexType { .. } => EX0003,
            Self::AccessDenied { .. } => EX0004,
            Self::NotCallable { .. } => EX0020,
            Self::TypeMismatch { .. } => EX0021,
            Self::UnknownOperator { .. } => EX0022,
            Self::EmptyCompound => EX0040,
            Self::InvalidNodeKind { .. } => EX0041,
            Self::FunctionFailed { .. } => EX0060,
        }
    }

    /// Get error information with help text
    pub fn error_info(&self) -> &'static ErrorInfo {
        self.error_code().info()
    }
}

/// Result type for expression operations
pub type Result<T> = std::result::Result<T, ExpressionError>;
