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

//! Error code system for expression faults (EX0001, EX0002, etc.)
//!
//! Every [`ExpressionError`](super::ExpressionError) variant maps to one code
//! so hosts can match on a stable identifier instead of message text.

use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Name and member resolution errors (EX0001-EX0019)
    Resolution,
    /// Operator and call errors (EX0020-EX0039)
    Operation,
    /// Malformed tree errors (EX0040-EX0059)
    Structure,
    /// Errors raised by host functions (EX0060+)
    Host,
}

/// Error code in the `EX0001` style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Get the full error code string (e.g., "EX0001")
    pub fn code_str(&self) -> String {
        format!("EX{:04}", self.code)
    }

    /// Get error information from the registry
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_REGISTRY.get_error_info(self)
    }

    /// Get error category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self.code {
            1..=19 => ErrorCategory::Resolution,
            20..=39 => ErrorCategory::Operation,
            40..=59 => ErrorCategory::Structure,
            _ => ErrorCategory::Host,
        }
    }

    /// Get human-readable description for this error code
    pub fn description(&self) -> &'static str {
        self.info().title
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EX{:04}", self.code)
    }
}

/// Error information with a short title and help text
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error code number
    pub code: u16,
    /// Human-readable error title
    pub title: &'static str,
    /// Help information and suggested solutions
    pub help: &'static str,
}

impl ErrorInfo {
    pub const fn new(code: u16, title: &'static str, help: &'static str) -> Self {
        Self { code, title, help }
    }
}

/// Central error registry containing all error definitions
pub struct ErrorRegistry;

impl ErrorRegistry {
    /// Get error information for a given error code
    pub fn get_error_info(&self, error_code: &ErrorCode) -> &'static ErrorInfo {
        match error_code.code {
            1 => &EX0001_INFO,
            2 => &EX0002_INFO,
            3 => &EX0003_INFO,
            4 => &EX0004_INFO,
            20 => &EX0020_INFO,
            21 => &EX0021_INFO,
            22 => &EX0022_INFO,
            40 => &EX0040_INFO,
            41 => &EX0041_INFO,
            60 => &EX0060_INFO,
            _ => &UNKNOWN_ERROR_INFO,
        }
    }
}

pub static ERROR_REGISTRY: ErrorRegistry = ErrorRegistry;

// Resolution errors
pub const EX0001: ErrorCode = ErrorCode::new(1); // Identifier not found
pub const EX0002: ErrorCode = ErrorCode::new(2); // Indexing a null or undefined value
pub const EX0003: ErrorCode = ErrorCode::new(3); // Invalid index type
pub const EX0004: ErrorCode = ErrorCode::new(4); // Member access denied by policy

// Operation errors
pub const EX0020: ErrorCode = ErrorCode::new(20); // Callee is not a function
pub const EX0021: ErrorCode = ErrorCode::new(21); // Operand type mismatch
pub const EX0022: ErrorCode = ErrorCode::new(22); // Unknown operator

// Structure errors
pub const EX0040: ErrorCode = ErrorCode::new(40); // Empty compound expression
pub const EX0041: ErrorCode = ErrorCode::new(41); // Invalid node kind

// Host errors
pub const EX0060: ErrorCode = ErrorCode::new(60); // Host function failed

const EX0001_INFO: ErrorInfo = ErrorInfo::new(
    1,
    "Identifier not found",
    "Only names that are own keys of the evaluation context can be referenced",
);
const EX0002_INFO: ErrorInfo = ErrorInfo::new(
    2,
    "Cannot index undefined",
    "Check that the object being indexed exists before accessing its members",
);
const EX0003_INFO: ErrorInfo = ErrorInfo::new(
    3,
    "Invalid index type",
    "Member keys must be strings or numbers",
);
const EX0004_INFO: ErrorInfo = ErrorInfo::new(
    4,
    "Member access denied",
    "Configure a member check that approves this container and key",
);
const EX0020_INFO: ErrorInfo = ErrorInfo::new(
    20,
    "Value is not callable",
    "Only functions supplied by the host can be called",
);
const EX0021_INFO: ErrorInfo = ErrorInfo::new(
    21,
    "Operand type mismatch",
    "Arithmetic needs two numbers; '+' also accepts two strings",
);
const EX0022_INFO: ErrorInfo = ErrorInfo::new(
    22,
    "Unknown operator",
    "The expression tree contains an operator the evaluator does not support",
);
const EX0040_INFO: ErrorInfo = ErrorInfo::new(
    40,
    "Empty compound expression",
    "A compound expression needs at least one element",
);
const EX0041_INFO: ErrorInfo = ErrorInfo::new(
    41,
    "Invalid expression node",
    "The parser produced a node kind or shape that is not supported",
);
const EX0060_INFO: ErrorInfo = ErrorInfo::new(
    60,
    "Host function failed",
    "A function supplied through the context returned an error",
);
const UNKNOWN_ERROR_INFO: ErrorInfo = ErrorInfo::new(0, "Unknown error", "");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(EX0001.code_str(), "EX0001");
        assert_eq!(EX0060.to_string(), "EX0060");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(EX0004.category(), ErrorCategory::Resolution);
        assert_eq!(EX0022.category(), ErrorCategory::Operation);
        assert_eq!(EX0040.category(), ErrorCategory::Structure);
        assert_eq!(EX0060.category(), ErrorCategory::Host);
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(EX0040.description(), "Empty compound expression");
        assert_eq!(ErrorCode::new(999).info().code, 0);
    }
}
