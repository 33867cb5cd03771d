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

//! Core types shared by the evaluator and the analyzer

pub mod context;
pub mod error;
pub mod error_code;
pub mod pattern;
pub mod string_methods;
pub mod value;

pub use context::Context;
pub use error::{ExpressionError, Result};
pub use error_code::{ErrorCategory, ErrorCode, ErrorInfo};
pub use pattern::{Pattern, PatternError};
pub use string_methods::is_string_method;
pub use value::{Callable, HostFunction, Namespace, NativeFunction, PropertyKey, Value, format_number};
