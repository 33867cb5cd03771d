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

//! Static analysis of expressions
//!
//! The [`ExpressionAnalyzer`] lists the call sites of an expression without
//! executing it, and the [`FunctionAnalyzer`] checks those call sites
//! against a signature table.

pub mod analysis;
pub mod expression_analyzer;
pub mod function_analyzer;
pub mod resolver;

pub use analysis::{ExpressionAnalysis, FunctionArg, FunctionCall, PathSegment, RuntimeValue};
pub use expression_analyzer::{ExpressionAnalyzer, analyze_expression};
pub use function_analyzer::{FunctionAnalysis, FunctionAnalyzer, FunctionBuckets, bucket_calls};
pub use resolver::PartialResolver;
