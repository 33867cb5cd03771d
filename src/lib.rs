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

//! Policy-guarded expression evaluation and static call analysis
//!
//! Small, untrusted, formula-like expressions arrive as trees produced by an
//! external parser. This crate can
//!
//! - evaluate a tree against a host [`Context`], reading members only where
//!   an [`AccessPolicy`] allows it ([`evaluate`]);
//! - list the function calls a tree would make, without executing anything
//!   ([`analyze`]);
//! - check those call sites against expected signatures ([`validate`]).
//!
//! ```rust
//! use guarded_expr::{ExpressionNode, analyze, validate, stdlib};
//!
//! // Math.max([1, 2])
//! let tree = ExpressionNode::call(
//!     ExpressionNode::member(ExpressionNode::identifier("Math"), "max"),
//!     vec![ExpressionNode::array(vec![
//!         ExpressionNode::literal(1),
//!         ExpressionNode::literal(2),
//!     ])],
//! );
//!
//! let analysis = analyze(&tree, None, None);
//! let buckets = validate(&analysis, &stdlib::standard_signatures());
//! assert_eq!(buckets["Math.max"].valid.len(), 1);
//! ```

pub mod analyzer;
pub mod ast;
pub mod core;
pub mod evaluator;
pub mod policy;
pub mod registry;
pub mod stdlib;

pub use analyzer::{
    ExpressionAnalysis, ExpressionAnalyzer, FunctionAnalysis, FunctionAnalyzer, FunctionArg,
    FunctionBuckets, FunctionCall, PathSegment, RuntimeValue,
};
pub use ast::{BinaryOperator, ExpressionNode, LiteralValue, LogicalOperator, UnaryOperator};
pub use crate::core::{
    Callable, Context, ErrorCode, ExpressionError, HostFunction, Namespace, Pattern, PropertyKey,
    Result, Value,
};
pub use evaluator::{EvaluationResult, EvaluatorOptions, ExpressionEvaluator};
pub use policy::{AccessPolicy, MemberCheck};
pub use registry::{ArgSpec, ArgType, FunctionSignature, PathKey, SignatureTable};

/// Evaluate a tree against a context under an access policy
///
/// Fails with the first fault encountered anywhere in the tree.
pub async fn evaluate(
    tree: &ExpressionNode,
    context: &Context,
    policy: Option<&AccessPolicy>,
) -> Result<EvaluationResult> {
    let options = EvaluatorOptions {
        context: context.clone(),
        policy: policy.cloned(),
    };
    ExpressionEvaluator::new(options).evaluate(tree).await
}

/// List the call sites and static errors of a tree without executing it
pub fn analyze(
    tree: &ExpressionNode,
    context: Option<&Context>,
    policy: Option<&AccessPolicy>,
) -> ExpressionAnalysis {
    analyzer::analyze_expression(tree, context, policy)
}

/// Bucket the call sites of an analysis per signature
pub fn validate(analysis: &ExpressionAnalysis, table: &SignatureTable) -> FunctionAnalysis {
    analyzer::bucket_calls(table, analysis)
}
