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

//! Expression analyzer
//!
//! Walks every node of a tree and collects the call sites the partial
//! resolver can describe, plus the static errors it runs into. Nothing is
//! executed and analysis never fails.

use log::{debug, trace};

use super::analysis::ExpressionAnalysis;
use super::resolver::PartialResolver;
use crate::ast::ExpressionNode;
use crate::core::{Context, ExpressionError};
use crate::evaluator::EvaluatorOptions;
use crate::policy::AccessPolicy;

/// Static analyzer for expression trees
///
/// Without a context, names and member chains are not resolved at all and no
/// resolution errors are reported. With a context but without a policy,
/// every member read is reported as denied.
#[derive(Debug, Clone, Default)]
pub struct ExpressionAnalyzer {
    context: Option<Context>,
    policy: Option<AccessPolicy>,
}

impl ExpressionAnalyzer {
    /// Analyzer without context or policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer using the same context and policy as an evaluator
    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            context: Some(options.context),
            policy: options.policy,
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn policy(&self) -> Option<&AccessPolicy> {
        self.policy.as_ref()
    }

    /// Analyze a tree
    ///
    /// Each call starts with a fresh set of reported nodes, so repeated
    /// analyses are independent.
    pub fn analyze(&self, expression: &ExpressionNode) -> ExpressionAnalysis {
        analyze_expression(expression, self.context.as_ref(), self.policy.as_ref())
    }
}

/// Analyze a tree with a borrowed context and policy
pub fn analyze_expression(
    expression: &ExpressionNode,
    context: Option<&Context>,
    policy: Option<&AccessPolicy>,
) -> ExpressionAnalysis {
    debug!("Analyzing {} expression", expression.node_type());

    let mut resolver = PartialResolver::new(context, policy);
    let analysis = analyze_node(&mut resolver, expression);

    debug!(
        "Analysis finished: {} function calls, {} errors",
        analysis.function_calls.len(),
        analysis.errors.len()
    );
    analysis
}

fn analyze_node(resolver: &mut PartialResolver<'_>, node: &ExpressionNode) -> ExpressionAnalysis {
    match node {
        ExpressionNode::Array(array) => analyze_all(resolver, &array.elements),
        ExpressionNode::Binary(binary) => ExpressionAnalysis::merge([
            analyze_node(resolver, &binary.left),
            analyze_node(resolver, &binary.right),
        ]),
        ExpressionNode::Call(call) => {
            let mut analysis = ExpressionAnalysis::empty();
            if let Some(function_call) = resolver.resolve_call(call) {
                trace!("Found call site {function_call}");
                analysis.function_calls.push(function_call);
            }
            analysis.append(analyze_node(resolver, &call.callee));
            analysis.append(analyze_all(resolver, &call.arguments));
            analysis
        }
        ExpressionNode::Compound(compound) if compound.body.is_empty() => {
            ExpressionAnalysis::with_errors(vec![ExpressionError::EmptyCompound])
        }
        ExpressionNode::Compound(compound) => analyze_all(resolver, &compound.body),
        ExpressionNode::Conditional(conditional) => ExpressionAnalysis::merge([
            analyze_node(resolver, &conditional.test),
            analyze_node(resolver, &conditional.consequent),
            analyze_node(resolver, &conditional.alternate),
        ]),
        ExpressionNode::Identifier(identifier) => {
            let mut errors = Vec::new();
            if resolver.has_context() {
                resolver.resolve_identifier(node, &identifier.name, Some(&mut errors));
            }
            ExpressionAnalysis::with_errors(errors)
        }
        ExpressionNode::Literal(_) | ExpressionNode::This => ExpressionAnalysis::empty(),
        ExpressionNode::Logical(logical) => ExpressionAnalysis::merge([
            analyze_node(resolver, &logical.left),
            analyze_node(resolver, &logical.right),
        ]),
        ExpressionNode::Member(member) => {
            // Only the errors of the chain matter here, not its value
            let mut errors = Vec::new();
            resolver.resolve_member(node, member, Some(&mut errors));

            let mut analysis = ExpressionAnalysis::with_errors(errors);
            analysis.append(analyze_node(resolver, &member.object));
            if member.computed {
                analysis.append(analyze_node(resolver, &member.property));
            }
            analysis
        }
        ExpressionNode::Unary(unary) => analyze_node(resolver, &unary.argument),
    }
}

fn analyze_all(resolver: &mut PartialResolver<'_>, nodes: &[ExpressionNode]) -> ExpressionAnalysis {
    ExpressionAnalysis::merge(
        nodes
            .iter()
            .map(|node| analyze_node(resolver, node))
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FunctionArg;
    use crate::core::Value;

    fn call(name: &str, args: Vec<ExpressionNode>) -> ExpressionNode {
        ExpressionNode::call(ExpressionNode::identifier(name), args)
    }

    #[test]
    fn test_identifier_errors_need_a_context() {
        let tree = ExpressionNode::identifier("a");
        assert!(ExpressionAnalyzer::new().analyze(&tree).errors.is_empty());

        let analysis = ExpressionAnalyzer::new()
            .with_context(Context::new())
            .analyze(&tree);
        assert_eq!(
            analysis.errors,
            vec![ExpressionError::NotFound {
                name: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_compound() {
        let analysis = ExpressionAnalyzer::new().analyze(&ExpressionNode::compound(vec![]));
        assert!(analysis.function_calls.is_empty());
        assert_eq!(analysis.errors, vec![ExpressionError::EmptyCompound]);
    }

    #[test]
    fn test_nested_calls_are_listed_twice() {
        // a(b())
        let tree = call("a", vec![call("b", vec![])]);
        let analysis = ExpressionAnalyzer::new().analyze(&tree);

        let names: Vec<_> = analysis.function_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(
            analysis.function_calls[0].args[0].as_call().map(|c| c.name.as_str()),
            Some("b")
        );
    }

    #[test]
    fn test_literal_arguments() {
        // c(1, 2)
        let tree = call(
            "c",
            vec![ExpressionNode::literal(1), ExpressionNode::literal(2)],
        );
        let analysis = ExpressionAnalyzer::new().analyze(&tree);
        assert_eq!(
            analysis.function_calls[0].args,
            vec![
                FunctionArg::Value(Value::from(1)),
                FunctionArg::Value(Value::from(2))
            ]
        );
    }
}
