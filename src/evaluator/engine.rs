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

//! Expression evaluator implementation
//!
//! Independent sub-trees (binary operands, array elements, a call's callee and
//! arguments, a computed member's object and key) are evaluated concurrently
//! and joined before use. Only logical short-circuiting, conditional branch
//! selection and compound sequencing impose an order. The first fault wins.

use futures::future::{BoxFuture, FutureExt, try_join, try_join_all};
use log::{debug, trace};

use super::operators::{apply_binary, apply_unary};
use super::options::EvaluatorOptions;
use super::result::EvaluationResult;
use crate::ast::{
    ArrayNode, BinaryNode, CallNode, CompoundNode, ConditionalNode, ExpressionNode, LogicalNode,
    LogicalOperator, MemberNode, UnaryNode,
};
use crate::core::{Context, ExpressionError, PropertyKey, Result, Value};
use crate::policy::{AccessPolicy, read_member};

/// Executes expression trees against a context under an access policy
#[derive(Debug, Clone, Default)]
pub struct ExpressionEvaluator {
    options: EvaluatorOptions,
}

impl ExpressionEvaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self { options }
    }

    pub fn context(&self) -> &Context {
        &self.options.context
    }

    pub fn policy(&self) -> Option<&AccessPolicy> {
        self.options.policy.as_ref()
    }

    /// Evaluate a tree to a value
    ///
    /// Fails on the first fault anywhere in the tree; no partial value is
    /// returned.
    pub async fn evaluate(&self, expression: &ExpressionNode) -> Result<EvaluationResult> {
        debug!("Evaluating {} expression", expression.node_type());

        match self.evaluate_node(expression).await {
            Ok(result) => {
                debug!(
                    "Evaluation finished: {} nodes, {} function calls",
                    result.node_count, result.function_call_count
                );
                Ok(result)
            }
            Err(err) => {
                debug!("Evaluation failed: {err}");
                Err(err)
            }
        }
    }

    /// Load a parser-produced JSON tree and evaluate it
    pub async fn evaluate_json(&self, tree: &serde_json::Value) -> Result<EvaluationResult> {
        let expression = ExpressionNode::from_json(tree)?;
        self.evaluate(&expression).await
    }

    fn evaluate_node<'a>(&'a self, node: &'a ExpressionNode) -> BoxFuture<'a, Result<EvaluationResult>> {
        async move {
            match node {
                ExpressionNode::Array(array) => self.evaluate_array(array).await,
                ExpressionNode::Binary(binary) => self.evaluate_binary(binary).await,
                ExpressionNode::Call(call) => self.evaluate_call(call).await,
                ExpressionNode::Compound(compound) => self.evaluate_compound(compound).await,
                ExpressionNode::Conditional(conditional) => {
                    self.evaluate_conditional(conditional).await
                }
                ExpressionNode::Identifier(identifier) => self.evaluate_identifier(&identifier.name),
                ExpressionNode::Literal(literal) => {
                    Ok(EvaluationResult::leaf(literal.value.to_value()))
                }
                ExpressionNode::Logical(logical) => self.evaluate_logical(logical).await,
                ExpressionNode::Member(member) => self.evaluate_member(member).await,
                ExpressionNode::This => Ok(EvaluationResult {
                    value: self.options.context.as_value(),
                    node_count: 0,
                    function_call_count: 0,
                }),
                ExpressionNode::Unary(unary) => self.evaluate_unary(unary).await,
            }
        }
        .boxed()
    }

    async fn evaluate_array(&self, node: &ArrayNode) -> Result<EvaluationResult> {
        let elements = try_join_all(node.elements.iter().map(|e| self.evaluate_node(e))).await?;

        let mut result = EvaluationResult::leaf(Value::Undefined);
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            result.node_count += element.node_count;
            result.function_call_count += element.function_call_count;
            values.push(element.value);
        }
        result.value = Value::from(values);
        Ok(result)
    }

    async fn evaluate_binary(&self, node: &BinaryNode) -> Result<EvaluationResult> {
        let (left, right) =
            try_join(self.evaluate_node(&node.left), self.evaluate_node(&node.right)).await?;

        Ok(EvaluationResult {
            value: apply_binary(&node.operator, &left.value, &right.value)?,
            node_count: 1 + left.node_count + right.node_count,
            function_call_count: left.function_call_count + right.function_call_count,
        })
    }

    async fn evaluate_call(&self, node: &CallNode) -> Result<EvaluationResult> {
        let (callee, args) = try_join(
            self.evaluate_node(&node.callee),
            try_join_all(node.arguments.iter().map(|a| self.evaluate_node(a))),
        )
        .await?;

        let Value::Function(callable) = &callee.value else {
            return Err(ExpressionError::NotCallable {
                type_name: callee.value.type_name(),
            });
        };

        let mut node_count = 1 + callee.node_count;
        let mut function_call_count = 1 + callee.function_call_count;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            node_count += arg.node_count;
            function_call_count += arg.function_call_count;
            values.push(arg.value);
        }

        trace!("Calling {} with {} arguments", callable.name(), values.len());
        let value = callable.invoke(values).await?;

        Ok(EvaluationResult {
            value,
            node_count,
            function_call_count,
        })
    }

    async fn evaluate_compound(&self, node: &CompoundNode) -> Result<EvaluationResult> {
        let mut last: Option<EvaluationResult> = None;
        let mut function_call_count = 0;

        for item in &node.body {
            let result = self.evaluate_node(item).await?;
            function_call_count += result.function_call_count;
            last = Some(result);
        }

        let mut result = last.ok_or(ExpressionError::EmptyCompound)?;
        result.node_count += node.body.len();
        result.function_call_count = function_call_count;
        Ok(result)
    }

    async fn evaluate_conditional(&self, node: &ConditionalNode) -> Result<EvaluationResult> {
        let test = self.evaluate_node(&node.test).await?;
        let branch = if test.value.is_truthy() {
            &node.consequent
        } else {
            &node.alternate
        };
        let result = self.evaluate_node(branch).await?;

        Ok(EvaluationResult {
            value: result.value,
            node_count: 1 + test.node_count + result.node_count,
            function_call_count: test.function_call_count + result.function_call_count,
        })
    }

    fn evaluate_identifier(&self, name: &str) -> Result<EvaluationResult> {
        self.options
            .context
            .get(name)
            .map(|value| EvaluationResult::leaf(value.clone()))
            .ok_or_else(|| ExpressionError::NotFound {
                name: name.to_string(),
            })
    }

    async fn evaluate_logical(&self, node: &LogicalNode) -> Result<EvaluationResult> {
        let left = self.evaluate_node(&node.left).await?;
        let op = LogicalOperator::from_symbol(&node.operator)
            .ok_or_else(|| ExpressionError::unknown_operator(&node.operator))?;

        let needs_right = match op {
            LogicalOperator::And => left.value.is_truthy(),
            LogicalOperator::Or => !left.value.is_truthy(),
        };

        if !needs_right {
            return Ok(EvaluationResult {
                value: left.value,
                node_count: 1 + left.node_count,
                function_call_count: left.function_call_count,
            });
        }

        let right = self.evaluate_node(&node.right).await?;
        Ok(EvaluationResult {
            value: right.value,
            node_count: 1 + left.node_count + right.node_count,
            function_call_count: left.function_call_count + right.function_call_count,
        })
    }

    async fn evaluate_member(&self, node: &MemberNode) -> Result<EvaluationResult> {
        let property = async {
            if node.computed {
                return self.evaluate_node(&node.property).await;
            }
            match node.property.as_identifier() {
                Some(name) => Ok(EvaluationResult::leaf(Value::from(name))),
                None => Err(ExpressionError::InvalidNodeKind {
                    kind: node.property.node_type().to_string(),
                }),
            }
        };
        let (object, property) = try_join(self.evaluate_node(&node.object), property).await?;

        if object.value.is_undefined() {
            return Err(ExpressionError::NullIndex {
                type_name: object.value.type_name(),
            });
        }

        let key = match property.value {
            Value::String(s) => PropertyKey::String(s),
            Value::Number(n) => PropertyKey::Number(n),
            other => {
                return Err(ExpressionError::InvalidIndexType {
                    type_name: other.type_name(),
                });
            }
        };

        Ok(EvaluationResult {
            value: read_member(self.policy(), &object.value, &key)?,
            node_count: 1 + object.node_count + property.node_count,
            function_call_count: object.function_call_count + property.function_call_count,
        })
    }

    async fn evaluate_unary(&self, node: &UnaryNode) -> Result<EvaluationResult> {
        let result = self.evaluate_node(&node.argument).await?;

        Ok(EvaluationResult {
            value: apply_unary(&node.operator, &result.value)?,
            node_count: 1 + result.node_count,
            function_call_count: result.function_call_count,
        })
    }
}
