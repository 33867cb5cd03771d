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

//! Partial resolver
//!
//! Mirrors the evaluator for the node kinds that can be resolved without
//! executing anything: literals, identifiers, member chains, arrays and call
//! sites. Everything else resolves to [`RuntimeValue`]. The resolver never
//! fails; problems go to an optional error sink, at most once per node.

use rustc_hash::FxHashSet;

use super::analysis::{FunctionArg, FunctionCall, PathSegment, RuntimeValue};
use crate::ast::{ArrayNode, CallNode, ExpressionNode, MemberNode};
use crate::core::{Context, ExpressionError, PropertyKey, Value};
use crate::policy::{AccessPolicy, read_member};

/// Static resolver scoped to a single analysis run
pub struct PartialResolver<'a> {
    context: Option<&'a Context>,
    policy: Option<&'a AccessPolicy>,
    reported: FxHashSet<*const ExpressionNode>,
}

impl<'a> PartialResolver<'a> {
    pub fn new(context: Option<&'a Context>, policy: Option<&'a AccessPolicy>) -> Self {
        Self {
            context,
            policy,
            reported: FxHashSet::default(),
        }
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Resolve a node to a value, a call descriptor or [`RuntimeValue`]
    pub fn resolve(
        &mut self,
        node: &ExpressionNode,
        errors: Option<&mut Vec<ExpressionError>>,
    ) -> FunctionArg {
        match node {
            ExpressionNode::Literal(literal) => FunctionArg::Value(literal.value.to_value()),
            ExpressionNode::Identifier(identifier) => {
                self.resolve_identifier(node, &identifier.name, errors)
            }
            ExpressionNode::Member(member) => self.resolve_member(node, member, errors),
            ExpressionNode::Array(array) => self.resolve_array(array),
            ExpressionNode::Call(call) => self
                .resolve_call(call)
                .map_or_else(FunctionArg::runtime, FunctionArg::Call),
            _ => FunctionArg::runtime(),
        }
    }

    /// Describe a call site without executing it
    ///
    /// Returns `None` when the callee chain does not end in a name.
    pub fn resolve_call(&mut self, call: &CallNode) -> Option<FunctionCall> {
        let mut path = self.resolve_call_path(&call.callee);
        let name = match path.pop() {
            Some(PathSegment::String(name)) => name,
            _ => return None,
        };

        let args = call
            .arguments
            .iter()
            .map(|arg| self.resolve(arg, None))
            .collect();

        Some(FunctionCall { name, args, path })
    }

    /// Walk a callee chain from the outermost member to the root identifier
    ///
    /// A segment that cannot be resolved replaces itself and everything
    /// inside it with a single leading runtime marker.
    fn resolve_call_path(&mut self, node: &ExpressionNode) -> Vec<PathSegment> {
        match node {
            ExpressionNode::Identifier(identifier) => {
                vec![PathSegment::String(identifier.name.clone())]
            }
            ExpressionNode::Member(member) => {
                let current = self.resolve_member_key(member);
                if current.is_runtime() {
                    return vec![current];
                }
                let mut path = self.resolve_call_path(&member.object);
                path.push(current);
                path
            }
            _ => vec![PathSegment::Runtime(RuntimeValue)],
        }
    }

    fn resolve_member_key(&mut self, member: &MemberNode) -> PathSegment {
        if member.computed {
            return self.resolve_index(&member.property);
        }
        match member.property.as_identifier() {
            Some(name) => PathSegment::String(name.to_string()),
            None => PathSegment::Runtime(RuntimeValue),
        }
    }

    /// Resolve a computed key; only strings, numbers and booleans count
    fn resolve_index(&mut self, node: &ExpressionNode) -> PathSegment {
        match self.resolve(node, None) {
            FunctionArg::Value(value) => {
                PathSegment::from_value(&value).unwrap_or(PathSegment::Runtime(RuntimeValue))
            }
            _ => PathSegment::Runtime(RuntimeValue),
        }
    }

    /// Own-key lookup in the context
    ///
    /// Without a context nothing can be judged, so no error is reported.
    pub fn resolve_identifier(
        &mut self,
        node: &ExpressionNode,
        name: &str,
        errors: Option<&mut Vec<ExpressionError>>,
    ) -> FunctionArg {
        let Some(context) = self.context else {
            return FunctionArg::runtime();
        };

        match context.get(name) {
            Some(value) => FunctionArg::Value(value.clone()),
            None => {
                self.report(
                    node,
                    errors,
                    ExpressionError::NotFound {
                        name: name.to_string(),
                    },
                );
                FunctionArg::runtime()
            }
        }
    }

    /// Resolve a member chain through the access policy
    pub fn resolve_member(
        &mut self,
        node: &ExpressionNode,
        member: &MemberNode,
        mut errors: Option<&mut Vec<ExpressionError>>,
    ) -> FunctionArg {
        if self.context.is_none() {
            return FunctionArg::runtime();
        }

        let key = match self.resolve_member_key(member) {
            PathSegment::String(s) => PropertyKey::String(s),
            PathSegment::Number(n) => PropertyKey::Number(n),
            PathSegment::Boolean(_) => {
                self.report(
                    node,
                    errors,
                    ExpressionError::InvalidIndexType {
                        type_name: "boolean",
                    },
                );
                return FunctionArg::runtime();
            }
            PathSegment::Runtime(_) => return FunctionArg::runtime(),
        };

        // The root identifier reports its own lookup errors when the tree
        // walk reaches it.
        let container = match member.object.as_ref() {
            ExpressionNode::Member(inner) => {
                self.resolve_member(&member.object, inner, errors.as_deref_mut())
            }
            ExpressionNode::Identifier(identifier) => {
                self.resolve_identifier(&member.object, &identifier.name, None)
            }
            _ => return FunctionArg::runtime(),
        };

        let container = match container {
            FunctionArg::Value(value) if !value.is_undefined() => value,
            _ => return FunctionArg::runtime(),
        };

        match read_member(self.policy, &container, &key) {
            Ok(value) => FunctionArg::Value(value),
            Err(err) => {
                self.report(node, errors, err);
                FunctionArg::runtime()
            }
        }
    }

    /// Resolve every element; any unresolvable element makes the whole array
    /// unresolvable
    fn resolve_array(&mut self, array: &ArrayNode) -> FunctionArg {
        let mut items = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            let item = self.resolve(element, None);
            if item.is_runtime() {
                return item;
            }
            items.push(item);
        }

        if items.iter().all(|item| matches!(item, FunctionArg::Value(_))) {
            let values = items.into_iter().filter_map(|item| match item {
                FunctionArg::Value(value) => Some(value),
                _ => None,
            });
            FunctionArg::Value(Value::array(values))
        } else {
            FunctionArg::Array(items)
        }
    }

    fn report(
        &mut self,
        node: &ExpressionNode,
        errors: Option<&mut Vec<ExpressionError>>,
        error: ExpressionError,
    ) {
        if let Some(errors) = errors {
            if self.reported.insert(node as *const ExpressionNode) {
                errors.push(error);
            }
        }
    }
}
