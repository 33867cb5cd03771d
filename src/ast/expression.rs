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

//! Expression tree produced by the external parser
//!
//! The node shapes and the `"type"` tags follow the ESTree-style output of
//! common JavaScript expression parsers, so a parser-produced JSON tree loads
//! directly with [`ExpressionNode::from_json`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{ExpressionError, Result, Value, format_number};

/// Any node of an expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExpressionNode {
    /// Array literal (e.g., "[1, a, f()]")
    #[serde(rename = "ArrayExpression")]
    Array(ArrayNode),

    /// Binary operation (e.g., "a + 1", "x === y")
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryNode),

    /// Function call (e.g., "Math.max(a, b)")
    #[serde(rename = "CallExpression")]
    Call(CallNode),

    /// Sequence of expressions (e.g., "a, b, c"); the last one is the result
    Compound(CompoundNode),

    /// Ternary (e.g., "a ? b : c")
    #[serde(rename = "ConditionalExpression")]
    Conditional(ConditionalNode),

    /// Name looked up in the context
    Identifier(IdentifierNode),

    /// Number, string or boolean literal
    Literal(LiteralNode),

    /// Short-circuit operation (e.g., "a && b")
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalNode),

    /// Member read (e.g., "a.b", "a[0]")
    #[serde(rename = "MemberExpression")]
    Member(MemberNode),

    /// The context itself
    #[serde(rename = "ThisExpression")]
    This,

    /// Unary operation (e.g., "-a", "!b")
    #[serde(rename = "UnaryExpression")]
    Unary(UnaryNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayNode {
    pub elements: Vec<ExpressionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryNode {
    /// Operator text as produced by the parser
    pub operator: String,
    pub left: Box<ExpressionNode>,
    pub right: Box<ExpressionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    pub callee: Box<ExpressionNode>,
    pub arguments: Vec<ExpressionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundNode {
    pub body: Vec<ExpressionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalNode {
    pub test: Box<ExpressionNode>,
    pub consequent: Box<ExpressionNode>,
    pub alternate: Box<ExpressionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralNode {
    pub value: LiteralValue,
    /// Source text of the literal, if the parser kept it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalNode {
    pub operator: String,
    pub left: Box<ExpressionNode>,
    pub right: Box<ExpressionNode>,
}

/// Member read
///
/// When `computed` is false the property is an [`ExpressionNode::Identifier`]
/// whose name is the key; otherwise the property is evaluated to get the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberNode {
    pub object: Box<ExpressionNode>,
    pub property: Box<ExpressionNode>,
    #[serde(default)]
    pub computed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryNode {
    pub operator: String,
    pub argument: Box<ExpressionNode>,
    #[serde(default = "default_prefix")]
    pub prefix: bool,
}

fn default_prefix() -> bool {
    true
}

/// Literal payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl LiteralValue {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Boolean(*b),
            Self::Number(n) => Value::Number(*n),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

const NODE_KINDS: &[&str] = &[
    "ArrayExpression",
    "BinaryExpression",
    "CallExpression",
    "Compound",
    "ConditionalExpression",
    "Identifier",
    "Literal",
    "LogicalExpression",
    "MemberExpression",
    "ThisExpression",
    "UnaryExpression",
];

impl ExpressionNode {
    /// Load a parser-produced JSON tree
    ///
    /// An unknown `"type"` tag or a malformed node is reported as
    /// [`ExpressionError::InvalidNodeKind`].
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(json.clone()).map_err(|_| ExpressionError::InvalidNodeKind {
            kind: find_invalid_kind(json).unwrap_or_else(|| describe_kind(json)),
        })
    }

    /// Get the tag name of this node
    pub fn node_type(&self) -> &'static str {
        match self {
            Self::Array(_) => "ArrayExpression",
            Self::Binary(_) => "BinaryExpression",
            Self::Call(_) => "CallExpression",
            Self::Compound(_) => "Compound",
            Self::Conditional(_) => "ConditionalExpression",
            Self::Identifier(_) => "Identifier",
            Self::Literal(_) => "Literal",
            Self::Logical(_) => "LogicalExpression",
            Self::Member(_) => "MemberExpression",
            Self::This => "ThisExpression",
            Self::Unary(_) => "UnaryExpression",
        }
    }

    /// Identifier name, if this node is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(node) => Some(&node.name),
            _ => None,
        }
    }
}

/// First unknown or missing `"type"` tag found in a JSON tree
fn find_invalid_kind(json: &serde_json::Value) -> Option<String> {
    match json {
        serde_json::Value::Object(map) => {
            match map.get("type") {
                Some(serde_json::Value::String(tag)) if !NODE_KINDS.contains(&tag.as_str()) => {
                    return Some(tag.clone());
                }
                Some(serde_json::Value::String(_)) => {}
                _ => return Some(describe_kind(json)),
            }
            map.iter()
                .filter(|(key, _)| key.as_str() != "value")
                .find_map(|(_, child)| find_child_kind(child))
        }
        _ => Some(describe_kind(json)),
    }
}

fn find_child_kind(child: &serde_json::Value) -> Option<String> {
    match child {
        serde_json::Value::Object(_) => find_invalid_kind(child),
        serde_json::Value::Array(items) => items.iter().find_map(find_child_kind),
        _ => None,
    }
}

fn describe_kind(json: &serde_json::Value) -> String {
    match json.get("type") {
        Some(serde_json::Value::String(tag)) => tag.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(n) => {
                write!(f, "[")?;
                write_list(f, &n.elements)?;
                write!(f, "]")
            }
            Self::Binary(n) => write!(f, "{} {} {}", n.left, n.operator, n.right),
            Self::Call(n) => {
                write!(f, "{}(", n.callee)?;
                write_list(f, &n.arguments)?;
                write!(f, ")")
            }
            Self::Compound(n) => write_list(f, &n.body),
            Self::Conditional(n) => {
                write!(f, "{} ? {} : {}", n.test, n.consequent, n.alternate)
            }
            Self::Identifier(n) => write!(f, "{}", n.name),
            Self::Literal(n) => write!(f, "{}", n.value),
            Self::Logical(n) => write!(f, "{} {} {}", n.left, n.operator, n.right),
            Self::Member(n) if n.computed => write!(f, "{}[{}]", n.object, n.property),
            Self::Member(n) => write!(f, "{}.{}", n.object, n.property),
            Self::This => write!(f, "this"),
            Self::Unary(n) => write!(f, "{}{}", n.operator, n.argument),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[ExpressionNode]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

// Convenience constructors
impl ExpressionNode {
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::Literal(LiteralNode {
            value: value.into(),
            raw: None,
        })
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(IdentifierNode { name: name.into() })
    }

    pub fn call(callee: ExpressionNode, arguments: Vec<ExpressionNode>) -> Self {
        Self::Call(CallNode {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// Dot access (e.g., "a.b")
    pub fn member(object: ExpressionNode, property: impl Into<String>) -> Self {
        Self::Member(MemberNode {
            object: Box::new(object),
            property: Box::new(Self::identifier(property)),
            computed: false,
        })
    }

    /// Bracket access (e.g., "a[b]")
    pub fn computed_member(object: ExpressionNode, property: ExpressionNode) -> Self {
        Self::Member(MemberNode {
            object: Box::new(object),
            property: Box::new(property),
            computed: true,
        })
    }

    pub fn binary(operator: impl Into<String>, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Binary(BinaryNode {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn logical(operator: impl Into<String>, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Logical(LogicalNode {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(operator: impl Into<String>, argument: ExpressionNode) -> Self {
        Self::Unary(UnaryNode {
            operator: operator.into(),
            argument: Box::new(argument),
            prefix: true,
        })
    }

    pub fn conditional(
        test: ExpressionNode,
        consequent: ExpressionNode,
        alternate: ExpressionNode,
    ) -> Self {
        Self::Conditional(ConditionalNode {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    pub fn compound(body: Vec<ExpressionNode>) -> Self {
        Self::Compound(CompoundNode { body })
    }

    pub fn array(elements: Vec<ExpressionNode>) -> Self {
        Self::Array(ArrayNode { elements })
    }

    pub fn this() -> Self {
        Self::This
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_construction() {
        let expr = ExpressionNode::call(
            ExpressionNode::member(ExpressionNode::identifier("a"), "b"),
            vec![ExpressionNode::literal(1), ExpressionNode::literal("x")],
        );
        assert_eq!(expr.node_type(), "CallExpression");
        assert_eq!(expr.to_string(), "a.b(1, \"x\")");
    }

    #[test]
    fn test_from_json() {
        let tree = json!({
            "type": "MemberExpression",
            "computed": true,
            "object": {"type": "Identifier", "name": "a"},
            "property": {"type": "Literal", "value": 0, "raw": "0"}
        });
        let expr = ExpressionNode::from_json(&tree).unwrap();
        assert_eq!(
            expr,
            ExpressionNode::Member(MemberNode {
                object: Box::new(ExpressionNode::identifier("a")),
                property: Box::new(ExpressionNode::Literal(LiteralNode {
                    value: LiteralValue::Number(0.0),
                    raw: Some("0".to_string()),
                })),
                computed: true,
            })
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_kinds() {
        let tree = json!({
            "type": "BinaryExpression",
            "operator": "+",
            "left": {"type": "Literal", "value": 1},
            "right": {"type": "ArrowFunctionExpression", "body": []}
        });
        assert_eq!(
            ExpressionNode::from_json(&tree),
            Err(ExpressionError::InvalidNodeKind {
                kind: "ArrowFunctionExpression".to_string()
            })
        );

        let err = ExpressionNode::from_json(&json!({"name": "a"})).unwrap_err();
        assert_eq!(err.error_code(), crate::core::error::EX0041);
    }

    #[test]
    fn test_this_and_compound() {
        let expr = ExpressionNode::from_json(&json!({
            "type": "Compound",
            "body": [{"type": "ThisExpression"}, {"type": "Literal", "value": true}]
        }))
        .unwrap();
        assert_eq!(
            expr,
            ExpressionNode::compound(vec![ExpressionNode::this(), ExpressionNode::literal(true)])
        );
        assert_eq!(expr.to_string(), "this, true");
    }
}
