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

//! Operator definitions for expression trees
//!
//! The external parser carries operators as text on the nodes. The evaluator
//! maps that text to these enums and reports unknown text as an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic operators
    /// Addition or string concatenation (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Remainder (%)
    Remainder,

    // Bitwise operators
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Bitwise AND (&)
    BitAnd,
    /// Left shift (<<)
    ShiftLeft,
    /// Sign-propagating right shift (>>)
    ShiftRight,
    /// Zero-fill right shift (>>>)
    UnsignedShiftRight,

    // Comparison operators
    /// Less than (<)
    LessThan,
    /// Greater than (>)
    GreaterThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,

    // Equality operators
    /// Equality (==)
    Equal,
    /// Strict equality (===)
    StrictEqual,
    /// Inequality (!=)
    NotEqual,
    /// Strict inequality (!==)
    StrictNotEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Arithmetic negation (-)
    Negate,
    /// Numeric plus (+)
    Plus,
    /// Bitwise NOT (~)
    BitNot,
    /// Logical NOT (!)
    Not,
}

/// Short-circuiting logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
}

impl BinaryOperator {
    /// Check if this operator only accepts numbers
    ///
    /// `+` is excluded: it also accepts two strings.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Self::Add | Self::Equal | Self::StrictEqual | Self::NotEqual | Self::StrictNotEqual
        )
    }

    /// Check if this operator is an equality test
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Equal | Self::StrictEqual | Self::NotEqual | Self::StrictNotEqual
        )
    }

    /// Get the symbol representation of this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::UnsignedShiftRight => ">>>",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
            Self::Equal => "==",
            Self::StrictEqual => "===",
            Self::NotEqual => "!=",
            Self::StrictNotEqual => "!==",
        }
    }

    /// Parse an operator from its symbol
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            "%" => Some(Self::Remainder),
            "|" => Some(Self::BitOr),
            "^" => Some(Self::BitXor),
            "&" => Some(Self::BitAnd),
            "<<" => Some(Self::ShiftLeft),
            ">>" => Some(Self::ShiftRight),
            ">>>" => Some(Self::UnsignedShiftRight),
            "<" => Some(Self::LessThan),
            ">" => Some(Self::GreaterThan),
            "<=" => Some(Self::LessThanOrEqual),
            ">=" => Some(Self::GreaterThanOrEqual),
            "==" => Some(Self::Equal),
            "===" => Some(Self::StrictEqual),
            "!=" => Some(Self::NotEqual),
            "!==" => Some(Self::StrictNotEqual),
            _ => None,
        }
    }
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::BitNot => "~",
            Self::Not => "!",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "-" => Some(Self::Negate),
            "+" => Some(Self::Plus),
            "~" => Some(Self::BitNot),
            "!" => Some(Self::Not),
            _ => None,
        }
    }

    /// Check if this operator only accepts numbers
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Not)
    }
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_parse_back() {
        for symbol in ["+", "%", ">>>", "<=", "===", "!=", "^"] {
            let op = BinaryOperator::from_symbol(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!(BinaryOperator::from_symbol("**"), None);
        assert_eq!(UnaryOperator::from_symbol("~"), Some(UnaryOperator::BitNot));
        assert_eq!(LogicalOperator::from_symbol("??"), None);
    }

    #[test]
    fn test_operator_classes() {
        assert!(!BinaryOperator::Add.is_numeric());
        assert!(BinaryOperator::LessThan.is_numeric());
        assert!(BinaryOperator::StrictNotEqual.is_equality());
        assert!(!UnaryOperator::Not.is_numeric());
    }
}
