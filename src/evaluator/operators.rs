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

//! Binary and unary operator semantics
//!
//! Arithmetic, comparison and bitwise operators need two numbers; `+` also
//! concatenates two strings. Equality is strict. Bitwise operators work on the
//! 32-bit integer conversion of their operands.

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::core::{ExpressionError, Result, Value};

/// Apply a binary operator given as parser text
pub fn apply_binary(operator: &str, left: &Value, right: &Value) -> Result<Value> {
    let op = BinaryOperator::from_symbol(operator)
        .ok_or_else(|| ExpressionError::unknown_operator(operator))?;

    if op.is_equality() {
        let equal = left.strict_equals(right);
        return Ok(Value::Boolean(match op {
            BinaryOperator::Equal | BinaryOperator::StrictEqual => equal,
            _ => !equal,
        }));
    }

    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(numeric(op, *l, *r)),
        (Value::String(l), Value::String(r)) if !op.is_numeric() => {
            Ok(Value::String(format!("{l}{r}")))
        }
        _ if !op.is_numeric() => Err(ExpressionError::type_mismatch(
            operator,
            format!(
                "can only be applied to 2 numbers or 2 strings (got {} and {})",
                left.type_name(),
                right.type_name()
            ),
        )),
        _ => Err(ExpressionError::type_mismatch(
            operator,
            format!(
                "cannot be applied to non-number (got {} and {})",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn numeric(op: BinaryOperator, l: f64, r: f64) -> Value {
    match op {
        BinaryOperator::Add => Value::Number(l + r),
        BinaryOperator::Subtract => Value::Number(l - r),
        BinaryOperator::Multiply => Value::Number(l * r),
        BinaryOperator::Divide => Value::Number(l / r),
        BinaryOperator::Remainder => Value::Number(l % r),
        BinaryOperator::BitOr => int32_result(to_int32(l) | to_int32(r)),
        BinaryOperator::BitXor => int32_result(to_int32(l) ^ to_int32(r)),
        BinaryOperator::BitAnd => int32_result(to_int32(l) & to_int32(r)),
        BinaryOperator::ShiftLeft => int32_result(to_int32(l).wrapping_shl(shift_count(r))),
        BinaryOperator::ShiftRight => int32_result(to_int32(l).wrapping_shr(shift_count(r))),
        BinaryOperator::UnsignedShiftRight => {
            Value::Number(f64::from(to_uint32(l).wrapping_shr(shift_count(r))))
        }
        BinaryOperator::LessThan => Value::Boolean(l < r),
        BinaryOperator::GreaterThan => Value::Boolean(l > r),
        BinaryOperator::LessThanOrEqual => Value::Boolean(l <= r),
        BinaryOperator::GreaterThanOrEqual => Value::Boolean(l >= r),
        // Equality is handled before operand types are inspected
        BinaryOperator::Equal | BinaryOperator::StrictEqual => Value::Boolean(l == r),
        BinaryOperator::NotEqual | BinaryOperator::StrictNotEqual => Value::Boolean(l != r),
    }
}

/// Apply a unary operator given as parser text
pub fn apply_unary(operator: &str, value: &Value) -> Result<Value> {
    let op = UnaryOperator::from_symbol(operator)
        .ok_or_else(|| ExpressionError::unknown_operator(operator))?;

    if !op.is_numeric() {
        return Ok(Value::Boolean(!value.is_truthy()));
    }

    let n = value.as_number().ok_or_else(|| {
        ExpressionError::type_mismatch(
            operator,
            format!("cannot be applied to non-number (got {})", value.type_name()),
        )
    })?;

    Ok(match op {
        UnaryOperator::Negate => Value::Number(-n),
        UnaryOperator::BitNot => int32_result(!to_int32(n)),
        UnaryOperator::Plus | UnaryOperator::Not => Value::Number(n),
    })
}

/// Wrap a number onto the signed 32-bit range
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// Wrap a number onto the unsigned 32-bit range
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn shift_count(n: f64) -> u32 {
    to_uint32(n) & 0x1f
}

fn int32_result(n: i32) -> Value {
    Value::Number(f64::from(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("+", 1.0, 2.0, 3.0)]
    #[case("-", 1.0, 2.0, -1.0)]
    #[case("*", 3.0, 4.0, 12.0)]
    #[case("/", 1.0, 4.0, 0.25)]
    #[case("%", -7.0, 3.0, -1.0)]
    #[case("|", 5.0, 2.0, 7.0)]
    #[case("^", 6.0, 3.0, 5.0)]
    #[case("&", 6.0, 3.0, 2.0)]
    #[case("<<", 1.0, 33.0, 2.0)]
    #[case(">>", -8.0, 1.0, -4.0)]
    #[case(">>>", -1.0, 0.0, 4_294_967_295.0)]
    #[case("|", 4_294_967_297.0, 0.0, 1.0)]
    fn test_numeric_operators(
        #[case] op: &str,
        #[case] l: f64,
        #[case] r: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(
            apply_binary(op, &Value::Number(l), &Value::Number(r)),
            Ok(Value::Number(expected))
        );
    }

    #[rstest]
    #[case("<", 1.0, 2.0, true)]
    #[case(">=", 2.0, 2.0, true)]
    #[case(">", f64::NAN, 0.0, false)]
    #[case("===", f64::NAN, f64::NAN, false)]
    #[case("!=", 1.0, 2.0, true)]
    fn test_comparisons(#[case] op: &str, #[case] l: f64, #[case] r: f64, #[case] expected: bool) {
        assert_eq!(
            apply_binary(op, &Value::Number(l), &Value::Number(r)),
            Ok(Value::Boolean(expected))
        );
    }

    #[test]
    fn test_string_concatenation_and_mismatch() {
        assert_eq!(
            apply_binary("+", &Value::from("a"), &Value::from("b")),
            Ok(Value::from("ab"))
        );
        assert!(matches!(
            apply_binary("+", &Value::from(1), &Value::from("a")),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            apply_binary("-", &Value::from("a"), &Value::from("b")),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_only_plus_accepts_strings() {
        let err = apply_binary("+", &Value::from(true), &Value::from(1)).unwrap_err();
        assert!(err.to_string().contains("2 numbers or 2 strings (got boolean and number)"));

        let err = apply_binary("<", &Value::from("a"), &Value::from("b")).unwrap_err();
        assert!(err.to_string().contains("non-number (got string and string)"));

        assert_eq!(apply_unary("!", &Value::from(0)), Ok(Value::from(true)));
        assert!(apply_unary("~", &Value::from(true)).is_err());
    }

    #[test]
    fn test_equality_is_strict() {
        assert_eq!(
            apply_binary("==", &Value::from(1), &Value::from("1")),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            apply_binary("!==", &Value::Undefined, &Value::Undefined),
            Ok(Value::Boolean(false))
        );
    }

    #[test]
    fn test_unknown_operators() {
        assert_eq!(
            apply_binary("**", &Value::from(1), &Value::from(2)),
            Err(ExpressionError::unknown_operator("**"))
        );
        assert_eq!(
            apply_unary("typeof", &Value::from(1)),
            Err(ExpressionError::unknown_operator("typeof"))
        );
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(apply_unary("-", &Value::from(2)), Ok(Value::from(-2)));
        assert_eq!(apply_unary("~", &Value::from(5)), Ok(Value::from(-6)));
        assert_eq!(apply_unary("!", &Value::from("")), Ok(Value::from(true)));
        assert!(apply_unary("+", &Value::from("1")).is_err());
    }
}
