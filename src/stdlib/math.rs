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

//! `Math` namespace
//!
//! Numeric helpers following the usual `Math` semantics. Functions over a
//! list (`hypot`, `max`, `min`, `sum`, `avg`) take one array argument.
//! `random` is the only function whose result is not determined by its
//! arguments.

use crate::core::{ExpressionError, Namespace, Result, Value};
use crate::evaluator::operators::{to_int32, to_uint32};
use crate::registry::{ArgType, FunctionSignature, SignatureTable};

const NULLARY: &[(&str, fn() -> f64)] = &[("random", random)];

const UNARY: &[(&str, fn(f64) -> f64)] = &[
    ("abs", f64::abs),
    ("acos", f64::acos),
    ("acosh", f64::acosh),
    ("asin", f64::asin),
    ("asinh", f64::asinh),
    ("atan", f64::atan),
    ("atanh", f64::atanh),
    ("cbrt", f64::cbrt),
    ("ceil", f64::ceil),
    ("clz32", clz32),
    ("cos", f64::cos),
    ("cosh", f64::cosh),
    ("exp", f64::exp),
    ("expm1", f64::exp_m1),
    ("floor", f64::floor),
    ("fround", fround),
    ("log", f64::ln),
    ("log1p", f64::ln_1p),
    ("log10", f64::log10),
    ("log2", f64::log2),
    ("round", round),
    ("sign", sign),
    ("sin", f64::sin),
    ("sinh", f64::sinh),
    ("sqrt", f64::sqrt),
    ("tan", f64::tan),
    ("tanh", f64::tanh),
    ("trunc", f64::trunc),
];

const BINARY: &[(&str, fn(f64, f64) -> f64)] = &[("atan2", f64::atan2), ("imul", imul), ("pow", pow)];

const LIST: &[(&str, fn(&[f64]) -> f64)] = &[
    ("hypot", hypot),
    ("max", max),
    ("min", min),
    ("sum", sum),
    ("avg", avg),
];

/// Build the `Math` namespace
pub fn math_namespace() -> Namespace {
    let mut ns = Namespace::new();
    for &(name, f) in NULLARY {
        ns.insert(name, Value::function(name, move |_| Ok(Value::Number(f()))));
    }
    for &(name, f) in UNARY {
        ns.insert(
            name,
            Value::function(name, move |args| Ok(Value::Number(f(number_arg(name, args, 0)?)))),
        );
    }
    for &(name, f) in BINARY {
        ns.insert(
            name,
            Value::function(name, move |args| {
                Ok(Value::Number(f(
                    number_arg(name, args, 0)?,
                    number_arg(name, args, 1)?,
                )))
            }),
        );
    }
    for &(name, f) in LIST {
        ns.insert(
            name,
            Value::function(name, move |args| Ok(Value::Number(f(&number_list(name, args)?)))),
        );
    }
    ns
}

/// Signatures of the `Math` namespace, keyed `Math.<name>`
pub fn math_signatures() -> SignatureTable {
    let nullary = NULLARY.iter().map(|&(name, _)| (name, Vec::<ArgType>::new()));
    let unary = UNARY
        .iter()
        .map(|&(name, _)| (name, vec![ArgType::Number]));
    let binary = BINARY
        .iter()
        .map(|&(name, _)| (name, vec![ArgType::Number, ArgType::Number]));
    let list = LIST
        .iter()
        .map(|&(name, _)| (name, vec![ArgType::NumberArray]));

    nullary
        .chain(unary)
        .chain(binary)
        .chain(list)
        .map(|(name, args)| {
            (
                format!("Math.{name}"),
                FunctionSignature::new(args)
                    .with_name(name)
                    .with_path(["Math"]),
            )
        })
        .collect()
}

fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        other => Err(ExpressionError::function_failed(
            format!("Math.{function}"),
            format!(
                "argument {} must be a number (got {})",
                index + 1,
                other.map_or("undefined", Value::type_name)
            ),
        )),
    }
}

fn number_list(function: &str, args: &[Value]) -> Result<Vec<f64>> {
    let items = match args.first() {
        Some(Value::Array(items)) => items,
        other => {
            return Err(ExpressionError::function_failed(
                format!("Math.{function}"),
                format!(
                    "argument 1 must be an array of numbers (got {})",
                    other.map_or("undefined", Value::type_name)
                ),
            ));
        }
    };

    items
        .iter()
        .map(|item| {
            item.as_number().ok_or_else(|| {
                ExpressionError::function_failed(
                    format!("Math.{function}"),
                    format!("array element must be a number (got {})", item.type_name()),
                )
            })
        })
        .collect()
}

/// Uniform in `[0, 1)`
fn random() -> f64 {
    rand::random::<f64>()
}

/// Round half up, towards positive infinity
fn round(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 { x } else { x.signum() }
}

fn clz32(x: f64) -> f64 {
    f64::from(to_uint32(x).leading_zeros())
}

fn fround(x: f64) -> f64 {
    f64::from(x as f32)
}

fn imul(a: f64, b: f64) -> f64 {
    f64::from(to_int32(a).wrapping_mul(to_int32(b)))
}

fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn hypot(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_infinite()) {
        return f64::INFINITY;
    }
    values.iter().fold(0.0, |acc, v| acc.hypot(*v))
}

fn max(values: &[f64]) -> f64 {
    values.iter().fold(f64::NEG_INFINITY, |acc, &v| {
        if acc.is_nan() || v.is_nan() { f64::NAN } else { acc.max(v) }
    })
}

fn min(values: &[f64]) -> f64 {
    values.iter().fold(f64::INFINITY, |acc, &v| {
        if acc.is_nan() || v.is_nan() { f64::NAN } else { acc.min(v) }
    })
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn avg(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ArgSpec, PathKey};
    use rstest::rstest;

    #[rstest]
    #[case(2.5, 3.0)]
    #[case(-2.5, -2.0)]
    #[case(0.49999999999999994, 0.0)]
    #[case(-0.4, -0.0)]
    fn test_round_half_up(#[case] x: f64, #[case] expected: f64) {
        assert_eq!(round(x), expected);
    }

    #[test]
    fn test_list_helpers() {
        assert_eq!(max(&[1.0, 5.0, 3.0]), 5.0);
        assert_eq!(max(&[]), f64::NEG_INFINITY);
        assert!(min(&[1.0, f64::NAN]).is_nan());
        assert_eq!(sum(&[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(avg(&[1.0, 2.0, 3.0]), 2.0);
        assert!(avg(&[]).is_nan());
        assert_eq!(hypot(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_small_helpers() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(clz32(1.0), 31.0);
        assert_eq!(imul(3.0, 4.0), 12.0);
        assert!(pow(1.0, f64::INFINITY).is_nan());
        assert_eq!(pow(2.0, 10.0), 1024.0);
    }

    #[tokio::test]
    async fn test_random_stays_in_unit_interval() {
        let ns = Value::from(math_namespace());
        let Value::Function(random) = ns.get_member(&"random".into()) else {
            panic!("random is a function");
        };
        for _ in 0..100 {
            let n = random.invoke(vec![]).await.unwrap().as_number().unwrap();
            assert!((0.0..1.0).contains(&n));
        }

        let table = math_signatures();
        let signature = table.get("Math.random").unwrap();
        assert!(matches!(&signature.args, ArgSpec::Positional(types) if types.is_empty()));
        assert_eq!(signature.required_args(), 0);
        assert_eq!(signature.path, vec![PathKey::from("Math")]);
    }

    #[test]
    fn test_signatures_cover_namespace() {
        let ns = math_namespace();
        let table = math_signatures();
        assert_eq!(ns.len(), table.len());
        for (key, signature) in table.iter() {
            let name = signature.name.as_deref().unwrap_or(key);
            assert!(ns.contains_key(name), "missing {name}");
            assert_eq!(key, &format!("Math.{name}"));
        }
    }

    #[test]
    fn test_argument_errors() {
        assert!(matches!(
            number_arg("abs", &[Value::from("1")], 0),
            Err(ExpressionError::FunctionFailed { .. })
        ));
        assert!(number_list("max", &[Value::from(1)]).is_err());
        assert_eq!(
            number_list("max", &[Value::array(vec![Value::from(1), Value::from(2)])]),
            Ok(vec![1.0, 2.0])
        );
    }
}
