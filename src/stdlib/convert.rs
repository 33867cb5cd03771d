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

//! `Convert` namespace

use crate::core::{Namespace, Value};
use crate::registry::{ArgType, FunctionSignature, SignatureTable};

/// Build the `Convert` namespace
pub fn convert_namespace() -> Namespace {
    Namespace::new()
        .with(
            "toString",
            Value::function("toString", |args| {
                Ok(Value::String(args.first().cloned().unwrap_or_default().to_string()))
            }),
        )
        .with(
            "toNumber",
            Value::function("toNumber", |args| {
                Ok(Value::Number(to_number(args.first().unwrap_or(&Value::Undefined))))
            }),
        )
}

/// Signatures of the `Convert` namespace, keyed `Convert.<name>`
pub fn convert_signatures() -> SignatureTable {
    ["toString", "toNumber"]
        .into_iter()
        .map(|name| {
            (
                format!("Convert.{name}"),
                FunctionSignature::new(vec![ArgType::Any])
                    .with_name(name)
                    .with_path(["Convert"]),
            )
        })
        .collect()
}

/// Numeric conversion of any value
///
/// Strings are trimmed; an empty string is `0` and unparsable text is NaN.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Number(n) => *n,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => parse_number(s),
        Value::Array(_) => parse_number(&value.to_string()),
        Value::Namespace(_) | Value::Function(_) | Value::Pattern(_) => f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&text[2..], radix).map_or(f64::NAN, |n| n as f64);
    }

    let numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !numeric {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}
