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

//! `String` namespace

use crate::core::{ExpressionError, Namespace, Pattern, Result, Value};
use crate::registry::{ArgType, FunctionSignature, SignatureTable};

/// Build the `String` namespace
pub fn string_namespace() -> Namespace {
    Namespace::new().with("regex", Value::function("regex", regex))
}

/// Signatures of the `String` namespace, keyed `String.<name>`
pub fn string_signatures() -> SignatureTable {
    [(
        "String.regex".to_string(),
        FunctionSignature::new(vec![ArgType::String, ArgType::String])
            .with_name("regex")
            .with_path(["String"])
            .with_required_args(1),
    )]
    .into_iter()
    .collect()
}

/// `regex(pattern, flags?)`
fn regex(args: &[Value]) -> Result<Value> {
    let failed = |message: String| ExpressionError::function_failed("String.regex", message);

    let source = match args.first() {
        Some(Value::String(source)) => source,
        other => {
            return Err(failed(format!(
                "argument 1 must be a string (got {})",
                other.map_or("undefined", Value::type_name)
            )));
        }
    };
    let flags = match args.get(1) {
        None | Some(Value::Undefined) => "",
        Some(Value::String(flags)) => flags.as_str(),
        Some(other) => {
            return Err(failed(format!(
                "argument 2 must be a string (got {})",
                other.type_name()
            )));
        }
    };

    Pattern::new(source, flags)
        .map(Value::Pattern)
        .map_err(|err| failed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex() {
        let plain = regex(&[Value::from("abc")]).unwrap();
        assert_eq!(plain, Value::Pattern(Pattern::new("abc", "").unwrap()));
        assert_eq!(plain.to_string(), "/abc/");

        let global = regex(&[Value::from("abc"), Value::from("g")]).unwrap();
        assert_eq!(global.to_string(), "/abc/g");
    }

    #[test]
    fn test_regex_errors() {
        assert!(matches!(
            regex(&[Value::from("(")]),
            Err(ExpressionError::FunctionFailed { ref function, .. }) if function == "String.regex"
        ));
        assert!(regex(&[Value::from("a"), Value::from("z")]).is_err());
        assert!(regex(&[Value::from(1)]).is_err());
        assert!(regex(&[]).is_err());
    }

    #[test]
    fn test_signatures() {
        let table = string_signatures();
        let signature = table.get("String.regex").unwrap();
        assert_eq!(signature.name.as_deref(), Some("regex"));
        assert_eq!(signature.required_args(), 1);
    }
}
