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

//! Ready-made member checks

use crate::core::{PropertyKey, Value, is_string_method};

use super::AccessPolicy;

/// Approves reads of keys a namespace or array actually holds
pub fn own_property(container: &Value, key: &PropertyKey) -> bool {
    match container {
        Value::Namespace(ns) => ns.contains_key(&key.to_key_string()),
        Value::Array(items) => key.as_index().is_some_and(|i| i < items.len()),
        _ => false,
    }
}

/// Approves integral numeric indexing into strings
pub fn string_index(container: &Value, key: &PropertyKey) -> bool {
    matches!(container, Value::String(_)) && key.as_index().is_some()
}

/// Approves reads of the whitelisted string methods such as `trim`
pub fn string_method(container: &Value, key: &PropertyKey) -> bool {
    match (container, key) {
        (Value::String(_), PropertyKey::String(name)) => is_string_method(name),
        _ => false,
    }
}

/// Policy made of [`own_property`], [`string_index`] and [`string_method`]
pub fn standard_member_checks() -> AccessPolicy {
    AccessPolicy::new()
        .with_check(own_property)
        .with_check(string_index)
        .with_check(string_method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Namespace;
    use rstest::rstest;

    #[rstest]
    #[case(Value::from(Namespace::new().with("a", 1)), PropertyKey::from("a"), true)]
    #[case(Value::from(Namespace::new().with("a", 1)), PropertyKey::from("b"), false)]
    #[case(Value::from(Namespace::new().with("0", 1)), PropertyKey::Number(0.0), true)]
    #[case(Value::array(vec![Value::from(1)]), PropertyKey::Number(0.0), true)]
    #[case(Value::array(vec![Value::from(1)]), PropertyKey::Number(1.0), false)]
    #[case(Value::array(vec![Value::from(1)]), PropertyKey::from("length"), false)]
    #[case(Value::from("abc"), PropertyKey::Number(0.0), false)]
    fn test_own_property(#[case] container: Value, #[case] key: PropertyKey, #[case] expected: bool) {
        assert_eq!(own_property(&container, &key), expected);
    }

    #[rstest]
    #[case(Value::from("abc"), PropertyKey::Number(1.0), true)]
    #[case(Value::from("abc"), PropertyKey::Number(1.5), false)]
    #[case(Value::from("abc"), PropertyKey::from("length"), false)]
    #[case(Value::array(vec![]), PropertyKey::Number(0.0), false)]
    fn test_string_index(#[case] container: Value, #[case] key: PropertyKey, #[case] expected: bool) {
        assert_eq!(string_index(&container, &key), expected);
    }

    #[rstest]
    #[case(Value::from(" a "), PropertyKey::from("trim"), true)]
    #[case(Value::from(" a "), PropertyKey::from("toUpperCase"), true)]
    #[case(Value::from(" a "), PropertyKey::from("constructor"), false)]
    #[case(Value::from(" a "), PropertyKey::from("length"), false)]
    #[case(Value::from(" a "), PropertyKey::Number(0.0), false)]
    #[case(Value::from(Namespace::new().with("trim", 1)), PropertyKey::from("trim"), false)]
    fn test_string_method(#[case] container: Value, #[case] key: PropertyKey, #[case] expected: bool) {
        assert_eq!(string_method(&container, &key), expected);
    }

    #[test]
    fn test_standard_member_checks() {
        let policy = standard_member_checks();
        assert_eq!(policy.len(), 3);
        assert!(policy.permits(&Value::from("abc"), &PropertyKey::Number(2.0)));
        assert!(policy.permits(&Value::from("abc"), &PropertyKey::from("trim")));
        assert!(!policy.permits(&Value::Undefined, &PropertyKey::from("a")));
    }
}
