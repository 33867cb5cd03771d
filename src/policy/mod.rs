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

//! Access policy for member reads
//!
//! A read of `container[key]` is permitted when at least one member check
//! approves it. An absent or empty policy permits nothing. The evaluator and
//! the static resolver both go through [`read_member`], so they can never
//! disagree about what a policy allows.

pub mod checks;

use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::core::{ExpressionError, PropertyKey, Result, Value};

pub use checks::{own_property, standard_member_checks, string_index, string_method};

/// Predicate deciding whether `container[key]` may be read
pub trait MemberCheck: Send + Sync {
    fn check(&self, container: &Value, key: &PropertyKey) -> bool;
}

impl<F> MemberCheck for F
where
    F: Fn(&Value, &PropertyKey) -> bool + Send + Sync,
{
    fn check(&self, container: &Value, key: &PropertyKey) -> bool {
        self(container, key)
    }
}

/// Ordered set of member checks
#[derive(Clone, Default)]
pub struct AccessPolicy {
    checks: Vec<Arc<dyn MemberCheck>>,
}

impl AccessPolicy {
    /// Create a policy with no checks, which denies every read
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style addition of a check
    pub fn with_check(mut self, check: impl MemberCheck + 'static) -> Self {
        self.push(check);
        self
    }

    pub fn push(&mut self, check: impl MemberCheck + 'static) {
        self.checks.push(Arc::new(check));
    }

    /// Append every check of `other` after the existing ones
    pub fn extend(&mut self, other: &AccessPolicy) {
        self.checks.extend(other.checks.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Check whether any member check approves the read
    pub fn permits(&self, container: &Value, key: &PropertyKey) -> bool {
        self.checks.iter().any(|check| check.check(container, key))
    }
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl<C: MemberCheck + 'static> FromIterator<C> for AccessPolicy {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            checks: iter
                .into_iter()
                .map(|check| Arc::new(check) as Arc<dyn MemberCheck>)
                .collect(),
        }
    }
}

/// Check whether `policy` permits reading `container[key]`
pub fn is_permitted(policy: Option<&AccessPolicy>, container: &Value, key: &PropertyKey) -> bool {
    policy.is_some_and(|policy| policy.permits(container, key))
}

/// Read `container[key]` through the policy gate
///
/// Returns [`ExpressionError::AccessDenied`] when no check approves the read.
/// Functions come back bound to `container`.
pub fn read_member(
    policy: Option<&AccessPolicy>,
    container: &Value,
    key: &PropertyKey,
) -> Result<Value> {
    if !is_permitted(policy, container, key) {
        trace!(
            "member read denied: {} [{}] with {} [{}]",
            container,
            container.type_name(),
            key,
            key.type_name()
        );
        return Err(access_denied(container, key));
    }

    Ok(container.get_member(key))
}

fn access_denied(container: &Value, key: &PropertyKey) -> ExpressionError {
    ExpressionError::AccessDenied {
        container: container.to_string(),
        container_type: container.type_name(),
        key: key.to_string(),
        key_type: key.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Namespace;

    fn container() -> Value {
        Value::from(Namespace::new().with("a", 1))
    }

    #[test]
    fn test_absent_or_empty_policy_denies() {
        let key = PropertyKey::from("a");
        assert!(matches!(
            read_member(None, &container(), &key),
            Err(ExpressionError::AccessDenied { .. })
        ));
        assert!(read_member(Some(&AccessPolicy::new()), &container(), &key).is_err());
    }

    #[test]
    fn test_any_check_approves() {
        let policy = AccessPolicy::new()
            .with_check(|_: &Value, _: &PropertyKey| false)
            .with_check(|_: &Value, key: &PropertyKey| key == &PropertyKey::from("a"));
        assert_eq!(
            read_member(Some(&policy), &container(), &"a".into()),
            Ok(Value::from(1))
        );
        assert!(read_member(Some(&policy), &container(), &"b".into()).is_err());
    }

    #[test]
    fn test_denial_message() {
        let err = read_member(None, &Value::from("abc"), &PropertyKey::Number(1.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "EX0004: Not allowed to index abc (type: string) with 1 (type: number)"
        );

        let err = read_member(None, &Value::from("abc"), &PropertyKey::Number(1e300)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "EX0004: Not allowed to index abc (type: string) with 1e+300 (type: number)"
        );
    }
}
