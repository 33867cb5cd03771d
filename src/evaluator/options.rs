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

//! Evaluator configuration

use crate::core::Context;
use crate::policy::{AccessPolicy, MemberCheck};

/// Context and access policy shared by the evaluator and the analyzer
///
/// # Examples
///
/// ```rust
/// use guarded_expr::{Context, EvaluatorOptions, policy::own_property};
///
/// let options = EvaluatorOptions::new()
///     .with_context(Context::new().with("answer", 42))
///     .with_member_check(own_property);
/// assert!(options.policy.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvaluatorOptions {
    /// Names available to identifiers
    pub context: Context,

    /// Member checks; `None` denies every member read
    pub policy: Option<AccessPolicy>,
}

impl EvaluatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Add one member check, creating the policy if needed
    pub fn with_member_check(mut self, check: impl MemberCheck + 'static) -> Self {
        self.policy.get_or_insert_with(AccessPolicy::new).push(check);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{own_property, string_index};

    #[test]
    fn test_default_has_no_policy() {
        let options = EvaluatorOptions::default();
        assert!(options.policy.is_none());
        assert!(options.context.namespace().is_empty());
    }

    #[test]
    fn test_member_checks_accumulate() {
        let options = EvaluatorOptions::new()
            .with_member_check(own_property)
            .with_member_check(string_index);
        assert_eq!(options.policy.map(|p| p.len()), Some(2));
    }
}
