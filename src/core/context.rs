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

//! Evaluation context: the host-supplied root namespace

use super::value::{Namespace, Value};

/// Host-owned namespace that identifiers are resolved against
///
/// Lookups only consider the context's own keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    root: Namespace,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a top-level name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.root.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.root.insert(name, value);
    }

    /// Own-key lookup of a top-level name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.contains_key(name)
    }

    /// Copy every top-level name of `other` into this context
    pub fn extend(&mut self, other: &Context) {
        self.root.extend(&other.root);
    }

    pub fn namespace(&self) -> &Namespace {
        &self.root
    }

    /// The context as a namespace value, e.g. for `this`
    pub fn as_value(&self) -> Value {
        Value::Namespace(self.root.clone())
    }
}

impl From<Namespace> for Context {
    fn from(root: Namespace) -> Self {
        Self { root }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            root: iter.into_iter().collect(),
        }
    }
}
