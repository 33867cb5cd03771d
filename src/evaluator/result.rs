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

//! Evaluation result type

use crate::core::Value;

/// Value of an evaluated expression plus complexity counters
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// Resulting value
    pub value: Value,
    /// Number of tree nodes visited
    pub node_count: usize,
    /// Number of host function invocations executed
    pub function_call_count: usize,
}

impl EvaluationResult {
    /// Result of a single visited node
    pub fn leaf(value: Value) -> Self {
        Self {
            value,
            node_count: 1,
            function_call_count: 0,
        }
    }

    /// Truthiness of the resulting value
    pub fn to_boolean(&self) -> bool {
        self.value.is_truthy()
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}
