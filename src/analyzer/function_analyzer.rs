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

//! Call-site validation against a signature table

use indexmap::IndexMap;
use log::debug;

use super::analysis::{ExpressionAnalysis, FunctionArg};
use crate::registry::{FunctionSignature, SignatureTable};

/// Argument lists of the call sites matching one signature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionBuckets {
    pub valid: Vec<Vec<FunctionArg>>,
    pub invalid: Vec<Vec<FunctionArg>>,
}

impl FunctionBuckets {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }
}

/// Buckets per signature key, in table order
pub type FunctionAnalysis = IndexMap<String, FunctionBuckets>;

/// Sorts call sites into valid and invalid argument lists per signature
#[derive(Debug, Clone, Default)]
pub struct FunctionAnalyzer {
    table: SignatureTable,
}

impl FunctionAnalyzer {
    pub fn new(table: SignatureTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SignatureTable {
        &self.table
    }

    /// Bucket every call site of `analysis` for every signature
    ///
    /// Call sites that match no signature are ignored.
    pub fn analyze(&self, analysis: &ExpressionAnalysis) -> FunctionAnalysis {
        bucket_calls(&self.table, analysis)
    }
}

/// Bucket the call sites of `analysis` against a borrowed table
pub fn bucket_calls(table: &SignatureTable, analysis: &ExpressionAnalysis) -> FunctionAnalysis {
    let result: FunctionAnalysis = table
        .iter()
        .map(|(key, signature)| (key.clone(), analyze_function(key, signature, analysis)))
        .collect();

    debug!(
        "Validated {} call sites against {} signatures",
        analysis.function_calls.len(),
        result.len()
    );
    result
}

fn analyze_function(
    key: &str,
    signature: &FunctionSignature,
    analysis: &ExpressionAnalysis,
) -> FunctionBuckets {
    let mut buckets = FunctionBuckets::default();

    for call in analysis
        .function_calls
        .iter()
        .filter(|call| signature.matches_call(key, call))
    {
        if signature.accepts(&call.args) {
            buckets.valid.push(call.args.clone());
        } else {
            buckets.invalid.push(call.args.clone());
        }
    }

    buckets
}
