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

//! Standard helper namespaces
//!
//! Ordinary host data: a context holding `Math`, `String` and `Convert`,
//! plus the matching signature tables for call-site validation.

pub mod convert;
pub mod math;
pub mod string;

use crate::core::Context;
use crate::registry::SignatureTable;

pub use convert::{convert_namespace, convert_signatures, to_number};
pub use math::{math_namespace, math_signatures};
pub use string::{string_namespace, string_signatures};

/// Context holding the `Math`, `String` and `Convert` namespaces
pub fn standard_context() -> Context {
    Context::new()
        .with("Math", math_namespace())
        .with("String", string_namespace())
        .with("Convert", convert_namespace())
}

/// Signatures for every function of [`standard_context`]
pub fn standard_signatures() -> SignatureTable {
    let mut table = convert_signatures();
    table.extend(math_signatures());
    table.extend(string_signatures());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_line_up() {
        let context = standard_context();
        let table = standard_signatures();
        for (key, signature) in table.iter() {
            let (namespace, _) = key.split_once('.').unwrap();
            assert!(context.contains(namespace));
            assert_eq!(signature.path.len(), 1);
        }
        assert_eq!(table.len(), 3 + math_signatures().len());
    }
}
