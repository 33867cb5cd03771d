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

//! Shared tree builders and helpers for integration tests

#![allow(dead_code)]

use guarded_expr::ExpressionNode as N;
use guarded_expr::{FunctionArg, LiteralValue};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(name: &str) -> N {
    N::identifier(name)
}

pub fn lit(value: impl Into<LiteralValue>) -> N {
    N::literal(value)
}

/// `name(args...)`
pub fn call(name: &str, args: Vec<N>) -> N {
    N::call(N::identifier(name), args)
}

/// `callee(args...)` for an arbitrary callee
pub fn call_on(callee: N, args: Vec<N>) -> N {
    N::call(callee, args)
}

/// Dotted chain, `path("a.b.c")` is `a.b.c`
pub fn path(dotted: &str) -> N {
    let mut parts = dotted.split('.');
    let root = parts.next().unwrap_or_default();
    parts.fold(N::identifier(root), |object, part| N::member(object, part))
}

/// `object[property]`
pub fn index(object: N, property: N) -> N {
    N::computed_member(object, property)
}

pub fn bin(operator: &str, left: N, right: N) -> N {
    N::binary(operator, left, right)
}

pub fn logical(operator: &str, left: N, right: N) -> N {
    N::logical(operator, left, right)
}

/// Comma sequence
pub fn seq(body: Vec<N>) -> N {
    N::compound(body)
}

pub fn arr(elements: Vec<N>) -> N {
    N::array(elements)
}

/// Render argument lists so lists holding runtime markers can be compared
pub fn render(lists: &[Vec<FunctionArg>]) -> Vec<String> {
    lists
        .iter()
        .map(|args| {
            let args: Vec<String> = args.iter().map(ToString::to_string).collect();
            format!("[{}]", args.join(", "))
        })
        .collect()
}
