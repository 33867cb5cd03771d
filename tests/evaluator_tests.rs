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

//! Evaluation against host contexts and access policies

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use guarded_expr::policy::{own_property, standard_member_checks, string_index, string_method};
use guarded_expr::{
    AccessPolicy, Context, EvaluatorOptions, ExpressionError, ExpressionEvaluator, ExpressionNode,
    HostFunction, Namespace, Pattern, PropertyKey, Result, Value, evaluate, stdlib,
};
use pretty_assertions::assert_eq;
use serde_json::json;

mod utils;
use utils::*;

/// Host function completing after a delay
struct Delayed {
    name: String,
    delay: Duration,
    value: f64,
    log: Arc<Mutex<Vec<String>>>,
}

impl Delayed {
    fn value(name: &str, millis: u64, value: f64, log: &Arc<Mutex<Vec<String>>>) -> Value {
        Value::host_function(Arc::new(Self {
            name: name.to_string(),
            delay: Duration::from_millis(millis),
            value,
            log: log.clone(),
        }))
    }
}

#[async_trait]
impl HostFunction for Delayed {
    async fn call(&self, _this: Option<&Value>, _args: Vec<Value>) -> Result<Value> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(self.name.clone());
        Ok(Value::Number(self.value))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn counter(name: &str, calls: &Arc<AtomicUsize>) -> Value {
    let calls = calls.clone();
    Value::function(name, move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Boolean(true))
    })
}

fn standard_evaluator() -> ExpressionEvaluator {
    ExpressionEvaluator::new(EvaluatorOptions {
        context: stdlib::standard_context(),
        policy: Some(standard_member_checks()),
    })
}

#[tokio::test]
async fn test_literals_evaluate_to_themselves() {
    init_logging();
    let context = Context::new();

    for (tree, expected) in [
        (lit(1), Value::from(1)),
        (lit("text"), Value::from("text")),
        (lit(false), Value::from(false)),
    ] {
        let result = evaluate(&tree, &context, None).await.unwrap();
        assert_eq!(result.value, expected);
        assert_eq!(result.node_count, 1);
        assert_eq!(result.function_call_count, 0);
    }
}

#[tokio::test]
async fn test_arithmetic_and_concatenation() {
    let context = Context::new();

    let result = evaluate(&bin("+", lit(1), lit(2)), &context, None)
        .await
        .unwrap();
    assert_eq!(result.value, Value::from(3));
    assert_eq!(result.node_count, 3);

    let result = evaluate(&bin("+", lit("a"), lit("b")), &context, None)
        .await
        .unwrap();
    assert_eq!(result.value, Value::from("ab"));

    let err = evaluate(&bin("+", lit(1), lit("a")), &context, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::TypeMismatch { ref operator, .. } if operator == "+"));

    // Exponentiation is not supported
    let err = evaluate(&bin("**", lit(2), lit(3)), &context, None)
        .await
        .unwrap_err();
    assert_eq!(err, ExpressionError::unknown_operator("**"));
}

#[tokio::test]
async fn test_equality_and_comparison() {
    let context = Context::new();
    let cases = [
        (bin("===", lit(1), lit(1)), true),
        (bin("==", lit("a"), lit("a")), true),
        (bin("!==", lit(1), lit("1")), true),
        (bin("<", lit(1), lit(2)), true),
        (bin(">=", lit(1), lit(2)), false),
    ];

    for (tree, expected) in cases {
        let result = evaluate(&tree, &context, None).await.unwrap();
        assert_eq!(result.value, Value::from(expected), "{tree}");
    }
}

#[tokio::test]
async fn test_identifiers_are_own_keys_only() {
    let context = Context::new().with("a", 5);

    let result = evaluate(&id("a"), &context, None).await.unwrap();
    assert_eq!(result.value, Value::from(5));

    let err = evaluate(&id("b"), &context, None).await.unwrap_err();
    assert_eq!(
        err,
        ExpressionError::NotFound {
            name: "b".to_string()
        }
    );
    assert_eq!(err.to_string(), "EX0001: Identifier (b) not found");
}

#[tokio::test]
async fn test_member_reads_need_a_policy() {
    let context = Context::new().with("obj", Namespace::new().with("k", 1));
    let tree = path("obj.k");

    let err = evaluate(&tree, &context, None).await.unwrap_err();
    assert!(matches!(err, ExpressionError::AccessDenied { .. }));

    let err = evaluate(&tree, &context, Some(&AccessPolicy::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::AccessDenied { .. }));

    let policy = AccessPolicy::new().with_check(own_property);
    let result = evaluate(&tree, &context, Some(&policy)).await.unwrap();
    assert_eq!(result.value, Value::from(1));
    assert_eq!(result.node_count, 3);
}

/// Outcome of `a.b()`, `l("abc")[0]` and `l(" a ").trim()` under a policy
async fn member_kinds(policy: Option<&AccessPolicy>) -> Vec<Option<Value>> {
    let context = Context::new()
        .with("a", Namespace::new().with("b", Value::function("b", |_| Ok(Value::from("c")))))
        .with(
            "l",
            Value::function("l", |args| Ok(args.first().cloned().unwrap_or_default())),
        );
    let trees = [
        call_on(path("a.b"), vec![]),
        index(call("l", vec![lit("abc")]), lit(0)),
        call_on(
            ExpressionNode::member(call("l", vec![lit(" a ")]), "trim"),
            vec![],
        ),
    ];

    let mut outcomes = Vec::new();
    for tree in &trees {
        outcomes.push(match evaluate(tree, &context, policy).await {
            Ok(result) => Some(result.value),
            Err(err) => {
                assert!(matches!(err, ExpressionError::AccessDenied { .. }), "{err}");
                None
            }
        });
    }
    outcomes
}

#[tokio::test]
async fn test_each_member_check_covers_its_own_kind() {
    assert_eq!(member_kinds(None).await, vec![None, None, None]);

    let policy = AccessPolicy::new().with_check(own_property);
    assert_eq!(
        member_kinds(Some(&policy)).await,
        vec![Some(Value::from("c")), None, None]
    );

    let policy = AccessPolicy::new().with_check(string_index);
    assert_eq!(
        member_kinds(Some(&policy)).await,
        vec![None, Some(Value::from("a")), None]
    );

    let policy = AccessPolicy::new().with_check(string_method);
    assert_eq!(
        member_kinds(Some(&policy)).await,
        vec![None, None, Some(Value::from("a"))]
    );

    assert_eq!(
        member_kinds(Some(&standard_member_checks())).await,
        vec![Some(Value::from("c")), Some(Value::from("a")), Some(Value::from("a"))]
    );
}

#[tokio::test]
async fn test_policy_can_restrict_keys() {
    let context = Context::new().with(
        "user",
        Namespace::new().with("name", "ada").with("secret", "x"),
    );
    let policy = AccessPolicy::new().with_check(|container: &Value, key: &PropertyKey| {
        matches!(container, Value::Namespace(_)) && key != &PropertyKey::from("secret")
    });

    let result = evaluate(&path("user.name"), &context, Some(&policy))
        .await
        .unwrap();
    assert_eq!(result.value, Value::from("ada"));

    let err = evaluate(&path("user.secret"), &context, Some(&policy))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::AccessDenied { ref key, .. } if key == "secret"));
}

#[tokio::test]
async fn test_computed_members() {
    let context = Context::new()
        .with("list", vec![Value::from(10), Value::from(20)])
        .with("word", "hey")
        .with("missing", Value::Undefined);
    let policy = standard_member_checks();

    let result = evaluate(&index(id("list"), lit(1)), &context, Some(&policy))
        .await
        .unwrap();
    assert_eq!(result.value, Value::from(20));

    let result = evaluate(&index(id("word"), lit(0)), &context, Some(&policy))
        .await
        .unwrap();
    assert_eq!(result.value, Value::from("h"));

    let err = evaluate(&index(id("list"), lit(true)), &context, Some(&policy))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExpressionError::InvalidIndexType {
            type_name: "boolean"
        }
    );

    let err = evaluate(&path("missing.x"), &context, Some(&policy))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExpressionError::NullIndex {
            type_name: "undefined"
        }
    );

    // Out of range index is not an own property
    let err = evaluate(&index(id("list"), lit(5)), &context, Some(&policy))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::AccessDenied { .. }));
}

#[tokio::test]
async fn test_calls() {
    let context = Context::new()
        .with(
            "add",
            Value::function("add", |args| {
                let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
                Ok(Value::Number(sum))
            }),
        )
        .with("n", 1);

    let tree = call("add", vec![lit(1), call("add", vec![lit(2), lit(3)])]);
    let result = evaluate(&tree, &context, None).await.unwrap();
    assert_eq!(result.value, Value::from(6));
    assert_eq!(result.function_call_count, 2);
    assert_eq!(result.node_count, 7);

    let err = evaluate(&call("n", vec![]), &context, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExpressionError::NotCallable {
            type_name: "number"
        }
    );
}

#[tokio::test]
async fn test_host_errors_propagate_unchanged() {
    let context = Context::new().with(
        "fail",
        Value::function("fail", |_| {
            Err(ExpressionError::function_failed("fail", "boom"))
        }),
    );

    let err = evaluate(&call("fail", vec![]), &context, None)
        .await
        .unwrap_err();
    assert_eq!(err, ExpressionError::function_failed("fail", "boom"));
    assert_eq!(err.error_code().code_str(), "EX0060");
}

#[tokio::test]
async fn test_logical_short_circuit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let context = Context::new().with("f", counter("f", &calls));

    let result = evaluate(&logical("&&", lit(false), call("f", vec![])), &context, None)
        .await
        .unwrap();
    assert_eq!(result.value, Value::from(false));
    assert_eq!(result.function_call_count, 0);
    assert_eq!(result.node_count, 2);

    let result = evaluate(&logical("||", lit(0), call("f", vec![])), &context, None)
        .await
        .unwrap();
    assert_eq!(result.value, Value::from(true));
    assert_eq!(result.function_call_count, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The right side is never evaluated, so the undefined name is not a fault
    let result = evaluate(&logical("||", lit("x"), id("nope")), &context, None)
        .await
        .unwrap();
    assert_eq!(result.value, Value::from("x"));
}

#[tokio::test]
async fn test_conditional_evaluates_one_branch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let context = Context::new().with("f", counter("f", &calls));

    let tree = ExpressionNode::conditional(lit(""), call("f", vec![]), lit(2));
    let result = evaluate(&tree, &context, None).await.unwrap();
    assert_eq!(result.value, Value::from(2));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_independent_operands_run_concurrently() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let context = Context::new()
        .with("slow", Delayed::value("slow", 100, 1.0, &log))
        .with("fast", Delayed::value("fast", 10, 2.0, &log));

    let start = tokio::time::Instant::now();
    let tree = bin("+", call("slow", vec![]), call("fast", vec![]));
    let result = evaluate(&tree, &context, None).await.unwrap();

    assert_eq!(result.value, Value::from(3));
    assert_eq!(result.function_call_count, 2);
    assert!(start.elapsed() < Duration::from_millis(150));
    // Completion order differs from tree order
    assert_eq!(*log.lock().unwrap(), vec!["fast", "slow"]);
}

#[tokio::test(start_paused = true)]
async fn test_compound_runs_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let context = Context::new()
        .with("slow", Delayed::value("slow", 100, 1.0, &log))
        .with("fast", Delayed::value("fast", 10, 2.0, &log));

    let tree = seq(vec![call("slow", vec![]), call("fast", vec![])]);
    let result = evaluate(&tree, &context, None).await.unwrap();

    assert_eq!(result.value, Value::from(2));
    assert_eq!(result.function_call_count, 2);
    assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
}

#[tokio::test(start_paused = true)]
async fn test_first_fault_fails_the_whole_tree() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let context = Context::new().with("slow", Delayed::value("slow", 100, 1.0, &log));

    let tree = arr(vec![call("slow", vec![]), id("nope")]);
    let err = evaluate(&tree, &context, None).await.unwrap_err();
    assert_eq!(
        err,
        ExpressionError::NotFound {
            name: "nope".to_string()
        }
    );
}

#[tokio::test]
async fn test_empty_compound_fails() {
    let err = evaluate(&seq(vec![]), &Context::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err, ExpressionError::EmptyCompound);
}

#[tokio::test]
async fn test_this_reads_the_context() {
    let context = Context::new().with("a", 4);
    let evaluator = ExpressionEvaluator::new(
        EvaluatorOptions::new()
            .with_context(context)
            .with_member_check(own_property),
    );

    let tree = bin("*", ExpressionNode::member(ExpressionNode::this(), "a"), lit(2));
    let result = evaluator.evaluate(&tree).await.unwrap();
    assert_eq!(result.value, Value::from(8));
}

#[tokio::test]
async fn test_standard_library() {
    let evaluator = standard_evaluator();

    // Math.max([1, 5, 3])
    let tree = call_on(
        path("Math.max"),
        vec![arr(vec![lit(1), lit(5), lit(3)])],
    );
    let result = evaluator.evaluate(&tree).await.unwrap();
    assert_eq!(result.value, Value::from(5));
    assert_eq!(result.node_count, 8);
    assert_eq!(result.function_call_count, 1);

    // Math.round(Convert.toNumber(" 2.5 "))
    let tree = call_on(
        path("Math.round"),
        vec![call_on(path("Convert.toNumber"), vec![lit(" 2.5 ")])],
    );
    let result = evaluator.evaluate(&tree).await.unwrap();
    assert_eq!(result.value, Value::from(3));
    assert_eq!(result.function_call_count, 2);

    // Math.abs("x")
    let err = evaluator
        .evaluate(&call_on(path("Math.abs"), vec![lit("x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::FunctionFailed { .. }));
}

#[tokio::test]
async fn test_string_namespace() {
    let context = Context::new().with("String", stdlib::string_namespace());
    let policy = AccessPolicy::new().with_check(own_property);

    let result = evaluate(&call_on(path("String.regex"), vec![lit("abc")]), &context, Some(&policy))
        .await
        .unwrap();
    assert_eq!(result.value, Value::Pattern(Pattern::new("abc", "").unwrap()));

    let result = evaluate(
        &call_on(path("String.regex"), vec![lit("abc"), lit("g")]),
        &context,
        Some(&policy),
    )
    .await
    .unwrap();
    assert_eq!(result.value.to_string(), "/abc/g");

    let err = evaluate(&call_on(path("String.regex"), vec![lit("(")]), &context, Some(&policy))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::FunctionFailed { .. }));
}

#[tokio::test]
async fn test_string_methods_take_patterns() {
    let evaluator = standard_evaluator();

    // "a1b22".replace(String.regex("\\d+", "g"), "#")
    let tree = call_on(
        ExpressionNode::member(lit("a1b22"), "replace"),
        vec![
            call_on(path("String.regex"), vec![lit("\\d+"), lit("g")]),
            lit("#"),
        ],
    );
    let result = evaluator.evaluate(&tree).await.unwrap();
    assert_eq!(result.value, Value::from("a#b#"));
    assert_eq!(result.function_call_count, 2);

    // "a,b".split(",")
    let tree = call_on(
        ExpressionNode::member(lit("a,b"), "split"),
        vec![lit(",")],
    );
    let result = evaluator.evaluate(&tree).await.unwrap();
    assert_eq!(result.value, Value::array(vec![Value::from("a"), Value::from("b")]));

    // "abc".constructor
    let err = evaluator
        .evaluate(&ExpressionNode::member(lit("abc"), "constructor"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExpressionError::AccessDenied { ref key, .. } if key == "constructor"));
}

#[tokio::test]
async fn test_math_random() {
    let evaluator = standard_evaluator();
    let tree = call_on(path("Math.random"), vec![]);
    for _ in 0..20 {
        let n = evaluator.evaluate(&tree).await.unwrap().value.as_number().unwrap();
        assert!((0.0..1.0).contains(&n));
    }
}

#[tokio::test]
async fn test_json_trees() {
    let evaluator = standard_evaluator();

    // Math.pow(2, 10) - 24
    let tree = json!({
        "type": "BinaryExpression",
        "operator": "-",
        "left": {
            "type": "CallExpression",
            "callee": {
                "type": "MemberExpression",
                "computed": false,
                "object": { "type": "Identifier", "name": "Math" },
                "property": { "type": "Identifier", "name": "pow" }
            },
            "arguments": [
                { "type": "Literal", "value": 2, "raw": "2" },
                { "type": "Literal", "value": 10, "raw": "10" }
            ]
        },
        "right": { "type": "Literal", "value": 24, "raw": "24" }
    });
    let result = evaluator.evaluate_json(&tree).await.unwrap();
    assert_eq!(result.value, Value::from(1000));

    let err = evaluator
        .evaluate_json(&json!({ "type": "ArrowFunctionExpression", "params": [] }))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExpressionError::InvalidNodeKind {
            kind: "ArrowFunctionExpression".to_string()
        }
    );
}
