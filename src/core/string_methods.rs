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

//! Methods readable from string values
//!
//! `" a ".trim` reads one of these as a function bound to the string. Indexes
//! and lengths count characters. Arguments are not coerced: text parameters
//! take strings, position parameters take numbers or may be left out.

use std::sync::LazyLock;

use indexmap::IndexMap;

use super::error::{ExpressionError, Result};
use super::pattern::Pattern;
use super::value::{Value, format_number};

type MethodFn = fn(&str, &[Value]) -> Result<Value>;

/// Longest string `padStart`, `padEnd` and `repeat` may build, in characters
const MAX_STRING_LEN: usize = 1 << 29;

const METHODS: &[(&str, MethodFn)] = &[
    ("charAt", char_at),
    ("concat", concat),
    ("endsWith", ends_with),
    ("includes", includes),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("match", match_pattern),
    ("padEnd", pad_end),
    ("padStart", pad_start),
    ("repeat", repeat),
    ("replace", replace),
    ("replaceAll", replace_all),
    ("search", search),
    ("slice", slice),
    ("split", split),
    ("startsWith", starts_with),
    ("substring", substring),
    ("toLowerCase", to_lower_case),
    ("toUpperCase", to_upper_case),
    ("trim", trim),
    ("trimEnd", trim_end),
    ("trimStart", trim_start),
];

static TABLE: LazyLock<IndexMap<&'static str, Value>> = LazyLock::new(|| {
    METHODS
        .iter()
        .map(|&(name, method)| {
            let function = Value::method(name, move |this, args| match this {
                Some(Value::String(s)) => method(s, args),
                other => Err(ExpressionError::function_failed(
                    name,
                    format!(
                        "must be called on a string (got {})",
                        other.map_or("undefined", Value::type_name)
                    ),
                )),
            });
            (name, function)
        })
        .collect()
});

/// Whether `name` is a method strings expose
pub fn is_string_method(name: &str) -> bool {
    TABLE.contains_key(name)
}

/// The unbound method called `name`
pub fn string_method(name: &str) -> Option<Value> {
    TABLE.get(name).cloned()
}

/// Names of every string method
pub fn string_method_names() -> impl Iterator<Item = &'static str> {
    METHODS.iter().map(|&(name, _)| name)
}

fn fail(method: &str, message: impl Into<String>) -> ExpressionError {
    ExpressionError::function_failed(method, message)
}

fn text_arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        other => Err(fail(
            method,
            format!(
                "argument {} must be a string (got {})",
                index + 1,
                other.map_or("undefined", Value::type_name)
            ),
        )),
    }
}

/// Integer position argument; absent means `default`, NaN means 0
fn position_arg(method: &str, args: &[Value], index: usize, default: f64) -> Result<f64> {
    match args.get(index) {
        None | Some(Value::Undefined) => Ok(default),
        Some(Value::Number(n)) if n.is_nan() => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.trunc()),
        Some(other) => Err(fail(
            method,
            format!(
                "argument {} must be a number (got {})",
                index + 1,
                other.type_name()
            ),
        )),
    }
}

/// Pattern argument; a string argument matches literally
fn pattern_arg(method: &str, args: &[Value], index: usize) -> Result<Pattern> {
    match args.get(index) {
        Some(Value::Pattern(pattern)) => Ok(pattern.clone()),
        Some(Value::String(s)) => {
            Pattern::new(&regex::escape(s), "").map_err(|err| fail(method, err.to_string()))
        }
        other => Err(fail(
            method,
            format!(
                "argument {} must be a string or a pattern (got {})",
                index + 1,
                other.map_or("undefined", Value::type_name)
            ),
        )),
    }
}

/// Clamp a relative position (negative counts from the end) to `0..=len`
fn relative(position: f64, len: usize) -> usize {
    let len_f = len as f64;
    if position < 0.0 {
        (len_f + position).max(0.0) as usize
    } else {
        position.min(len_f) as usize
    }
}

fn clamp(position: f64, len: usize) -> usize {
    position.clamp(0.0, len as f64) as usize
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn char_index(s: &str, byte: usize) -> f64 {
    s[..byte].chars().count() as f64
}

fn byte_offset(s: &str, char_pos: usize) -> usize {
    s.char_indices().nth(char_pos).map_or(s.len(), |(i, _)| i)
}

fn char_at(s: &str, args: &[Value]) -> Result<Value> {
    let pos = position_arg("charAt", args, 0, 0.0)?;
    let found = (pos >= 0.0)
        .then(|| s.chars().nth(pos as usize))
        .flatten()
        .map(String::from)
        .unwrap_or_default();
    Ok(Value::String(found))
}

fn concat(s: &str, args: &[Value]) -> Result<Value> {
    let mut out = s.to_string();
    for arg in args {
        out.push_str(&arg.to_string());
    }
    Ok(Value::String(out))
}

fn ends_with(s: &str, args: &[Value]) -> Result<Value> {
    let search = text_arg("endsWith", args, 0)?;
    let all = chars(s);
    let end = clamp(position_arg("endsWith", args, 1, all.len() as f64)?, all.len());
    let head: String = all[..end].iter().collect();
    Ok(Value::Boolean(head.ends_with(search)))
}

fn starts_with(s: &str, args: &[Value]) -> Result<Value> {
    let search = text_arg("startsWith", args, 0)?;
    let start = clamp(position_arg("startsWith", args, 1, 0.0)?, s.chars().count());
    Ok(Value::Boolean(s[byte_offset(s, start)..].starts_with(search)))
}

fn includes(s: &str, args: &[Value]) -> Result<Value> {
    let search = text_arg("includes", args, 0)?;
    let start = clamp(position_arg("includes", args, 1, 0.0)?, s.chars().count());
    Ok(Value::Boolean(s[byte_offset(s, start)..].contains(search)))
}

fn index_of(s: &str, args: &[Value]) -> Result<Value> {
    let search = text_arg("indexOf", args, 0)?;
    let start = clamp(position_arg("indexOf", args, 1, 0.0)?, s.chars().count());
    let offset = byte_offset(s, start);
    let found = s[offset..]
        .find(search)
        .map_or(-1.0, |i| char_index(s, offset + i));
    Ok(Value::Number(found))
}

fn last_index_of(s: &str, args: &[Value]) -> Result<Value> {
    let search = text_arg("lastIndexOf", args, 0)?;
    let found = s.rfind(search).map_or(-1.0, |i| char_index(s, i));
    Ok(Value::Number(found))
}

fn pad(method: &str, s: &str, args: &[Value], at_start: bool) -> Result<Value> {
    let target = position_arg(method, args, 0, 0.0)?;
    let fill = match args.get(1) {
        None | Some(Value::Undefined) => " ",
        Some(_) => text_arg(method, args, 1)?,
    };

    let len = s.chars().count();
    if target <= len as f64 || fill.is_empty() {
        return Ok(Value::String(s.to_string()));
    }
    if target > MAX_STRING_LEN as f64 {
        return Err(fail(method, format!("invalid length {}", format_number(target))));
    }

    let padding: String = fill.chars().cycle().take(target as usize - len).collect();
    Ok(Value::String(if at_start {
        padding + s
    } else {
        s.to_string() + &padding
    }))
}

fn pad_end(s: &str, args: &[Value]) -> Result<Value> {
    pad("padEnd", s, args, false)
}

fn pad_start(s: &str, args: &[Value]) -> Result<Value> {
    pad("padStart", s, args, true)
}

fn repeat(s: &str, args: &[Value]) -> Result<Value> {
    let count = position_arg("repeat", args, 0, 0.0)?;
    let too_long = count * s.chars().count() as f64 > MAX_STRING_LEN as f64;
    if count < 0.0 || count.is_infinite() || too_long {
        return Err(fail("repeat", format!("invalid count {}", format_number(count))));
    }
    Ok(Value::String(s.repeat(count as usize)))
}

fn replace(s: &str, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg("replace", args, 0)?;
    let replacement = text_arg("replace", args, 1)?;
    let limit = if pattern.is_global() { 0 } else { 1 };
    let out = if matches!(args.first(), Some(Value::String(_))) {
        pattern.regex().replacen(s, limit, regex::NoExpand(replacement))
    } else {
        pattern.regex().replacen(s, limit, replacement)
    };
    Ok(Value::String(out.into_owned()))
}

fn replace_all(s: &str, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg("replaceAll", args, 0)?;
    let replacement = text_arg("replaceAll", args, 1)?;
    let out = match args.first() {
        Some(Value::Pattern(_)) if !pattern.is_global() => {
            return Err(fail("replaceAll", "pattern must have the g flag"));
        }
        Some(Value::Pattern(_)) => pattern.regex().replace_all(s, replacement),
        _ => pattern.regex().replace_all(s, regex::NoExpand(replacement)),
    };
    Ok(Value::String(out.into_owned()))
}

fn search(s: &str, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg("search", args, 0)?;
    let found = pattern
        .regex()
        .find(s)
        .map_or(-1.0, |m| char_index(s, m.start()));
    Ok(Value::Number(found))
}

/// Every match for a global pattern, else the first match and its groups;
/// undefined when nothing matches
fn match_pattern(s: &str, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg("match", args, 0)?;
    let regex = pattern.regex();

    if pattern.is_global() {
        let found: Vec<Value> = regex.find_iter(s).map(|m| Value::from(m.as_str())).collect();
        return Ok(if found.is_empty() {
            Value::Undefined
        } else {
            Value::array(found)
        });
    }

    Ok(regex.captures(s).map_or(Value::Undefined, |captures| {
        Value::array(
            captures
                .iter()
                .map(|group| group.map_or(Value::Undefined, |m| Value::from(m.as_str()))),
        )
    }))
}

fn slice(s: &str, args: &[Value]) -> Result<Value> {
    let all = chars(s);
    let len = all.len();
    let start = relative(position_arg("slice", args, 0, 0.0)?, len);
    let end = relative(position_arg("slice", args, 1, len as f64)?, len);
    let out: String = if start < end {
        all[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Value::String(out))
}

fn substring(s: &str, args: &[Value]) -> Result<Value> {
    let all = chars(s);
    let len = all.len();
    let a = clamp(position_arg("substring", args, 0, 0.0)?, len);
    let b = clamp(position_arg("substring", args, 1, len as f64)?, len);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(Value::String(all[start..end].iter().collect()))
}

fn split(s: &str, args: &[Value]) -> Result<Value> {
    let limit = match position_arg("split", args, 1, f64::INFINITY)? {
        n if n < 0.0 => usize::MAX,
        n => n.min(usize::MAX as f64) as usize,
    };

    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::from(s)],
        Some(Value::String(sep)) if sep.is_empty() => {
            s.chars().map(|c| Value::String(c.to_string())).collect()
        }
        Some(Value::String(sep)) => s.split(sep.as_str()).map(Value::from).collect(),
        Some(Value::Pattern(pattern)) => pattern.regex().split(s).map(Value::from).collect(),
        Some(other) => {
            return Err(fail(
                "split",
                format!(
                    "argument 1 must be a string or a pattern (got {})",
                    other.type_name()
                ),
            ));
        }
    };

    Ok(Value::array(parts.into_iter().take(limit)))
}

fn to_lower_case(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::String(s.to_lowercase()))
}

fn to_upper_case(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::String(s.to_uppercase()))
}

fn trim(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::from(s.trim()))
}

fn trim_end(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::from(s.trim_end()))
}

fn trim_start(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::from(s.trim_start()))
}
