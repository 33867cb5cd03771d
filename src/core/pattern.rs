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

//! Compiled regular expression values
//!
//! Patterns use the `regex` crate syntax. Flags follow the familiar letters:
//! `i`, `m` and `s` change matching, `g` makes `replace`, `match` and
//! `split` work on every match, `d`, `u`, `v` and `y` are accepted and kept
//! for display only.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

const KNOWN_FLAGS: &str = "dgimsuvy";

/// Reasons a pattern cannot be built
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("invalid flag '{0}'")]
    InvalidFlag(char),

    #[error("duplicate flag '{0}'")]
    DuplicateFlag(char),

    #[error("invalid pattern: {0}")]
    Syntax(String),
}

/// A compiled regular expression together with its source and flags
#[derive(Clone)]
pub struct Pattern {
    source: Arc<str>,
    flags: Arc<str>,
    regex: Arc<Regex>,
}

impl Pattern {
    /// Compile `source` with the given flag letters
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let mut seen = String::new();
        for flag in flags.chars() {
            if !KNOWN_FLAGS.contains(flag) {
                return Err(PatternError::InvalidFlag(flag));
            }
            if seen.contains(flag) {
                return Err(PatternError::DuplicateFlag(flag));
            }
            seen.push(flag);
        }

        let regex = RegexBuilder::new(source)
            .case_insensitive(seen.contains('i'))
            .multi_line(seen.contains('m'))
            .dot_matches_new_line(seen.contains('s'))
            .build()
            .map_err(|err| PatternError::Syntax(err.to_string()))?;

        Ok(Self {
            source: source.into(),
            flags: flags.into(),
            regex: Arc::new(regex),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.regex, &other.regex)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_change_matching() {
        let plain = Pattern::new("abc", "").unwrap();
        assert!(!plain.regex().is_match("ABC"));
        assert!(!plain.is_global());

        let folded = Pattern::new("abc", "gi").unwrap();
        assert!(folded.regex().is_match("xABCx"));
        assert!(folded.is_global());
        assert_eq!(folded.to_string(), "/abc/gi");
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(Pattern::new("a", "q"), Err(PatternError::InvalidFlag('q')));
        assert_eq!(Pattern::new("a", "gg"), Err(PatternError::DuplicateFlag('g')));
        assert!(matches!(Pattern::new("(", ""), Err(PatternError::Syntax(_))));
    }

    #[test]
    fn test_equality_is_structural_identity_is_separate() {
        let a = Pattern::new("abc", "g").unwrap();
        let b = Pattern::new("abc", "g").unwrap();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
        assert_ne!(a, Pattern::new("abc", "").unwrap());
    }
}
