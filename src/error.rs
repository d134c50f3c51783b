//! Parse error reporting

use crate::cursor::Cursor;
use std::fmt::{self, Display, Write};
use thiserror::Error;

/// Longest prefix of the unconsumed input quoted in an error message.
pub const SNIPPET_CHARS: usize = 16;

/// Labels of the alternatives that failed at the furthest position, in the
/// order they were first recorded.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ExpectedSet {
    expected: Vec<String>,
}

impl ExpectedSet {
    /// Iterator of expected labels
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.expected.iter().map(|x| x.as_str())
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    fn insert(&mut self, label: &str) {
        if !self.expected.iter().any(|x| x == label) {
            self.expected.push(label.to_owned());
        }
    }

    fn clear(&mut self) {
        self.expected.clear();
    }
}

impl Display for ExpectedSet {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.expected.is_empty() {
            return write!(fmt, "<unreported>");
        }

        let mut iter = self.tokens();
        if let Some(first) = iter.next() {
            write!(fmt, "{}", first)?;
        }
        for elem in iter {
            write!(fmt, " or {}", elem)?;
        }
        Ok(())
    }
}

/// The furthest failure reached by any branch of a parse.
///
/// Only moves forward: a failure before `furthest` is ignored, one at
/// `furthest` adds its label, and one beyond it starts a new label set.
#[derive(Debug, Clone, Default)]
pub struct FailureState {
    furthest: Option<Cursor>,
    expected: ExpectedSet,

    /// Non-zero inside a lookahead, whose failures are not recorded. Counts
    /// nesting depth.
    pub(crate) suppress_fail: usize,
}

impl FailureState {
    pub fn new() -> Self {
        FailureState::default()
    }

    pub fn furthest(&self) -> Option<Cursor> {
        self.furthest
    }

    pub fn expected(&self) -> &ExpectedSet {
        &self.expected
    }

    /// Flag a failure to match `label` at `at`.
    #[inline]
    pub fn mark_failure(&mut self, at: Cursor, label: &str) {
        if self.suppress_fail > 0 {
            return;
        }
        match self.furthest {
            Some(furthest) if at.offset < furthest.offset => {}
            Some(furthest) if at.offset == furthest.offset => self.expected.insert(label),
            _ => {
                self.furthest = Some(at);
                self.expected.clear();
                self.expected.insert(label);
            }
        }
    }

    /// Merge failures recorded in a separate state into this one, as if each
    /// had been marked here.
    pub fn absorb(&mut self, other: &FailureState) {
        if let Some(at) = other.furthest {
            for label in other.expected.tokens() {
                self.mark_failure(at, label);
            }
        }
    }
}

/// Which way a parse went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No alternative matched at the furthest position reached.
    Failure,
    /// The start rule matched but input remained.
    Unconsumed,
    /// A fold function rejected what was matched.
    Rejected,
}

/// A parse failure, with a message in the exact format callers match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,

    /// Where the error is reported: the furthest failure, the first
    /// unconsumed character, or the start of the rejecting rule.
    pub location: Cursor,

    /// Alternatives expected at `location`. Empty unless `kind` is `Failure`.
    pub expected: ExpectedSet,

    /// Input left after the start rule matched. Empty unless `kind` is `Unconsumed`.
    pub unconsumed: String,

    message: String,
}

impl ParseError {
    pub(crate) fn failure(failures: FailureState, file: Option<&str>) -> ParseError {
        let location = failures.furthest.unwrap_or_else(Cursor::start);
        let message = positioned(&format!("Expected {}", failures.expected), location, file);
        ParseError {
            kind: ParseErrorKind::Failure,
            location,
            expected: failures.expected,
            unconsumed: String::new(),
            message,
        }
    }

    pub(crate) fn unconsumed(rest: &str, location: Cursor, file: Option<&str>) -> ParseError {
        let snippet: String = rest.chars().take(SNIPPET_CHARS).collect();
        let message = positioned(
            &format!("Not all input was consumed starting from '{}'", snippet),
            location,
            file,
        );
        ParseError {
            kind: ParseErrorKind::Unconsumed,
            location,
            expected: ExpectedSet::default(),
            unconsumed: rest.to_owned(),
            message,
        }
    }

    pub(crate) fn rejected(reason: &str, location: Cursor, file: Option<&str>) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Rejected,
            location,
            expected: ExpectedSet::default(),
            unconsumed: String::new(),
            message: positioned(reason, location, file),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `"{text} at line L col C."`, or `" in {file}"` in place of the period.
fn positioned(text: &str, at: Cursor, file: Option<&str>) -> String {
    let mut message = escape(text);
    // Writing to a String cannot fail.
    let _ = write!(message, " at line {} col {}", at.line, at.column);
    match file {
        Some(file) => {
            let _ = write!(message, " in {}", file);
        }
        None => message.push('.'),
    }
    message
}

/// Make control characters visible.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Any error returned by [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The grammar and its fold functions disagree, e.g. a fold received an
    /// operator it does not know. Not caused by the input.
    #[error("grammar inconsistency: {0}")]
    Inconsistent(String),
}

impl Error {
    /// The parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Inconsistent(_) => None,
        }
    }
}

/// A defect in a grammar, found before any input is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("duplicate rule `{0}`")]
    DuplicateRule(String),

    #[error("undefined rule `{name}` referenced from `{from}`")]
    UndefinedRule { name: String, from: String },

    #[error("missing start rule `{0}`")]
    MissingStart(String),

    #[error("left recursive rules create an infinite loop: {}", .0.join(" -> "))]
    LeftRecursion(Vec<String>),

    #[error("repetition in rule `{rule}` allows {min} to {max} matches; max must be positive and at least min")]
    InvalidRepeat { rule: String, min: usize, max: usize },

    #[error("backwards range `{lo}-{hi}` in rule `{rule}`")]
    BackwardsRange { rule: String, lo: char, hi: char },

    #[error("unreachable alternative in rule `{0}`")]
    UnreachableAlternative(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset: usize) -> Cursor {
        Cursor { offset, line: 1, column: offset + 1 }
    }

    #[test]
    fn furthest_failure_wins() {
        let mut state = FailureState::new();
        state.mark_failure(at(0), "a");
        state.mark_failure(at(2), "b");
        state.mark_failure(at(1), "c");
        state.mark_failure(at(2), "d");
        state.mark_failure(at(2), "b");
        assert_eq!(state.furthest(), Some(at(2)));
        assert_eq!(state.expected().tokens().collect::<Vec<_>>(), ["b", "d"]);
    }

    #[test]
    fn suppressed_failures_are_ignored() {
        let mut state = FailureState::new();
        state.suppress_fail += 1;
        state.mark_failure(at(3), "x");
        assert_eq!(state.furthest(), None);
    }

    #[test]
    fn absorb_keeps_order() {
        let mut outer = FailureState::new();
        outer.mark_failure(at(1), "x");
        let mut inner = FailureState::new();
        inner.mark_failure(at(1), "y");
        inner.mark_failure(at(1), "x");
        outer.absorb(&inner);
        assert_eq!(outer.expected().to_string(), "x or y");
    }

    #[test]
    fn message_formats() {
        let mut state = FailureState::new();
        state.mark_failure(at(0), "whitespace");
        state.mark_failure(at(0), "number");
        assert_eq!(
            ParseError::failure(state, None).to_string(),
            "Expected whitespace or number at line 1 col 1."
        );

        let e = ParseError::unconsumed("yy\n", at(2), Some("input.txt"));
        assert_eq!(e.to_string(), "Not all input was consumed starting from 'yy\\n' at line 1 col 3 in input.txt");
        assert_eq!(e.unconsumed, "yy\n");

        let e = ParseError::unconsumed("abcdefghijklmnopqrstuvwxyz", at(0), None);
        assert_eq!(e.message(), "Not all input was consumed starting from 'abcdefghijklmnop' at line 1 col 1.");
    }

    #[test]
    fn empty_expected_set() {
        assert_eq!(ParseError::failure(FailureState::new(), None).message(), "Expected <unreported> at line 1 col 1.");
    }
}
