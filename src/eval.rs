//! The matcher interpreter.

use crate::cursor::Cursor;
use crate::error::FailureState;
use crate::expr::*;
use crate::fold::{FoldError, Match, Value};
use crate::grammar::{Grammar, Rule};
use log::debug;
use std::collections::HashMap;
use std::mem;

/// Rule tracing - no-op unless the `trace` feature is enabled
#[cfg(not(feature = "trace"))]
macro_rules! trace_rule {
    ($($arg:tt)*) => {};
}

/// Rule tracing - logs through the `log` crate at trace level
#[cfg(feature = "trace")]
macro_rules! trace_rule {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

/// The outcome of matching one expression.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RuleResult {
    Matched(Cursor),
    Failed,
}

use self::RuleResult::{Failed, Matched};

/// Stops evaluation outright. Never backtracked over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    /// A fold function rejected the input matched by the rule starting at `at`.
    Rejected { reason: String, at: Cursor },
    Inconsistent(String),
}

/// A successful rule invocation: where it ended and what it produced.
pub type RuleMatch<'input, V> = Option<(Cursor, Match<'input, V>)>;

struct CacheEntry<'input, V> {
    result: RuleMatch<'input, V>,
    failures: FailureState,
}

/// State for a single parse of a single input.
pub struct Session<'g, 'input, V> {
    grammar: &'g Grammar<V>,
    input: &'input str,
    pub failures: FailureState,
    cache: HashMap<(usize, usize), CacheEntry<'input, V>>,
}

impl<'g, 'input, V: Value> Session<'g, 'input, V> {
    pub fn new(grammar: &'g Grammar<V>, input: &'input str) -> Self {
        Session { grammar, input, failures: FailureState::new(), cache: HashMap::new() }
    }

    /// Invoke the rule at `index` from `start`, returning its match even if
    /// the rule is silent.
    pub fn invoke(&mut self, index: usize, start: Cursor) -> Result<RuleMatch<'input, V>, Abort> {
        let grammar = self.grammar;
        let rule = grammar.get(index);

        if rule.cached {
            if let Some(entry) = self.cache.get(&(index, start.offset)) {
                trace_rule!("Cached {} of rule {} at {}", if entry.result.is_some() { "match" } else { "fail" }, rule.name, start);
                self.failures.absorb(&entry.failures);
                return Ok(entry.result.clone());
            }
        }

        trace_rule!("Attempting to match rule {} at {}", rule.name, start);

        // Cached and labelled rules collect their failures separately: a cache
        // entry has to replay them, and a label may replace them.
        let isolate = rule.cached || rule.expected.is_some();
        let outer = if isolate { Some(mem::take(&mut self.failures)) } else { None };

        let mut children = Vec::new();
        let body = self.eval(&rule.expr, start, &mut children);
        let inner = outer.map(|outer| mem::replace(&mut self.failures, outer));

        let result = match body? {
            Matched(end) => {
                trace_rule!("Matched rule {} at {} to {}", rule.name, start, end);
                if rule.trace.matches() {
                    debug!("matched rule {} at {} to {}", rule.name, start, end);
                }
                Some((end, self.complete(rule, start, end, &children)?))
            }
            Failed => {
                trace_rule!("Failed to match rule {} at {}", rule.name, start);
                if rule.trace.failures() {
                    debug!("failed to match rule {} at {}", rule.name, start);
                }
                None
            }
        };

        if let Some(inner) = inner {
            // A label stands in for the failures of a rule that failed. A rule
            // that matched keeps them: they may lie beyond where it ended.
            let reported = match (&rule.expected, &result) {
                (Some(label), None) => {
                    let mut labelled = FailureState::new();
                    labelled.mark_failure(inner.furthest().unwrap_or(start), label);
                    labelled
                }
                _ => inner,
            };
            self.failures.absorb(&reported);

            if rule.cached {
                self.cache.insert(
                    (index, start.offset),
                    CacheEntry { result: result.clone(), failures: reported },
                );
            }
        }

        Ok(result)
    }

    /// Build the rule's match from the matches of its body.
    fn complete(&self, rule: &Rule<V>, start: Cursor, end: Cursor, children: &[Match<'input, V>]) -> Result<Match<'input, V>, Abort> {
        let text = &self.input[start.offset..end.offset];
        let value = match &rule.fold {
            Some(fold) => fold(children).map_err(|e| match e {
                FoldError::Reject(reason) => Abort::Rejected { reason, at: start },
                FoldError::Inconsistent(msg) => Abort::Inconsistent(format!("rule `{}`: {}", rule.name, msg)),
            })?,
            None => V::from_text(text),
        };
        Ok(Match { text, value, position: start })
    }

    fn leaf(&self, start: Cursor, len: usize) -> (Cursor, Match<'input, V>) {
        let text = &self.input[start.offset..start.offset + len];
        let end = start.advance_over(text);
        (end, Match { text, value: V::from_text(text), position: start })
    }

    /// Match `expr` at `cursor`, appending produced matches to `out`.
    ///
    /// On failure `out` is left as it was found and the cursor is not
    /// advanced.
    pub fn eval(&mut self, expr: &'g Expr, cursor: Cursor, out: &mut Vec<Match<'input, V>>) -> Result<RuleResult, Abort> {
        let res = match expr {
            LiteralExpr(lit) => match lit.match_len(cursor.rest(self.input)) {
                Some(len) => {
                    let (end, m) = self.leaf(cursor, len);
                    out.push(m);
                    Matched(end)
                }
                None => {
                    self.failures.mark_failure(cursor, lit.text());
                    Failed
                }
            },

            ClassExpr(class) => match cursor.peek(self.input) {
                Some(c) if class.matches(c) => {
                    let (end, m) = self.leaf(cursor, c.len_utf8());
                    out.push(m);
                    Matched(end)
                }
                _ => {
                    self.failures.mark_failure(cursor, &class.describe());
                    Failed
                }
            },

            SeqExpr(exprs) => {
                let mark = out.len();
                let mut pos = cursor;
                for expr in exprs {
                    match self.eval(expr, pos, out)? {
                        Matched(next) => pos = next,
                        Failed => {
                            out.truncate(mark);
                            return Ok(Failed);
                        }
                    }
                }
                Matched(pos)
            }

            ChoiceExpr(exprs) => {
                let mark = out.len();
                for expr in exprs {
                    if let Matched(next) = self.eval(expr, cursor, out)? {
                        return Ok(Matched(next));
                    }
                    out.truncate(mark);
                }
                Failed
            }

            RepeatExpr { expr, min, max } => {
                let mark = out.len();
                let mut pos = cursor;
                let mut count = 0;

                while max.map_or(true, |max| count < max) {
                    match self.eval(expr, pos, out)? {
                        Matched(next) => {
                            count += 1;
                            if next.offset == pos.offset {
                                // Matching nothing again would loop forever.
                                break;
                            }
                            pos = next;
                        }
                        Failed => break,
                    }
                }

                if count >= *min {
                    Matched(pos)
                } else {
                    out.truncate(mark);
                    Failed
                }
            }

            PosAssertExpr(expr) => {
                let mark = out.len();
                self.failures.suppress_fail += 1;
                let res = self.eval(expr, cursor, out);
                self.failures.suppress_fail -= 1;
                out.truncate(mark);
                match res? {
                    Matched(_) => Matched(cursor),
                    Failed => Failed,
                }
            }

            NegAssertExpr(expr) => {
                let mark = out.len();
                self.failures.suppress_fail += 1;
                let res = self.eval(expr, cursor, out);
                self.failures.suppress_fail -= 1;
                out.truncate(mark);
                match res? {
                    Matched(_) => Failed,
                    Failed => Matched(cursor),
                }
            }

            RuleExpr(name) => {
                let index = match self.grammar.index(name) {
                    Some(index) => index,
                    None => return Err(Abort::Inconsistent(format!("undefined rule `{}`", name))),
                };
                let silent = self.grammar.get(index).silent;
                match self.invoke(index, cursor)? {
                    Some((end, m)) => {
                        if !silent {
                            out.push(m);
                        }
                        Matched(end)
                    }
                    None => Failed,
                }
            }

            EofExpr => {
                if cursor.at_end(self.input) {
                    Matched(cursor)
                } else {
                    self.failures.mark_failure(cursor, "end of input");
                    Failed
                }
            }
        };
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    fn run(grammar: &Grammar<String>, expr: &Expr, input: &str) -> (RuleResult, Vec<String>, FailureState) {
        let mut session = Session::new(grammar, input);
        let mut out = Vec::new();
        let res = session.eval(expr, Cursor::start(), &mut out).unwrap();
        (res, out.into_iter().map(|m| m.text.to_owned()).collect(), session.failures)
    }

    fn offset(res: RuleResult) -> Option<usize> {
        match res {
            Matched(c) => Some(c.offset),
            Failed => None,
        }
    }

    #[test]
    fn sequence_is_all_or_nothing() {
        let g = Grammar::new();
        let e = seq(vec![lit("a"), lit("b"), lit("c")]);
        let (res, out, failures) = run(&g, &e, "abx");
        assert_eq!(res, Failed);
        assert!(out.is_empty());
        assert_eq!(failures.furthest().map(|c| c.offset), Some(2));
        assert_eq!(failures.expected().to_string(), "c");
    }

    #[test]
    fn choice_collects_labels_of_failed_alternatives() {
        let g = Grammar::new();
        let e = choice(vec![lit("x"), lit("y"), lit("z")]);
        let (res, _, failures) = run(&g, &e, "q");
        assert_eq!(res, Failed);
        assert_eq!(failures.expected().to_string(), "x or y or z");

        let (res, out, _) = run(&g, &e, "y");
        assert_eq!(offset(res), Some(1));
        assert_eq!(out, ["y"]);
    }

    #[test]
    fn choice_commits_to_first_success() {
        let g = Grammar::new();
        let e = seq(vec![choice(vec![lit("a"), lit("ab")]), lit("c")]);
        let (res, _, _) = run(&g, &e, "abc");
        assert_eq!(res, Failed);
    }

    #[test]
    fn repetition_bounds() {
        let g = Grammar::new();
        let digit = || class(CharClass::new().range('0', '9'));

        let (res, out, _) = run(&g, &repeat(digit(), 2, Some(3)), "12345");
        assert_eq!(offset(res), Some(3));
        assert_eq!(out, ["1", "2", "3"]);

        let (res, out, failures) = run(&g, &repeat(digit(), 2, None), "1x");
        assert_eq!(res, Failed);
        assert!(out.is_empty());
        assert_eq!(failures.expected().to_string(), "[0-9]");
        assert_eq!(failures.furthest().map(|c| c.column), Some(2));
    }

    #[test]
    fn zero_width_repetition_terminates() {
        let g = Grammar::new();
        let (res, out, _) = run(&g, &star(opt(lit("x"))), "xxy");
        assert_eq!(offset(res), Some(2));
        assert_eq!(out, ["x", "x"]);

        let (res, _, _) = run(&g, &repeat(star(lit("x")), 3, None), "y");
        assert_eq!(res, Failed);
        let (res, _, _) = run(&g, &plus(star(lit("x"))), "y");
        assert_eq!(offset(res), Some(0));
    }

    #[test]
    fn lookahead_does_not_consume() {
        let g = Grammar::new();
        let e = seq(vec![pos(lit("ab")), lit("a")]);
        let (res, out, _) = run(&g, &e, "ab");
        assert_eq!(offset(res), Some(1));
        assert_eq!(out, ["a"]);

        let e = seq(vec![neg(seq(vec![lit("a"), lit("b")])), lit("a"), lit("x")]);
        let (res, _, failures) = run(&g, &e, "ac");
        assert_eq!(res, Failed);
        assert_eq!(failures.furthest().map(|c| c.offset), Some(1));
        assert_eq!(failures.expected().len(), 1, "expected set includes: {}", failures.expected());
    }

    #[test]
    fn labelled_rule_replaces_inner_failures() {
        let g = Grammar::new()
            .rule(Rule::new("ws", class(CharClass::new().chars(" \t"))).expected("whitespace"))
            .rule(Rule::new("digits", plus(class(CharClass::new().range('0', '9')))));
        let e = choice(vec![rule("ws"), rule("digits")]);
        let (_, _, failures) = run(&g, &e, "x");
        assert_eq!(failures.expected().to_string(), "whitespace or [0-9]");
    }

    #[test]
    fn labelled_rule_that_matches_keeps_inner_failures() {
        let digits = || plus(class(CharClass::new().range('0', '9')));
        let g = Grammar::new()
            .rule(Rule::new("num", seq(vec![digits(), opt(seq(vec![lit("."), digits()]))])).expected("number"));
        let (res, _, failures) = run(&g, &rule("num"), "2.x");
        assert_eq!(offset(res), Some(1));
        assert_eq!(failures.furthest().map(|c| c.offset), Some(2));
        assert_eq!(failures.expected().to_string(), "[0-9]");
    }

    #[test]
    fn silent_rule_contributes_nothing() {
        let g = Grammar::new()
            .rule(Rule::new("ws", star(lit(" "))).silent())
            .rule(Rule::new("word", plus(class(CharClass::new().range('a', 'z')))));
        let e = seq(vec![rule("ws"), rule("word"), rule("ws")]);
        let (res, out, _) = run(&g, &e, "  hi ");
        assert_eq!(offset(res), Some(5));
        assert_eq!(out, ["hi"]);
    }

    #[test]
    fn cached_rule_replays_failures() {
        let g = Grammar::<String>::new().rule(Rule::new("x", lit("x")).cached());
        let e = choice(vec![seq(vec![rule("x"), lit("!")]), seq(vec![neg(lit("y")), rule("x")])]);
        let mut session = Session::new(&g, "z");
        let mut out = Vec::new();
        assert_eq!(session.eval(&e, Cursor::start(), &mut out), Ok(Failed));
        assert_eq!(session.cache.len(), 1);
        assert_eq!(session.failures.expected().to_string(), "x");
    }
}
