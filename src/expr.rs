//! The matcher tree: rule bodies as a closed set of expression kinds.

use std::fmt::{self, Display, Write};
use std::ops::RangeInclusive;

pub use self::Expr::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    LiteralExpr(Literal),
    ClassExpr(CharClass),
    SeqExpr(Vec<Expr>),
    ChoiceExpr(Vec<Expr>),
    RepeatExpr {
        expr: Box<Expr>,
        min: usize,
        /// `None` means unbounded.
        max: Option<usize>,
    },
    PosAssertExpr(Box<Expr>),
    NegAssertExpr(Box<Expr>),
    /// Reference to another rule, resolved by name when evaluated.
    RuleExpr(String),
    EofExpr,
}

impl Expr {
    /// Visit this expression and every expression nested in it, parents first.
    pub fn for_each_expr<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        match self {
            SeqExpr(exprs) | ChoiceExpr(exprs) => {
                for expr in exprs {
                    expr.for_each_expr(f);
                }
            }
            RepeatExpr { expr, .. } | PosAssertExpr(expr) | NegAssertExpr(expr) => expr.for_each_expr(f),
            LiteralExpr(_) | ClassExpr(_) | RuleExpr(_) | EofExpr => {}
        }
    }

    /// Visit the names of all rules this expression references.
    pub fn for_each_rule<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        self.for_each_expr(&mut |expr| {
            if let RuleExpr(name) = expr {
                f(name)
            }
        });
    }
}

/// A literal string, optionally compared without regard to case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    text: String,
    ignore_case: bool,
}

impl Literal {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Length in bytes of the input matched at the start of `rest`, if it matches.
    pub(crate) fn match_len(&self, rest: &str) -> Option<usize> {
        if !self.ignore_case {
            return if rest.starts_with(self.text.as_str()) {
                Some(self.text.len())
            } else {
                None
            };
        }

        let mut len = 0;
        let mut input = rest.chars();
        for expected in self.text.chars() {
            let found = input.next()?;
            if !found.to_lowercase().eq(expected.to_lowercase()) {
                return None;
            }
            len += found.len_utf8();
        }
        Some(len)
    }

    /// True if this literal matches wherever `later` does, so that `later`
    /// is never reached when it is the later alternative of a choice.
    pub(crate) fn shadows(&self, later: &Literal) -> bool {
        if self.ignore_case {
            later.text.to_lowercase().starts_with(&self.text.to_lowercase())
        } else {
            !later.ignore_case && later.text.starts_with(self.text.as_str())
        }
    }
}

/// A single-character test: explicit characters and inclusive ranges,
/// optionally negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    chars: Vec<char>,
    ranges: Vec<RangeInclusive<char>>,
    negated: bool,
    label: Option<String>,
}

impl CharClass {
    pub fn new() -> CharClass {
        CharClass { chars: Vec::new(), ranges: Vec::new(), negated: false, label: None }
    }

    /// Add each character of `chars` to the class.
    pub fn chars(mut self, chars: &str) -> CharClass {
        self.chars.extend(chars.chars());
        self
    }

    pub fn range(mut self, lo: char, hi: char) -> CharClass {
        self.ranges.push(lo..=hi);
        self
    }

    /// Match every character *not* in the class.
    pub fn negate(mut self) -> CharClass {
        self.negated = !self.negated;
        self
    }

    /// Report failures with `label` instead of the bracket rendering.
    pub fn label(mut self, label: &str) -> CharClass {
        self.label = Some(label.to_owned());
        self
    }

    pub fn matches(&self, c: char) -> bool {
        let found = self.chars.contains(&c) || self.ranges.iter().any(|r| r.contains(&c));
        found != self.negated
    }

    /// The first range written high to low, such as `z-a`.
    pub fn backwards_range(&self) -> Option<(char, char)> {
        self.ranges.iter().find(|r| r.start() > r.end()).map(|r| (*r.start(), *r.end()))
    }

    /// True if this class matches every character `other` matches.
    ///
    /// Conservative: a negated `other` is only covered by a negated class.
    pub fn covers(&self, other: &CharClass) -> bool {
        let (mine, theirs) = (self.intervals(), other.intervals());
        match (self.negated, other.negated) {
            (false, false) => within(&theirs, &mine),
            (true, false) => disjoint(&theirs, &mine),
            (true, true) => within(&mine, &theirs),
            (false, true) => false,
        }
    }

    /// The listed characters and ranges as sorted, merged code point spans.
    fn intervals(&self) -> Vec<(u32, u32)> {
        let mut spans: Vec<(u32, u32)> = self
            .chars
            .iter()
            .map(|&c| (c as u32, c as u32))
            .chain(self.ranges.iter().filter(|r| r.start() <= r.end()).map(|r| (*r.start() as u32, *r.end() as u32)))
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
        for (lo, hi) in spans {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        merged
    }

    /// The label recorded when the class fails to match.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.to_string(),
        }
    }
}

/// Every span of `inner` lies inside a span of `outer`. Both must be merged.
fn within(inner: &[(u32, u32)], outer: &[(u32, u32)]) -> bool {
    inner.iter().all(|&(lo, hi)| outer.iter().any(|&(olo, ohi)| olo <= lo && hi <= ohi))
}

fn disjoint(a: &[(u32, u32)], b: &[(u32, u32)]) -> bool {
    a.iter().all(|&(lo, hi)| b.iter().all(|&(blo, bhi)| hi < blo || bhi < lo))
}

impl Default for CharClass {
    fn default() -> Self {
        CharClass::new()
    }
}

impl Display for CharClass {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_char('[')?;
        if self.negated {
            fmt.write_char('^')?;
        }
        for &c in &self.chars {
            fmt.write_char(c)?;
        }
        for r in &self.ranges {
            write!(fmt, "{}-{}", r.start(), r.end())?;
        }
        fmt.write_char(']')
    }
}

pub fn lit(text: &str) -> Expr {
    LiteralExpr(Literal { text: text.to_owned(), ignore_case: false })
}

/// A case-insensitive literal.
pub fn ilit(text: &str) -> Expr {
    LiteralExpr(Literal { text: text.to_owned(), ignore_case: true })
}

pub fn class(class: CharClass) -> Expr {
    ClassExpr(class)
}

pub fn seq(exprs: Vec<Expr>) -> Expr {
    SeqExpr(exprs)
}

pub fn choice(exprs: Vec<Expr>) -> Expr {
    ChoiceExpr(exprs)
}

pub fn rule(name: &str) -> Expr {
    RuleExpr(name.to_owned())
}

pub fn eof() -> Expr {
    EofExpr
}

pub fn repeat(expr: Expr, min: usize, max: Option<usize>) -> Expr {
    RepeatExpr { expr: Box::new(expr), min, max }
}

pub fn opt(expr: Expr) -> Expr {
    repeat(expr, 0, Some(1))
}

pub fn star(expr: Expr) -> Expr {
    repeat(expr, 0, None)
}

pub fn plus(expr: Expr) -> Expr {
    repeat(expr, 1, None)
}

/// Positive lookahead.
pub fn pos(expr: Expr) -> Expr {
    PosAssertExpr(Box::new(expr))
}

/// Negative lookahead.
pub fn neg(expr: Expr) -> Expr {
    NegAssertExpr(Box::new(expr))
}
