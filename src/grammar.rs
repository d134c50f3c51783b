//! The rule table.

use crate::error::GrammarError;
use crate::expr::Expr;
use crate::fold::{self, FoldError, FoldFn, Match, Value};
use std::collections::HashMap;
use std::fmt;

/// Which outcomes of a rule are logged at `debug` level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Trace {
    #[default]
    Off,
    Matches,
    Failures,
    All,
}

impl Trace {
    pub fn matches(self) -> bool {
        matches!(self, Trace::Matches | Trace::All)
    }

    pub fn failures(self) -> bool {
        matches!(self, Trace::Failures | Trace::All)
    }
}

/// A named rule: a body expression plus how its match is reported.
pub struct Rule<V> {
    pub name: String,
    pub expr: Expr,
    pub fold: Option<FoldFn<V>>,

    /// Replaces every failure inside the rule with this single label.
    pub expected: Option<String>,

    /// Matches without contributing a result to the enclosing rule.
    pub silent: bool,

    /// Memoize results by input offset for the duration of one parse.
    pub cached: bool,

    pub trace: Trace,
}

impl<V: Value> Rule<V> {
    pub fn new(name: &str, expr: Expr) -> Rule<V> {
        Rule {
            name: name.to_owned(),
            expr,
            fold: None,
            expected: None,
            silent: false,
            cached: false,
            trace: Trace::Off,
        }
    }

    pub fn fold<F>(mut self, f: F) -> Rule<V>
    where
        F: for<'input> Fn(&[Match<'input, V>]) -> Result<V, FoldError> + Send + Sync + 'static,
    {
        self.fold = Some(fold::from_fn(f));
        self
    }

    /// Use an already boxed fold function, such as the ones in [`fold`](crate::fold).
    pub fn fold_with(mut self, f: FoldFn<V>) -> Rule<V> {
        self.fold = Some(f);
        self
    }

    pub fn expected(mut self, label: &str) -> Rule<V> {
        self.expected = Some(label.to_owned());
        self
    }

    pub fn silent(mut self) -> Rule<V> {
        self.silent = true;
        self
    }

    pub fn cached(mut self) -> Rule<V> {
        self.cached = true;
        self
    }

    /// Log this rule's matches, failures or both through `log::debug!`.
    pub fn trace(mut self, trace: Trace) -> Rule<V> {
        self.trace = trace;
        self
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Rule")
            .field("name", &self.name)
            .field("expr", &self.expr)
            .field("fold", &self.fold.as_ref().map(|_| "<fn>"))
            .field("expected", &self.expected)
            .field("silent", &self.silent)
            .field("cached", &self.cached)
            .field("trace", &self.trace)
            .finish()
    }
}

/// Rules in declaration order, indexed by name.
///
/// Rule references inside bodies are plain names, so rules may refer to
/// themselves and to each other in any order.
#[derive(Debug)]
pub struct Grammar<V> {
    rules: Vec<Rule<V>>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl<V: Value> Grammar<V> {
    pub fn new() -> Grammar<V> {
        Grammar { rules: Vec::new(), index: HashMap::new(), duplicates: Vec::new() }
    }

    /// Add a rule. A second rule with the same name is reported when the
    /// grammar is turned into a [`Parser`](crate::Parser).
    pub fn rule(mut self, rule: Rule<V>) -> Grammar<V> {
        if self.index.contains_key(&rule.name) {
            self.duplicates.push(rule.name);
            return self;
        }
        self.index.insert(rule.name.clone(), self.rules.len());
        self.rules.push(rule);
        self
    }

    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule<V>> {
        self.rules.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Rule<V>> {
        self.index(name).map(|i| &self.rules[i])
    }

    pub(crate) fn index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn get(&self, index: usize) -> &Rule<V> {
        &self.rules[index]
    }

    /// Check the grammar for defects, with `start` as the entry rule.
    pub fn check(&self, start: &str) -> Result<(), GrammarError> {
        if let Some(name) = self.duplicates.first() {
            return Err(GrammarError::DuplicateRule(name.clone()));
        }
        if self.index(start).is_none() {
            return Err(GrammarError::MissingStart(start.to_owned()));
        }

        let mut errors = Vec::new();
        crate::analysis::check(self, &mut |e| errors.push(e));
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<V: Value> Default for Grammar<V> {
    fn default() -> Self {
        Grammar::new()
    }
}
