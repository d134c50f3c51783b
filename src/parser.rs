//! The parser façade: a checked grammar plus a start rule.

use crate::cursor::Cursor;
use crate::error::{Error, GrammarError, ParseError};
use crate::eval::{Abort, Session};
use crate::fold::Value;
use crate::grammar::Grammar;
use log::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Accept a match of the start rule that leaves input behind. The
    /// remainder is returned in [`Parsed::unconsumed`].
    pub allow_partial: bool,
}

/// A successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<'input, V> {
    pub value: V,

    /// The input after the start rule's match; empty if it consumed everything.
    pub unconsumed: &'input str,
}

/// A reusable parser. Holds no per-parse state, so one instance can serve any
/// number of calls, from any number of threads.
#[derive(Debug)]
pub struct Parser<V> {
    grammar: Grammar<V>,
    start: usize,
    options: Options,
}

impl<V: Value> Parser<V> {
    /// Check `grammar` and build a parser starting from the rule named `start`.
    pub fn new(grammar: Grammar<V>, start: &str) -> Result<Parser<V>, GrammarError> {
        grammar.check(start)?;
        let start = grammar.index(start).ok_or_else(|| GrammarError::MissingStart(start.to_owned()))?;
        Ok(Parser { grammar, start, options: Options::default() })
    }

    pub fn with_options(mut self, options: Options) -> Parser<V> {
        self.options = options;
        self
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Parse `input`, returning the start rule's value.
    ///
    /// Unless [`Options::allow_partial`] is set, input left over after the
    /// start rule is an error.
    pub fn parse(&self, input: &str) -> Result<V, Error> {
        self.run(input, None, self.options.allow_partial).map(|parsed| parsed.value)
    }

    /// Like [`parse`](Parser::parse), naming `file` in error messages.
    pub fn parse_file(&self, input: &str, file: &str) -> Result<V, Error> {
        self.run(input, Some(file), self.options.allow_partial).map(|parsed| parsed.value)
    }

    /// Parse a prefix of `input`, returning the value and what was left over.
    pub fn parse_partial<'input>(&self, input: &'input str) -> Result<Parsed<'input, V>, Error> {
        self.run(input, None, true)
    }

    fn run<'input>(&self, input: &'input str, file: Option<&str>, allow_partial: bool) -> Result<Parsed<'input, V>, Error> {
        let rule_name = &self.grammar.get(self.start).name;
        debug!("parsing {} bytes from rule {}", input.len(), rule_name);

        let mut session = Session::new(&self.grammar, input);
        let result = match session.invoke(self.start, Cursor::start()) {
            Ok(result) => result,
            Err(Abort::Rejected { reason, at }) => {
                debug!("rejected at {}: {}", at, reason);
                return Err(ParseError::rejected(&reason, at, file).into());
            }
            Err(Abort::Inconsistent(msg)) => {
                debug!("grammar inconsistency: {}", msg);
                return Err(Error::Inconsistent(msg));
            }
        };

        let (end, m) = match result {
            Some(matched) => matched,
            None => {
                let err = ParseError::failure(session.failures, file);
                debug!("failed: {}", err);
                return Err(err.into());
            }
        };

        let unconsumed = end.rest(input);
        if !unconsumed.is_empty() && !allow_partial {
            debug!("matched to {} with input left over", end);
            return Err(ParseError::unconsumed(unconsumed, end, file).into());
        }

        debug!("matched to {}", end);
        Ok(Parsed { value: m.value, unconsumed })
    }
}
