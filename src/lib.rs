//! A backtracking evaluator for parsing expression grammars.
//!
//! Grammars are built at runtime from [`Expr`] nodes and named [`Rule`]s,
//! checked once when a [`Parser`] is created, and then evaluated against any
//! number of inputs. A failed parse reports every alternative that was
//! expected at the furthest position any branch reached:
//!
//! ```
//! use peg_engine::calc;
//!
//! let parser = calc::parser();
//! assert_eq!(parser.parse("(2 + 3) * 5"), Ok(25.0));
//!
//! let err = parser.parse("xxx").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Expected whitespace or number or parenthesized expression at line 1 col 1."
//! );
//! ```

mod analysis;
pub mod calc;
pub mod cursor;
pub mod error;
mod eval;
pub mod expr;
pub mod fold;
pub mod grammar;
pub mod parser;

pub use crate::cursor::Cursor;
pub use crate::error::{Error, ExpectedSet, GrammarError, ParseError, ParseErrorKind};
pub use crate::expr::{CharClass, Expr, Literal};
pub use crate::fold::{FoldError, FoldFn, Match, Value};
pub use crate::grammar::{Grammar, Rule, Trace};
pub use crate::parser::{Options, Parsed, Parser};
