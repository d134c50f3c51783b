//! Whitespace-tolerant four-function arithmetic over `f64`.
//!
//! ```text
//! start   = _ sum
//! sum     = product (("+" / "-") _ product)*
//! product = value (("*" / "/") _ value)*
//! value   = number / paren
//! number  = [0-9]+ ("." [0-9]+)? _            -- "number"
//! paren   = "(" _ sum ")" _                   -- "parenthesized expression"
//! _       = space*                            -- silent
//! space   = [ \t\r\n]                         -- "whitespace"
//! ```

use crate::expr::*;
use crate::fold::{self, FoldError, Match};
use crate::grammar::{Grammar, Rule};
use crate::parser::Parser;

pub fn grammar() -> Grammar<f64> {
    let digits = || plus(class(CharClass::new().range('0', '9')));

    Grammar::new()
        .rule(Rule::new("start", seq(vec![rule("_"), rule("sum")])).fold_with(fold::first()))
        .rule(
            Rule::new(
                "sum",
                seq(vec![
                    rule("product"),
                    star(seq(vec![choice(vec![lit("+"), lit("-")]), rule("_"), rule("product")])),
                ]),
            )
            .fold_with(fold::binary(fold::arith)),
        )
        .rule(
            Rule::new(
                "product",
                seq(vec![
                    rule("value"),
                    star(seq(vec![choice(vec![lit("*"), lit("/")]), rule("_"), rule("value")])),
                ]),
            )
            .fold_with(fold::binary(fold::arith)),
        )
        .rule(Rule::new("value", choice(vec![rule("number"), rule("paren")])).fold_with(fold::first()))
        .rule(
            Rule::new("number", seq(vec![digits(), opt(seq(vec![lit("."), digits()])), rule("_")]))
                .expected("number")
                .fold(|results: &[Match<'_, f64>]| {
                    let text: String = results.iter().map(|m| m.text).collect();
                    match text.parse::<f64>() {
                        Ok(n) if n.is_finite() => Ok(n),
                        _ => Err(FoldError::Reject(format!("number {} is out of range", text))),
                    }
                }),
        )
        .rule(
            Rule::new("paren", seq(vec![lit("("), rule("_"), rule("sum"), lit(")"), rule("_")]))
                .expected("parenthesized expression")
                .cached()
                .fold_with(fold::nth(1)),
        )
        .rule(Rule::new("_", star(rule("space"))).silent())
        .rule(Rule::new("space", class(CharClass::new().chars(" \t\r\n"))).expected("whitespace"))
}

/// A parser for [`grammar`], starting at `start`.
pub fn parser() -> Parser<f64> {
    // The grammar is fixed; `grammar_is_well_formed` checks it.
    Parser::new(grammar(), "start").expect("arithmetic grammar is well formed")
}
