use assert_matches::assert_matches;
use peg_engine::expr::*;
use peg_engine::{calc, Cursor, Grammar, GrammarError, Parser, Rule};
use std::sync::Arc;
use std::thread;

#[test]
fn parse_is_repeatable() {
    let p = Parser::new(Grammar::<String>::new().rule(Rule::new("xs", plus(lit("x")))), "xs").unwrap();
    for input in &["x", "xxyy", "y", ""] {
        let first = p.parse_partial(input);
        let second = p.parse_partial(input);
        assert_eq!(first, second);
    }
}

#[test]
fn parser_is_shared_across_threads() {
    let p = Arc::new(calc::parser());
    let handles: Vec<_> = (1..=8)
        .map(|n| {
            let p = Arc::clone(&p);
            thread::spawn(move || p.parse(&format!("{} * ({} + 1)", n, n)))
        })
        .collect();
    for (n, handle) in (1..=8).zip(handles) {
        let n = f64::from(n);
        assert_eq!(handle.join().unwrap(), Ok(n * (n + 1.0)));
    }
}

#[test]
fn case_insensitive_literal() {
    let g = Grammar::new().rule(Rule::new("kw", seq(vec![ilit("select"), lit(":"), ilit("Ä")])));
    let p: Parser<String> = Parser::new(g, "kw").unwrap();
    assert_eq!(p.parse("SeLeCt:ä"), Ok("SeLeCt:ä".to_owned()));
    assert_eq!(p.parse("selects").unwrap_err().to_string(), "Expected : at line 1 col 7.");
}

#[test]
fn rule_order_does_not_matter() {
    let g = Grammar::new()
        .rule(Rule::new("list", seq(vec![lit("["), opt(rule("items")), lit("]")])))
        .rule(Rule::new("items", seq(vec![rule("list"), star(seq(vec![lit(","), rule("list")]))])));
    let p: Parser<()> = Parser::new(g, "list").unwrap();
    assert!(p.parse("[[],[[]],[]]").is_ok());
    assert_eq!(p.parse("[[],]").unwrap_err().to_string(), "Expected [ at line 1 col 5.");
}

#[test]
fn match_positions() {
    let g = Grammar::new()
        .rule(Rule::new("lines", plus(rule("line"))).fold(|results| {
            Ok(results.iter().map(|m| format!("{}:{}", m.position.line, m.position.column)).collect::<Vec<_>>().join(" "))
        }))
        .rule(Rule::new("line", seq(vec![plus(lit("a")), lit("\n")])));
    let p = Parser::new(g, "lines").unwrap();
    assert_eq!(p.parse("a\naaa\naa\n"), Ok("1:1 2:1 3:1".to_owned()));
}

#[test]
fn cursor_location() {
    let c = Cursor::start().advance("ab\ncd", 4);
    assert_eq!((c.line, c.column), (2, 2));
    assert_eq!(c.to_string(), "line 2 col 2");
}

#[test]
fn grammar_errors() {
    let dup: Grammar<()> = Grammar::new().rule(Rule::new("a", lit("a"))).rule(Rule::new("a", lit("b")));
    assert_matches!(Parser::new(dup, "a"), Err(GrammarError::DuplicateRule(name)) if name == "a");

    let missing: Grammar<()> = Grammar::new().rule(Rule::new("a", lit("a")));
    assert_matches!(Parser::new(missing, "b"), Err(GrammarError::MissingStart(_)));

    let undefined: Grammar<()> = Grammar::new().rule(Rule::new("a", rule("nope")));
    assert_eq!(
        Parser::new(undefined, "a").unwrap_err().to_string(),
        "undefined rule `nope` referenced from `a`"
    );

    let left: Grammar<()> = Grammar::new().rule(Rule::new("sum", choice(vec![seq(vec![rule("sum"), lit("+")]), lit("1")])));
    assert_eq!(
        Parser::new(left, "sum").unwrap_err(),
        GrammarError::LeftRecursion(vec!["sum".to_owned(), "sum".to_owned()])
    );

    let bounds: Grammar<()> = Grammar::new().rule(Rule::new("a", repeat(lit("x"), 3, Some(1))));
    assert_eq!(
        Parser::new(bounds, "a").unwrap_err(),
        GrammarError::InvalidRepeat { rule: "a".to_owned(), min: 3, max: 1 }
    );

    let range: Grammar<()> = Grammar::new().rule(Rule::new("a", class(CharClass::new().range('z', 'a'))));
    assert_eq!(
        Parser::new(range, "a").unwrap_err(),
        GrammarError::BackwardsRange { rule: "a".to_owned(), lo: 'z', hi: 'a' }
    );

    let shadowed: Grammar<()> = Grammar::new().rule(Rule::new("kw", choice(vec![ilit("in"), lit("int")])));
    assert_eq!(
        Parser::new(shadowed, "kw").unwrap_err().to_string(),
        "unreachable alternative in rule `kw`"
    );
}
