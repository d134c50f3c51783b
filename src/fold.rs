//! Semantic values and the fold functions that build them.
//!
//! Every successful rule produces a [`Match`]. A rule's fold function receives
//! the matches of everything its body matched, flattened into one ordered
//! list: each literal and character class contributes one match, each rule
//! reference contributes the referenced rule's match (unless that rule is
//! silent), and lookahead contributes nothing.

use crate::cursor::Cursor;
use thiserror::Error;

/// A semantic payload carried through a parse.
pub trait Value: Clone {
    /// The value of a leaf match, and of a rule that has no fold function.
    fn from_text(text: &str) -> Self;
}

impl Value for String {
    fn from_text(text: &str) -> Self {
        text.to_owned()
    }
}

impl Value for () {
    fn from_text(_: &str) -> Self {}
}

/// Parses the trimmed text as a number; anything else is NaN.
impl Value for f64 {
    fn from_text(text: &str) -> Self {
        text.trim().parse().unwrap_or(f64::NAN)
    }
}

/// One successful match.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'input, V> {
    /// The input that was matched.
    pub text: &'input str,
    pub value: V,
    /// Where the match started.
    pub position: Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    /// The input matched but is not acceptable, e.g. a number out of range.
    /// Ends the parse with this message, positioned at the rule's start.
    #[error("{0}")]
    Reject(String),

    /// The fold function and the grammar disagree. Ends the parse with
    /// [`Error::Inconsistent`](crate::Error::Inconsistent).
    #[error("{0}")]
    Inconsistent(String),
}

/// A fold function: the ordered child matches of a rule to the rule's value.
pub type FoldFn<V> = Box<dyn for<'input> Fn(&[Match<'input, V>]) -> Result<V, FoldError> + Send + Sync>;

/// Box a closure as a [`FoldFn`].
pub fn from_fn<V, F>(f: F) -> FoldFn<V>
where
    F: for<'input> Fn(&[Match<'input, V>]) -> Result<V, FoldError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// The value of the first child.
pub fn first<V: Value + 'static>() -> FoldFn<V> {
    nth(0)
}

/// The value of the child at `index`.
pub fn nth<V: Value + 'static>(index: usize) -> FoldFn<V> {
    from_fn(move |results: &[Match<'_, V>]| match results.get(index) {
        Some(m) => Ok(m.value.clone()),
        None => Err(FoldError::Inconsistent(format!(
            "expected at least {} results, found {}",
            index + 1,
            results.len()
        ))),
    })
}

/// Left-associative fold over `[operand, operator, operand, ...]`.
///
/// `apply` combines the accumulator with the next operand for an operator
/// token, and returns `None` if it does not know the operator.
pub fn binary<V, F>(apply: F) -> FoldFn<V>
where
    V: Value + 'static,
    F: Fn(&V, &str, &V) -> Option<V> + Send + Sync + 'static,
{
    from_fn(move |results: &[Match<'_, V>]| {
        let (head, tail) = match results.split_first() {
            Some(split) => split,
            None => return Err(FoldError::Inconsistent("no operand to fold".to_owned())),
        };

        let pairs = tail.chunks_exact(2);
        if let [op] = pairs.remainder() {
            return Err(FoldError::Inconsistent(format!("operator '{}' without an operand", op.text.trim())));
        }

        let mut acc = head.value.clone();
        for pair in pairs {
            let token = pair[0].text.trim();
            acc = apply(&acc, token, &pair[1].value)
                .ok_or_else(|| FoldError::Inconsistent(format!("unexpected operator '{}'", token)))?;
        }
        Ok(acc)
    })
}

/// The four arithmetic operators over `f64`.
pub fn arith(lhs: &f64, op: &str, rhs: &f64) -> Option<f64> {
    match op {
        "+" => Some(lhs + rhs),
        "-" => Some(lhs - rhs),
        "*" => Some(lhs * rhs),
        "/" => Some(lhs / rhs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn m(text: &str, value: f64) -> Match<'_, f64> {
        Match { text, value, position: Cursor::start() }
    }

    #[test]
    fn binary_folds_left_to_right() {
        let fold = binary(arith);
        let results = [m("8", 8.0), m("-", f64::NAN), m("3", 3.0), m("- ", f64::NAN), m("1", 1.0)];
        assert_eq!(fold(&results[..]), Ok(4.0));
        assert_eq!(fold(&results[..1]), Ok(8.0));
    }

    #[test]
    fn unknown_operator_is_inconsistent() {
        let fold = binary(arith);
        let results = [m("2", 2.0), m("%", f64::NAN), m("3", 3.0)];
        assert_matches!(fold(&results[..]), Err(FoldError::Inconsistent(msg)) if msg == "unexpected operator '%'");
    }

    #[test]
    fn dangling_operator_is_inconsistent() {
        let fold = binary(arith);
        let results = [m("2", 2.0), m("+", f64::NAN)];
        assert_matches!(fold(&results[..]), Err(FoldError::Inconsistent(msg)) if msg == "operator '+' without an operand");
    }

    #[test]
    fn nth_out_of_range() {
        let fold = nth::<f64>(2);
        assert_matches!(fold(&[m("1", 1.0)][..]), Err(FoldError::Inconsistent(_)));
    }

    #[test]
    fn text_values() {
        assert_eq!(f64::from_text(" 2.5 "), 2.5);
        assert!(f64::from_text("+").is_nan());
        assert_eq!(String::from_text("ab"), "ab");
    }
}
