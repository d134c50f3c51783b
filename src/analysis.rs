use crate::error::GrammarError;
use crate::expr::*;
use crate::fold::Value;
use crate::grammar::{Grammar, Rule};

/// Report undefined rules, malformed repetitions and ranges, unreachable
/// alternatives and left recursion. Each defect is passed to `emit_error`.
pub fn check<V: Value>(grammar: &Grammar<V>, emit_error: &mut dyn FnMut(GrammarError)) {
    let mut undefined = false;
    let mut success = SuccessVisitor { grammar, stack: Vec::new() };
    for rule in grammar.iter_rules() {
        rule.expr.for_each_expr(&mut |expr| match expr {
            RuleExpr(name) if grammar.find(name).is_none() => {
                undefined = true;
                emit_error(GrammarError::UndefinedRule { name: name.clone(), from: rule.name.clone() });
            }
            RepeatExpr { min, max: Some(max), .. } if *max == 0 || *max < *min => {
                emit_error(GrammarError::InvalidRepeat { rule: rule.name.clone(), min: *min, max: *max });
            }
            ClassExpr(class) => {
                if let Some((lo, hi)) = class.backwards_range() {
                    emit_error(GrammarError::BackwardsRange { rule: rule.name.clone(), lo, hi });
                }
            }
            ChoiceExpr(alternatives) if success.unreachable_alternative(alternatives) => {
                emit_error(GrammarError::UnreachableAlternative(rule.name.clone()));
            }
            _ => {}
        });
    }

    // The recursion walk follows references, so it needs them all resolved.
    if !undefined {
        RecursionVisitor::check(grammar, emit_error);
    }
}

/// Finds choice alternatives that can never be tried because an earlier one
/// always matches, or matches everything the later one would.
struct SuccessVisitor<'a, V> {
    grammar: &'a Grammar<V>,
    stack: Vec<&'a str>,
}

impl<'a, V: Value> SuccessVisitor<'a, V> {
    fn unreachable_alternative(&mut self, alternatives: &'a [Expr]) -> bool {
        let last = alternatives.len().saturating_sub(1);
        if alternatives[..last].iter().any(|expr| self.always_succeeds(expr)) {
            return true;
        }

        alternatives.iter().enumerate().any(|(i, earlier)| {
            alternatives[i + 1..].iter().any(|later| match (earlier, later) {
                (LiteralExpr(a), LiteralExpr(b)) => a.shadows(b),
                (ClassExpr(a), ClassExpr(b)) => a.covers(b),
                _ => false,
            })
        })
    }

    /// True if `expr` matches at every position of every input. Unknown
    /// and recursive rules count as fallible.
    fn always_succeeds(&mut self, expr: &'a Expr) -> bool {
        match expr {
            LiteralExpr(lit) => lit.text().is_empty(),
            ClassExpr(_) | NegAssertExpr(_) | EofExpr => false,
            SeqExpr(exprs) => exprs.iter().all(|expr| self.always_succeeds(expr)),
            ChoiceExpr(exprs) => exprs.iter().any(|expr| self.always_succeeds(expr)),
            PosAssertExpr(expr) => self.always_succeeds(expr),

            // A zero-width body counts once, so only a minimum of one survives it.
            RepeatExpr { expr, min, max } => {
                *min == 0 || *max == Some(0) || (*min == 1 && self.always_succeeds(expr))
            }

            RuleExpr(name) => {
                if self.stack.contains(&name.as_str()) {
                    return false;
                }
                match self.grammar.find(name) {
                    Some(rule) => {
                        self.stack.push(&rule.name);
                        let res = self.always_succeeds(&rule.expr);
                        self.stack.pop();
                        res
                    }
                    None => false,
                }
            }
        }
    }
}

struct RecursionVisitor<'a, V> {
    stack: Vec<&'a str>,
    emit_error: &'a mut dyn FnMut(GrammarError),
    grammar: &'a Grammar<V>,
}

#[derive(Clone, Copy)]
struct RuleInfo {
    /// True if the rule is known to match without consuming any input.
    /// This is a conservative heuristic, if unknown, we return false to avoid reporting false-positives
    /// for left recursion.
    nullable: bool,
}

impl<'a, V: Value> RecursionVisitor<'a, V> {
    fn check(grammar: &'a Grammar<V>, emit_error: &'a mut dyn FnMut(GrammarError)) {
        let mut visitor = RecursionVisitor { grammar, emit_error, stack: Vec::new() };

        for rule in grammar.iter_rules() {
            visitor.walk_rule(rule);
            debug_assert!(visitor.stack.is_empty());
        }
    }

    fn walk_rule(&mut self, rule: &'a Rule<V>) -> RuleInfo {
        self.stack.push(&rule.name);
        let res = self.walk_expr(&rule.expr);
        self.stack.pop();
        res
    }

    fn walk_expr(&mut self, this_expr: &'a Expr) -> RuleInfo {
        match this_expr {
            RuleExpr(name) => {
                if let Some(loop_start) = self.stack.iter().position(|caller| *caller == name.as_str()) {
                    let mut recursive_loop: Vec<String> =
                        self.stack[loop_start..].iter().map(|s| s.to_string()).collect();
                    recursive_loop.push(name.clone());
                    (self.emit_error)(GrammarError::LeftRecursion(recursive_loop));
                    return RuleInfo { nullable: false };
                }

                match self.grammar.find(name) {
                    Some(rule) => self.walk_rule(rule),
                    None => RuleInfo { nullable: false },
                }
            }

            SeqExpr(exprs) => {
                for expr in exprs {
                    if !self.walk_expr(expr).nullable {
                        return RuleInfo { nullable: false };
                    }
                }
                RuleInfo { nullable: true }
            }

            ChoiceExpr(choices) => {
                let mut nullable = false;
                for expr in choices {
                    nullable |= self.walk_expr(expr).nullable;
                }
                RuleInfo { nullable }
            }

            PosAssertExpr(expr) | NegAssertExpr(expr) => {
                self.walk_expr(expr);
                RuleInfo { nullable: true }
            }

            RepeatExpr { expr, min, .. } => {
                let res = self.walk_expr(expr);
                RuleInfo { nullable: res.nullable || *min == 0 }
            }

            LiteralExpr(lit) => RuleInfo { nullable: lit.text().is_empty() },
            ClassExpr(_) => RuleInfo { nullable: false },
            EofExpr => RuleInfo { nullable: true },
        }
    }
}
