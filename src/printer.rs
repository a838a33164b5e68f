use crate::ast::{Expr, LiteralValue};

/// A minimal pretty-printer over the expression subset exercised by the
/// round-trip unit test below. Supports only `Literal`, `Grouping`,
/// `Unary`, `Binary`, `Logical`, and `Variable` — the subset needed for
/// the round-trip property; anything else is a parser/evaluator concern,
/// not a printing one.
///
/// Every composite node is fully parenthesized so the emitted text is valid
/// `glint` expression syntax and can be fed straight back through the
/// lexer and parser.
pub fn print(expr: &Expr) -> String {
    match expr {
        Expr::Literal(LiteralValue::Nil) => "nil".to_string(),
        Expr::Literal(LiteralValue::Bool(b)) => b.to_string(),
        Expr::Literal(LiteralValue::Number(n)) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{n:.0}")
            } else {
                n.to_string()
            }
        }
        Expr::Literal(LiteralValue::Str(s)) => format!("\"{s}\""),
        Expr::Grouping(inner) => format!("({})", print(inner)),
        Expr::Unary(op, right) => format!("({}{})", op.lexeme, print(right)),
        Expr::Binary(left, op, right) => format!("({} {} {})", print(left), op.lexeme, print(right)),
        Expr::Logical(left, op, right) => format!("({} {} {})", print(left), op.lexeme, print(right)),
        Expr::Variable(name) => name.lexeme.clone(),
        other => format!("<unsupported {other:?}>"),
    }
}

/// Recursively discards `Grouping` wrappers so two expressions that differ
/// only by how many redundant parentheses they carry compare equal. Used
/// to check the round-trip invariant: printing adds parentheses that
/// re-parsing turns back into `Grouping` nodes the original expression may
/// not have had.
#[cfg(test)]
pub fn strip_groupings(expr: &Expr) -> Expr {
    match expr {
        Expr::Grouping(inner) => strip_groupings(inner),
        Expr::Unary(op, right) => Expr::Unary(op.clone(), Box::new(strip_groupings(right))),
        Expr::Binary(l, op, r) => Expr::Binary(
            Box::new(strip_groupings(l)),
            op.clone(),
            Box::new(strip_groupings(r)),
        ),
        Expr::Logical(l, op, r) => Expr::Logical(
            Box::new(strip_groupings(l)),
            op.clone(),
            Box::new(strip_groupings(r)),
        ),
        other => other.clone(),
    }
}
