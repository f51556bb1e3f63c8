//! Containment for the expression engine.
//!
//! The CEL parser unwraps some literal conversions and the interpreter uses unchecked integer
//! arithmetic, so hostile rule text can panic inside either one. Rules come from third-party
//! metadata, so every call into the engine goes through [`contained`], and the nesting of an
//! expression is bounded before and after parsing. The parser, the type checker, the interpreter
//! and `Drop` all recurse over the tree.

use cel_parser::{Expression, Member};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Upper bound on operator and delimiter characters in an expression's source.
pub const MAX_EXPRESSION_SYMBOLS: usize = 1024;

/// Upper bound on the depth of a parsed expression tree.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Runs `f`, turning a panic into an error carrying the panic message.
pub(super) fn contained<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("expression engine failed: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("expression engine failed: {message}")
    } else {
        "expression engine failed".to_string()
    }
}

/// Rejects sources with enough operators to build a tree deep enough to exhaust the stack.
///
/// Every node deeper than a leaf needs at least one of these characters, so their count bounds the
/// depth of whatever the parser produces. Characters inside string literals are counted too.
pub(super) fn check_symbols(source: &str) -> Result<(), String> {
    let symbols = source
        .chars()
        .filter(|c| matches!(c, '(' | '[' | '{' | '.' | '?' | '!' | '-' | '+' | '*' | '/' | '%' | '<' | '>' | '=' | '&' | '|'))
        .count();

    if symbols > MAX_EXPRESSION_SYMBOLS {
        return Err(format!(
            "expression has {symbols} operators and delimiters, the limit is {MAX_EXPRESSION_SYMBOLS}"
        ));
    }

    Ok(())
}

/// Rejects parsed trees nested deeper than [`MAX_EXPRESSION_DEPTH`].
pub(super) fn check_depth(expr: &Expression) -> Result<(), String> {
    let mut pending = vec![(expr, 1_usize)];

    while let Some((node, depth)) = pending.pop() {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(format!("expression nests deeper than {MAX_EXPRESSION_DEPTH} levels"));
        }

        let next = depth + 1;
        match node {
            Expression::Arithmetic(lhs, _, rhs)
            | Expression::Relation(lhs, _, rhs)
            | Expression::Or(lhs, rhs)
            | Expression::And(lhs, rhs) => {
                pending.push((lhs, next));
                pending.push((rhs, next));
            }
            Expression::Ternary(cond, then, otherwise) => {
                pending.push((cond, next));
                pending.push((then, next));
                pending.push((otherwise, next));
            }
            Expression::Unary(_, operand) => pending.push((operand, next)),
            Expression::Member(target, member) => {
                pending.push((target, next));
                match member.as_ref() {
                    Member::Attribute(_) => {}
                    Member::Index(index) => pending.push((index, next)),
                    Member::Fields(fields) => pending.extend(fields.iter().map(|(_, value)| (value, next))),
                }
            }
            Expression::FunctionCall(function, target, args) => {
                pending.push((function, next));
                if let Some(target) = target {
                    pending.push((target, next));
                }
                pending.extend(args.iter().map(|arg| (arg, next)));
            }
            Expression::List(items) => pending.extend(items.iter().map(|item| (item, next))),
            Expression::Map(entries) => {
                for (key, value) in entries {
                    pending.push((key, next));
                    pending.push((value, next));
                }
            }
            Expression::Atom(_) | Expression::Ident(_) => {}
        }
    }

    Ok(())
}
