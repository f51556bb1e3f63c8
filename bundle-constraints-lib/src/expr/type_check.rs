//! Static type inference over parsed expressions

use super::environment::join_types;
use super::{Environment, StaticType};
use cel_parser::{ArithmeticOp, Atom, Expression, Member, RelationOp, UnaryOp};

type CheckResult = Result<StaticType, String>;

/// Infers the type of an expression against an [`Environment`]'s declarations.
pub(super) struct TypeChecker<'a> {
    env: &'a Environment,

    // comprehension variables in scope, innermost last
    scopes: Vec<(String, StaticType)>,
}

impl<'a> TypeChecker<'a> {
    pub(super) const fn new(env: &'a Environment) -> Self {
        Self { env, scopes: Vec::new() }
    }

    pub(super) fn check(&mut self, expr: &Expression) -> CheckResult {
        match expr {
            Expression::Atom(atom) => Ok(atom_type(atom)),
            Expression::Ident(name) => self.ident(name),
            Expression::List(items) => {
                let mut elem: Option<StaticType> = None;
                for item in items {
                    let ty = self.check(item)?;
                    elem = Some(match elem {
                        Some(prev) => prev.unify(ty),
                        None => ty,
                    });
                }
                Ok(StaticType::List(Box::new(elem.unwrap_or(StaticType::Dyn))))
            }
            Expression::Map(entries) => {
                let mut value: Option<StaticType> = None;
                for (key, val) in entries {
                    let _ = self.check(key)?;
                    let ty = self.check(val)?;
                    value = Some(match value {
                        Some(prev) => prev.unify(ty),
                        None => ty,
                    });
                }
                Ok(StaticType::Map(Box::new(value.unwrap_or(StaticType::Dyn))))
            }
            Expression::And(lhs, rhs) => self.logical("&&", lhs, rhs),
            Expression::Or(lhs, rhs) => self.logical("||", lhs, rhs),
            Expression::Unary(op, operand) => self.unary(op, operand),
            Expression::Relation(lhs, op, rhs) => self.relation(lhs, op, rhs),
            Expression::Arithmetic(lhs, op, rhs) => self.arithmetic(lhs, op, rhs),
            Expression::Ternary(cond, then, otherwise) => {
                let cond_ty = self.check(cond)?;
                if !cond_ty.is_assignable_to(&StaticType::Bool) {
                    return Err(format!("ternary condition must be bool, found {cond_ty}"));
                }
                Ok(self.check(then)?.unify(self.check(otherwise)?))
            }
            Expression::Member(operand, member) => self.member(operand, member),
            Expression::FunctionCall(func, target, args) => {
                let Expression::Ident(name) = func.as_ref() else {
                    return Err("only named functions may be called".to_string());
                };
                self.call(name, target.as_deref(), args)
            }
        }
    }

    fn ident(&self, name: &str) -> CheckResult {
        if let Some((_, ty)) = self.scopes.iter().rev().find(|(bound, _)| bound == name) {
            return Ok(ty.clone());
        }

        self.env
            .variable(name)
            .cloned()
            .ok_or_else(|| format!("undeclared reference to '{name}'"))
    }

    fn logical(&mut self, op: &str, lhs: &Expression, rhs: &Expression) -> CheckResult {
        let lhs = self.check(lhs)?;
        let rhs = self.check(rhs)?;
        if lhs.is_assignable_to(&StaticType::Bool) && rhs.is_assignable_to(&StaticType::Bool) {
            Ok(StaticType::Bool)
        } else {
            Err(format!("found no matching overload for '{op}' applied to ({lhs}, {rhs})"))
        }
    }

    fn unary(&mut self, op: &UnaryOp, operand: &Expression) -> CheckResult {
        let ty = self.check(operand)?;
        match op {
            UnaryOp::Not | UnaryOp::DoubleNot => {
                if ty.is_assignable_to(&StaticType::Bool) {
                    Ok(StaticType::Bool)
                } else {
                    Err(format!("found no matching overload for '!' applied to ({ty})"))
                }
            }
            UnaryOp::Minus | UnaryOp::DoubleMinus => {
                if matches!(ty, StaticType::Int | StaticType::Double | StaticType::Dyn) {
                    Ok(ty)
                } else {
                    Err(format!("found no matching overload for '-' applied to ({ty})"))
                }
            }
        }
    }

    fn relation(&mut self, lhs: &Expression, op: &RelationOp, rhs: &Expression) -> CheckResult {
        let lhs = self.check(lhs)?;
        let rhs = self.check(rhs)?;

        let ok = match op {
            RelationOp::Equals | RelationOp::NotEquals => true,
            RelationOp::In => matches!(rhs, StaticType::List(_) | StaticType::Map(_) | StaticType::Dyn),
            RelationOp::LessThan | RelationOp::LessThanEq | RelationOp::GreaterThan | RelationOp::GreaterThanEq => {
                lhs.is_dyn()
                    || rhs.is_dyn()
                    || (lhs.is_numeric() && rhs.is_numeric())
                    || (lhs == rhs && matches!(lhs, StaticType::String | StaticType::Bytes | StaticType::Bool))
            }
        };

        if ok {
            Ok(StaticType::Bool)
        } else {
            Err(format!(
                "found no matching overload for '{}' applied to ({lhs}, {rhs})",
                relation_symbol(op)
            ))
        }
    }

    fn arithmetic(&mut self, lhs: &Expression, op: &ArithmeticOp, rhs: &Expression) -> CheckResult {
        let lhs = self.check(lhs)?;
        let rhs = self.check(rhs)?;

        if lhs.is_dyn() || rhs.is_dyn() {
            return Ok(StaticType::Dyn);
        }

        let is_add = matches!(op, ArithmeticOp::Add);
        match (&lhs, &rhs) {
            (StaticType::List(a), StaticType::List(b)) if is_add => {
                Ok(StaticType::List(Box::new(a.as_ref().clone().unify(b.as_ref().clone()))))
            }
            (StaticType::String, StaticType::String) | (StaticType::Bytes, StaticType::Bytes) if is_add => Ok(lhs.clone()),
            _ if lhs == rhs && lhs.is_numeric() => Ok(lhs.clone()),
            _ => Err(format!("found no matching overload for arithmetic applied to ({lhs}, {rhs})")),
        }
    }

    fn member(&mut self, operand: &Expression, member: &Member) -> CheckResult {
        let operand_ty = self.check(operand)?;
        match member {
            Member::Attribute(field) => match operand_ty {
                StaticType::Property => match field.as_str() {
                    "type" => Ok(StaticType::String),
                    "value" => Ok(StaticType::Dyn),
                    other => Err(format!("undefined field '{other}' on property")),
                },
                StaticType::Map(value) => Ok(*value),
                StaticType::Dyn => Ok(StaticType::Dyn),
                other => Err(format!("type '{other}' does not support field selection")),
            },
            Member::Index(index) => {
                let index_ty = self.check(index)?;
                match operand_ty {
                    StaticType::List(elem) => {
                        if matches!(index_ty, StaticType::Int | StaticType::UInt | StaticType::Dyn) {
                            Ok(*elem)
                        } else {
                            Err(format!("list index must be an integer, found {index_ty}"))
                        }
                    }
                    StaticType::Map(value) => Ok(*value),
                    StaticType::Dyn => Ok(StaticType::Dyn),
                    other => Err(format!("type '{other}' does not support indexing")),
                }
            }
            Member::Fields(_) => Err("message construction is not supported".to_string()),
        }
    }

    fn call(&mut self, name: &str, target: Option<&Expression>, args: &[Expression]) -> CheckResult {
        match name {
            "exists" | "all" | "exists_one" => {
                let body = self.comprehension(name, target, args)?;
                require_bool(name, &body)?;
                Ok(StaticType::Bool)
            }
            "filter" => {
                let body = self.comprehension(name, target, args)?;
                require_bool(name, &body)?;
                let target = target.map_or(Ok(StaticType::Dyn), |t| self.check(t))?;
                Ok(target)
            }
            "map" => {
                let body = self.comprehension(name, target, args)?;
                Ok(StaticType::List(Box::new(body)))
            }
            "has" => match args {
                [Expression::Member(operand, member)] if target.is_none() && matches!(member.as_ref(), Member::Attribute(_)) => {
                    let _ = self.check(operand)?;
                    Ok(StaticType::Bool)
                }
                _ => Err("has() requires a single field selection argument".to_string()),
            },
            _ => {
                let decl = self
                    .env
                    .function(name)
                    .ok_or_else(|| format!("undeclared reference to '{name}'"))?
                    .clone();

                let mut arg_types = Vec::with_capacity(args.len() + 1);
                if let Some(target) = target {
                    arg_types.push(self.check(target)?);
                }
                for arg in args {
                    arg_types.push(self.check(arg)?);
                }

                decl.check_call(name, &arg_types)
            }
        }
    }

    /// Checks `target.name(var, body)` and returns the type of `body`.
    fn comprehension(&mut self, name: &str, target: Option<&Expression>, args: &[Expression]) -> CheckResult {
        let Some(target) = target else {
            return Err(format!("{name}() must be called on a list or map"));
        };

        let [Expression::Ident(var), body] = args else {
            return Err(format!("{name}() takes a variable name and an expression"));
        };

        let elem = match self.check(target)? {
            StaticType::List(elem) => *elem,
            StaticType::Map(_) => StaticType::String,
            StaticType::Dyn => StaticType::Dyn,
            other => return Err(format!("{name}() cannot iterate over {other}")),
        };

        self.scopes.push((var.to_string(), elem));
        let body = self.check(body);
        let _ = self.scopes.pop();
        body
    }
}

fn require_bool(name: &str, ty: &StaticType) -> Result<(), String> {
    if ty.is_assignable_to(&StaticType::Bool) {
        Ok(())
    } else {
        Err(format!("{name}() predicate must be bool, found {}", join_types(core::slice::from_ref(ty))))
    }
}

const fn atom_type(atom: &Atom) -> StaticType {
    match atom {
        Atom::Int(_) => StaticType::Int,
        Atom::UInt(_) => StaticType::UInt,
        Atom::Float(_) => StaticType::Double,
        Atom::String(_) => StaticType::String,
        Atom::Bytes(_) => StaticType::Bytes,
        Atom::Bool(_) => StaticType::Bool,
        Atom::Null => StaticType::Null,
    }
}

const fn relation_symbol(op: &RelationOp) -> &'static str {
    match op {
        RelationOp::LessThan => "<",
        RelationOp::LessThanEq => "<=",
        RelationOp::GreaterThan => ">",
        RelationOp::GreaterThanEq => ">=",
        RelationOp::Equals => "==",
        RelationOp::NotEquals => "!=",
        RelationOp::In => "in",
    }
}
