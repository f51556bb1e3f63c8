use super::guard::{check_depth, check_symbols, contained};
use super::semver_compare::SEMVER_COMPARE;
use super::type_check::TypeChecker;
use super::{Program, StaticType};
use crate::constraints::{ConstraintError, ConstraintResult};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

const LOG_TARGET: &str = "      expr";

/// Name of the variable holding the candidate's property records.
pub const PROPERTIES_VARIABLE: &str = "properties";

/// The signature of a function callable from expressions.
///
/// For receiver-style calls (`a.f(b)`) the receiver counts as the first parameter.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    params: Vec<StaticType>,
    variadic: bool,
    result: StaticType,
}

impl FunctionDecl {
    fn fixed(params: impl Into<Vec<StaticType>>, result: StaticType) -> Self {
        Self {
            params: params.into(),
            variadic: false,
            result,
        }
    }

    fn variadic(param: StaticType, result: StaticType) -> Self {
        Self {
            params: vec![param],
            variadic: true,
            result,
        }
    }

    /// Checks the argument types of a call and returns its result type.
    pub(super) fn check_call(&self, name: &str, args: &[StaticType]) -> Result<StaticType, String> {
        let arity_ok = if self.variadic {
            !args.is_empty()
        } else {
            args.len() == self.params.len()
        };

        if !arity_ok {
            return Err(format!(
                "found no matching overload for '{name}' applied to ({})",
                join_types(args)
            ));
        }

        for (index, arg) in args.iter().enumerate() {
            let expected = self.params.get(index).or_else(|| self.params.last()).unwrap_or(&StaticType::Dyn);
            if !arg.is_assignable_to(expected) {
                return Err(format!(
                    "found no matching overload for '{name}' applied to ({})",
                    join_types(args)
                ));
            }
        }

        Ok(self.result.clone())
    }
}

pub(super) fn join_types(types: &[StaticType]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// A reusable, immutable host for boolean expressions over a candidate's properties.
///
/// The environment declares a single variable, `properties`, bound to a list of `{type, value}`
/// records. On top of the interpreter's standard functions it declares `semver_compare(a, b)`,
/// which compares two semantic versions and returns -1, 0, or 1.
///
/// Compilation parses the source and type-checks it against these declarations, so unknown
/// identifiers, unknown functions, and non-boolean results are all rejected before anything is
/// evaluated. The environment holds no mutable state and may be shared across threads.
#[derive(Debug, Clone)]
pub struct Environment {
    variables: BTreeMap<&'static str, StaticType>,
    functions: BTreeMap<&'static str, FunctionDecl>,
}

static SHARED: LazyLock<Environment> = LazyLock::new(Environment::new);

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        let variables = BTreeMap::from([(PROPERTIES_VARIABLE, StaticType::List(Box::new(StaticType::Property)))]);

        let functions = BTreeMap::from([
            ("size", FunctionDecl::fixed([StaticType::Dyn], StaticType::Int)),
            ("contains", FunctionDecl::fixed([StaticType::Dyn, StaticType::Dyn], StaticType::Bool)),
            ("startsWith", FunctionDecl::fixed([StaticType::String, StaticType::String], StaticType::Bool)),
            ("endsWith", FunctionDecl::fixed([StaticType::String, StaticType::String], StaticType::Bool)),
            ("matches", FunctionDecl::fixed([StaticType::String, StaticType::String], StaticType::Bool)),
            ("string", FunctionDecl::fixed([StaticType::Dyn], StaticType::String)),
            ("int", FunctionDecl::fixed([StaticType::Dyn], StaticType::Int)),
            ("uint", FunctionDecl::fixed([StaticType::Dyn], StaticType::UInt)),
            ("double", FunctionDecl::fixed([StaticType::Dyn], StaticType::Double)),
            ("max", FunctionDecl::variadic(StaticType::Dyn, StaticType::Dyn)),
            (SEMVER_COMPARE, FunctionDecl::fixed([StaticType::String, StaticType::String], StaticType::Int)),
        ]);

        Self { variables, functions }
    }

    /// The process-wide environment, built on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&StaticType> {
        self.variables.get(name)
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }

    /// Parses and type-checks `source` into a reusable [`Program`].
    ///
    /// # Errors
    /// Returns [`ConstraintError::Compile`] on a syntax error, on a reference to an undeclared
    /// variable or function, on a type mismatch, or when the expression is not statically boolean.
    pub fn compile(&self, source: &str) -> ConstraintResult<Program> {
        self.compile_inner(source).inspect_err(|e| {
            log::debug!(target: LOG_TARGET, "Rejected expression: {e}");
        })
    }

    fn compile_inner(&self, source: &str) -> ConstraintResult<Program> {
        let compile_err = |reason: String| ConstraintError::Compile {
            rule: source.to_string(),
            reason,
        };

        check_symbols(source).map_err(compile_err)?;

        // the interpreter executes this tree directly
        let ast = contained(|| cel_parser::parse(source))
            .map_err(compile_err)?
            .map_err(|e| compile_err(e.to_string()))?;
        check_depth(&ast).map_err(compile_err)?;

        let result_type = TypeChecker::new(self).check(&ast).map_err(compile_err)?;
        if result_type != StaticType::Bool {
            return Err(compile_err(format!("expression must evaluate to bool, found {result_type}")));
        }

        Ok(Program::new(source.to_string(), Arc::new(ast)))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
