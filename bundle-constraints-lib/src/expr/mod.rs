//! Free-form boolean predicates over a candidate's properties, using CEL
//!
//! This module hosts the Common Expression Language (CEL) for constraints that cannot be
//! expressed with the built-in GVK and package predicates. It provides a sandboxed evaluation
//! environment. Expressions are pure and always terminate, and they can only read the candidate's
//! properties.
//!
//! # Implementation Model
//!
//! An [`Environment`] declares what expressions may reference:
//!
//! - `properties`: a list of `{type, value}` records, one per declared property
//! - the interpreter's standard functions and macros (`exists`, `all`, `filter`, `map`, `size`, ...)
//! - `semver_compare(a, b)`: compares two semantic versions, returning -1, 0, or 1
//!
//! [`Environment::compile`] parses the source once, then runs a static type checker over the
//! syntax tree that the interpreter later executes. The checker rejects unknown identifiers and
//! functions and mismatched operands. It also rejects any expression whose result is not
//! statically `bool`. This means a rule like `1` fails when it is authored, not when it is first
//! evaluated. Sources with more than [`MAX_EXPRESSION_SYMBOLS`] operators, or trees deeper than
//! [`MAX_EXPRESSION_DEPTH`], are rejected as well.
//!
//! A compiled [`Program`] is immutable. Every call to [`Program::evaluate`] builds a fresh CEL
//! context from the property list, so one program can serve many threads at once. A failure
//! inside the engine, such as an integer division by zero, becomes an evaluation error for that
//! call and never unwinds into the caller.

mod environment;
mod guard;
mod program;
mod semver_compare;
mod static_type;
mod type_check;

pub use environment::{Environment, FunctionDecl, PROPERTIES_VARIABLE};
pub use guard::{MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_SYMBOLS};
pub use program::Program;
pub use semver_compare::{SEMVER_COMPARE, compare_versions};
pub use static_type::StaticType;
