//! Declarative requirements over a candidate's properties
//!
//! A constraint document is a JSON object with exactly one predicate and an optional `message`:
//!
//! ```json
//! {
//!   "message": "requires a supported foo",
//!   "all": {"constraints": [
//!     {"gvk": {"group": "example.com", "version": "v1", "kind": "Foo"}},
//!     {"package": {"packageName": "foo", "versionRange": ">=1.0.0 <2.0.0"}},
//!     {"cel": {"rule": "properties.exists(p, p.type == 'olm.label' && p.value.label == 'stable')"}}
//!   ]}
//! }
//! ```
//!
//! [`ConstraintParser`] turns such documents into immutable [`Constraint`] trees, and
//! [`evaluate`] decides whether a property set satisfies a tree, producing a failure trace that
//! explains why not.

mod constraint;
mod error;
mod evaluator;
mod parser;
mod version_range;
mod wire;

pub use constraint::{CelConstraint, CompoundConstraint, Constraint, GvkConstraint, PackageConstraint, Predicate, PredicateKind};
pub use error::{ConstraintError, ConstraintResult, ErrorKind};
pub use evaluator::{Candidate, Evaluation, FailureCause, FailureReason, LeafError, evaluate, matching_candidates};
pub use parser::{ConstraintParser, DEFAULT_MAX_CONSTRAINT_SIZE, ParserConfig};
pub use version_range::{VersionRange, compare_precedence};
