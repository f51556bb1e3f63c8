//! Bundle dependency files
//!
//! A bundle lists what it needs from other bundles in a `dependencies.json` or
//! `dependencies.yaml` document. Each entry has a `type` and a `value`:
//!
//! - `olm.gvk`: a required API, as `{group, version, kind}`
//! - `olm.package`: a required package, as `{packageName, version}` where `version` is a range
//! - `olm.label`: a required label, as `{label}`
//! - `olm.constraint`: a complete constraint document
//!
//! Every dependency converts into a [`Constraint`](crate::constraints::Constraint), so a single
//! evaluator serves all of them.

mod dependencies_file;
mod dependency;

pub use dependencies_file::{DependenciesFile, DependencyProblem};
pub use dependency::{CONSTRAINT_TYPE, Dependency, DependencyValue, GvkDependency, LabelDependency, PackageDependency};
