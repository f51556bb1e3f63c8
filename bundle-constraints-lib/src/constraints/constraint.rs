use super::VersionRange;
use super::wire::ConstraintDoc;
use crate::expr::Program;
use crate::properties::{Property, PropertyValue};
use core::fmt;
use semver::Version;
use serde::{Serialize, Serializer};

/// Requires a provided API with exactly this group, version, and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GvkConstraint {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GvkConstraint {
    /// Whether any `olm.gvk` property matches all three fields.
    #[must_use]
    pub fn is_satisfied_by(&self, properties: &[Property]) -> bool {
        properties.iter().any(|property| match property.value() {
            PropertyValue::Gvk(gvk) => gvk.group == self.group && gvk.version == self.version && gvk.kind == self.kind,
            _ => false,
        })
    }
}

/// Requires a package with this name whose version falls in a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConstraint {
    pub package_name: String,
    pub version_range: VersionRange,
}

impl PackageConstraint {
    /// Whether any `olm.package` property has this name and a version inside the range.
    ///
    /// A property whose version is not a valid semantic version never matches.
    #[must_use]
    pub fn is_satisfied_by(&self, properties: &[Property]) -> bool {
        properties.iter().any(|property| match property.value() {
            PropertyValue::Package(package) if package.package_name == self.package_name => {
                Version::parse(&package.version).is_ok_and(|version| self.version_range.matches(&version))
            }
            _ => false,
        })
    }
}

/// Requires a free-form expression over the properties to evaluate to `true`.
#[derive(Debug, Clone)]
pub struct CelConstraint {
    program: Program,
}

impl CelConstraint {
    #[must_use]
    pub const fn new(program: Program) -> Self {
        Self { program }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        self.program.source()
    }

    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }
}

impl PartialEq for CelConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.rule() == other.rule()
    }
}

impl Eq for CelConstraint {}

/// An ordered list of child constraints combined by a boolean operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundConstraint {
    pub constraints: Vec<Constraint>,
}

/// The requirement expressed by a single constraint node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Gvk(GvkConstraint),
    Package(PackageConstraint),
    Cel(CelConstraint),

    /// Satisfied when every child is satisfied. An empty list is satisfied.
    All(CompoundConstraint),

    /// Satisfied when at least one child is satisfied. An empty list is never satisfied.
    Any(CompoundConstraint),

    /// Satisfied when no child is satisfied. An empty list is satisfied.
    Not(CompoundConstraint),
}

impl Predicate {
    #[must_use]
    pub const fn kind(&self) -> PredicateKind {
        match self {
            Self::Gvk(_) => PredicateKind::Gvk,
            Self::Package(_) => PredicateKind::Package,
            Self::Cel(_) => PredicateKind::Cel,
            Self::All(_) => PredicateKind::All,
            Self::Any(_) => PredicateKind::Any,
            Self::Not(_) => PredicateKind::Not,
        }
    }

    /// A short human-readable statement of what this predicate requires.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Gvk(gvk) => format!("requires API {}/{}, Kind={}", gvk.group, gvk.version, gvk.kind),
            Self::Package(package) => format!(
                "requires package '{}' with version in range '{}'",
                package.package_name, package.version_range
            ),
            Self::Cel(cel) => format!("requires expression '{}' to hold", cel.rule()),
            Self::All(compound) => format!("requires all of {} constraint(s)", compound.constraints.len()),
            Self::Any(compound) => format!("requires any of {} constraint(s)", compound.constraints.len()),
            Self::Not(compound) => format!("requires none of {} constraint(s)", compound.constraints.len()),
        }
    }
}

/// Identifies which predicate a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Gvk,
    Package,
    Cel,
    All,
    Any,
    Not,
}

impl PredicateKind {
    /// The JSON key carrying this predicate.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Gvk => "gvk",
            Self::Package => "package",
            Self::Cel => "cel",
            Self::All => "all",
            Self::Any => "any",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A node of the constraint tree: one predicate plus an optional failure message.
///
/// Constraints are built by [`ConstraintParser`](super::ConstraintParser) and are immutable
/// afterwards. Two constraints are equal when their trees are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub message: Option<String>,
    pub predicate: Predicate,
}

impl Constraint {
    #[must_use]
    pub const fn new(predicate: Predicate) -> Self {
        Self { message: None, predicate }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn gvk(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(Predicate::Gvk(GvkConstraint {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }))
    }

    #[must_use]
    pub fn package(package_name: impl Into<String>, version_range: VersionRange) -> Self {
        Self::new(Predicate::Package(PackageConstraint {
            package_name: package_name.into(),
            version_range,
        }))
    }

    #[must_use]
    pub const fn cel(program: Program) -> Self {
        Self::new(Predicate::Cel(CelConstraint::new(program)))
    }

    #[must_use]
    pub const fn all(constraints: Vec<Self>) -> Self {
        Self::new(Predicate::All(CompoundConstraint { constraints }))
    }

    #[must_use]
    pub const fn any(constraints: Vec<Self>) -> Self {
        Self::new(Predicate::Any(CompoundConstraint { constraints }))
    }

    #[must_use]
    pub const fn not(constraints: Vec<Self>) -> Self {
        Self::new(Predicate::Not(CompoundConstraint { constraints }))
    }

    /// Serializes this constraint back into its JSON document form.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(ConstraintDoc::from(self)).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ConstraintDoc::from(self).serialize(serializer)
    }
}
