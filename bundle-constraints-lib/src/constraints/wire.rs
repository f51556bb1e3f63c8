//! The JSON document shape of a constraint.
//!
//! These types mirror the wire format one-to-one and reject unknown keys at every level. They
//! carry no invariants of their own; the parser turns them into a validated [`Constraint`] tree.

use super::{CompoundConstraint, Constraint, Predicate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDoc {
    #[serde(default, alias = "failureMessage", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gvk: Option<GvkDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cel: Option<CelDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<CompoundDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<CompoundDoc>,

    #[serde(default, alias = "none", skip_serializing_if = "Option::is_none")]
    pub not: Option<CompoundDoc>,
}

impl ConstraintDoc {
    /// The keys of every predicate present in this document, in declaration order.
    pub fn predicate_keys(&self) -> Vec<&'static str> {
        [
            ("gvk", self.gvk.is_some()),
            ("package", self.package.is_some()),
            ("cel", self.cel.is_some()),
            ("all", self.all.is_some()),
            ("any", self.any.is_some()),
            ("not", self.not.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GvkDoc {
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PackageDoc {
    #[serde(default)]
    pub package_name: String,

    #[serde(default)]
    pub version_range: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CelDoc {
    #[serde(default)]
    pub rule: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<ConstraintDoc>>,
}

impl From<&CompoundConstraint> for CompoundDoc {
    fn from(compound: &CompoundConstraint) -> Self {
        Self {
            constraints: Some(compound.constraints.iter().map(ConstraintDoc::from).collect()),
        }
    }
}

impl From<&Constraint> for ConstraintDoc {
    fn from(constraint: &Constraint) -> Self {
        let mut doc = Self {
            message: constraint.message.clone(),
            ..Self::default()
        };

        match &constraint.predicate {
            Predicate::Gvk(gvk) => {
                doc.gvk = Some(GvkDoc {
                    group: gvk.group.clone(),
                    version: gvk.version.clone(),
                    kind: gvk.kind.clone(),
                });
            }
            Predicate::Package(package) => {
                doc.package = Some(PackageDoc {
                    package_name: package.package_name.clone(),
                    version_range: package.version_range.to_string(),
                });
            }
            Predicate::Cel(cel) => {
                doc.cel = Some(CelDoc {
                    rule: cel.rule().to_string(),
                });
            }
            Predicate::All(compound) => doc.all = Some(compound.into()),
            Predicate::Any(compound) => doc.any = Some(compound.into()),
            Predicate::Not(compound) => doc.not = Some(compound.into()),
        }

        doc
    }
}
