use crate::constraints::{Constraint, ConstraintError, ConstraintParser, ConstraintResult, VersionRange};
use crate::expr::Environment;
use crate::properties::{GVK_TYPE, LABEL_TYPE, PACKAGE_TYPE};
use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Dependency type whose value is a complete constraint document.
pub const CONSTRAINT_TYPE: &str = "olm.constraint";

/// Requires a provided API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GvkDependency {
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub kind: String,
}

impl GvkDependency {
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.group.is_empty() {
            problems.push("API group is empty".to_string());
        }
        if self.version.is_empty() {
            problems.push("API version is empty".to_string());
        }
        if self.kind.is_empty() {
            problems.push("API kind is empty".to_string());
        }
        problems
    }
}

/// Requires a package whose version falls within a range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PackageDependency {
    #[serde(default)]
    pub package_name: String,

    /// A version range such as `>=1.0.0 <2.0.0`.
    #[serde(default)]
    pub version: String,
}

impl PackageDependency {
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.package_name.is_empty() {
            problems.push("package name is empty".to_string());
        }
        if self.version.is_empty() {
            problems.push("package version is empty".to_string());
        } else if let Err(e) = VersionRange::parse(&self.version) {
            problems.push(e.to_string());
        }
        problems
    }
}

/// Requires a bundle carrying a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelDependency {
    #[serde(default)]
    pub label: String,
}

impl LabelDependency {
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if self.label.is_empty() {
            vec!["label is empty".to_string()]
        } else {
            Vec::new()
        }
    }

    /// The expression matching an `olm.label` property with this label.
    #[must_use]
    pub fn rule(&self) -> String {
        let escaped = self.label.replace('\\', "\\\\").replace('\'', "\\'");
        format!("properties.exists(p, p.type == '{LABEL_TYPE}' && p.value.label == '{escaped}')")
    }
}

/// The decoded value of a [`Dependency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyValue {
    Gvk(GvkDependency),
    Package(PackageDependency),
    Label(LabelDependency),
    Constraint(Constraint),
}

/// A single requirement a bundle places on its environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    #[serde(rename = "type")]
    pub dependency_type: String,

    #[serde(default)]
    pub value: JsonValue,
}

impl Dependency {
    /// Decodes the value according to the dependency type.
    ///
    /// # Errors
    ///
    /// Returns an error if the type is not supported, the value has the wrong shape, or an
    /// `olm.constraint` value does not parse.
    pub fn decode(&self, parser: &ConstraintParser<'_>) -> ConstraintResult<DependencyValue> {
        let from_json = |e: serde_json::Error| ConstraintError::from_json(&e);

        match self.dependency_type.as_str() {
            GVK_TYPE => Ok(DependencyValue::Gvk(serde_json::from_value(self.value.clone()).map_err(from_json)?)),
            PACKAGE_TYPE => Ok(DependencyValue::Package(
                serde_json::from_value(self.value.clone()).map_err(from_json)?,
            )),
            LABEL_TYPE => Ok(DependencyValue::Label(serde_json::from_value(self.value.clone()).map_err(from_json)?)),
            CONSTRAINT_TYPE => {
                let bytes = serde_json::to_vec(&self.value).map_err(from_json)?;
                Ok(DependencyValue::Constraint(parser.parse(&bytes)?))
            }
            other => Err(ConstraintError::MalformedDocument {
                message: format!("unsupported dependency type '{other}'"),
            }),
        }
    }

    /// Every problem with this dependency, or an empty list when it is valid.
    #[must_use]
    pub fn validate(&self, parser: &ConstraintParser<'_>) -> Vec<String> {
        match self.decode(parser) {
            Ok(DependencyValue::Gvk(gvk)) => gvk.validate(),
            Ok(DependencyValue::Package(package)) => package.validate(),
            Ok(DependencyValue::Label(label)) => label.validate(),
            Ok(DependencyValue::Constraint(_)) => Vec::new(),
            Err(e) => vec![e.to_string()],
        }
    }

    /// Converts this dependency into the equivalent constraint.
    ///
    /// A label dependency becomes an expression constraint over `olm.label` properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependency does not decode or fails validation.
    pub fn to_constraint(&self, parser: &ConstraintParser<'_>) -> ConstraintResult<Constraint> {
        let invalid = |problems: Vec<String>| ConstraintError::malformed(self.dependency_type.clone(), problems.join("; "));

        match self.decode(parser)? {
            DependencyValue::Gvk(gvk) => {
                let problems = gvk.validate();
                if !problems.is_empty() {
                    return Err(invalid(problems));
                }
                Ok(Constraint::gvk(gvk.group, gvk.version, gvk.kind))
            }
            DependencyValue::Package(package) => {
                if package.package_name.is_empty() || package.version.is_empty() {
                    return Err(invalid(package.validate()));
                }
                let range = VersionRange::parse(&package.version)?;
                Ok(Constraint::package(package.package_name, range))
            }
            DependencyValue::Label(label) => {
                let problems = label.validate();
                if !problems.is_empty() {
                    return Err(invalid(problems));
                }
                Ok(Constraint::cel(Environment::shared().compile(&label.rule())?))
            }
            DependencyValue::Constraint(constraint) => Ok(constraint),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dependency_type, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ErrorKind;
    use crate::properties::Property;
    use serde_json::json;

    fn dependency(dependency_type: &str, value: JsonValue) -> Dependency {
        Dependency {
            dependency_type: dependency_type.to_string(),
            value,
        }
    }

    #[test]
    fn test_gvk_validate_reports_every_field() {
        let problems = dependency(GVK_TYPE, json!({})).validate(&ConstraintParser::default());
        assert_eq!(problems, vec!["API group is empty", "API version is empty", "API kind is empty"]);
    }

    #[test]
    fn test_package_validate() {
        let parser = ConstraintParser::default();
        assert!(dependency(PACKAGE_TYPE, json!({"packageName": "foo", "version": ">=1.0.0"})).validate(&parser).is_empty());
        assert_eq!(
            dependency(PACKAGE_TYPE, json!({"version": ">=1.0.0"})).validate(&parser),
            vec!["package name is empty"]
        );

        let problems = dependency(PACKAGE_TYPE, json!({"packageName": "foo", "version": "one"})).validate(&parser);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("invalid version range"));
    }

    #[test]
    fn test_label_validate() {
        let parser = ConstraintParser::default();
        assert_eq!(dependency(LABEL_TYPE, json!({})).validate(&parser), vec!["label is empty"]);
        assert!(dependency(LABEL_TYPE, json!({"label": "stable"})).validate(&parser).is_empty());
    }

    #[test]
    fn test_unknown_type_and_field() {
        let parser = ConstraintParser::default();
        let problems = dependency("olm.other", json!({})).validate(&parser);
        assert!(problems[0].contains("unsupported dependency type 'olm.other'"));

        let err = dependency(GVK_TYPE, json!({"group": "g", "arbitrary": 1})).decode(&parser).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_constraint_dependency() {
        let parser = ConstraintParser::default();
        let dep = dependency(
            CONSTRAINT_TYPE,
            json!({"failureMessage": "needs foo", "package": {"packageName": "foo", "versionRange": ">=1.0.0"}}),
        );
        let constraint = dep.to_constraint(&parser).unwrap();
        assert_eq!(constraint.message.as_deref(), Some("needs foo"));

        let bad = dependency(CONSTRAINT_TYPE, json!({"message": "x", "arbitrary": {}}));
        assert_eq!(bad.to_constraint(&parser).unwrap_err().kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_to_constraint() {
        let parser = ConstraintParser::default();
        let gvk = dependency(GVK_TYPE, json!({"group": "example.com", "version": "v1", "kind": "Foo"}));
        assert_eq!(gvk.to_constraint(&parser).unwrap(), Constraint::gvk("example.com", "v1", "Foo"));

        let empty = dependency(GVK_TYPE, json!({"group": "example.com"}));
        assert_eq!(empty.to_constraint(&parser).unwrap_err().kind(), ErrorKind::MalformedPredicate);

        let range = dependency(PACKAGE_TYPE, json!({"packageName": "foo", "version": "x"}));
        assert_eq!(range.to_constraint(&parser).unwrap_err().kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_label_becomes_expression() {
        let parser = ConstraintParser::default();
        let constraint = dependency(LABEL_TYPE, json!({"label": "it's stable"})).to_constraint(&parser).unwrap();

        let crate::constraints::Predicate::Cel(cel) = &constraint.predicate else {
            panic!("expected an expression constraint");
        };
        assert!(cel.program().evaluate(&[Property::label("it's stable")]).unwrap());
        assert!(!cel.program().evaluate(&[Property::label("stable")]).unwrap());
    }
}
