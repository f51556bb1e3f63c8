use super::Dependency;
use crate::Result;
use crate::constraints::{Constraint, ConstraintParser, ConstraintResult};
use camino::Utf8Path;
use core::fmt;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;

/// A problem found in one entry of a [`DependenciesFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyProblem {
    pub index: usize,
    pub dependency_type: String,
    pub message: String,
}

impl fmt::Display for DependencyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependencies[{}] ({}): {}", self.index, self.dependency_type, self.message)
    }
}

/// The dependencies a bundle declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesFile {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl DependenciesFile {
    /// Loads a dependencies document, as YAML when the extension says so and as JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading dependencies file '{path}'"))?;

        if matches!(path.extension(), Some("yaml" | "yml")) {
            serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing dependencies file '{path}'"))
        } else {
            serde_json::from_str(&text).into_app_err_with(|| format!("parsing dependencies file '{path}'"))
        }
    }

    /// Every problem across all dependencies, in file order.
    #[must_use]
    pub fn validate(&self, parser: &ConstraintParser<'_>) -> Vec<DependencyProblem> {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(index, dependency)| {
                dependency.validate(parser).into_iter().map(move |message| DependencyProblem {
                    index,
                    dependency_type: dependency.dependency_type.clone(),
                    message,
                })
            })
            .collect()
    }

    /// Converts every dependency into a constraint.
    ///
    /// # Errors
    ///
    /// Returns the first conversion failure.
    pub fn to_constraints(&self, parser: &ConstraintParser<'_>) -> ConstraintResult<Vec<Constraint>> {
        self.dependencies.iter().map(|d| d.to_constraint(parser)).collect()
    }

    /// A single constraint requiring every dependency.
    ///
    /// # Errors
    ///
    /// Returns the first conversion failure.
    pub fn to_constraint(&self, parser: &ConstraintParser<'_>) -> ConstraintResult<Constraint> {
        Ok(Constraint::all(self.to_constraints(parser)?))
    }
}
