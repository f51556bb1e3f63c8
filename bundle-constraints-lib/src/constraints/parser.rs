use super::wire::{CompoundDoc, ConstraintDoc};
use super::{
    CelConstraint, CompoundConstraint, Constraint, ConstraintError, ConstraintResult, GvkConstraint, PackageConstraint, Predicate,
    VersionRange,
};
use crate::expr::Environment;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "    parser";

/// The default upper bound on the size of a constraint document, in bytes.
pub const DEFAULT_MAX_CONSTRAINT_SIZE: usize = 64 * 1024;

/// Tunables for [`ConstraintParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Documents strictly larger than this many bytes are rejected before decoding.
    pub max_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_CONSTRAINT_SIZE,
        }
    }
}

/// Turns JSON constraint documents into validated [`Constraint`] trees.
///
/// Parsing is strict. The size bound is checked before any decoding happens, unknown keys are
/// rejected at every level, every node must carry exactly one predicate, version ranges must
/// parse, and every expression must compile in the parser's [`Environment`].
///
/// A parser holds no mutable state and may be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintParser<'env> {
    config: ParserConfig,
    env: &'env Environment,
}

impl ConstraintParser<'static> {
    /// Creates a parser that compiles expressions with [`Environment::shared`].
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self::with_environment(config, Environment::shared())
    }
}

impl Default for ConstraintParser<'static> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<'env> ConstraintParser<'env> {
    #[must_use]
    pub const fn with_environment(config: ParserConfig, env: &'env Environment) -> Self {
        Self { config, env }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a constraint document.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::SizeExceeded`] when `input` is larger than the configured maximum
    /// - [`ConstraintError::UnknownField`] when any object carries an unrecognized key
    /// - [`ConstraintError::MalformedDocument`] when `input` is not well-formed JSON of the right shape
    /// - [`ConstraintError::MalformedPredicate`] when a node has zero or several predicates, or empty fields
    /// - [`ConstraintError::InvalidRange`] when a package version range does not parse
    /// - [`ConstraintError::Compile`] when an expression does not compile
    pub fn parse(&self, input: &[u8]) -> ConstraintResult<Constraint> {
        let result = self.parse_inner(input);
        match &result {
            Ok(_) => log::debug!(target: LOG_TARGET, "Parsed constraint document of {} bytes", input.len()),
            Err(e) => log::debug!(target: LOG_TARGET, "Rejected constraint document: {e}"),
        }

        result
    }

    /// Parses a constraint document held in a string.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse`].
    pub fn parse_str(&self, input: &str) -> ConstraintResult<Constraint> {
        self.parse(input.as_bytes())
    }

    fn parse_inner(&self, input: &[u8]) -> ConstraintResult<Constraint> {
        if input.len() > self.config.max_size {
            return Err(ConstraintError::SizeExceeded {
                size: input.len(),
                max: self.config.max_size,
            });
        }

        let doc: ConstraintDoc = serde_json::from_slice(input).map_err(|e| ConstraintError::from_json(&e))?;
        self.build(doc, "$")
    }

    fn build(&self, doc: ConstraintDoc, path: &str) -> ConstraintResult<Constraint> {
        let keys = doc.predicate_keys();
        match keys.as_slice() {
            [] => {
                return Err(ConstraintError::malformed(
                    path,
                    "no predicate set, expected exactly one of gvk, package, cel, all, any, not",
                ));
            }
            [_] => {}
            _ => {
                return Err(ConstraintError::malformed(
                    path,
                    format!("expected exactly one predicate, found {}", keys.join(", ")),
                ));
            }
        }

        let ConstraintDoc {
            message,
            gvk,
            package,
            cel,
            all,
            any,
            not,
        } = doc;

        let predicate = if let Some(gvk) = gvk {
            let path = format!("{path}.gvk");
            Predicate::Gvk(GvkConstraint {
                group: require_non_empty(gvk.group, &path, "group")?,
                version: require_non_empty(gvk.version, &path, "version")?,
                kind: require_non_empty(gvk.kind, &path, "kind")?,
            })
        } else if let Some(package) = package {
            let path = format!("{path}.package");
            let package_name = require_non_empty(package.package_name, &path, "packageName")?;
            let version_range = require_non_empty(package.version_range, &path, "versionRange")?;
            Predicate::Package(PackageConstraint {
                package_name,
                version_range: VersionRange::parse(&version_range)?,
            })
        } else if let Some(cel) = cel {
            let rule = require_non_empty(cel.rule, &format!("{path}.cel"), "rule")?;
            Predicate::Cel(CelConstraint::new(self.env.compile(&rule)?))
        } else if let Some(all) = all {
            Predicate::All(self.build_compound(all, &format!("{path}.all"))?)
        } else if let Some(any) = any {
            Predicate::Any(self.build_compound(any, &format!("{path}.any"))?)
        } else if let Some(not) = not {
            Predicate::Not(self.build_compound(not, &format!("{path}.not"))?)
        } else {
            return Err(ConstraintError::malformed(path, "no predicate set"));
        };

        Ok(Constraint { message, predicate })
    }

    fn build_compound(&self, compound: CompoundDoc, path: &str) -> ConstraintResult<CompoundConstraint> {
        let Some(docs) = compound.constraints else {
            return Err(ConstraintError::malformed(path, "missing 'constraints' list"));
        };

        let constraints = docs
            .into_iter()
            .enumerate()
            .map(|(index, doc)| self.build(doc, &format!("{path}.constraints[{index}]")))
            .collect::<ConstraintResult<Vec<_>>>()?;

        Ok(CompoundConstraint { constraints })
    }
}

fn require_non_empty(value: String, path: &str, field: &str) -> ConstraintResult<String> {
    if value.trim().is_empty() {
        Err(ConstraintError::malformed(path, format!("'{field}' must not be empty")))
    } else {
        Ok(value)
    }
}
