use super::{CompoundConstraint, Constraint, ConstraintError, Predicate, PredicateKind};
use crate::properties::Property;
use core::fmt;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = " evaluator";

/// Why a node contributed to an unsatisfied result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The node evaluated to `false`.
    Unsatisfied,

    /// The node is a child of a `not` and was satisfied, which the parent forbids.
    Forbidden,

    /// The node could not be evaluated and is treated as unsatisfied.
    Errored(ConstraintError),
}

/// One entry of the failure trace produced by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    /// Location of the node in the tree, such as `$.all.constraints[1]`.
    pub path: String,
    pub predicate: PredicateKind,

    /// The author-supplied failure message, or a description of the predicate.
    pub message: String,
    pub cause: FailureCause,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.predicate, self.message)?;
        match &self.cause {
            FailureCause::Unsatisfied => Ok(()),
            FailureCause::Forbidden => f.write_str(" [forbidden by parent]"),
            FailureCause::Errored(e) => write!(f, " [error: {e}]"),
        }
    }
}

/// An error raised by a leaf while evaluating, with the leaf's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafError {
    pub path: String,
    pub error: ConstraintError,
}

impl fmt::Display for LeafError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// The result of evaluating a constraint tree against a set of properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub satisfied: bool,

    /// The nodes that explain an unsatisfied result, children before their parents.
    ///
    /// Empty when the constraint is satisfied.
    pub failures: Vec<FailureReason>,

    /// Every leaf that failed to evaluate, in tree order.
    ///
    /// Errors are recorded even when they did not change the outcome.
    pub errors: Vec<LeafError>,
}

impl Evaluation {
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.satisfied
    }
}

/// A named set of properties, such as one bundle in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Candidate {
    pub name: String,

    #[serde(default)]
    pub properties: Vec<Property>,
}

/// Decides whether `properties` satisfy `constraint`.
///
/// Every child of a compound node is evaluated, so the trace and error list are complete even
/// when the outcome was decided early. A leaf that fails to evaluate counts as unsatisfied and is
/// recorded in [`Evaluation::errors`].
#[must_use]
pub fn evaluate(constraint: &Constraint, properties: &[Property]) -> Evaluation {
    let mut errors = Vec::new();
    let node = eval_node(constraint, properties, "$", &mut errors);

    log::debug!(
        target: LOG_TARGET,
        "Constraint {} with {} failure(s) and {} error(s)",
        if node.satisfied { "satisfied" } else { "unsatisfied" },
        node.failures.len(),
        errors.len()
    );

    Evaluation {
        satisfied: node.satisfied,
        failures: node.failures,
        errors,
    }
}

/// Returns the candidates whose properties satisfy `constraint`, in input order.
#[must_use]
pub fn matching_candidates<'a>(constraint: &Constraint, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
    candidates
        .iter()
        .filter(|candidate| {
            let satisfied = evaluate(constraint, &candidate.properties).satisfied;
            log::trace!(target: LOG_TARGET, "Candidate '{}' satisfied: {satisfied}", candidate.name);
            satisfied
        })
        .collect()
}

struct NodeOutcome {
    satisfied: bool,
    failures: Vec<FailureReason>,
}

impl NodeOutcome {
    const fn satisfied() -> Self {
        Self {
            satisfied: true,
            failures: Vec::new(),
        }
    }

    fn unsatisfied(mut failures: Vec<FailureReason>, own: FailureReason) -> Self {
        failures.push(own);
        Self {
            satisfied: false,
            failures,
        }
    }
}

fn reason(constraint: &Constraint, path: &str, cause: FailureCause) -> FailureReason {
    FailureReason {
        path: path.to_string(),
        predicate: constraint.predicate.kind(),
        message: constraint
            .message
            .clone()
            .unwrap_or_else(|| constraint.predicate.describe()),
        cause,
    }
}

fn eval_node(constraint: &Constraint, properties: &[Property], path: &str, errors: &mut Vec<LeafError>) -> NodeOutcome {
    let leaf = match &constraint.predicate {
        Predicate::Gvk(gvk) => Ok(gvk.is_satisfied_by(properties)),
        Predicate::Package(package) => Ok(package.is_satisfied_by(properties)),
        Predicate::Cel(cel) => cel.program().evaluate(properties),
        Predicate::All(compound) => return eval_all(constraint, compound, properties, path, errors),
        Predicate::Any(compound) => return eval_any(constraint, compound, properties, path, errors),
        Predicate::Not(compound) => return eval_not(constraint, compound, properties, path, errors),
    };

    match leaf {
        Ok(true) => {
            log::trace!(target: LOG_TARGET, "{path}: satisfied");
            NodeOutcome::satisfied()
        }
        Ok(false) => {
            log::trace!(target: LOG_TARGET, "{path}: unsatisfied");
            NodeOutcome::unsatisfied(Vec::new(), reason(constraint, path, FailureCause::Unsatisfied))
        }
        Err(error) => {
            log::debug!(target: LOG_TARGET, "{path}: {error}");
            errors.push(LeafError {
                path: path.to_string(),
                error: error.clone(),
            });
            NodeOutcome::unsatisfied(Vec::new(), reason(constraint, path, FailureCause::Errored(error)))
        }
    }
}

fn eval_children<'c>(
    compound: &'c CompoundConstraint,
    properties: &[Property],
    path: &str,
    errors: &mut Vec<LeafError>,
) -> Vec<(String, &'c Constraint, NodeOutcome)> {
    compound
        .constraints
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let child_path = format!("{path}.constraints[{index}]");
            let outcome = eval_node(child, properties, &child_path, errors);
            (child_path, child, outcome)
        })
        .collect()
}

fn eval_all(
    constraint: &Constraint,
    compound: &CompoundConstraint,
    properties: &[Property],
    path: &str,
    errors: &mut Vec<LeafError>,
) -> NodeOutcome {
    let children = eval_children(compound, properties, &compound_path(path, PredicateKind::All), errors);
    if children.iter().all(|(_, _, outcome)| outcome.satisfied) {
        return NodeOutcome::satisfied();
    }

    let failures = children
        .into_iter()
        .filter(|(_, _, outcome)| !outcome.satisfied)
        .flat_map(|(_, _, outcome)| outcome.failures)
        .collect();
    NodeOutcome::unsatisfied(failures, reason(constraint, path, FailureCause::Unsatisfied))
}

fn eval_any(
    constraint: &Constraint,
    compound: &CompoundConstraint,
    properties: &[Property],
    path: &str,
    errors: &mut Vec<LeafError>,
) -> NodeOutcome {
    let children = eval_children(compound, properties, &compound_path(path, PredicateKind::Any), errors);
    if children.iter().any(|(_, _, outcome)| outcome.satisfied) {
        return NodeOutcome::satisfied();
    }

    let failures = children.into_iter().flat_map(|(_, _, outcome)| outcome.failures).collect();
    NodeOutcome::unsatisfied(failures, reason(constraint, path, FailureCause::Unsatisfied))
}

fn eval_not(
    constraint: &Constraint,
    compound: &CompoundConstraint,
    properties: &[Property],
    path: &str,
    errors: &mut Vec<LeafError>,
) -> NodeOutcome {
    let children = eval_children(compound, properties, &compound_path(path, PredicateKind::Not), errors);
    if children.iter().all(|(_, _, outcome)| !outcome.satisfied) {
        return NodeOutcome::satisfied();
    }

    let failures = children
        .into_iter()
        .filter(|(_, _, outcome)| outcome.satisfied)
        .map(|(child_path, child, _)| reason(child, &child_path, FailureCause::Forbidden))
        .collect();
    NodeOutcome::unsatisfied(failures, reason(constraint, path, FailureCause::Unsatisfied))
}

fn compound_path(path: &str, kind: PredicateKind) -> String {
    format!("{path}.{kind}")
}
