use crate::constraints::compare_precedence;
use cel_interpreter::{ExecutionError, FunctionContext};
use core::cmp::Ordering;
use semver::Version;
use std::sync::Arc;

/// Name under which [`semver_compare`] is registered in expressions.
pub const SEMVER_COMPARE: &str = "semver_compare";

/// Compares two semantic versions, returning -1, 0, or 1.
///
/// Both inputs must be strict `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` versions. Anything else
/// fails the evaluation rather than being coerced.
pub fn compare_versions(a: &str, b: &str) -> Result<i64, String> {
    let a = Version::parse(a).map_err(|e| format!("'{a}' is not a semantic version: {e}"))?;
    let b = Version::parse(b).map_err(|e| format!("'{b}' is not a semantic version: {e}"))?;

    Ok(match compare_precedence(&a, &b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

/// The `semver_compare(a, b)` expression function.
pub fn semver_compare(ftx: &FunctionContext, a: Arc<String>, b: Arc<String>) -> Result<i64, ExecutionError> {
    compare_versions(&a, &b).map_err(|message| ftx.error(message))
}
