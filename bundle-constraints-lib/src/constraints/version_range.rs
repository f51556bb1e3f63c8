//! Semantic-version ranges such as `>=1.0.0 <2.0.0 || 3.1.4`

use super::{ConstraintError, ConstraintResult};
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        let ordering = compare_precedence(version, &self.version);
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
        }
    }
}

/// A parsed semantic-version range.
///
/// Comparators separated by whitespace must all hold; groups separated by `||` are alternatives.
/// A comparator without an operator requires equality.
#[derive(Debug, Clone)]
pub struct VersionRange {
    source: String,
    alternatives: Vec<Vec<Comparator>>,
}

impl VersionRange {
    /// Parses a version range.
    ///
    /// # Errors
    /// Returns [`ConstraintError::InvalidRange`] if the range is empty or any comparator is malformed.
    pub fn parse(source: &str) -> ConstraintResult<Self> {
        let invalid = |reason: String| ConstraintError::InvalidRange {
            range: source.to_string(),
            reason,
        };

        if source.trim().is_empty() {
            return Err(invalid("range is empty".to_string()));
        }

        let mut alternatives = Vec::new();
        for group in source.split("||") {
            let tokens = join_operators(group);
            if tokens.is_empty() {
                return Err(invalid("empty alternative around '||'".to_string()));
            }

            let comparators = tokens
                .iter()
                .map(|token| parse_comparator(token).map_err(&invalid))
                .collect::<ConstraintResult<Vec<_>>>()?;
            alternatives.push(comparators);
        }

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// Whether `version` falls inside this range.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|group| group.iter().all(|comparator| comparator.matches(version)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Compares two versions by semantic-version precedence, ignoring build metadata.
#[must_use]
pub fn compare_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

// Splits a group on whitespace, re-attaching a bare operator to the version that follows it so that
// `>= 1.0.0` reads the same as `>=1.0.0`.
fn join_operators(group: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for word in group.split_whitespace() {
        if let Some(op) = pending_op.take() {
            tokens.push(format!("{op}{word}"));
        } else if word.chars().all(|c| matches!(c, '<' | '>' | '=' | '!')) {
            pending_op = Some(word);
        } else {
            tokens.push(word.to_string());
        }
    }

    if let Some(op) = pending_op {
        tokens.push(op.to_string());
    }

    tokens
}

fn parse_comparator(token: &str) -> Result<Comparator, String> {
    let split = token.find(|c: char| !matches!(c, '<' | '>' | '=' | '!')).unwrap_or(token.len());
    let (op, version) = token.split_at(split);

    let op = match op {
        "" | "=" | "==" => Op::Eq,
        "!" | "!=" => Op::Ne,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        "<" => Op::Lt,
        "<=" => Op::Le,
        other => return Err(format!("unknown operator '{other}'")),
    };

    if version.is_empty() {
        return Err(format!("operator '{token}' is not followed by a version"));
    }

    let version = Version::parse(version).map_err(|e| format!("'{version}' is not a semantic version: {e}"))?;
    Ok(Comparator { op, version })
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for VersionRange {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}
