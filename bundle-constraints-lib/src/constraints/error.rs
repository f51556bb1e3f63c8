use thiserror::Error;

/// The broad category of a [`ConstraintError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SizeExceeded,
    UnknownField,
    MalformedDocument,
    MalformedPredicate,
    InvalidRange,
    Compile,
    Evaluation,
    InvalidProperty,
}

/// Errors produced while parsing constraints, compiling expressions, or evaluating either.
///
/// Parse and compile errors describe malformed authoring input and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("constraint document is {size} bytes, which exceeds the maximum of {max} bytes")]
    SizeExceeded { size: usize, max: usize },

    #[error("unknown field `{field}` at line {line}, column {column}")]
    UnknownField { field: String, line: usize, column: usize },

    #[error("malformed constraint document: {message}")]
    MalformedDocument { message: String },

    #[error("malformed predicate at '{path}': {reason}")]
    MalformedPredicate { path: String, reason: String },

    #[error("invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("could not compile expression '{rule}': {reason}")]
    Compile { rule: String, reason: String },

    #[error("could not evaluate expression '{rule}': {reason}")]
    Evaluation { rule: String, reason: String },

    #[error("invalid property '{property_type}': {reason}")]
    InvalidProperty { property_type: String, reason: String },
}

impl ConstraintError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Self::MalformedPredicate { .. } => ErrorKind::MalformedPredicate,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::Compile { .. } => ErrorKind::Compile,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
            Self::InvalidProperty { .. } => ErrorKind::InvalidProperty,
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPredicate {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps a `serde_json` decoding failure onto the error taxonomy.
    ///
    /// `deny_unknown_fields` rejections surface as [`ConstraintError::UnknownField`], carrying the
    /// name of the offending key. Everything else is a malformed document.
    pub(crate) fn from_json(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        if let Some(field) = unknown_field_name(&message) {
            return Self::UnknownField {
                field: field.to_string(),
                line: err.line(),
                column: err.column(),
            };
        }

        Self::MalformedDocument { message }
    }
}

fn unknown_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    let end = rest.find('`')?;
    rest.get(..end)
}

/// Result type for constraint operations.
pub type ConstraintResult<T> = Result<T, ConstraintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    #[expect(dead_code, reason = "only decoded to trigger errors")]
    struct Strict {
        name: String,
    }

    #[test]
    fn test_unknown_field_is_classified() {
        let err = serde_json::from_str::<Strict>(r#"{"name": "a", "unexpected": 1}"#).unwrap_err();
        let err = ConstraintError::from_json(&err);
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        match err {
            ConstraintError::UnknownField { field, line, .. } => {
                assert_eq!(field, "unexpected");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_is_malformed_document() {
        let err = serde_json::from_str::<Strict>("{not json").unwrap_err();
        assert_eq!(ConstraintError::from_json(&err).kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_missing_field_is_malformed_document() {
        let err = serde_json::from_str::<Strict>("{}").unwrap_err();
        assert_eq!(ConstraintError::from_json(&err).kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_display_names_the_field() {
        let err = ConstraintError::UnknownField {
            field: "arbitrary".to_string(),
            line: 1,
            column: 30,
        };
        assert_eq!(err.to_string(), "unknown field `arbitrary` at line 1, column 30");
    }
}
