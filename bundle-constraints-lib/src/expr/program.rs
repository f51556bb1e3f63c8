use super::environment::PROPERTIES_VARIABLE;
use super::semver_compare::{SEMVER_COMPARE, semver_compare};
use crate::constraints::{ConstraintError, ConstraintResult};
use crate::properties::{Property, to_records};
use super::guard::contained;
use cel_interpreter::objects::Map;
use cel_interpreter::{Context, Expression, Value};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled, type-checked boolean expression.
///
/// Programs are immutable and may be evaluated concurrently from any number of threads. Each
/// evaluation builds its own activation, so calls never observe one another.
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    expression: Arc<Expression>,
}

impl Program {
    pub(super) const fn new(source: String, expression: Arc<Expression>) -> Self {
        Self { source, expression }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the program against a candidate's properties.
    ///
    /// # Errors
    /// Returns [`ConstraintError::Evaluation`] if evaluation fails at runtime, for example because a
    /// property value has an unexpected type or is not a valid semantic version, or because integer
    /// arithmetic divides by zero or overflows.
    pub fn evaluate(&self, properties: &[Property]) -> ConstraintResult<bool> {
        self.evaluate_records(&to_records(properties))
    }

    /// Evaluates the program against a `{"properties": [...]}` input document.
    ///
    /// # Errors
    /// Returns [`ConstraintError::Evaluation`] if `input` has no `properties` list or evaluation fails.
    pub fn evaluate_json(&self, input: &JsonValue) -> ConstraintResult<bool> {
        match input.get(PROPERTIES_VARIABLE) {
            Some(records @ JsonValue::Array(_)) => self.evaluate_records(records),
            _ => Err(self.evaluation_err(format!("input must bind '{PROPERTIES_VARIABLE}' to a list"))),
        }
    }

    fn evaluate_records(&self, records: &JsonValue) -> ConstraintResult<bool> {
        let context = build_cel_context(records);

        let result =
            contained(|| Value::resolve(&self.expression, &context)).map_err(|reason| self.evaluation_err(reason))?;

        match result.map_err(|e| self.evaluation_err(e.to_string()))? {
            Value::Bool(b) => Ok(b),
            other => Err(self.evaluation_err(format!("expression did not return a boolean, got '{other:?}' instead"))),
        }
    }

    fn evaluation_err(&self, reason: String) -> ConstraintError {
        ConstraintError::Evaluation {
            rule: self.source.clone(),
            reason,
        }
    }
}

fn build_cel_context(records: &JsonValue) -> Context<'_> {
    let mut context = Context::default();
    context.add_function(SEMVER_COMPARE, semver_compare);
    context.add_variable_from_value(PROPERTIES_VARIABLE, convert_json_value(records));
    context
}

/// Convert a JSON value to a CEL Value
fn convert_json_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::String(Arc::new(s.clone())),
        JsonValue::Array(values) => Value::List(Arc::new(values.iter().map(convert_json_value).collect())),
        JsonValue::Object(fields) => {
            let map: HashMap<Arc<String>, Value> = fields
                .iter()
                .map(|(k, v)| (Arc::new(k.clone()), convert_json_value(v)))
                .collect();
            Value::Map(Map::from(map))
        }
    }
}
