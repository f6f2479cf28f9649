use regex::Regex;
use serde_json::{Number, Value};
use tracing::debug;

use super::{AssertionOutcome, AssertionSpec, Operator, ShapeDefect, Source};
use crate::walk::{json_kind_name, Resolved, Root};

/// Required vs actual kind, before the callsite is attached.
type Mismatch = (&'static str, String);

/// Evaluate one spec against a scenario root.
///
/// A path is resolved with the walker matching `root`; a producer is called
/// with no root at all. A producer error is reported as a failed outcome.
pub fn evaluate(spec: &AssertionSpec<'_>, root: Root<'_>) -> Result<AssertionOutcome, ShapeDefect> {
    let resolved = match &spec.source {
        Source::Path(path) => Ok(root.resolve(path)),
        Source::Producer(produce) => produce().map(Resolved::Value),
        Source::Derive(derive) => Ok(Resolved::Value(derive(root))),
    };

    let (resolved, passed, message) = match resolved {
        Ok(resolved) => {
            let passed = check(spec.operator, &resolved, &spec.expected).map_err(
                |(required, actual)| ShapeDefect {
                    operator: spec.operator,
                    required,
                    actual,
                    callsite: spec.callsite.clone(),
                },
            )?;
            let message = (!passed).then(|| {
                format!(
                    "{}: value={}, want={}",
                    spec.operator, resolved, spec.expected
                )
            });
            (resolved, passed, message)
        }
        Err(error) => {
            let message = format!("{}: producer failed: {error}", spec.operator);
            (Resolved::Absent, false, Some(message))
        }
    };

    debug!(
        operator = %spec.operator,
        subject = %spec.source,
        passed,
        "assertion evaluated"
    );

    Ok(AssertionOutcome {
        description: spec.description.clone(),
        operator: spec.operator,
        subject: spec.source.to_string(),
        expected: spec.expected.clone(),
        resolved,
        passed,
        message,
        callsite: spec.callsite.clone(),
    })
}

fn check(operator: Operator, resolved: &Resolved, expected: &Value) -> Result<bool, Mismatch> {
    match operator {
        Operator::Equal => Ok(resolved_equals(resolved, expected)),
        Operator::NotEqual => Ok(!resolved_equals(resolved, expected)),
        Operator::Present => Ok(!resolved.is_absent()),
        Operator::NotPresent => Ok(resolved.is_absent()),
        Operator::Contains => {
            let value = require_string(resolved)?;
            let needle = require_expected_string(expected)?;
            Ok(value.contains(needle))
        }
        Operator::Matches => {
            let value = require_string(resolved)?;
            let pattern = require_expected_string(expected)?;
            let regex = Regex::new(pattern).map_err(|error| {
                (
                    "a valid regular expression",
                    format!("`{pattern}` ({error})"),
                )
            })?;
            Ok(regex.is_match(value))
        }
        Operator::LengthEquals => {
            let Some(Value::Array(items)) = resolved.as_value() else {
                return Err(("sequence", resolved.kind_name().to_string()));
            };
            let want = require_expected_integer(expected)?;
            Ok(i128::try_from(items.len()).is_ok_and(|len| len == want))
        }
        Operator::GreaterThan => {
            let value = require_integer(resolved)?;
            Ok(value > require_expected_integer(expected)?)
        }
        Operator::LessThan => {
            let value = require_integer(resolved)?;
            Ok(value < require_expected_integer(expected)?)
        }
    }
}

/// Absent equals only a null expectation.
fn resolved_equals(resolved: &Resolved, expected: &Value) -> bool {
    match resolved {
        Resolved::Absent => expected.is_null(),
        Resolved::Value(value) => values_equal(value, expected),
    }
}

/// Structural equality where `5`, `5u64` and `5.0` compare equal.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| values_equal(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right
                        .get(key)
                        .is_some_and(|right| values_equal(left, right))
                })
        }
        _ => left == right,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (as_integer(left), as_integer(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left.as_f64() == right.as_f64(),
    }
}

fn as_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn require_string(resolved: &Resolved) -> Result<&str, Mismatch> {
    match resolved.as_value() {
        Some(Value::String(value)) => Ok(value),
        _ => Err(("string", resolved.kind_name().to_string())),
    }
}

fn require_integer(resolved: &Resolved) -> Result<i128, Mismatch> {
    match resolved.as_value() {
        Some(Value::Number(number)) => {
            as_integer(number).ok_or(("integer", resolved.kind_name().to_string()))
        }
        _ => Err(("integer", resolved.kind_name().to_string())),
    }
}

fn require_expected_string(expected: &Value) -> Result<&str, Mismatch> {
    expected.as_str().ok_or_else(|| {
        (
            "a string expected value",
            json_kind_name(expected).to_string(),
        )
    })
}

fn require_expected_integer(expected: &Value) -> Result<i128, Mismatch> {
    match expected {
        Value::Number(number) => as_integer(number),
        _ => None,
    }
    .ok_or_else(|| {
        (
            "an integer expected value",
            json_kind_name(expected).to_string(),
        )
    })
}
