use serde_json::Value;

use crate::issue::{Expected, Issue, IssueCode, PathSegment};
use crate::schema::{ConstraintKind, Schema, SchemaKind};

/// Evaluate every constraint on `schema` against `input`; no short-circuit.
///
/// Constraints that do not apply to the input's run-time type are skipped:
/// the structural check has already reported the mismatch.
pub(super) fn check(schema: &Schema, input: &Value, path: &[PathSegment]) -> Vec<Issue> {
    let mut issues = Vec::new();
    let kind = schema.kind();
    let label = kind.as_str().to_uppercase();
    let unit = if kind == SchemaKind::String { "characters" } else { "elements" };

    for constraint in schema.constraints() {
        // constraint override > node override > generated
        let message = |generated: String| -> String {
            constraint
                .message()
                .or(schema.message())
                .map(str::to_string)
                .unwrap_or(generated)
        };

        match constraint.kind() {
            ConstraintKind::Length => {
                let (Some(len), Some(limit)) = (length_of(input), constraint.value().as_number()) else {
                    continue;
                };
                let len = len as f64;
                let violation = match constraint.name() {
                    "min_length" if len < limit => Some((
                        IssueCode::LengthConstraintFailed,
                        format!("{label} too short (Minimum of {limit} {unit})"),
                    )),
                    "max_length" if len > limit => Some((
                        IssueCode::LengthConstraintExceeded,
                        format!("{label} too large (Maximum of {limit} {unit})"),
                    )),
                    _ => None,
                };
                if let Some((code, generated)) = violation {
                    issues.push(
                        Issue::new(code, message(generated), path.to_vec())
                            .with_expected(Expected::Number(limit))
                            .with_recieved(input),
                    );
                }
            }
            ConstraintKind::Range => {
                let (Some(n), Some(limit)) = (input.as_f64(), constraint.value().as_number()) else {
                    continue;
                };
                let violation = match constraint.name() {
                    "min" if n < limit => Some((
                        IssueCode::RangeConstraintFailed,
                        format!("{label} too small (Minimum of {limit})"),
                    )),
                    "max" if n > limit => Some((
                        IssueCode::RangeConstraintExceeded,
                        format!("{label} too large (Maximum of {limit})"),
                    )),
                    _ => None,
                };
                if let Some((code, generated)) = violation {
                    issues.push(
                        Issue::new(code, message(generated), path.to_vec())
                            .with_expected(Expected::Number(limit))
                            .with_recieved(input),
                    );
                }
            }
            ConstraintKind::Pattern => {
                let (Some(s), Some(rx)) = (input.as_str(), constraint.value().as_pattern()) else {
                    continue;
                };
                if !rx.is_match(s) {
                    let generated = format!("{label} does not match pattern {}", rx.as_str());
                    issues.push(
                        Issue::new(IssueCode::PatternMismatch, message(generated), path.to_vec())
                            .with_expected(Expected::Pattern(rx.as_str().to_string()))
                            .with_recieved(input),
                    );
                }
            }
        }
    }
    issues
}

/// Length of a string (in chars) or a sequence; `None` for anything else.
fn length_of(v: &Value) -> Option<usize> {
    match v {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(xs) => Some(xs.len()),
        _ => None,
    }
}
