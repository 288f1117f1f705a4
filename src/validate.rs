//! Validation / transform engine.
//!
//! [`validate`] walks a schema and an input in lock-step, collecting every
//! [`Issue`] it finds (structure first, then children, then constraints). Only
//! when the whole tree is clean does a second pass apply transforms; on failure
//! the caller gets the original input back untouched.
mod constraints;
mod transform;

use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::issue::{Expected, Issue, IssueCode, PathSegment};
use crate::schema::{Node, Schema};

// ------------------------------- Result ---------------------------------- //

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    /// Transformed value on success, the original input on failure.
    pub output: Value,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_success(&self) -> bool { self.success }

    pub fn into_result(self) -> Result<Value, ValidationFailure> {
        if self.success {
            Ok(self.output)
        } else {
            Err(ValidationFailure { input: self.output, issues: self.issues })
        }
    }
}

/// A failed validation as an error value.
#[derive(Error, Debug, Clone)]
#[error("validation failed with {} issue(s):\n{}", .issues.len(), IssueList(.issues))]
pub struct ValidationFailure {
    pub input: Value,
    pub issues: Vec<Issue>,
}

struct IssueList<'a>(&'a [Issue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {issue}")?;
        }
        Ok(())
    }
}

// ------------------------------ Front API -------------------------------- //

/// Validate `input` against `schema`.
pub fn validate(schema: &Schema, input: Value) -> ValidationResult {
    let mut walker = Walker::default();
    walker.walk(schema, &input);
    let issues = walker.issues;

    tracing::debug!(
        schema = %schema.kind(),
        issues = issues.len(),
        "validation finished"
    );

    if !issues.is_empty() {
        return ValidationResult { success: false, output: input, issues };
    }
    ValidationResult {
        success: true,
        output: transform::apply(schema, input),
        issues,
    }
}

// ------------------------------- Walker ---------------------------------- //

#[derive(Default)]
struct Walker {
    issues: Vec<Issue>,
    path: Vec<PathSegment>,
}

impl Walker {
    fn push(&mut self, code: IssueCode, message: String) -> &mut Issue {
        tracing::trace!(%code, path = ?self.path, "{message}");
        self.issues.push(Issue::new(code, message, self.path.clone()));
        let last = self.issues.len() - 1;
        &mut self.issues[last]
    }

    fn descend(&mut self, seg: PathSegment, schema: &Schema, input: &Value) {
        self.path.push(seg);
        self.walk(schema, input);
        self.path.pop();
    }

    fn walk(&mut self, schema: &Schema, input: &Value) {
        if schema.nullable && input.is_null() {
            return;
        }

        match &schema.node {
            Node::String => self.expect_type(schema, input, input.is_string()),
            Node::Number => self.expect_type(schema, input, input.is_number()),
            Node::Boolean => self.expect_type(schema, input, input.is_boolean()),
            Node::Enum { values } => {
                if !values.iter().any(|v| same_value(v, input)) {
                    let message = schema.message.clone().unwrap_or_else(|| {
                        let prefix = if values.len() > 1 { "either " } else { "" };
                        format!(
                            "Received {} but expected {prefix}{}",
                            type_name(input),
                            join_values(values, " or ")
                        )
                    });
                    let expected = Expected::Text(format!("Values: {}", join_values(values, ", ")));
                    let issue = self.push(IssueCode::InvalidValue, message);
                    issue.expected = Some(expected);
                    issue.recieved = Some(input.clone());
                }
            }
            Node::Array { shape } => match input.as_array() {
                None => self.expect_type(schema, input, false),
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.descend(PathSegment::Index(i), shape, item);
                    }
                }
            },
            Node::Object { fields } => match input.as_object() {
                None => self.expect_type(schema, input, false),
                Some(map) => {
                    // absence of required fields is reported before anything
                    // present in the input is looked at
                    for (key, field) in fields {
                        if !field.optional && !map.contains_key(key) {
                            self.path.push(PathSegment::Key(key.clone()));
                            let message = schema
                                .message
                                .clone()
                                .unwrap_or_else(|| format!("Field: {key} missing in input"));
                            self.push(IssueCode::MissingRequiredField, message).expected =
                                Some(Expected::Text(format!("Field: {key}")));
                            self.path.pop();
                        }
                    }
                    for (key, value) in map {
                        match fields.get(key) {
                            Some(field) => self.descend(PathSegment::Key(key.clone()), field, value),
                            None => {
                                self.path.push(PathSegment::Key(key.clone()));
                                let message = schema.message.clone().unwrap_or_else(|| {
                                    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                                    format!("This schema only expects fields: {}", names.join(", "))
                                });
                                self.push(IssueCode::UnknownField, message).recieved = Some(value.clone());
                                self.path.pop();
                            }
                        }
                    }
                }
            },
            Node::Phantom => {}
        }

        if !schema.constraints.is_empty() {
            let path = &self.path;
            let found = constraints::check(schema, input, path);
            self.issues.extend(found);
        }
    }

    fn expect_type(&mut self, schema: &Schema, input: &Value, ok: bool) {
        if ok {
            return;
        }
        let kind = schema.kind();
        let message = schema
            .message
            .clone()
            .unwrap_or_else(|| format!("Expected {kind} but received {}", type_name(input)));
        let issue = self.push(IssueCode::InvalidType, message);
        issue.expected = Some(Expected::Text(kind.as_str().to_string()));
        issue.recieved = Some(input.clone());
    }
}

// ------------------------------ Utilities -------------------------------- //

/// Run-time type name of a JSON value, as used in messages.
pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Value equality for enum membership; numbers compare by numeric value.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => OrderedFloat(x) == OrderedFloat(y),
            _ => x == y,
        },
        _ => a == b,
    }
}

fn join_values(values: &[Value], sep: &str) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(sep)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use serde_json::json;

    fn codes(r: &ValidationResult) -> Vec<IssueCode> {
        r.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn primitive_type_mismatch() {
        let r = validate(&string(Default::default()), json!(5));
        assert!(!r.success);
        assert_eq!(codes(&r), [IssueCode::InvalidType]);
        assert_eq!(r.issues[0].message, "Expected string but received number");
        assert_eq!(r.issues[0].expected, Some(Expected::Text("string".into())));
        assert_eq!(r.issues[0].recieved, Some(json!(5)));
        assert_eq!(r.output, json!(5));
    }

    #[test]
    fn node_message_overrides_type_error() {
        let s = boolean(BooleanOptions::new().msg("flag please"));
        let r = validate(&s, json!("yes"));
        assert_eq!(r.issues[0].message, "flag please");
    }

    #[test]
    fn enum_membership() {
        let e = one_of(["a", "b"], EnumOptions::new());
        let r = validate(&e, json!("c"));
        assert_eq!(codes(&r), [IssueCode::InvalidValue]);
        assert!(r.issues[0].path.is_empty());
        assert_eq!(r.issues[0].message, "Received string but expected either a or b");
        assert_eq!(r.issues[0].expected, Some(Expected::Text("Values: a, b".into())));

        let single = one_of([1], EnumOptions::new());
        let r = validate(&single, json!(2));
        assert_eq!(r.issues[0].message, "Received number but expected 1");
        assert!(validate(&single, json!(1.0)).success);
    }

    #[test]
    fn array_elements_get_index_paths() {
        let s = array(object([("id", number(Default::default()))]), Default::default());
        let r = validate(&s, json!([{"id": 1}, {"id": "x"}]));
        assert_eq!(codes(&r), [IssueCode::InvalidType]);
        assert_eq!(r.issues[0].path, vec![PathSegment::Index(1), PathSegment::Key("id".into())]);
    }

    #[test]
    fn non_array_input_skips_element_recursion() {
        let s = array(number(Default::default()), Default::default());
        let r = validate(&s, json!({"0": "x"}));
        assert_eq!(codes(&r), [IssueCode::InvalidType]);
    }

    #[test]
    fn object_strictness_two_passes() {
        let s = object([
            ("a", string(Default::default())),
            ("b", string(Default::default())),
        ]);
        let r = validate(&s, json!({"c": 1}));
        assert_eq!(
            codes(&r),
            [IssueCode::MissingRequiredField, IssueCode::MissingRequiredField, IssueCode::UnknownField]
        );
        assert_eq!(r.issues[0].path, vec![PathSegment::Key("a".into())]);
        assert_eq!(r.issues[1].path, vec![PathSegment::Key("b".into())]);
        assert_eq!(r.issues[2].path, vec![PathSegment::Key("c".into())]);
        assert_eq!(r.issues[2].message, "This schema only expects fields: a, b");
    }

    #[test]
    fn unknown_field_path_is_nested() {
        let s = object([("inner", object([("a", number(Default::default()))]))]);
        let r = validate(&s, json!({"inner": {"a": 1, "z": {"deep": true}}}));
        assert_eq!(codes(&r), [IssueCode::UnknownField]);
        assert_eq!(r.issues[0].pointer(), "/inner/z");
    }

    #[test]
    fn optional_field_may_be_absent_but_is_checked_when_present() {
        let s = object([
            ("a", string(Default::default())),
            ("b", crate::modifiers::optional(&number(Default::default()))),
        ]);
        assert!(validate(&s, json!({"a": "x"})).success);
        let r = validate(&s, json!({"a": "x", "b": "nope"}));
        assert_eq!(codes(&r), [IssueCode::InvalidType]);
        assert_eq!(r.issues[0].pointer(), "/b");
    }

    #[test]
    fn object_rejects_non_objects_including_null_and_arrays() {
        let s = object([("a", string(Default::default()))]);
        for input in [json!(null), json!([]), json!("s")] {
            let r = validate(&s, input);
            assert_eq!(codes(&r), [IssueCode::InvalidType]);
        }
    }

    #[test]
    fn nullable_accepts_null_only_when_marked() {
        let s = string(StringOptions::new().min_length(3));
        assert!(!validate(&s, json!(null)).success);
        let n = crate::modifiers::nullable(&s);
        let r = validate(&n, json!(null));
        assert!(r.success);
        assert_eq!(r.output, json!(null));
    }

    #[test]
    fn phantom_accepts_anything() {
        for input in [json!(null), json!({"x": [1, 2]}), json!("s")] {
            let r = validate(&phantom(), input.clone());
            assert!(r.success);
            assert_eq!(r.output, input);
        }
    }

    #[test]
    fn into_result_reports_issues() {
        let err = validate(&number(Default::default()), json!("x")).into_result().unwrap_err();
        assert_eq!(err.input, json!("x"));
        let text = err.to_string();
        assert!(text.starts_with("validation failed with 1 issue(s):"));
        assert!(text.contains("(root): Expected number but received string [invalid_type]"));
    }

    #[test]
    fn repeated_validation_is_stable() {
        let s = object([("n", number(NumberOptions::new().max(3)))]);
        let a = validate(&s, json!({"n": 9}));
        let b = validate(&s, json!({"n": 9}));
        assert_eq!(a, b);
    }
}
