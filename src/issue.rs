//! Structured validation issues.
//!
//! An [`Issue`] is the only failure currency of the engine: every problem found
//! while walking a schema and an input is recorded as one, tagged with the path
//! of the offending value inside the root input.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------- Codes ----------------------------------- //

/// Failure kind of an [`Issue`]. Serializes as the snake_case wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidValue,
    MissingRequiredField,
    UnknownField,
    LengthConstraintFailed,
    LengthConstraintExceeded,
    RangeConstraintFailed,
    RangeConstraintExceeded,
    PatternMismatch,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::MissingRequiredField => "missing_required_field",
            IssueCode::UnknownField => "unknown_field",
            IssueCode::LengthConstraintFailed => "length_constraint_failed",
            IssueCode::LengthConstraintExceeded => "length_constraint_exceeded",
            IssueCode::RangeConstraintFailed => "range_constraint_failed",
            IssueCode::RangeConstraintExceeded => "range_constraint_exceeded",
            IssueCode::PatternMismatch => "pattern_mismatch",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------- Paths ----------------------------------- //

/// One step from a parent value to a child: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self { PathSegment::Index(i) }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self { PathSegment::Key(k.to_string()) }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self { PathSegment::Key(k) }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

/// Render a path as a JSON Pointer (`/items/1/id`); the root is the empty string.
pub fn json_pointer(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for seg in path {
        out.push('/');
        match seg {
            PathSegment::Index(i) => out.push_str(&i.to_string()),
            PathSegment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
        }
    }
    out
}

// ------------------------------- Issue ----------------------------------- //

/// What the failing node required.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expected {
    Text(String),
    Number(f64),
    /// Source of the regular expression that did not match.
    Pattern(String),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Text(s) => f.write_str(s),
            Expected::Number(n) => write!(f, "{n}"),
            Expected::Pattern(p) => write!(f, "/{p}/"),
        }
    }
}

/// A single validation failure.
///
/// The `recieved` spelling is part of the serialized contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recieved: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>, path: Vec<PathSegment>) -> Self {
        Self { code, message: message.into(), path, recieved: None, expected: None }
    }

    pub fn with_recieved(mut self, value: &Value) -> Self {
        self.recieved = Some(value.clone());
        self
    }

    pub fn with_expected(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn pointer(&self) -> String {
        json_pointer(&self.path)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {} [{}]", self.message, self.code)
        } else {
            write!(f, "{}: {} [{}]", self.pointer(), self.message, self.code)
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
