//! Schema documents: the declarative JSON form of a [`Schema`].
//!
//! ```json
//! { "type": "object", "fields": {
//!     "name":  { "type": "string", "minLength": 1, "maxLength": [40, "name too long"] },
//!     "email": { "type": "email", "optional": true },
//!     "tags":  { "type": "array", "shape": { "type": "string" }, "maxLength": 8 },
//!     "role":  { "type": "enum", "values": ["admin", "user"], "default": "user" }
//! } }
//! ```
//!
//! `minLength`, `maxLength`, `min`, `max` and `pattern` are constraint options,
//! given bare or as `[value, message]`; they go through the same classification
//! as the builder API. Unknown keys are rejected. Transforms cannot be
//! expressed here.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::helpers;
use crate::modifiers;
use crate::schema::constraint::option_key;
use crate::schema::{
    ArrayOptions, BooleanOptions, ConstraintKind, ConstraintValue, EnumOptions, Limit, Node,
    NumberOptions, Schema, StringOptions, array, boolean, number, object, one_of, phantom, string,
};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read schema document {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed schema document at {path}: {source}")]
    Syntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{at}: `{kind}` schema requires `{property}`")]
    MissingProperty { at: String, kind: &'static str, property: &'static str },
    #[error("{at}: invalid option `{option}`: {reason}")]
    InvalidOption { at: String, option: String, reason: String },
    #[error("{at}: invalid pattern: {source}")]
    InvalidPattern {
        at: String,
        #[source]
        source: regex::Error,
    },
}

// ------------------------------ Raw form --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    String,
    Number,
    Boolean,
    Enum,
    Array,
    Object,
    Phantom,
    Date,
    Email,
    Url,
    Uuid,
}

impl RawKind {
    fn as_str(&self) -> &'static str {
        match self {
            RawKind::String => "string",
            RawKind::Number => "number",
            RawKind::Boolean => "boolean",
            RawKind::Enum => "enum",
            RawKind::Array => "array",
            RawKind::Object => "object",
            RawKind::Phantom => "phantom",
            RawKind::Date => "date",
            RawKind::Email => "email",
            RawKind::Url => "url",
            RawKind::Uuid => "uuid",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(rename = "type")]
    kind: RawKind,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    values: Option<Vec<Value>>,
    #[serde(default)]
    shape: Option<Box<RawSchema>>,
    #[serde(default)]
    fields: Option<IndexMap<String, RawSchema>>,
    #[serde(default, rename = "minLength")]
    min_length: Option<RawOption>,
    #[serde(default, rename = "maxLength")]
    max_length: Option<RawOption>,
    #[serde(default)]
    min: Option<RawOption>,
    #[serde(default)]
    max: Option<RawOption>,
    #[serde(default)]
    pattern: Option<RawOption>,
}

/// A constraint option: bare value or `[value, message]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawOption {
    WithMessage(Value, String),
    Bare(Value),
}

impl RawOption {
    fn split(self) -> (Value, Option<String>) {
        match self {
            RawOption::WithMessage(v, m) => (v, Some(m)),
            RawOption::Bare(v) => (v, None),
        }
    }
}

// ------------------------------ Loading ---------------------------------- //

pub fn from_str(src: &str) -> Result<Schema, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let raw: RawSchema = serde_path_to_error::deserialize(de).map_err(syntax_error)?;
    build(raw, "$")
}

pub fn from_value(value: Value) -> Result<Schema, DocumentError> {
    let raw: RawSchema = serde_path_to_error::deserialize(value).map_err(syntax_error)?;
    build(raw, "$")
}

pub fn from_path(path: impl AsRef<Path>) -> Result<Schema, DocumentError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading schema document");
    from_str(&src)
}

fn syntax_error(err: serde_path_to_error::Error<serde_json::Error>) -> DocumentError {
    let path = err.path().to_string();
    DocumentError::Syntax { path, source: err.into_inner() }
}

fn invalid(at: &str, option: &str, reason: impl Into<String>) -> DocumentError {
    DocumentError::InvalidOption { at: at.to_string(), option: option.to_string(), reason: reason.into() }
}

fn build(raw: RawSchema, at: &str) -> Result<Schema, DocumentError> {
    let RawSchema {
        kind, optional, nullable, msg, default, values, shape, fields,
        min_length, max_length, min, max, pattern,
    } = raw;
    let options: Vec<(&'static str, RawOption)> = [
        ("minLength", min_length),
        ("maxLength", max_length),
        ("min", min),
        ("max", max),
        ("pattern", pattern),
    ]
    .into_iter()
    .filter_map(|(name, opt)| opt.map(|o| (name, o)))
    .collect();
    let first_option = options.first().map(|(name, _)| *name);

    if values.is_some() && kind != RawKind::Enum {
        return Err(invalid(at, "values", format!("not valid for `{}` schemas", kind.as_str())));
    }
    if shape.is_some() && kind != RawKind::Array {
        return Err(invalid(at, "shape", format!("not valid for `{}` schemas", kind.as_str())));
    }
    if fields.is_some() && kind != RawKind::Object {
        return Err(invalid(at, "fields", format!("not valid for `{}` schemas", kind.as_str())));
    }

    let schema = match kind {
        k @ (RawKind::String | RawKind::Date | RawKind::Email | RawKind::Url | RawKind::Uuid) => {
            let mut opts = StringOptions::new();
            opts.msg = msg;
            if let Some(d) = default {
                match d {
                    Value::String(s) => opts.default = Some(s),
                    _ => return Err(invalid(at, "default", "expected a string")),
                }
            }
            for (name, raw) in options {
                let (value, message) = raw.split();
                match (ConstraintKind::classify(name), name) {
                    (ConstraintKind::Length, "minLength") => {
                        opts.min_length = Some(length_limit(at, name, value, message)?)
                    }
                    (ConstraintKind::Length, _) => {
                        opts.max_length = Some(length_limit(at, name, value, message)?)
                    }
                    (ConstraintKind::Pattern, "pattern") if k == RawKind::String => {
                        opts.pattern = Some(pattern_limit(at, name, value, message)?)
                    }
                    _ => return Err(unsupported(at, name, k)),
                }
            }
            match k {
                RawKind::Date => helpers::date(opts),
                RawKind::Email => helpers::email(opts),
                RawKind::Url => helpers::url(opts),
                RawKind::Uuid => helpers::uuid(opts),
                _ => string(opts),
            }
        }
        RawKind::Number => {
            let mut opts = NumberOptions::new();
            opts.msg = msg;
            if let Some(d) = default {
                opts.default = Some(d.as_f64().ok_or_else(|| invalid(at, "default", "expected a number"))?);
            }
            for (name, raw) in options {
                let (value, message) = raw.split();
                match (ConstraintKind::classify(name), name) {
                    (ConstraintKind::Range, "min") => opts.min = Some(range_limit(at, name, value, message)?),
                    (ConstraintKind::Range, _) => opts.max = Some(range_limit(at, name, value, message)?),
                    _ => return Err(unsupported(at, name, kind)),
                }
            }
            number(opts)
        }
        RawKind::Boolean => {
            if let Some(name) = first_option {
                return Err(unsupported(at, name, kind));
            }
            let mut opts = BooleanOptions::new();
            opts.msg = msg;
            if let Some(d) = default {
                opts.default = Some(d.as_bool().ok_or_else(|| invalid(at, "default", "expected a boolean"))?);
            }
            boolean(opts)
        }
        RawKind::Enum => {
            if let Some(name) = first_option {
                return Err(unsupported(at, name, kind));
            }
            let values = values.ok_or_else(|| DocumentError::MissingProperty {
                at: at.to_string(),
                kind: "enum",
                property: "values",
            })?;
            if values.is_empty() {
                return Err(invalid(at, "values", "must not be empty"));
            }
            let mut opts = EnumOptions::new();
            opts.msg = msg;
            opts.default = default;
            one_of(values, opts)
        }
        RawKind::Array => {
            let shape = shape.ok_or_else(|| DocumentError::MissingProperty {
                at: at.to_string(),
                kind: "array",
                property: "shape",
            })?;
            let mut opts = ArrayOptions::new();
            opts.msg = msg;
            if let Some(d) = default {
                match d {
                    Value::Array(xs) => opts.default = Some(xs),
                    _ => return Err(invalid(at, "default", "expected an array")),
                }
            }
            for (name, raw) in options {
                let (value, message) = raw.split();
                match (ConstraintKind::classify(name), name) {
                    (ConstraintKind::Length, "minLength") => {
                        opts.min_length = Some(length_limit(at, name, value, message)?)
                    }
                    (ConstraintKind::Length, _) => {
                        opts.max_length = Some(length_limit(at, name, value, message)?)
                    }
                    _ => return Err(unsupported(at, name, kind)),
                }
            }
            array(build(*shape, &format!("{at}.shape"))?, opts)
        }
        RawKind::Object => {
            if let Some(name) = first_option {
                return Err(unsupported(at, name, kind));
            }
            if default.is_some() {
                return Err(unsupported(at, "default", kind));
            }
            let fields = fields.ok_or_else(|| DocumentError::MissingProperty {
                at: at.to_string(),
                kind: "object",
                property: "fields",
            })?;
            let mut built = Vec::with_capacity(fields.len());
            for (key, field) in fields {
                let child = build(field, &format!("{at}.fields.{key}"))?;
                built.push((key, child));
            }
            let schema = object(built);
            match msg {
                Some(m) => schema.with_message(m),
                None => schema,
            }
        }
        RawKind::Phantom => {
            if let Some(name) = first_option {
                return Err(unsupported(at, name, kind));
            }
            phantom()
        }
    };

    let schema = if optional { modifiers::optional(&schema) } else { schema };
    let schema = if nullable { modifiers::nullable(&schema) } else { schema };
    Ok(schema)
}

fn unsupported(at: &str, option: &str, kind: RawKind) -> DocumentError {
    invalid(at, option, format!("not supported by `{}` schemas", kind.as_str()))
}

fn length_limit(at: &str, name: &str, value: Value, message: Option<String>) -> Result<Limit<usize>, DocumentError> {
    let n = value
        .as_f64()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .ok_or_else(|| invalid(at, name, "expected a non-negative integer"))?;
    Ok(Limit { value: n as usize, message })
}

fn range_limit(at: &str, name: &str, value: Value, message: Option<String>) -> Result<Limit<f64>, DocumentError> {
    let n = value.as_f64().ok_or_else(|| invalid(at, name, "expected a number"))?;
    Ok(Limit { value: n, message })
}

fn pattern_limit(at: &str, name: &str, value: Value, message: Option<String>) -> Result<Limit<Regex>, DocumentError> {
    let src = value.as_str().ok_or_else(|| invalid(at, name, "expected a regular expression string"))?;
    let rx = Regex::new(src).map_err(|source| DocumentError::InvalidPattern { at: at.to_string(), source })?;
    Ok(Limit { value: rx, message })
}

// ------------------------------- Emission -------------------------------- //

/// Emit the document form of `schema`. Transforms are dropped.
pub fn to_value(schema: &Schema) -> Value {
    let mut o = Map::new();
    o.insert("type".into(), Value::from(schema.kind().as_str()));
    if schema.is_optional() {
        o.insert("optional".into(), Value::Bool(true));
    }
    if schema.is_nullable() {
        o.insert("nullable".into(), Value::Bool(true));
    }
    if let Some(m) = schema.message() {
        o.insert("msg".into(), Value::from(m));
    }
    if let Some(d) = schema.default_value() {
        o.insert("default".into(), d.clone());
    }

    match schema.node() {
        Node::Enum { values } => {
            o.insert("values".into(), Value::Array(values.clone()));
        }
        Node::Array { shape } => {
            o.insert("shape".into(), to_value(shape));
        }
        Node::Object { fields } => {
            let fields: Map<String, Value> = fields.iter().map(|(k, f)| (k.clone(), to_value(f))).collect();
            o.insert("fields".into(), Value::Object(fields));
        }
        Node::String | Node::Number | Node::Boolean | Node::Phantom => {}
    }

    for c in schema.constraints() {
        let value = match c.value() {
            ConstraintValue::Number(n) => json_num_pref_i64(*n),
            ConstraintValue::Pattern(rx) => Value::from(rx.as_str()),
        };
        let value = match c.message() {
            Some(m) => json!([value, m]),
            None => value,
        };
        o.insert(option_key(c.name()), value);
    }

    Value::Object(o)
}

// prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //
