//! Declarative schema model.
//!
//! A [`Schema`] is an immutable description of one expected data shape. The
//! shape itself is the closed tagged union [`Node`]; the fields shared by every
//! kind (optionality, nullability, override message, default, transform,
//! constraints) live on [`Schema`].
//!
//! Schemas are built only through the constructor functions in this module
//! ([`string`], [`number`], [`boolean`], [`one_of`], [`array`], [`object`],
//! [`phantom`]). Each takes a variant-specific options value; constraint
//! options are split off and turned into [`Constraint`]s by name.
pub mod constraint;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub use constraint::{Constraint, ConstraintKind, ConstraintValue, Limit};

// ------------------------------ Transform -------------------------------- //

/// Output mapping applied to an already validated value.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

// ------------------------------- Model ----------------------------------- //

/// Discriminant of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Enum,
    Array,
    Object,
    Phantom,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
            SchemaKind::Phantom => "phantom",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a schema node.
#[derive(Debug, Clone)]
pub enum Node {
    String,
    Number,
    Boolean,
    Enum { values: Vec<Value> },
    /// Homogeneous list; every element is checked against `shape`.
    Array { shape: Box<Schema> },
    /// Strict record; `fields` are the only keys an input may carry.
    Object { fields: IndexMap<String, Schema> },
    /// Accepts anything.
    Phantom,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) node: Node,
    pub(crate) optional: bool,
    pub(crate) nullable: bool,
    pub(crate) message: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) transform: Option<Transform>,
    pub(crate) constraints: Vec<Constraint>,
}

impl Schema {
    fn from_node(node: Node) -> Self {
        Self {
            node,
            optional: false,
            nullable: false,
            message: None,
            default: None,
            transform: None,
            constraints: Vec::new(),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        match &self.node {
            Node::String => SchemaKind::String,
            Node::Number => SchemaKind::Number,
            Node::Boolean => SchemaKind::Boolean,
            Node::Enum { .. } => SchemaKind::Enum,
            Node::Array { .. } => SchemaKind::Array,
            Node::Object { .. } => SchemaKind::Object,
            Node::Phantom => SchemaKind::Phantom,
        }
    }

    pub fn node(&self) -> &Node { &self.node }
    pub fn is_optional(&self) -> bool { self.optional }
    pub fn is_nullable(&self) -> bool { self.nullable }
    pub fn message(&self) -> Option<&str> { self.message.as_deref() }
    pub fn default_value(&self) -> Option<&Value> { self.default.as_ref() }
    pub fn transform(&self) -> Option<&Transform> { self.transform.as_ref() }
    pub fn constraints(&self) -> &[Constraint] { &self.constraints }

    /// Declared fields, for object schemas.
    pub fn fields(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.node {
            Node::Object { fields } => Some(fields),
            _ => None,
        }
    }

    /// Copy of this schema with an override message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Validate `input` against this schema. See [`crate::validate::validate`].
    pub fn validate(&self, input: Value) -> crate::validate::ValidationResult {
        crate::validate::validate(self, input)
    }

    /// Thread an output type through this schema.
    pub fn typed<T>(self) -> crate::typed::Typed<T> {
        crate::typed::Typed::new(self)
    }
}

/// Misuse of a schema helper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected an object schema, got {0}")]
    NotAnObject(SchemaKind),
}

// ------------------------------ Options ---------------------------------- //

#[derive(Debug, Clone, Default)]
pub struct StringOptions {
    pub msg: Option<String>,
    pub default: Option<String>,
    pub transform: Option<Transform>,
    pub min_length: Option<Limit<usize>>,
    pub max_length: Option<Limit<usize>>,
    pub pattern: Option<Limit<Regex>>,
}

impl StringOptions {
    pub fn new() -> Self { Self::default() }

    pub fn msg(mut self, msg: impl Into<String>) -> Self { self.msg = Some(msg.into()); self }
    pub fn default_value(mut self, d: impl Into<String>) -> Self { self.default = Some(d.into()); self }
    pub fn min_length(mut self, l: impl Into<Limit<usize>>) -> Self { self.min_length = Some(l.into()); self }
    pub fn max_length(mut self, l: impl Into<Limit<usize>>) -> Self { self.max_length = Some(l.into()); self }
    pub fn pattern(mut self, p: impl Into<Limit<Regex>>) -> Self { self.pattern = Some(p.into()); self }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberOptions {
    pub msg: Option<String>,
    pub default: Option<f64>,
    pub transform: Option<Transform>,
    pub min: Option<Limit<f64>>,
    pub max: Option<Limit<f64>>,
}

impl NumberOptions {
    pub fn new() -> Self { Self::default() }

    pub fn msg(mut self, msg: impl Into<String>) -> Self { self.msg = Some(msg.into()); self }
    pub fn default_value(mut self, d: f64) -> Self { self.default = Some(d); self }
    pub fn min(mut self, l: impl Into<Limit<f64>>) -> Self { self.min = Some(l.into()); self }
    pub fn max(mut self, l: impl Into<Limit<f64>>) -> Self { self.max = Some(l.into()); self }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanOptions {
    pub msg: Option<String>,
    pub default: Option<bool>,
    pub transform: Option<Transform>,
}

impl BooleanOptions {
    pub fn new() -> Self { Self::default() }

    pub fn msg(mut self, msg: impl Into<String>) -> Self { self.msg = Some(msg.into()); self }
    pub fn default_value(mut self, d: bool) -> Self { self.default = Some(d); self }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumOptions {
    pub msg: Option<String>,
    pub default: Option<Value>,
    pub transform: Option<Transform>,
}

impl EnumOptions {
    pub fn new() -> Self { Self::default() }

    pub fn msg(mut self, msg: impl Into<String>) -> Self { self.msg = Some(msg.into()); self }
    pub fn default_value(mut self, d: impl Into<Value>) -> Self { self.default = Some(d.into()); self }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArrayOptions {
    pub msg: Option<String>,
    pub default: Option<Vec<Value>>,
    /// Applied to each element after the element schema's own transform.
    pub transform: Option<Transform>,
    pub min_length: Option<Limit<usize>>,
    pub max_length: Option<Limit<usize>>,
}

impl ArrayOptions {
    pub fn new() -> Self { Self::default() }

    pub fn msg(mut self, msg: impl Into<String>) -> Self { self.msg = Some(msg.into()); self }
    pub fn default_value(mut self, d: Vec<Value>) -> Self { self.default = Some(d); self }
    pub fn min_length(mut self, l: impl Into<Limit<usize>>) -> Self { self.min_length = Some(l.into()); self }
    pub fn max_length(mut self, l: impl Into<Limit<usize>>) -> Self { self.max_length = Some(l.into()); self }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }
}

// ---------------------------- Constructors ------------------------------- //

fn length_constraint(option: &str, limit: Limit<usize>) -> Constraint {
    Constraint::from_option(option, ConstraintValue::Number(limit.value as f64), limit.message)
}

fn range_constraint(option: &str, limit: Limit<f64>) -> Constraint {
    Constraint::from_option(option, ConstraintValue::Number(limit.value), limit.message)
}

fn pattern_constraint(option: &str, limit: Limit<Regex>) -> Constraint {
    Constraint::from_option(option, ConstraintValue::Pattern(limit.value), limit.message)
}

pub fn string(options: StringOptions) -> Schema {
    let StringOptions { msg, default, transform, min_length, max_length, pattern } = options;
    let mut constraints = Vec::new();
    constraints.extend(min_length.map(|l| length_constraint("minLength", l)));
    constraints.extend(max_length.map(|l| length_constraint("maxLength", l)));
    constraints.extend(pattern.map(|p| pattern_constraint("pattern", p)));
    Schema {
        message: msg,
        default: default.map(Value::String),
        transform,
        constraints,
        ..Schema::from_node(Node::String)
    }
}

pub fn number(options: NumberOptions) -> Schema {
    let NumberOptions { msg, default, transform, min, max } = options;
    let mut constraints = Vec::new();
    constraints.extend(min.map(|l| range_constraint("min", l)));
    constraints.extend(max.map(|l| range_constraint("max", l)));
    Schema {
        message: msg,
        default: default.map(Value::from),
        transform,
        constraints,
        ..Schema::from_node(Node::Number)
    }
}

pub fn boolean(options: BooleanOptions) -> Schema {
    let BooleanOptions { msg, default, transform } = options;
    Schema {
        message: msg,
        default: default.map(Value::Bool),
        transform,
        ..Schema::from_node(Node::Boolean)
    }
}

/// Enumeration of allowed literal values.
pub fn one_of<I, V>(values: I, options: EnumOptions) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let EnumOptions { msg, default, transform } = options;
    let values = values.into_iter().map(Into::into).collect();
    Schema {
        message: msg,
        default,
        transform,
        ..Schema::from_node(Node::Enum { values })
    }
}

pub fn array(shape: Schema, options: ArrayOptions) -> Schema {
    let ArrayOptions { msg, default, transform, min_length, max_length } = options;
    let mut constraints = Vec::new();
    constraints.extend(min_length.map(|l| length_constraint("minLength", l)));
    constraints.extend(max_length.map(|l| length_constraint("maxLength", l)));
    Schema {
        message: msg,
        default: default.map(Value::Array),
        transform,
        constraints,
        ..Schema::from_node(Node::Array { shape: Box::new(shape) })
    }
}

pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let fields = fields.into_iter().map(|(k, s)| (k.into(), s)).collect();
    Schema::from_node(Node::Object { fields })
}

pub fn phantom() -> Schema {
    Schema::from_node(Node::Phantom)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_options_become_constraints() {
        let s = string(
            StringOptions::new()
                .min_length(2)
                .max_length((5, "at most five"))
                .pattern(Regex::new("^a").unwrap()),
        );
        assert_eq!(s.kind(), SchemaKind::String);
        let names: Vec<_> = s.constraints().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["min_length", "max_length", "pattern"]);
        let kinds: Vec<_> = s.constraints().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, [ConstraintKind::Length, ConstraintKind::Length, ConstraintKind::Pattern]);
        assert_eq!(s.constraints()[1].message(), Some("at most five"));
        assert!(!s.is_optional());
    }

    #[test]
    fn non_constraint_options_stay_on_the_node() {
        let n = number(NumberOptions::new().msg("need a number").default_value(3.0).min(0));
        assert_eq!(n.message(), Some("need a number"));
        assert_eq!(n.default_value(), Some(&json!(3.0)));
        assert_eq!(n.constraints().len(), 1);
        assert_eq!(n.constraints()[0].kind(), ConstraintKind::Range);
    }

    #[test]
    fn contradictory_constraints_are_accepted() {
        let n = number(NumberOptions::new().min(10).max(1));
        assert_eq!(n.constraints().len(), 2);
    }

    #[test]
    fn object_keeps_field_order() {
        let o = object([
            ("zeta", string(Default::default())),
            ("alpha", number(Default::default())),
            ("mid", boolean(Default::default())),
        ]);
        let keys: Vec<_> = o.fields().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn enum_and_phantom_have_no_constraints() {
        let e = one_of(["a", "b"], EnumOptions::new());
        assert!(matches!(e.node(), Node::Enum { values } if values.len() == 2));
        assert!(e.constraints().is_empty());
        assert_eq!(phantom().kind(), SchemaKind::Phantom);
    }

    #[test]
    fn with_message_returns_amended_copy() {
        let base = object([("a", string(Default::default()))]);
        let amended = base.clone().with_message("bad object");
        assert_eq!(base.message(), None);
        assert_eq!(amended.message(), Some("bad object"));
    }
}
