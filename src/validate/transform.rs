use serde_json::{Map, Value};

use crate::schema::{Node, Schema};

/// Second pass: rebuild `input` through each node's transform.
///
/// Only called once the whole tree validated cleanly, so shapes are trusted.
pub(super) fn apply(schema: &Schema, input: Value) -> Value {
    if schema.nullable && input.is_null() {
        return Value::Null;
    }

    match &schema.node {
        Node::Phantom => input,
        Node::String | Node::Number | Node::Boolean | Node::Enum { .. } => match &schema.transform {
            Some(t) => t.apply(input),
            None => input,
        },
        Node::Array { shape } => match input {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| {
                        let item = apply(shape, item);
                        match &schema.transform {
                            Some(t) => t.apply(item),
                            None => item,
                        }
                    })
                    .collect(),
            ),
            other => other,
        },
        Node::Object { fields } => match input {
            Value::Object(mut map) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, field) in fields {
                    match map.remove(key) {
                        Some(value) => {
                            out.insert(key.clone(), apply(field, value));
                        }
                        None => {
                            if let Some(default) = &field.default {
                                out.insert(key.clone(), apply(field, default.clone()));
                            }
                        }
                    }
                }
                Value::Object(out)
            }
            other => other,
        },
    }
}
