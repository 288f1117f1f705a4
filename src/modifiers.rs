//! Copy-and-amend modifiers. None of these touch the schema they are given.
use crate::schema::{Node, Schema, SchemaError};

/// Copy with `optional` set: absence of the key in an object is accepted.
pub fn optional(schema: &Schema) -> Schema {
    Schema { optional: true, ..schema.clone() }
}

/// Copy with `nullable` set: `null` is accepted in place of the value.
pub fn nullable(schema: &Schema) -> Schema {
    Schema { nullable: true, ..schema.clone() }
}

/// Object copy with every field optional.
pub fn partial(schema: &Schema) -> Result<Schema, SchemaError> {
    with_field_optionality(schema, true)
}

/// Object copy with every field required.
pub fn required(schema: &Schema) -> Result<Schema, SchemaError> {
    with_field_optionality(schema, false)
}

fn with_field_optionality(schema: &Schema, optional: bool) -> Result<Schema, SchemaError> {
    let fields = schema.fields().ok_or(SchemaError::NotAnObject(schema.kind()))?;
    let fields = fields
        .iter()
        .map(|(k, f)| (k.clone(), Schema { optional, ..f.clone() }))
        .collect();
    Ok(Schema { node: Node::Object { fields }, ..schema.clone() })
}
