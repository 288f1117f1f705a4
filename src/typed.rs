//! Schemas carrying their output type.
//!
//! `Typed<T>` validates with the wrapped schema and then deserializes the
//! transformed output into `T`, reporting the JSON path of any mismatch.
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;
use crate::validate::ValidationFailure;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
    #[error("output does not fit the target type at {path}: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Typed<T> {
    schema: Schema,
    _out: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new(schema: Schema) -> Self {
        Self { schema, _out: PhantomData }
    }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn into_schema(self) -> Schema { self.schema }
}

impl<T: DeserializeOwned> Typed<T> {
    pub fn parse(&self, input: Value) -> Result<T, ParseError> {
        let output = self.schema.validate(input).into_result()?;
        from_value_with_path(output)
    }

    pub fn parse_str(&self, src: &str) -> Result<T, ParseError> {
        let input = serde_json::from_str(src).map_err(|source| ParseError::Deserialize {
            path: ".".to_string(),
            source,
        })?;
        self.parse(input)
    }
}

/// Deserialize with JSON-path context in the error.
fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, ParseError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        ParseError::Deserialize { path, source: err.into_inner() }
    })
}
