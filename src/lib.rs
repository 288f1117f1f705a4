//! Declarative schemas for JSON values.
//!
//! A [`Schema`] is built once from the constructors in [`schema`] (or loaded
//! from a JSON [`document`]) and can then validate any number of inputs.
//! Validation walks the whole input and collects every [`Issue`]; only when
//! there are none does the transform pass run and produce the output value.
//!
//! ```
//! use serde_json::json;
//! use voxel::{object, string, number, NumberOptions, StringOptions};
//!
//! let user = object([
//!     ("name", string(StringOptions::new().min_length(1))),
//!     ("age", number(NumberOptions::new().min(0))),
//! ]);
//! let result = user.validate(json!({"name": "ada", "age": 36}));
//! assert!(result.success);
//! ```
pub mod document;
pub mod helpers;
pub mod issue;
pub mod modifiers;
pub mod schema;
pub mod typed;
pub mod validate;

pub use helpers::{date, email, merge, omit, pick, url, uuid};
pub use issue::{Expected, Issue, IssueCode, PathSegment};
pub use modifiers::{nullable, optional, partial, required};
pub use schema::{
    ArrayOptions, BooleanOptions, EnumOptions, Limit, NumberOptions, Schema, SchemaError,
    SchemaKind, StringOptions, array, boolean, number, object, one_of, phantom, string,
};
pub use typed::{ParseError, Typed};
pub use validate::{ValidationFailure, ValidationResult, validate};
