//! Derived string schemas and object-shape helpers.
//!
//! The derived schemas (`date`, `email`, `url`, `uuid`) are ordinary string
//! schemas with a fixed pattern; any pattern in the given options is replaced.
//! `pick`, `omit` and `merge` build fresh object schemas out of existing fields.
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema::{Limit, Schema, SchemaError, StringOptions, object, string};

static DATE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("date regex"));
static EMAIL_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static URL_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").expect("url regex"));
static UUID_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").expect("uuid regex")
});

// ---------------------------- String shapes ------------------------------ //

/// ISO-8601 timestamp string; the output is normalized to RFC 3339 UTC.
pub fn date(options: StringOptions) -> Schema {
    string(
        options
            .pattern(Limit::with_message(DATE_RX.clone(), "Invalid date"))
            .transform(normalize_timestamp),
    )
}

pub fn email(options: StringOptions) -> Schema {
    string(options.pattern(Limit::with_message(EMAIL_RX.clone(), "Invalid email")))
}

pub fn url(options: StringOptions) -> Schema {
    string(options.pattern(Limit::with_message(URL_RX.clone(), "Invalid url")))
}

pub fn uuid(options: StringOptions) -> Schema {
    string(options.pattern(Limit::with_message(UUID_RX.clone(), "Invalid uuid")))
}

/// Timestamps with an offset are converted to UTC; timestamps without one are
/// read as UTC. Anything chrono cannot make sense of is passed through as is.
fn normalize_timestamp(v: Value) -> Value {
    let Some(s) = v.as_str() else { return v };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Value::String(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    let naive = s
        .get(..19)
        .and_then(|head| NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok());
    match naive {
        Some(n) => Value::String(n.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => v,
    }
}

// ---------------------------- Object shapes ------------------------------ //

fn fields_of(schema: &Schema) -> Result<&IndexMap<String, Schema>, SchemaError> {
    schema.fields().ok_or(SchemaError::NotAnObject(schema.kind()))
}

/// Object schema with only the listed fields (those that exist), in listed order.
pub fn pick<I, K>(schema: &Schema, keys: I) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let fields = fields_of(schema)?;
    let picked: Vec<(String, Schema)> = keys
        .into_iter()
        .filter_map(|k| {
            let k = k.as_ref();
            fields.get(k).map(|f| (k.to_string(), f.clone()))
        })
        .collect();
    Ok(object(picked))
}

/// Object schema with the listed fields removed.
pub fn omit<I, K>(schema: &Schema, keys: I) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut fields = fields_of(schema)?.clone();
    for k in keys {
        fields.shift_remove(k.as_ref());
    }
    Ok(object(fields))
}

/// Union of both field sets. On conflict the second schema's field wins but
/// keeps the first schema's position.
pub fn merge(first: &Schema, second: &Schema) -> Result<Schema, SchemaError> {
    let mut fields = fields_of(first)?.clone();
    for (k, f) in fields_of(second)? {
        fields.insert(k.clone(), f.clone());
    }
    Ok(object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use crate::modifiers::optional;
    use crate::schema::*;
    use serde_json::json;

    fn keys(s: &Schema) -> Vec<String> {
        s.fields().unwrap().keys().cloned().collect()
    }

    fn user() -> Schema {
        object([
            ("id", uuid(Default::default())),
            ("email", email(Default::default())),
            ("site", optional(&url(Default::default()))),
        ])
    }

    #[test]
    fn email_pattern() {
        let s = email(Default::default());
        assert!(s.validate(json!("a@b.co")).success);
        let r = s.validate(json!("not-an-email"));
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].code, IssueCode::PatternMismatch);
        assert_eq!(r.issues[0].message, "Invalid email");
        assert!(r.issues[0].path.is_empty());
        assert_eq!(r.output, json!("not-an-email"));
    }

    #[test]
    fn url_and_uuid_patterns() {
        assert!(url(Default::default()).validate(json!("https://example.com")).success);
        assert!(!url(Default::default()).validate(json!("ftp://example.com")).success);
        let id = "123e4567-e89b-12d3-a456-426614174000";
        assert!(uuid(Default::default()).validate(json!(id)).success);
        assert!(!uuid(Default::default()).validate(json!(id.to_uppercase())).success);
    }

    #[test]
    fn helper_keeps_caller_constraints() {
        let s = email(StringOptions::new().max_length(5));
        let r = s.validate(json!("long@example.com"));
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].code, IssueCode::LengthConstraintExceeded);
    }

    #[test]
    fn date_normalizes_to_utc() {
        let s = date(Default::default());
        let r = s.validate(json!("2024-03-01T12:30:00+02:00"));
        assert_eq!(r.output, json!("2024-03-01T10:30:00.000Z"));
        let r = s.validate(json!("2024-03-01T12:30:00"));
        assert_eq!(r.output, json!("2024-03-01T12:30:00.000Z"));
        let r = s.validate(json!("01/03/2024"));
        assert_eq!(r.issues[0].message, "Invalid date");
    }

    #[test]
    fn pick_keeps_listed_order_and_skips_unknown() {
        let p = pick(&user(), ["email", "nope", "id"]).unwrap();
        assert_eq!(keys(&p), ["email", "id"]);
    }

    #[test]
    fn omit_removes_fields() {
        let o = omit(&user(), ["email"]).unwrap();
        assert_eq!(keys(&o), ["id", "site"]);
        assert!(o.fields().unwrap()["site"].is_optional());
    }

    #[test]
    fn merge_second_wins_in_first_position() {
        let a = object([("x", string(Default::default())), ("y", string(Default::default()))]);
        let b = object([("z", boolean(Default::default())), ("x", number(Default::default()))]);
        let m = merge(&a, &b).unwrap();
        assert_eq!(keys(&m), ["x", "y", "z"]);
        assert_eq!(m.fields().unwrap()["x"].kind(), SchemaKind::Number);
    }

    #[test]
    fn object_helpers_need_objects() {
        assert!(pick(&phantom(), ["a"]).is_err());
        assert!(merge(&user(), &string(Default::default())).is_err());
    }
}
