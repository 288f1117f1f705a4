use regex::Regex;

/// Constraint family, decided from the option name that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Length,
    Range,
    Pattern,
}

impl ConstraintKind {
    /// Fixed classification rule: length options, range options, and
    /// everything else is a pattern.
    pub fn classify(option: &str) -> Self {
        match option {
            "minLength" | "maxLength" => ConstraintKind::Length,
            "min" | "max" => ConstraintKind::Range,
            _ => ConstraintKind::Pattern,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Length => "length",
            ConstraintKind::Range => "range",
            ConstraintKind::Pattern => "pattern",
        }
    }
}

/// camelCase option name → snake_case constraint name (`minLength` → `min_length`).
pub fn format_key(option: &str) -> String {
    let mut out = String::with_capacity(option.len() + 4);
    for c in option.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`format_key`], used when emitting schema documents.
pub fn option_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub enum ConstraintValue {
    Number(f64),
    Pattern(Regex),
}

impl ConstraintValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConstraintValue::Number(n) => Some(*n),
            ConstraintValue::Pattern(_) => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            ConstraintValue::Pattern(rx) => Some(rx),
            ConstraintValue::Number(_) => None,
        }
    }
}

/// A named secondary rule attached to a schema node.
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    name: String,
    value: ConstraintValue,
    message: Option<String>,
}

impl Constraint {
    /// Build a constraint from a construction option (`minLength`, `max`, `pattern`, ...).
    pub fn from_option(option: &str, value: ConstraintValue, message: Option<String>) -> Self {
        Self {
            kind: ConstraintKind::classify(option),
            name: format_key(option),
            value,
            message,
        }
    }

    pub fn kind(&self) -> ConstraintKind { self.kind }
    pub fn name(&self) -> &str { &self.name }
    pub fn value(&self) -> &ConstraintValue { &self.value }
    pub fn message(&self) -> Option<&str> { self.message.as_deref() }
}

// ------------------------------- Limits ---------------------------------- //

/// A constraint option as supplied by a caller: a bare limit, or a
/// `(limit, message)` pair carrying an override message.
#[derive(Debug, Clone)]
pub struct Limit<T> {
    pub value: T,
    pub message: Option<String>,
}

impl<T> Limit<T> {
    pub fn new(value: T) -> Self {
        Self { value, message: None }
    }

    pub fn with_message(value: T, message: impl Into<String>) -> Self {
        Self { value, message: Some(message.into()) }
    }
}

macro_rules! limit_from {
    ($target:ty, $src:ty, |$v:ident| $conv:expr) => {
        impl From<$src> for Limit<$target> {
            fn from($v: $src) -> Self { Limit::new($conv) }
        }
        impl<'a> From<($src, &'a str)> for Limit<$target> {
            fn from(($v, msg): ($src, &'a str)) -> Self { Limit::with_message($conv, msg) }
        }
        impl From<($src, String)> for Limit<$target> {
            fn from(($v, msg): ($src, String)) -> Self { Limit::with_message($conv, msg) }
        }
    };
}

limit_from!(usize, usize, |v| v);
limit_from!(usize, i32, |v| usize::try_from(v).unwrap_or(0));
limit_from!(f64, f64, |v| v);
limit_from!(f64, i32, |v| f64::from(v));
limit_from!(f64, u32, |v| f64::from(v));
limit_from!(f64, i64, |v| v as f64);
limit_from!(Regex, Regex, |v| v);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_option_name() {
        assert_eq!(ConstraintKind::classify("minLength"), ConstraintKind::Length);
        assert_eq!(ConstraintKind::classify("maxLength"), ConstraintKind::Length);
        assert_eq!(ConstraintKind::classify("min"), ConstraintKind::Range);
        assert_eq!(ConstraintKind::classify("max"), ConstraintKind::Range);
        assert_eq!(ConstraintKind::classify("pattern"), ConstraintKind::Pattern);
        assert_eq!(ConstraintKind::classify("anythingElse"), ConstraintKind::Pattern);
    }

    #[test]
    fn key_formatting_round_trips() {
        assert_eq!(format_key("minLength"), "min_length");
        assert_eq!(format_key("max"), "max");
        assert_eq!(option_key("max_length"), "maxLength");
        assert_eq!(option_key(&format_key("pattern")), "pattern");
    }

    #[test]
    fn pair_form_attaches_message() {
        let bare: Limit<usize> = 3.into();
        assert!(bare.message.is_none());
        let pair: Limit<f64> = (10, "too big").into();
        assert_eq!(pair.value, 10.0);
        assert_eq!(pair.message.as_deref(), Some("too big"));
    }

    #[test]
    fn from_option_keeps_message() {
        let c = Constraint::from_option("minLength", ConstraintValue::Number(2.0), Some("short".into()));
        assert_eq!(c.kind(), ConstraintKind::Length);
        assert_eq!(c.name(), "min_length");
        assert_eq!(c.value().as_number(), Some(2.0));
        assert_eq!(c.message(), Some("short"));
    }
}
