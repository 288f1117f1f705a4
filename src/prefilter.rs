//! jq pre-processing of input documents (via jaq).
//!
//! A filter may yield zero, one or many values per input document; each one is
//! validated as a document of its own.
use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Prefilter {
    code: String,
}

impl Prefilter {
    /// Parse and compile `code` so a bad filter is reported before any input is read.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        compile_and_run(&code, None)?;
        Ok(Self { code })
    }

    pub fn apply(&self, input: &Value) -> Result<Vec<Value>> {
        compile_and_run(&self.code, Some(input))
    }
}

fn compile_and_run(code: &str, input: Option<&Value>) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let Some(input) = input else {
        return Ok(Vec::new());
    };

    let inputs = RcIter::new(core::iter::empty());
    let mut it = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = it.next() {
        let v = item.map_err(|e| anyhow!("jq runtime error: {e:?}"))?;
        // Val prints as JSON text
        let v = serde_json::from_str::<Value>(&v.to_string())?;
        out.push(v);
    }
    Ok(out)
}

fn format_parse_errors(
    errs: Vec<(load::File<&str, ()>, load::Error<&str>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("jq parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("jq: undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_and_fans_out() {
        let f = Prefilter::new(".items[]").unwrap();
        let out = f.apply(&json!({"items": [{"id": 1}, {"id": 2}]})).unwrap();
        assert_eq!(out, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn bad_filters_fail_up_front() {
        assert!(Prefilter::new(".items[").is_err());
        assert!(Prefilter::new("no_such_function").is_err());
    }
}
