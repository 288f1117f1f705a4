//! CLI: check JSON/NDJSON documents against a schema document, or describe one.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use voxel::{Issue, Schema};

use crate::prefilter::Prefilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a declarative schema document
#[derive(Parser, Debug)]
#[command(name = "voxel", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document and report the issues found
    Check(CheckOut),
    /// load a schema document and print its normalized form
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is checked on its own
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// report file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document, labelled by where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

#[derive(Debug, Serialize)]
struct DocumentReport {
    source: String,
    success: bool,
    issues: Vec<Issue>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let prefilter = self
            .jq_expr
            .as_deref()
            .map(Prefilter::new)
            .transpose()
            .context("invalid --jq-expr filter")?;
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;

        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            for (source, value) in self.split(&source_path_str, &source)? {
                let Some(value) = self.select(&source, value)? else {
                    continue;
                };
                match prefilter.as_ref() {
                    None => out.push(Document { source, value }),
                    Some(prefilter) => {
                        let results = prefilter.apply(&value).with_context(|| {
                            format!("failed to apply jq expression to {source}")
                        })?;
                        for (ix, value) in results.into_iter().enumerate() {
                            out.push(Document { source: format!("{source}[{ix}]"), value });
                        }
                    }
                }
            }
        }
        tracing::info!(documents = out.len(), "inputs loaded");
        Ok(out)
    }

    /// Whole-file JSON, or one document per non-blank NDJSON line.
    fn split(&self, source_path: &str, source: &str) -> Result<Vec<(String, Value)>> {
        if !self.ndjson {
            let value = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({source_path})"))?;
            return Ok(vec![(source_path.to_string(), value)]);
        }
        let mut out = Vec::new();
        for (ix, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let label = format!("{source_path}:{}", ix + 1);
            let value = serde_json::from_str::<Value>(line)
                .with_context(|| format!("failed to parse NDJSON line ({label})"))?;
            out.push((label, value));
        }
        Ok(out)
    }

    fn select(&self, source: &str, value: Value) -> Result<Option<Value>> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(Some(value));
        };
        if !pointer.is_empty() && !pointer.starts_with('/') {
            bail!("invalid JSON pointer `{pointer}`: must be empty or start with '/'");
        }
        match value.pointer(pointer) {
            Some(node) => Ok(Some(node.clone())),
            None => {
                tracing::warn!(%source, %pointer, "JSON pointer selects nothing; skipping");
                Ok(None)
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns whether every checked document was valid.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(true);
                }

                let schema = load_schema(&target.schema)?;
                let documents = target.input_settings.load()?;
                let reports = check_all(&schema, documents);

                let failed = reports.iter().filter(|r| !r.success).count();
                if failed > 0 {
                    tracing::warn!(failed, total = reports.len(), "documents failed validation");
                } else {
                    tracing::info!(total = reports.len(), "all documents valid");
                }

                let report_src = match target.format {
                    ReportFormat::Text => render_text(&reports, target.out.is_none()),
                    ReportFormat::Json => serde_json::to_string_pretty(&reports)?,
                };
                emit(target.out.as_deref(), &report_src)?;
                Ok(failed == 0)
            }
            Command::Describe(target) => {
                let schema = load_schema(&target.schema)?;
                let document = voxel::document::to_value(&schema);
                let document_src = serde_json::to_string_pretty(&document)?;
                emit(target.out.as_deref(), &document_src)?;
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_schema(path: &Path) -> Result<Schema> {
    voxel::document::from_path(path)
        .with_context(|| format!("failed to load schema document ({})", path.display()))
}

/// Validates in parallel against the one shared schema; report order follows input order.
fn check_all(schema: &Schema, documents: Vec<Document>) -> Vec<DocumentReport> {
    documents
        .into_par_iter()
        .map(|doc| {
            let result = schema.validate(doc.value);
            DocumentReport { source: doc.source, success: result.success, issues: result.issues }
        })
        .collect()
}

fn render_text(reports: &[DocumentReport], color: bool) -> String {
    colored::control::set_override(color);
    let mut out = String::new();
    for report in reports {
        if report.success {
            out.push_str(&format!("{} {}\n", "ok".green().bold(), report.source));
            continue;
        }
        out.push_str(&format!(
            "{} {} ({} issue{})\n",
            "invalid".red().bold(),
            report.source,
            report.issues.len(),
            if report.issues.len() == 1 { "" } else { "s" },
        ));
        for issue in &report.issues {
            let at = if issue.path.is_empty() { "(root)".to_string() } else { issue.pointer() };
            out.push_str(&format!(
                "    {}: {} {}\n",
                at.yellow(),
                issue.message,
                format!("[{}]", issue.code).dimmed(),
            ));
        }
    }
    let failed = reports.iter().filter(|r| !r.success).count();
    let summary = format!("{} document(s) checked, {} invalid", reports.len(), failed);
    if failed > 0 {
        out.push_str(&format!("{}\n", summary.red()));
    } else {
        out.push_str(&format!("{}\n", summary.green()));
    }
    colored::control::unset_override();
    out
}

fn emit(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{}", src.trim_end()),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry.map_err(|e| anyhow!("unreadable glob match: {e}"))?);
            }
            if !matched_any {
                // explicit glob that matched nothing
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(input: Vec<String>) -> InputSettings {
        InputSettings { ndjson: false, json_pointer: None, jq_expr: None, input }
    }

    fn write(dir: &Path, name: &str, src: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, src).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn globs_must_match_something() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "b.json", "{}");
        let pattern = format!("{}/*.json", dir.path().display());
        let mut found = resolve_file_path_patterns([&pattern]).unwrap();
        found.sort();
        assert_eq!(found.len(), 2);

        let nothing = format!("{}/*.ndjson", dir.path().display());
        assert!(resolve_file_path_patterns([&nothing]).is_err());
    }

    #[test]
    fn ndjson_lines_become_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rows.ndjson", "{\"a\":1}\n\n{\"a\":2}\n");
        let mut s = settings(vec![path.clone()]);
        s.ndjson = true;
        let docs = s.load().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].source, format!("{path}:3"));
        assert_eq!(docs[1].value, json!({"a": 2}));
    }

    #[test]
    fn pointer_and_jq_select_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.json", r#"{"data": {"items": [1, 2, 3]}}"#);

        let mut s = settings(vec![path.clone()]);
        s.json_pointer = Some("/data/items/1".into());
        let docs = s.load().unwrap();
        assert_eq!(docs[0].value, json!(2));

        s.json_pointer = Some("/data/missing".into());
        assert!(s.load().unwrap().is_empty());

        let mut s = settings(vec![path]);
        s.jq_expr = Some(".data.items[]".into());
        let docs = s.load().unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs[2].source.ends_with("[2]"));
    }

    #[test]
    fn reports_follow_input_order() {
        let schema = voxel::object([("id", voxel::number(Default::default()))]);
        let documents = (0..16)
            .map(|i| Document {
                source: format!("doc{i}"),
                value: if i % 5 == 0 { json!({"id": "x"}) } else { json!({"id": i}) },
            })
            .collect();
        let reports = check_all(&schema, documents);
        let sources: Vec<_> = reports.iter().map(|r| r.source.as_str()).collect();
        let expected: Vec<String> = (0..16).map(|i| format!("doc{i}")).collect();
        assert_eq!(sources, expected);
        assert_eq!(reports.iter().filter(|r| !r.success).count(), 4);
    }

    #[test]
    fn text_report_lists_issues() {
        let reports = vec![
            DocumentReport { source: "a.json".into(), success: true, issues: vec![] },
            DocumentReport {
                source: "b.json".into(),
                success: false,
                issues: vec![Issue::new(
                    voxel::IssueCode::InvalidType,
                    "Expected number but received string",
                    vec!["id".into()],
                )],
            },
        ];
        let text = render_text(&reports, false);
        assert_eq!(
            text,
            "ok a.json\n\
             invalid b.json (1 issue)\n    \
             /id: Expected number but received string [invalid_type]\n\
             2 document(s) checked, 1 invalid\n"
        );
    }
}
