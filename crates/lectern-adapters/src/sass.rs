//! Sass adapter: `///` doc comments on variables, mixins, functions and
//! placeholders.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::annotations::{parse_param, parse_typed, DocComment};
use crate::files::{display_path, find_sources};
use crate::traits::{AdapterError, AdapterRef, CategorizedDoclets, DocAdapter, RawDoclets};

const EXTENSIONS: &[&str] = &["scss", "sass"];

/// Kinds that are always present in categorized output, even when empty.
const KINDS: &[&str] = &["variable", "mixin", "function"];

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([\w-]+)\s*:\s*(.*?)\s*;?\s*$").unwrap());
static MIXIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@mixin\s+([\w-]+)").unwrap());
static FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@function\s+([\w-]+)").unwrap());
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^%([\w-]+)").unwrap());

/// Extracts Sass documentation.
#[derive(Debug, Clone)]
pub struct SassAdapter {
    base_dir: PathBuf,
}

impl SassAdapter {
    /// Create an adapter resolving patterns against `base_dir`.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl DocAdapter for SassAdapter {
    fn name(&self) -> &'static str {
        "sass"
    }

    async fn parse(&self, reference: &AdapterRef) -> Result<RawDoclets, AdapterError> {
        let patterns = reference.patterns()?;
        let files = find_sources(&self.base_dir, patterns, EXTENSIONS).await?;

        let mut doclets = Vec::new();
        for path in files {
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| AdapterError::Io {
                    path: path.clone(),
                    source,
                })?;
            doclets.extend(extract_doclets(&source, &display_path(&path, &self.base_dir)));
        }

        Ok(doclets)
    }

    fn categorize(&self, doclets: RawDoclets) -> CategorizedDoclets {
        let mut categorized: CategorizedDoclets = KINDS
            .iter()
            .map(|kind| (kind.to_string(), Vec::new()))
            .collect();

        for doclet in doclets {
            let kind = doclet
                .pointer("/context/type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            categorized.entry(kind).or_default().push(doclet);
        }

        categorized
    }
}

/// Extract doclets from one Sass source file.
///
/// A run of `///` lines documents the item on the next code line. Blank lines
/// may separate the two; any other line discards the run. `////` poster
/// comments are ignored.
pub fn extract_doclets(source: &str, file: &str) -> RawDoclets {
    let mut doclets = Vec::new();
    let mut comment: Vec<&str> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with("////") {
            comment.clear();
            continue;
        }

        if let Some(text) = trimmed.strip_prefix("///") {
            comment.push(text.strip_prefix(' ').unwrap_or(text));
            continue;
        }

        if trimmed.is_empty() || comment.is_empty() {
            continue;
        }

        if let Some(context) = item_context(trimmed, index + 1) {
            let doc = DocComment::parse(comment.iter().copied());
            doclets.push(build_doclet(doc, context, file));
        }
        comment.clear();
    }

    doclets
}

fn item_context(line: &str, line_number: usize) -> Option<Value> {
    let mut context = Map::new();

    if let Some(caps) = VARIABLE.captures(line) {
        context.insert("type".to_string(), json!("variable"));
        context.insert("name".to_string(), json!(&caps[1]));
        context.insert("value".to_string(), json!(&caps[2]));
    } else if let Some(caps) = MIXIN.captures(line) {
        context.insert("type".to_string(), json!("mixin"));
        context.insert("name".to_string(), json!(&caps[1]));
    } else if let Some(caps) = FUNCTION.captures(line) {
        context.insert("type".to_string(), json!("function"));
        context.insert("name".to_string(), json!(&caps[1]));
    } else if let Some(caps) = PLACEHOLDER.captures(line) {
        context.insert("type".to_string(), json!("placeholder"));
        context.insert("name".to_string(), json!(&caps[1]));
    } else {
        return None;
    }

    context.insert("line".to_string(), json!({ "start": line_number }));
    Some(Value::Object(context))
}

fn build_doclet(doc: DocComment, context: Value, file: &str) -> Value {
    let mut doclet = doc.extra_fields(&["param", "parameter", "arg", "return", "returns"]);

    doclet.insert("description".to_string(), json!(doc.description));
    doclet.insert("context".to_string(), context);
    doclet.insert("file".to_string(), json!({ "path": file }));

    let params: Vec<Value> = doc
        .all(&["param", "parameter", "arg"])
        .map(parse_param)
        .collect();
    if !params.is_empty() {
        doclet.insert("parameter".to_string(), Value::Array(params));
    }

    if let Some(ret) = doc.first("return").or_else(|| doc.first("returns")) {
        doclet.insert("return".to_string(), parse_typed(ret));
    }

    Value::Object(doclet)
}
