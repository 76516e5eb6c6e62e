//! Script adapter: `/** */` doc comments on functions, classes, constants and
//! class members in JavaScript and TypeScript sources.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::annotations::{parse_param, parse_typed, DocComment};
use crate::files::{display_path, find_sources};
use crate::traits::{AdapterError, AdapterRef, CategorizedDoclets, DocAdapter, RawDoclets};

const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx"];

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([\w$]+)").unwrap()
});
static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([\w$]+)").unwrap()
});
static ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+([\w$]+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[\w$]+\s*=>)")
        .unwrap()
});
static CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+([\w$]+)").unwrap()
});
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:static|async|get|set|public|private|protected|readonly)\s+)*([\w$]+)\s*[(=:]")
        .unwrap()
});

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "catch", "function", "typeof", "await",
];

/// Extracts JSDoc-style documentation.
#[derive(Debug, Clone)]
pub struct ScriptAdapter {
    base_dir: PathBuf,
}

impl ScriptAdapter {
    /// Create an adapter resolving patterns against `base_dir`.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl DocAdapter for ScriptAdapter {
    fn name(&self) -> &'static str {
        "js"
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
            let file = display_path(&path, &self.base_dir);
            doclets.extend(extract_doclets(&source, &file).map_err(|(line, message)| {
                AdapterError::Parse {
                    path: path.clone(),
                    line,
                    message,
                }
            })?);
        }

        Ok(doclets)
    }

    fn categorize(&self, doclets: RawDoclets) -> CategorizedDoclets {
        let mut categorized = CategorizedDoclets::new();

        for doclet in doclets {
            let kind = doclet
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("member")
                .to_string();
            categorized.entry(kind).or_default().push(doclet);
        }

        categorized
    }
}

/// Extract doclets from one script source.
///
/// Each `/** ... */` block documents the first code line after it. Blocks
/// naming their subject with `@name` stand alone; blocks with neither a
/// recognizable subject nor `@name` are skipped. An unterminated block is an
/// error carrying the line it starts on.
pub fn extract_doclets(source: &str, file: &str) -> Result<RawDoclets, (usize, String)> {
    let lines: Vec<&str> = source.lines().collect();
    let mut doclets = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let trimmed = lines[index].trim_start();
        if !trimmed.starts_with("/**")
            || trimmed.starts_with("/***")
            || trimmed.starts_with("/**/")
        {
            index += 1;
            continue;
        }

        let start = index;
        let mut body: Vec<&str> = Vec::new();
        let mut rest = &trimmed[3..];
        loop {
            if let Some(end) = rest.find("*/") {
                body.push(strip_star(&rest[..end]));
                break;
            }
            body.push(strip_star(rest));
            index += 1;
            let Some(next) = lines.get(index).copied() else {
                return Err((start + 1, "unterminated doc comment".to_string()));
            };
            rest = next;
        }
        index += 1;

        let code = lines[index..]
            .iter()
            .map(|l| l.trim())
            .position(|l| !l.is_empty())
            .map(|offset| (index + offset, lines[index + offset].trim()));

        let doc = DocComment::parse(body);
        if let Some(doclet) = build_doclet(doc, code, file) {
            doclets.push(doclet);
        }
    }

    Ok(doclets)
}

fn strip_star(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => trimmed,
    }
}

/// Kind and name of the code line following a comment.
fn subject(line: &str) -> Option<(&'static str, String)> {
    if let Some(caps) = FUNCTION.captures(line) {
        return Some(("function", caps[1].to_string()));
    }
    if let Some(caps) = CLASS.captures(line) {
        return Some(("class", caps[1].to_string()));
    }
    if let Some(caps) = ARROW.captures(line) {
        return Some(("function", caps[1].to_string()));
    }
    if let Some(caps) = CONSTANT.captures(line) {
        return Some(("constant", caps[1].to_string()));
    }
    if let Some(caps) = MEMBER.captures(line) {
        let name = &caps[1];
        if !KEYWORDS.contains(&name) {
            return Some(("member", name.to_string()));
        }
    }
    None
}

fn build_doclet(doc: DocComment, code: Option<(usize, &str)>, file: &str) -> Option<Value> {
    let detected = code.and_then(|(line, text)| subject(text).map(|s| (line, s)));

    let (kind, name, line) = match (detected, doc.first("name")) {
        (_, Some(name)) if !name.is_empty() => {
            let kind = doc.first("kind").unwrap_or("member").to_string();
            let line = code.map(|(l, _)| l + 1);
            (kind, name.to_string(), line)
        }
        (Some((line, (kind, name))), _) => {
            let kind = doc.first("kind").unwrap_or(kind).to_string();
            (kind, name, Some(line + 1))
        }
        _ => return None,
    };

    let mut doclet = doc.extra_fields(&[
        "param", "arg", "argument", "return", "returns", "name", "kind",
    ]);
    doclet.insert("kind".to_string(), json!(kind));
    doclet.insert("name".to_string(), json!(name));
    doclet.insert("description".to_string(), json!(doc.description));
    doclet.insert("meta".to_string(), json!({ "path": file, "lineno": line }));

    let params: Vec<Value> = doc
        .all(&["param", "arg", "argument"])
        .map(parse_param)
        .collect();
    if !params.is_empty() {
        doclet.insert("params".to_string(), Value::Array(params));
    }

    if let Some(ret) = doc.first("returns").or_else(|| doc.first("return")) {
        doclet.insert("returns".to_string(), json!([parse_typed(ret)]));
    }

    Some(Value::Object(doclet))
}
