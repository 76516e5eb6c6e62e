//! Front matter extraction and parsing.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::source::SourceKind;

const FENCE: &str = "---";

/// Metadata block declared at the top of a page.
///
/// The mapping keeps its keys in declaration order so it can be written
/// back out as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter(Mapping);

impl FrontMatter {
    /// Create an empty front matter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing YAML mapping.
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    /// Borrow the underlying mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Look up a raw value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(Value::String(key.into()), value.into());
    }

    /// Look up a string value by key.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Explicit page title.
    ///
    /// Any scalar counts, so `title: 2024` is the title `"2024"`. Null,
    /// empty strings and collections count as absent.
    pub fn title(&self) -> Option<Cow<'_, str>> {
        let title = match self.get("title")? {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Bool(b) => Cow::Owned(b.to_string()),
            _ => return None,
        };
        (!title.trim().is_empty()).then_some(title)
    }

    /// Navigation group the page belongs to.
    pub fn group(&self) -> Option<&str> {
        self.str("group")
    }

    /// Named render layout.
    pub fn layout(&self) -> Option<&str> {
        self.str("layout")
    }

    /// Navigation sort key.
    pub fn order(&self) -> Option<i64> {
        self.get("order").and_then(Value::as_i64)
    }

    /// Documentation references, keyed by adapter name.
    ///
    /// Entries whose key is not a string are skipped.
    pub fn docs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.get("docs")
            .and_then(Value::as_mapping)
            .into_iter()
            .flat_map(|m| m.iter())
            .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Serialize as a fenced header block, ready to prepend to output.
    pub fn to_block(&self) -> Result<String, FrontmatterError> {
        let yaml = serde_yaml::to_string(&self.0)
            .map_err(|e| FrontmatterError::Serialize(e.to_string()))?;
        Ok(format!("{FENCE}\n{yaml}{FENCE}\n"))
    }
}

/// Extract front matter from page source.
///
/// Returns the parsed front matter and the body that follows the closing
/// fence. A source without an opening fence has empty front matter and the
/// whole source as its body.
pub fn extract_frontmatter(source: &str) -> Result<(FrontMatter, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    let Some(after_open) = strip_fence_line(trimmed) else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &after_open[..offset];
            let body = after_open[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Ok((parse_yaml(yaml)?, body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed)
}

/// Lift front matter out of a leading comment.
///
/// Template and verbatim sources can hide their front matter from other
/// tools by wrapping the fenced block in a comment, e.g.
/// `<!--\n---\ntitle: Colors\n---\n-->`. The comment delimiters are
/// dropped so [`extract_frontmatter`] sees a plain fenced block. Markdown
/// sources and sources without such a comment are returned unchanged.
pub fn unwrap_comment_frontmatter(source: &str, kind: SourceKind) -> Cow<'_, str> {
    let delimiters: &[(&str, &str)] = match kind {
        SourceKind::Markdown => &[],
        SourceKind::Template => &[("{#", "#}"), ("<!--", "-->")],
        SourceKind::Verbatim => &[("<!--", "-->"), ("/*", "*/")],
    };

    let trimmed = source.trim_start();
    for (open, close) in delimiters {
        let Some(inner) = trimmed.strip_prefix(open) else {
            continue;
        };
        let Some(end) = inner.find(close) else {
            continue;
        };

        let block = inner[..end].trim();
        if strip_fence_line(block).is_none() {
            continue;
        }
        let rest = inner[end + close.len()..].trim_start_matches(['\r', '\n']);
        return Cow::Owned(format!("{block}\n{rest}"));
    }

    Cow::Borrowed(source)
}

/// Return what follows the first line if that line is an opening fence.
fn strip_fence_line(source: &str) -> Option<&str> {
    let (first, rest) = match source.find('\n') {
        Some(i) => (&source[..i], &source[i + 1..]),
        None => (source, ""),
    };
    (first.trim_end() == FENCE).then_some(rest)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(FrontMatter(mapping)),
        Value::Null => Ok(FrontMatter::default()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),

    #[error("Front matter must be a key/value mapping")]
    NotAMapping,

    #[error("Failed to serialize front matter: {0}")]
    Serialize(String),
}
