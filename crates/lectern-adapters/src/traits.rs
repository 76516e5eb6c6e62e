//! Trait definitions for documentation adapters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Doclets as produced by an adapter's parser, in source order.
pub type RawDoclets = Vec<serde_json::Value>;

/// Doclets grouped by kind (e.g. "variable", "mixin", "function").
pub type CategorizedDoclets = BTreeMap<String, Vec<serde_json::Value>>;

/// Documentation sources as declared in a page's front matter.
///
/// The bundled adapters accept a glob string or a list of glob strings.
/// Other adapters are free to interpret the value however they like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterRef(Value);

impl AdapterRef {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// The declared value, untouched.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Interpret the reference as one or more path patterns.
    pub fn patterns(&self) -> Result<Vec<String>, AdapterError> {
        match &self.0 {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        AdapterError::InvalidReference(format!(
                            "expected a list of strings, found {item:?}"
                        ))
                    })
                })
                .collect(),
            other => Err(AdapterError::InvalidReference(format!(
                "expected a string or list of strings, found {other:?}"
            ))),
        }
    }
}

impl From<&str> for AdapterRef {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

/// Categorized doclets produced for one adapter on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterResolution {
    /// Name the adapter is registered under
    pub adapter: String,

    /// Categorized result
    pub doclets: CategorizedDoclets,
}

/// Errors that can occur while parsing documentation sources.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Invalid documentation reference: {0}")]
    InvalidReference(String),

    #[error("Invalid pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Source scan failed: {0}")]
    Scan(String),
}

/// A source language's documentation extractor.
///
/// Implementations are shared across concurrently parsed pages and must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait DocAdapter: Send + Sync {
    /// Language identifier (e.g., "sass", "js")
    fn name(&self) -> &'static str;

    /// Collect raw doclets for a documentation reference.
    async fn parse(&self, reference: &AdapterRef) -> Result<RawDoclets, AdapterError>;

    /// Group raw doclets by kind. Must not fail on doclets produced by
    /// [`DocAdapter::parse`].
    fn categorize(&self, doclets: RawDoclets) -> CategorizedDoclets;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_pattern() {
        let reference = AdapterRef::from("scss/*.scss");

        assert_eq!(reference.patterns().unwrap(), vec!["scss/*.scss"]);
    }

    #[test]
    fn reads_pattern_list() {
        let value: Value = serde_yaml::from_str("[a.js, 'lib/**/*.js']").unwrap();

        let patterns = AdapterRef::new(value).patterns().unwrap();

        assert_eq!(patterns, vec!["a.js", "lib/**/*.js"]);
    }

    #[test]
    fn rejects_other_shapes() {
        let value: Value = serde_yaml::from_str("{files: a.js}").unwrap();

        let result = AdapterRef::new(value).patterns();

        assert!(matches!(result, Err(AdapterError::InvalidReference(_))));
    }
}
