//! The parsed form of one source file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use lectern_adapters::{AdapterRef, CategorizedDoclets};
use lectern_page::FrontMatter;
use serde::Serialize;

/// Documentation attached to a page under one adapter name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocsEntry {
    /// No adapter is registered under the name; the front matter reference
    /// is carried through untouched.
    Unresolved(AdapterRef),
    /// Doclets produced by the adapter, grouped by kind.
    Resolved(CategorizedDoclets),
}

impl DocsEntry {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Categorized doclets, if an adapter produced them.
    pub fn doclets(&self) -> Option<&CategorizedDoclets> {
        match self {
            Self::Resolved(doclets) => Some(doclets),
            Self::Unresolved(_) => None,
        }
    }
}

/// A parsed page, ready to be placed in the site tree and rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    /// Source file location.
    pub original_path: PathBuf,
    /// Path relative to the page root with the output extension. Unique in a
    /// site tree.
    pub output_path: String,
    /// Front matter exactly as authored.
    #[serde(rename = "meta")]
    pub front_matter: FrontMatter,
    /// Rendered body (HTML for markdown sources).
    pub body: String,
    pub title: String,
    pub group: Option<String>,
    pub layout: Option<String>,
    /// Adapter name to documentation.
    pub docs: BTreeMap<String, DocsEntry>,
    /// Sort key for navigation; pages without one sort last.
    pub order: Option<i64>,
}

impl PageRecord {
    /// Doclets every resolved adapter produced, flattened across kinds.
    pub fn doclets(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.docs
            .values()
            .filter_map(DocsEntry::doclets)
            .flat_map(|kinds| kinds.values().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> PageRecord {
        let mut sass = CategorizedDoclets::new();
        sass.insert("mixin".to_string(), vec![json!({ "context": { "name": "button" } })]);
        sass.insert("variable".to_string(), vec![json!({ "context": { "name": "color" } })]);

        let mut docs = BTreeMap::new();
        docs.insert("sass".to_string(), DocsEntry::Resolved(sass));
        docs.insert("python".to_string(), DocsEntry::Unresolved(AdapterRef::from("lib/*.py")));

        PageRecord {
            original_path: PathBuf::from("docs/button.md"),
            output_path: "button.html".to_string(),
            front_matter: FrontMatter::new(),
            body: "<p>Buttons</p>".to_string(),
            title: "Button".to_string(),
            group: Some("Components".to_string()),
            layout: None,
            docs,
            order: Some(2),
        }
    }

    #[test]
    fn serializes_docs_untagged() {
        let value = serde_json::to_value(record()).unwrap();

        assert_eq!(value["docs"]["python"], json!("lib/*.py"));
        assert_eq!(value["docs"]["sass"]["mixin"][0]["context"]["name"], "button");
        assert_eq!(value["meta"], json!({}));
        assert_eq!(value["original_path"], "docs/button.md");
    }

    #[test]
    fn flattens_resolved_doclets() {
        let record = record();

        let names: Vec<_> = record
            .doclets()
            .map(|d| d["context"]["name"].as_str().unwrap())
            .collect();

        assert_eq!(names, vec!["button", "color"]);
    }
}
