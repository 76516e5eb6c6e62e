//! Turns one source file into a [`PageRecord`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use lectern_adapters::{AdapterRef, AdapterRegistry};
use lectern_page::{
    extract_frontmatter, ordering_prefix, output_path, resolve_title, rewrite_markdown_links,
    unwrap_comment_frontmatter, FrontMatter, MarkdownRenderer, SourceKind,
};
use tracing::debug;

use crate::error::PageError;
use crate::page::{DocsEntry, PageRecord};
use crate::theme::{empty_context, TemplateEngine};

/// Where pages live and what they become.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Directory output paths are computed relative to.
    pub page_root: PathBuf,
    /// Extension given to every output path, without the dot.
    pub extension: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            page_root: PathBuf::from("docs"),
            extension: "html".to_string(),
        }
    }
}

/// Parses page sources. Holds no per-page state, so one parser serves any
/// number of concurrent parses.
pub struct PageParser {
    config: ParserConfig,
    registry: Arc<AdapterRegistry>,
    markdown: Arc<dyn MarkdownRenderer>,
    templates: Arc<dyn TemplateEngine>,
}

impl PageParser {
    pub fn new(
        config: ParserConfig,
        registry: Arc<AdapterRegistry>,
        markdown: Arc<dyn MarkdownRenderer>,
        templates: Arc<dyn TemplateEngine>,
    ) -> Self {
        Self {
            config,
            registry,
            markdown,
            templates,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Output path a source file maps to.
    pub fn output_path(&self, path: &Path) -> String {
        output_path(path, &self.config.page_root, &self.config.extension)
    }

    /// Parse one source file.
    ///
    /// Directories yield `Ok(None)`. Any other failure is returned as a
    /// [`PageError`] naming the file.
    pub async fn parse(&self, path: &Path) -> Result<Option<PageRecord>, PageError> {
        let read_err = |source| PageError::Read {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
        if metadata.is_dir() {
            debug!("Skipping directory {}", path.display());
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(path).await.map_err(read_err)?;
        let kind = SourceKind::from_path(path);
        let contents = unwrap_comment_frontmatter(&contents, kind);
        let (front_matter, body) =
            extract_frontmatter(&contents).map_err(|source| PageError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;

        let output_path = self.output_path(path);
        let resolved = resolve_title(&front_matter, kind, body, &output_path);
        let body = self.render_body(path, kind, &resolved.body)?;
        let docs = self.resolve_docs(path, &front_matter).await?;
        let order = front_matter.order().or_else(|| file_order(path));

        debug!(
            "Parsed {} -> {} ({:?} title, {} docs)",
            path.display(),
            output_path,
            resolved.source,
            docs.len()
        );

        Ok(Some(PageRecord {
            original_path: path.to_path_buf(),
            output_path,
            title: resolved.title,
            group: front_matter.group().map(str::to_string),
            layout: front_matter.layout().map(str::to_string),
            docs,
            order,
            body,
            front_matter,
        }))
    }

    fn render_body(&self, path: &Path, kind: SourceKind, body: &str) -> Result<String, PageError> {
        let render_err = |message: String| PageError::Render {
            path: path.to_path_buf(),
            message,
        };

        match kind {
            SourceKind::Markdown => {
                let linked = rewrite_markdown_links(body, &self.config.extension);
                self.markdown
                    .render(&linked)
                    .map_err(|e| render_err(e.to_string()))
            }
            SourceKind::Template => self
                .templates
                .render_str(body, empty_context())
                .map_err(|e| render_err(e.to_string())),
            SourceKind::Verbatim => Ok(body.to_string()),
        }
    }

    /// Run every adapter the front matter declares, concurrently.
    async fn resolve_docs(
        &self,
        path: &Path,
        front_matter: &FrontMatter,
    ) -> Result<BTreeMap<String, DocsEntry>, PageError> {
        let declared: Vec<(String, AdapterRef)> = front_matter
            .docs()
            .map(|(name, value)| (name.to_string(), AdapterRef::new(value.clone())))
            .collect();

        let results = join_all(
            declared
                .iter()
                .map(|(name, reference)| self.registry.run(name, reference)),
        )
        .await;

        let mut docs = BTreeMap::new();
        for ((name, reference), result) in declared.into_iter().zip(results) {
            let entry = match result {
                Ok(Some(resolution)) => DocsEntry::Resolved(resolution.doclets),
                Ok(None) => DocsEntry::Unresolved(reference),
                Err(source) => {
                    return Err(PageError::Adapter {
                        path: path.to_path_buf(),
                        adapter: name,
                        source,
                    })
                }
            };
            docs.insert(name, entry);
        }

        Ok(docs)
    }
}

/// Order from a numeric file name prefix such as `03-intro.md`.
fn file_order(path: &Path) -> Option<i64> {
    let name = path.file_name()?.to_str()?;
    ordering_prefix(name).map(|(order, _)| order)
}
