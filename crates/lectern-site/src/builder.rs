//! Site orchestration: discover sources, parse them into the site tree, render
//! and write the output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use lectern_adapters::AdapterRegistry;
use lectern_page::MarkdownRenderer;
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, PageError, RenderError};
use crate::page::PageRecord;
use crate::parser::{PageParser, ParserConfig};
use crate::render::{RenderConfig, Renderer};
use crate::theme::TemplateEngine;
use crate::tree::{SiteTree, UpsertMode, Upserted};

/// Name of the search index written next to the pages.
pub const SEARCH_INDEX_FILE: &str = "search.json";

/// Configuration for a site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub parser: ParserConfig,
    pub render: RenderConfig,
    /// Source extensions picked up by [`Site::discover_pages`].
    pub page_extensions: Vec<String>,
    /// Maximum pages parsed at once during a full build.
    pub concurrency: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            render: RenderConfig::default(),
            page_extensions: ["md", "markdown", "html", "htm", "jinja", "j2"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            concurrency: 16,
        }
    }
}

/// What [`Site::parse`] does with the record it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Insert as part of a whole-site build.
    Full,
    /// Insert or replace a single page.
    Incremental,
    /// Return the record without touching the tree.
    Dry,
}

/// Result of [`Site::parse`].
#[derive(Debug)]
pub enum ParseOutcome {
    /// The path was a directory.
    Skipped,
    /// Dry parse result.
    Parsed(PageRecord),
    /// The record is now in the tree.
    Stored {
        output_path: String,
        upserted: Upserted,
    },
}

/// Result of a full build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages now in the tree.
    pub pages: usize,
    /// Sources that failed to parse, in discovery order.
    pub failures: Vec<PageError>,
    /// Total build time in milliseconds
    pub duration_ms: u64,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of writing rendered pages to disk.
#[derive(Debug, Default)]
pub struct OutputReport {
    pub written: usize,
    pub failures: Vec<RenderError>,
    pub output_dir: PathBuf,
}

/// One entry of the search index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub title: String,
    pub path: String,
    pub group: Option<String>,
    /// Names of the items documented on the page.
    pub doclets: Vec<String>,
}

/// A documentation site: one parser, one renderer and the shared tree.
pub struct Site {
    config: SiteConfig,
    parser: PageParser,
    renderer: Renderer,
    tree: Arc<RwLock<SiteTree>>,
}

impl Site {
    pub fn new(
        config: SiteConfig,
        registry: AdapterRegistry,
        engine: Arc<dyn TemplateEngine>,
        markdown: Arc<dyn MarkdownRenderer>,
    ) -> Self {
        let adapters = registry.names().into_iter().map(str::to_string).collect();
        let renderer = Renderer::new(
            Arc::clone(&engine),
            Arc::clone(&markdown),
            adapters,
            config.render.clone(),
        );
        let parser = PageParser::new(config.parser.clone(), Arc::new(registry), markdown, engine);

        Self {
            config,
            parser,
            renderer,
            tree: Arc::new(RwLock::new(SiteTree::new())),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Shared handle to the site tree.
    pub fn tree(&self) -> Arc<RwLock<SiteTree>> {
        Arc::clone(&self.tree)
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Output path a source file maps to.
    pub fn output_path(&self, path: &Path) -> String {
        self.parser.output_path(path)
    }

    /// Whether `path` is a page source this site would pick up.
    pub fn is_page_source(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .page_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            });
        known && !hidden
    }

    /// All page sources under the page root, sorted by path. Hidden files and
    /// directories are skipped.
    pub fn discover_pages(&self) -> Result<Vec<PathBuf>, BuildError> {
        let root = &self.config.parser.page_root;
        if !root.is_dir() {
            return Err(BuildError::MissingRoot(root.clone()));
        }

        let pages = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .is_some_and(|n| n.starts_with('.'))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_page_source(e.path()))
            .map(|e| e.into_path())
            .collect();

        Ok(pages)
    }

    /// Parse one source and apply `mode` to the tree.
    pub async fn parse(&self, path: &Path, mode: ParseMode) -> Result<ParseOutcome, PageError> {
        let Some(record) = self.parser.parse(path).await? else {
            return Ok(ParseOutcome::Skipped);
        };

        let mode = match mode {
            ParseMode::Dry => return Ok(ParseOutcome::Parsed(record)),
            ParseMode::Full => UpsertMode::Full,
            ParseMode::Incremental => UpsertMode::Incremental,
        };

        let output_path = record.output_path.clone();
        let upserted = self.tree.write().await.upsert(record, mode);
        debug!("Stored {} ({:?})", output_path, upserted);

        Ok(ParseOutcome::Stored {
            output_path,
            upserted,
        })
    }

    /// Rebuild the tree from `paths`.
    ///
    /// The tree is cleared first. Sources are parsed concurrently and inserted
    /// in the order given; a source that fails is reported and left out
    /// without affecting the others.
    pub async fn build(&self, paths: &[PathBuf]) -> BuildReport {
        let start = Instant::now();
        self.tree.write().await.clear();

        let results: Vec<_> = stream::iter(paths)
            .map(|path| async move { (path, self.parser.parse(path).await) })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut report = BuildReport::default();
        let mut tree = self.tree.write().await;
        for (path, result) in results {
            match result {
                Ok(Some(record)) => {
                    tree.upsert(record, UpsertMode::Full);
                }
                Ok(None) => debug!("Skipped {}", path.display()),
                Err(e) => {
                    warn!("{}", e);
                    report.failures.push(e);
                }
            }
        }

        report.pages = tree.len();
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Parsed {} pages ({} failed) in {}ms",
            report.pages,
            report.failures.len(),
            report.duration_ms
        );

        report
    }

    /// Drop the page built from `path`, if any.
    pub async fn remove(&self, path: &Path) -> Option<PageRecord> {
        let output_path = self.output_path(path);
        self.tree.write().await.remove(&output_path)
    }

    /// Render the page stored under `output_path`.
    pub async fn render_page(&self, output_path: &str) -> Result<String, RenderError> {
        let tree = self.tree.read().await;
        let page = tree
            .get(output_path)
            .ok_or_else(|| RenderError::PageNotFound(output_path.to_string()))?;
        self.renderer.render(page, &tree)
    }

    /// Render every page in navigation order.
    ///
    /// The tree is snapshotted and the lock released before rendering, which
    /// runs on the blocking pool.
    pub async fn render_all(
        &self,
    ) -> Result<Vec<(String, Result<String, RenderError>)>, BuildError> {
        let (site, pages) = {
            let tree = self.tree.read().await;
            let pages: Vec<PageRecord> = tree.list().into_iter().cloned().collect();
            (self.renderer.site_context(&tree), pages)
        };
        let renderer = self.renderer.clone();

        tokio::task::spawn_blocking(move || {
            pages
                .par_iter()
                .map(|page| {
                    (
                        page.output_path.clone(),
                        renderer.render_with_site(page, &site),
                    )
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| BuildError::Task(e.to_string()))
    }

    /// Search entries for every page in navigation order.
    pub async fn search_index(&self) -> Vec<SearchEntry> {
        let tree = self.tree.read().await;

        tree.list()
            .into_iter()
            .map(|page| SearchEntry {
                title: page.title.clone(),
                path: page.output_path.clone(),
                group: page.group.clone(),
                doclets: page.doclets().filter_map(symbol_name).collect(),
            })
            .collect()
    }

    /// Render every page into `output_dir` and write the search index.
    ///
    /// Pages that fail to render are reported and skipped; I/O failures stop
    /// the write.
    pub async fn write_output(&self, output_dir: &Path) -> Result<OutputReport, BuildError> {
        let rendered = self.render_all().await?;
        let index = serde_json::to_string_pretty(&self.search_index().await)
            .map_err(|e| BuildError::Serialize(e.to_string()))?;

        let dir = output_dir.to_path_buf();
        let report = tokio::task::spawn_blocking(move || write_pages(&dir, rendered, &index))
            .await
            .map_err(|e| BuildError::Task(e.to_string()))??;

        info!(
            "Wrote {} pages to {}",
            report.written,
            output_dir.display()
        );

        Ok(report)
    }
}

fn write_pages(
    output_dir: &Path,
    rendered: Vec<(String, Result<String, RenderError>)>,
    index: &str,
) -> Result<OutputReport, BuildError> {
    fs::create_dir_all(output_dir).map_err(|source| BuildError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut report = OutputReport {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };

    for (output_path, result) in rendered {
        match result {
            Ok(html) => {
                write_file(&output_dir.join(&output_path), &html)?;
                report.written += 1;
            }
            Err(e) => {
                warn!("{}", e);
                report.failures.push(e);
            }
        }
    }

    write_file(&output_dir.join(SEARCH_INDEX_FILE), index)?;

    Ok(report)
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    let write_err = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

fn symbol_name(doclet: &serde_json::Value) -> Option<String> {
    doclet
        .get("name")
        .or_else(|| doclet.pointer("/context/name"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
