//! Error types for parsing, building and rendering.

use std::path::{Path, PathBuf};

use lectern_adapters::AdapterError;
use lectern_page::FrontmatterError;

/// Failure to turn one source file into a page. Never affects other pages.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid front matter in {}: {source}", .path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("Adapter '{adapter}' failed for {}: {source}", .path.display())]
    Adapter {
        path: PathBuf,
        adapter: String,
        #[source]
        source: AdapterError,
    },

    #[error("Failed to render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },
}

impl PageError {
    /// Source file the error belongs to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::FrontMatter { path, .. }
            | Self::Adapter { path, .. }
            | Self::Render { path, .. } => path,
        }
    }
}

/// Failure to render a page through its layout.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("No layout called '{layout}' exists (set by {page})")]
    MissingLayout { layout: String, page: String },

    #[error("Template error in {page}: {message}")]
    Template { page: String, message: String },

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error(transparent)]
    FrontMatter(#[from] FrontmatterError),
}

/// Errors that stop a build as a whole.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Page root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize search index: {0}")]
    Serialize(String),

    #[error("Output task failed: {0}")]
    Task(String),
}
