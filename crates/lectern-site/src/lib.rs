//! Site assembly for lectern.
//!
//! A [`Site`] parses page sources into a [`SiteTree`] of [`PageRecord`]s,
//! resolving each page's documentation through the adapter registry, then
//! renders every record through its layout.

pub mod builder;
pub mod error;
pub mod page;
pub mod parser;
pub mod render;
pub mod theme;
pub mod tree;

pub use builder::{
    BuildReport, OutputReport, ParseMode, ParseOutcome, SearchEntry, Site, SiteConfig,
    SEARCH_INDEX_FILE,
};
pub use error::{BuildError, PageError, RenderError};
pub use page::{DocsEntry, PageRecord};
pub use parser::{PageParser, ParserConfig};
pub use render::{RenderConfig, Renderer};
pub use theme::{TemplateEngine, TemplateError, Theme};
pub use tree::{PageGroup, SiteTree, UpsertMode, Upserted};
