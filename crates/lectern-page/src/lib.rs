//! Page source handling for lectern.
//!
//! This crate knows how to take the raw text of a documentation page apart:
//! split off its YAML front matter, classify the source, derive the output
//! path a page is identified by, infer a title, and turn markdown into HTML.
//! It has no notion of adapters or of the site as a whole.

pub mod frontmatter;
pub mod highlight;
pub mod links;
pub mod markdown;
pub mod source;
pub mod title;

pub use frontmatter::{
    extract_frontmatter, unwrap_comment_frontmatter, FrontMatter, FrontmatterError,
};
pub use highlight::{canonical_language, fence_language, Highlighter};
pub use links::rewrite_markdown_links;
pub use markdown::{CmarkRenderer, MarkdownError, MarkdownRenderer};
pub use source::{ordering_prefix, output_path, strip_ordering_prefix, SourceKind};
pub use title::{resolve_title, slugify, ResolvedTitle, TitleSource};
