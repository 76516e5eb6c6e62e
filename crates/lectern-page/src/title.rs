//! Page title inference.

use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::frontmatter::FrontMatter;
use crate::markdown::cmark_options;
use crate::source::SourceKind;

/// Where a resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// Explicit `title` key in the front matter
    FrontMatter,
    /// First level-one heading of a markdown body
    Heading,
    /// Base name of the page's output path
    FileName,
}

/// A resolved title and the body it was resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTitle<'a> {
    pub title: String,
    pub source: TitleSource,
    /// Body with the heading line removed when the title came from it,
    /// otherwise the body as given.
    pub body: Cow<'a, str>,
}

/// Resolve a page title.
///
/// Tries, in order: the front matter `title`; for markdown sources, the first
/// level-one heading outside code (which is then removed from the body); the
/// file stem of `output_path`. Exactly one source is used.
pub fn resolve_title<'a>(
    front_matter: &FrontMatter,
    kind: SourceKind,
    body: &'a str,
    output_path: &str,
) -> ResolvedTitle<'a> {
    if let Some(title) = front_matter.title() {
        return ResolvedTitle {
            title: title.into_owned(),
            source: TitleSource::FrontMatter,
            body: Cow::Borrowed(body),
        };
    }

    if kind.is_markdown() {
        if let Some((title, range)) = first_heading(body) {
            let lines = line_span(body, range);
            let mut stripped = String::with_capacity(body.len());
            stripped.push_str(&body[..lines.start]);
            stripped.push_str(&body[lines.end..]);

            return ResolvedTitle {
                title,
                source: TitleSource::Heading,
                body: Cow::Owned(stripped),
            };
        }
    }

    let stem = Path::new(output_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled");

    ResolvedTitle {
        title: stem.to_string(),
        source: TitleSource::FileName,
        body: Cow::Borrowed(body),
    }
}

/// Text and source range of the first non-empty level-one heading.
fn first_heading(body: &str) -> Option<(String, Range<usize>)> {
    let mut current: Option<(String, Range<usize>)> = None;

    for (event, range) in Parser::new_ext(body, cmark_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => current = Some((String::new(), range)),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some((text, range)) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some((text.to_string(), range));
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((title, _)) = current.as_mut() {
                    title.push_str(&text);
                }
            }
            _ => {}
        }
    }

    None
}

/// Widen `range` to whole lines, including the trailing line break.
fn line_span(body: &str, range: Range<usize>) -> Range<usize> {
    let start = body[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let content_end = range.start + body[range].trim_end_matches(['\r', '\n']).len();
    let end = body[content_end..]
        .find('\n')
        .map_or(body.len(), |i| content_end + i + 1);
    start..end
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::extract_frontmatter;
    use pretty_assertions::assert_eq;

    #[test]
    fn explicit_title_wins_and_keeps_heading() {
        let (fm, body) =
            extract_frontmatter("---\ntitle: Custom Title\n---\n# Heading\nText").unwrap();

        let resolved = resolve_title(&fm, SourceKind::Markdown, body, "page.html");

        assert_eq!(resolved.title, "Custom Title");
        assert_eq!(resolved.source, TitleSource::FrontMatter);
        assert_eq!(resolved.body, "# Heading\nText");
    }

    #[test]
    fn heading_title_is_removed_from_body() {
        let fm = FrontMatter::new();
        let body = "# Getting Started\nHello.";

        let resolved = resolve_title(&fm, SourceKind::Markdown, body, "intro.html");

        assert_eq!(resolved.title, "Getting Started");
        assert_eq!(resolved.source, TitleSource::Heading);
        assert_eq!(resolved.body, "Hello.");
    }

    #[test]
    fn only_first_heading_is_removed() {
        let fm = FrontMatter::new();
        let body = "Intro\n\n# First\n\nText\n\n# Second\n";

        let resolved = resolve_title(&fm, SourceKind::Markdown, body, "p.html");

        assert_eq!(resolved.title, "First");
        assert_eq!(resolved.body, "Intro\n\n\nText\n\n# Second\n");
    }

    #[test]
    fn level_two_headings_do_not_count() {
        let fm = FrontMatter::new();

        let resolved = resolve_title(&fm, SourceKind::Markdown, "## Sub\nText", "notes.html");

        assert_eq!(resolved.title, "notes");
        assert_eq!(resolved.source, TitleSource::FileName);
        assert_eq!(resolved.body, "## Sub\nText");
    }

    #[test]
    fn non_markdown_sources_use_file_name() {
        let fm = FrontMatter::new();

        let resolved = resolve_title(&fm, SourceKind::Verbatim, "# Not a heading", "guides/colors.html");

        assert_eq!(resolved.title, "colors");
        assert_eq!(resolved.body, "# Not a heading");
    }

    #[test]
    fn strips_closing_hashes() {
        let fm = FrontMatter::new();

        let resolved = resolve_title(&fm, SourceKind::Markdown, "# Setup ##\n", "a.html");

        assert_eq!(resolved.title, "Setup");
    }

    #[test]
    fn keeps_hash_that_is_part_of_title() {
        let fm = FrontMatter::new();

        let resolved = resolve_title(&fm, SourceKind::Markdown, "# Using C#\n", "a.html");

        assert_eq!(resolved.title, "Using C#");
    }

    #[test]
    fn fenced_comments_are_not_headings() {
        let fm = FrontMatter::new();
        let body = "```sh\n# install deps\nnpm i\n```\n\n# Guide\nText";

        let resolved = resolve_title(&fm, SourceKind::Markdown, body, "guide.html");

        assert_eq!(resolved.title, "Guide");
        assert_eq!(resolved.source, TitleSource::Heading);
        assert_eq!(resolved.body, "```sh\n# install deps\nnpm i\n```\n\nText");
    }

    #[test]
    fn heading_text_keeps_inline_code() {
        let fm = FrontMatter::new();

        let resolved = resolve_title(&fm, SourceKind::Markdown, "# The `find` helper\n", "a.html");

        assert_eq!(resolved.title, "The find helper");
        assert_eq!(resolved.body, "");
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("Button (Primary)"), "button-primary");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
