//! Rewriting of intra-site markdown links.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark::{Event, LinkType, Parser, Tag};

use crate::markdown::cmark_options;

/// Point links at `.md` files to their rendered counterparts.
///
/// `[Setup](guides/setup.md#install)` becomes
/// `[Setup](guides/setup.html#install)` for extension `html`. Inline links
/// and reference definitions are rewritten; external URLs, fragments, and
/// links inside code are left alone.
pub fn rewrite_markdown_links<'a>(source: &'a str, extension: &str) -> Cow<'a, str> {
    let parser = Parser::new_ext(source, cmark_options());
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for (_, def) in parser.reference_definitions().iter() {
        if let Some(target) = retarget(&def.dest, extension) {
            if let Some(range) = locate(source, def.span.clone(), "]:", &def.dest) {
                edits.push((range, target));
            }
        }
    }

    for (event, range) in parser.into_offset_iter() {
        if let Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url,
            ..
        }) = event
        {
            if let Some(target) = retarget(&dest_url, extension) {
                if let Some(range) = locate(source, range, "](", &dest_url) {
                    edits.push((range, target));
                }
            }
        }
    }

    if edits.is_empty() {
        return Cow::Borrowed(source);
    }

    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, target) in edits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..range.start]);
        out.push_str(&target);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);

    Cow::Owned(out)
}

/// New destination for a link to a local `.md` file, or `None` to keep it.
fn retarget(dest: &str, extension: &str) -> Option<String> {
    if dest.is_empty()
        || dest.starts_with('#')
        || dest.starts_with("//")
        || dest.contains("://")
        || dest.starts_with("mailto:")
    {
        return None;
    }

    let split = dest.find(['#', '?']).unwrap_or(dest.len());
    let (path, suffix) = dest.split_at(split);

    let stem = path
        .strip_suffix(".md")
        .or_else(|| path.strip_suffix(".MD"))?;

    let mut target = String::with_capacity(dest.len() + extension.len());
    target.push_str(stem);
    if !extension.is_empty() {
        target.push('.');
        target.push_str(extension);
    }
    target.push_str(suffix);
    Some(target)
}

/// Byte range of `dest` within `span`, searched after `marker` when present.
fn locate(source: &str, span: Range<usize>, marker: &str, dest: &str) -> Option<Range<usize>> {
    let slice = source.get(span.clone())?;
    let after = slice.find(marker).map_or(0, |i| i + marker.len());
    let start = after + slice[after..].find(dest)?;
    Some(span.start + start..span.start + start + dest.len())
}
