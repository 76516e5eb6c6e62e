//! Source classification and output path normalization.

use std::path::{Component, Path};

/// How a page body is turned into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Markdown, rendered through the markdown renderer
    Markdown,
    /// Template source, rendered through the template engine
    Template,
    /// Anything else, passed through unchanged
    #[default]
    Verbatim,
}

impl SourceKind {
    /// Classify a source file by its extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    /// Classify an extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Self::Markdown,
            "jinja" | "j2" => Self::Template,
            _ => Self::Verbatim,
        }
    }

    pub fn is_markdown(&self) -> bool {
        *self == Self::Markdown
    }
}

/// Split a numeric ordering prefix off a file name.
///
/// `03-intro.md` yields `(3, "intro.md")`. Names without a prefix, or whose
/// prefix is the entire name, yield `None`.
pub fn ordering_prefix(name: &str) -> Option<(i64, &str)> {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let rest = name[digits..].strip_prefix('-')?;
    if rest.is_empty() {
        return None;
    }

    let order = name[..digits].parse().ok()?;
    Some((order, rest))
}

/// File name with any ordering prefix removed.
pub fn strip_ordering_prefix(name: &str) -> &str {
    ordering_prefix(name).map_or(name, |(_, rest)| rest)
}

/// Compute the output path that identifies a page within the site.
///
/// The path is taken relative to `page_root` (falling back to the bare file
/// name for files outside it), the ordering prefix is stripped from the file
/// name, and the extension is replaced with `extension`. Separators are
/// always `/`.
///
/// `docs/guides/03-intro.md` with root `docs` and extension `html` becomes
/// `guides/intro.html`.
pub fn output_path(path: &Path, page_root: &Path, extension: &str) -> String {
    let relative = match path.strip_prefix(page_root) {
        Ok(rel) => rel,
        Err(_) => path.file_name().map(Path::new).unwrap_or(path),
    };

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(name) = segments.pop() {
        let stripped = Path::new(strip_ordering_prefix(&name)).with_extension(extension);
        segments.push(stripped.to_string_lossy().into_owned());
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_sources() {
        assert_eq!(SourceKind::from_path(Path::new("a/b.md")), SourceKind::Markdown);
        assert_eq!(SourceKind::from_path(Path::new("b.MARKDOWN")), SourceKind::Markdown);
        assert_eq!(SourceKind::from_path(Path::new("b.jinja")), SourceKind::Template);
        assert_eq!(SourceKind::from_path(Path::new("b.j2")), SourceKind::Template);
        assert_eq!(SourceKind::from_path(Path::new("b.html")), SourceKind::Verbatim);
        assert_eq!(SourceKind::from_path(Path::new("README")), SourceKind::Verbatim);
    }

    #[test]
    fn parses_ordering_prefix() {
        assert_eq!(ordering_prefix("03-intro.md"), Some((3, "intro.md")));
        assert_eq!(ordering_prefix("10-a-b.md"), Some((10, "a-b.md")));
        assert_eq!(ordering_prefix("intro.md"), None);
        assert_eq!(ordering_prefix("03intro.md"), None);
        assert_eq!(ordering_prefix("03-"), None);
        assert_eq!(strip_ordering_prefix("2019-notes.md"), "notes.md");
    }

    #[test]
    fn computes_output_path() {
        let root = PathBuf::from("docs");

        assert_eq!(
            output_path(Path::new("docs/03-intro.md"), &root, "html"),
            "intro.html"
        );
        assert_eq!(
            output_path(Path::new("docs/guides/01-setup.md"), &root, "html"),
            "guides/setup.html"
        );
        assert_eq!(
            output_path(Path::new("docs/colors.jinja"), &root, "html"),
            "colors.html"
        );
    }

    #[test]
    fn keeps_ordering_prefix_on_directories() {
        assert_eq!(
            output_path(Path::new("docs/01-guides/intro.md"), Path::new("docs"), "html"),
            "01-guides/intro.html"
        );
    }

    #[test]
    fn files_outside_root_use_file_name() {
        assert_eq!(
            output_path(Path::new("/elsewhere/02-page.md"), Path::new("docs"), "md"),
            "page.md"
        );
    }

    #[test]
    fn empty_extension_drops_it() {
        assert_eq!(
            output_path(Path::new("docs/page.md"), Path::new("docs"), ""),
            "page"
        );
    }
}
