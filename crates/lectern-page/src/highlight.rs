//! Syntax highlighting hook for fenced code blocks.

/// External syntax highlighter.
///
/// Receives the raw code of a fenced block and its canonical language name
/// and returns HTML for the inside of the `<code>` element.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: &str) -> String;
}

/// Language named by a code fence info string, if any.
///
/// Only the first word is considered, so `scss title="x"` yields `scss`.
pub fn fence_language(info: &str) -> Option<&'static str> {
    let lang = info.split_whitespace().next()?;
    let lang = lang.trim_start_matches('{').trim_end_matches('}');
    if lang.is_empty() {
        None
    } else {
        Some(canonical_language(lang))
    }
}

/// Normalize common language aliases to one name.
pub fn canonical_language(lang: &str) -> &'static str {
    match lang.to_lowercase().as_str() {
        "ts" | "typescript" => "typescript",
        "js" | "javascript" | "mjs" | "cjs" => "javascript",
        "tsx" => "tsx",
        "jsx" => "jsx",
        "scss" => "scss",
        "sass" => "sass",
        "css" => "css",
        "html" | "htm" => "html",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "rust" | "rs" => "rust",
        "bash" | "sh" | "shell" | "zsh" => "bash",
        "md" | "markdown" => "markdown",
        _ => "plaintext",
    }
}
