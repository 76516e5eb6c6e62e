//! Markdown rendering.

use std::sync::Arc;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::highlight::{fence_language, Highlighter};

/// External markdown renderer: markdown text in, HTML out.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<String, MarkdownError>;
}

/// Errors raised by a markdown renderer.
#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    #[error("Markdown render error: {0}")]
    Render(String),
}

pub(crate) fn cmark_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Clone, Default)]
pub struct CmarkRenderer {
    highlighter: Option<Arc<dyn Highlighter>>,
}

impl CmarkRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route fenced code blocks that name a language through `highlighter`.
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, source: &str) -> Result<String, MarkdownError> {
        let parser = Parser::new_ext(source, cmark_options());
        let mut out = String::with_capacity(source.len() * 3 / 2);

        let Some(highlighter) = &self.highlighter else {
            html::push_html(&mut out, parser);
            return Ok(out);
        };

        let mut events = Vec::new();
        let mut fence: Option<(&'static str, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info))) => {
                    match fence_language(info) {
                        Some(lang) => fence = Some((lang, String::new())),
                        None => events.push(event),
                    }
                }
                Event::Text(ref text) if fence.is_some() => {
                    if let Some((_, code)) = fence.as_mut() {
                        code.push_str(text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((lang, code)) = fence.take() {
                        let inner = highlighter.highlight(&code, lang);
                        events.push(Event::Html(CowStr::from(format!(
                            "<pre><code class=\"language-{lang}\">{inner}</code></pre>\n"
                        ))));
                    }
                }
                other => events.push(other),
            }
        }

        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}
