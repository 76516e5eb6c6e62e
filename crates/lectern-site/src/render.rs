//! Renders page records through their layouts.

use std::fmt;
use std::sync::Arc;

use lectern_page::{slugify, MarkdownRenderer};
use minijinja::value::{from_args, Object, ObjectRepr};
use minijinja::{context, Error, ErrorKind, State, Value};
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::error::RenderError;
use crate::page::{DocsEntry, PageRecord};
use crate::theme::{TemplateEngine, TemplateError};
use crate::tree::{PageGroup, SiteTree};

/// Options for the render step.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Layout for pages that do not name one.
    pub default_layout: String,
    /// Prefix each rendered page with its front matter block.
    pub keep_front_matter: bool,
    /// Extra values exposed under `site` in every layout.
    pub site_data: Map<String, Json>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_layout: "default".to_string(),
            keep_front_matter: false,
            site_data: Map::new(),
        }
    }
}

#[derive(Serialize)]
struct SiteContext<'a> {
    #[serde(flatten)]
    data: &'a Map<String, Json>,
    pages: Vec<&'a PageRecord>,
    groups: Vec<PageGroup<'a>>,
}

/// Applies layouts to page records.
///
/// Layouts see three namespaces: `page` (the record, front matter under
/// `page.meta`), `site` (configured site data plus `pages` and `groups` in
/// navigation order) and `helpers`.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn TemplateEngine>,
    markdown: Arc<dyn MarkdownRenderer>,
    adapters: Arc<Vec<String>>,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(
        engine: Arc<dyn TemplateEngine>,
        markdown: Arc<dyn MarkdownRenderer>,
        adapters: Vec<String>,
        config: RenderConfig,
    ) -> Self {
        Self {
            engine,
            markdown,
            adapters: Arc::new(adapters),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The `site` namespace for a tree.
    pub fn site_context(&self, tree: &SiteTree) -> Value {
        Value::from_serialize(&SiteContext {
            data: &self.config.site_data,
            pages: tree.list(),
            groups: tree.groups(),
        })
    }

    /// Render one page against the tree it belongs to.
    pub fn render(&self, record: &PageRecord, tree: &SiteTree) -> Result<String, RenderError> {
        self.render_with_site(record, &self.site_context(tree))
    }

    /// Render one page with a prepared `site` namespace.
    pub fn render_with_site(&self, record: &PageRecord, site: &Value) -> Result<String, RenderError> {
        let layout = record
            .layout
            .as_deref()
            .unwrap_or(&self.config.default_layout);

        let helpers = Helpers {
            docs: record.docs.clone(),
            adapters: Arc::clone(&self.adapters),
            markdown: Arc::clone(&self.markdown),
        };

        let ctx = context! {
            page => Value::from_serialize(record),
            site => site.clone(),
            helpers => Value::from_object(helpers),
        };

        let rendered = self.engine.render(layout, ctx).map_err(|e| match e {
            TemplateError::NotFound(layout) => RenderError::MissingLayout {
                layout,
                page: record.output_path.clone(),
            },
            TemplateError::Render(message) => RenderError::Template {
                page: record.output_path.clone(),
                message,
            },
        })?;

        if self.config.keep_front_matter {
            Ok(format!("{}\n{}", record.front_matter.to_block()?, rendered))
        } else {
            Ok(rendered)
        }
    }
}

/// The `helpers` namespace of one page render.
struct Helpers {
    docs: std::collections::BTreeMap<String, DocsEntry>,
    adapters: Arc<Vec<String>>,
    markdown: Arc<dyn MarkdownRenderer>,
}

impl fmt::Debug for Helpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helpers")
            .field("docs", &self.docs.keys().collect::<Vec<_>>())
            .field("adapters", &self.adapters)
            .finish()
    }
}

impl Helpers {
    /// Doclets from one adapter, across all kinds, matching `predicate`.
    fn find(&self, adapter: &str, predicate: &Json) -> Vec<&Json> {
        let Some(kinds) = self.docs.get(adapter).and_then(DocsEntry::doclets) else {
            return Vec::new();
        };

        kinds
            .values()
            .flatten()
            .filter(|doclet| matches_predicate(doclet, predicate))
            .collect()
    }
}

impl Object for Helpers {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "adapters" => Some(Value::from_serialize(&*self.adapters)),
            _ => None,
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "find" => {
                let (adapter, predicate): (String, Option<Value>) = from_args(args)?;
                let predicate = match predicate {
                    Some(p) => serde_json::to_value(&p)
                        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?,
                    None => Json::Null,
                };
                Ok(Value::from_serialize(self.find(&adapter, &predicate)))
            }
            "slugify" => {
                let (text,): (String,) = from_args(args)?;
                Ok(Value::from(slugify(&text)))
            }
            "markdown" => {
                let (text,): (String,) = from_args(args)?;
                self.markdown
                    .render(&text)
                    .map(Value::from_safe_string)
                    .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// Partial deep match. Objects match when every predicate field matches,
/// arrays when every predicate element matches some element, and a string
/// predicate tests that the named field is truthy. Null matches everything.
fn matches_predicate(doclet: &Json, predicate: &Json) -> bool {
    match predicate {
        Json::Null => true,
        Json::Object(fields) => fields.iter().all(|(key, expected)| {
            doclet
                .get(key)
                .is_some_and(|actual| value_matches(actual, expected))
        }),
        Json::String(key) => doclet.get(key).is_some_and(truthy),
        _ => false,
    }
}

fn value_matches(actual: &Json, expected: &Json) -> bool {
    match (actual, expected) {
        (_, Json::Object(_)) => matches_predicate(actual, expected),
        (Json::Array(items), Json::Array(wanted)) => wanted
            .iter()
            .all(|w| items.iter().any(|item| value_matches(item, w))),
        _ => actual == expected,
    }
}

fn truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use crate::tree::UpsertMode;
    use lectern_adapters::{AdapterRef, CategorizedDoclets};
    use lectern_page::{CmarkRenderer, FrontMatter};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn record(output_path: &str) -> PageRecord {
        let mut sass = CategorizedDoclets::new();
        sass.insert(
            "mixin".to_string(),
            vec![
                json!({ "description": "A *button*.", "context": { "type": "mixin", "name": "button" }, "group": ["forms"] }),
                json!({ "context": { "type": "mixin", "name": "card" } }),
            ],
        );
        sass.insert(
            "variable".to_string(),
            vec![json!({ "context": { "type": "variable", "name": "color" }, "group": ["forms", "theme"] })],
        );

        let mut docs = BTreeMap::new();
        docs.insert("sass".to_string(), DocsEntry::Resolved(sass));
        docs.insert("py".to_string(), DocsEntry::Unresolved(AdapterRef::from("*.py")));

        let mut front_matter = FrontMatter::new();
        front_matter.insert("title", "Buttons");

        PageRecord {
            original_path: PathBuf::from(format!("docs/{output_path}")),
            output_path: output_path.to_string(),
            front_matter,
            body: "<p>Press it.</p>".to_string(),
            title: "Buttons".to_string(),
            group: Some("Components".to_string()),
            layout: None,
            docs,
            order: None,
        }
    }

    fn renderer(theme: Theme, config: RenderConfig) -> Renderer {
        Renderer::new(
            Arc::new(theme),
            Arc::new(CmarkRenderer::new()),
            vec!["js".to_string(), "sass".to_string()],
            config,
        )
    }

    fn render_with(layout: &str) -> String {
        let mut theme = Theme::new();
        theme.add_layout("default", layout).unwrap();
        let renderer = renderer(theme, RenderConfig::default());

        let mut tree = SiteTree::new();
        tree.upsert(record("buttons.html"), UpsertMode::Full);
        let page = tree.get("buttons.html").unwrap();

        renderer.render(page, &tree).unwrap()
    }

    #[test]
    fn find_filters_across_kinds() {
        let out = render_with(
            "{% for d in helpers.find('sass', {'context': {'type': 'mixin'}}) %}{{ d.context.name }},{% endfor %}",
        );

        assert_eq!(out, "button,card,");
    }

    #[test]
    fn find_without_predicate_returns_everything() {
        let out = render_with("{{ helpers.find('sass') | length }}");

        assert_eq!(out, "3");
    }

    #[test]
    fn find_matches_array_subsets() {
        let out = render_with(
            "{% for d in helpers.find('sass', {'group': ['theme']}) %}{{ d.context.name }}{% endfor %}",
        );

        assert_eq!(out, "color");
    }

    #[test]
    fn find_on_unresolved_or_unknown_adapter_is_empty() {
        let out = render_with(
            "{{ helpers.find('py') | length }}/{{ helpers.find('nope') | length }}",
        );

        assert_eq!(out, "0/0");
    }

    #[test]
    fn exposes_page_site_and_helpers() {
        let out = render_with(
            "{{ page.title }}|{{ page.meta.title }}|{% for p in site.pages %}{{ p.output_path }}{% endfor %}|{{ helpers.adapters | join(',') }}|{{ helpers.slugify('Hello World') }}",
        );

        assert_eq!(out, "Buttons|Buttons|buttons.html|js,sass|hello-world");
    }

    #[test]
    fn markdown_helper_renders_html() {
        let out = render_with("{{ helpers.markdown('A *b*') }}");

        assert_eq!(out.trim(), "<p>A <em>b</em></p>");
    }

    #[test]
    fn site_data_is_merged_into_site() {
        let mut theme = Theme::new();
        theme
            .add_layout("default", "{{ site.title }}:{{ site.groups[0].name }}")
            .unwrap();
        let mut config = RenderConfig::default();
        config.site_data.insert("title".to_string(), json!("Handbook"));
        let renderer = renderer(theme, config);

        let mut tree = SiteTree::new();
        tree.upsert(record("a.html"), UpsertMode::Full);

        let out = renderer.render(tree.get("a.html").unwrap(), &tree).unwrap();

        assert_eq!(out, "Handbook:Components");
    }

    #[test]
    fn missing_layout_names_layout_and_page() {
        let renderer = renderer(Theme::new(), RenderConfig::default());
        let mut page = record("a.html");
        page.layout = Some("nope".to_string());
        let tree = SiteTree::new();

        let err = renderer.render(&page, &tree).unwrap_err();

        match err {
            RenderError::MissingLayout { layout, page } => {
                assert_eq!(layout, "nope");
                assert_eq!(page, "a.html");
            }
            other => panic!("expected missing layout, got {other:?}"),
        }
    }

    #[test]
    fn keeps_front_matter_block() {
        let mut theme = Theme::new();
        theme.add_layout("default", "<main>{{ page.body | safe }}</main>").unwrap();
        let config = RenderConfig {
            keep_front_matter: true,
            ..RenderConfig::default()
        };
        let renderer = renderer(theme, config);
        let page = record("a.html");

        let out = renderer.render(&page, &SiteTree::new()).unwrap();

        assert_eq!(out, "---\ntitle: Buttons\n---\n\n<main><p>Press it.</p></main>");
    }

    #[test]
    fn kept_front_matter_parses_back() {
        let mut theme = Theme::new();
        theme.add_layout("default", "{{ page.body | safe }}").unwrap();
        let config = RenderConfig {
            keep_front_matter: true,
            ..RenderConfig::default()
        };
        let renderer = renderer(theme, config);
        let mut page = record("a.html");
        let (front_matter, _) = lectern_page::extract_frontmatter(
            "---\ntitle: Buttons\norder: 4\ntags: [a, b]\ndocs:\n  sass: scss/*.scss\n---\n",
        )
        .unwrap();
        page.front_matter = front_matter;

        let out = renderer.render(&page, &SiteTree::new()).unwrap();
        let (front_matter, body) = lectern_page::extract_frontmatter(&out).unwrap();

        assert_eq!(front_matter, page.front_matter);
        assert_eq!(body, "<p>Press it.</p>");
    }

    #[test]
    fn builtin_layout_lists_doclets() {
        let renderer = renderer(Theme::new(), RenderConfig::default());
        let mut tree = SiteTree::new();
        tree.upsert(record("buttons.html"), UpsertMode::Full);

        let html = renderer
            .render(tree.get("buttons.html").unwrap(), &tree)
            .unwrap();

        assert!(html.contains("<p>Press it.</p>"));
        assert!(html.contains("<code>button</code>"));
        assert!(html.contains("<code>color</code>"));
        assert!(html.contains("<em>button</em>"));
        assert!(html.contains(r#"id="sass-mixin-card""#));
        assert!(html.contains(r#"class="nav-item active""#));
    }
}
