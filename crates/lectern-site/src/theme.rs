//! Layout templates.

use std::path::Path;

use minijinja::{context, Environment, ErrorKind, Value};

/// Template engine used for page layouts and for template-language sources.
pub trait TemplateEngine: Send + Sync {
    /// Render the layout named `layout` with `context`.
    fn render(&self, layout: &str, context: Value) -> Result<String, TemplateError>;

    /// Render a template given as source text.
    fn render_str(&self, source: &str, context: Value) -> Result<String, TemplateError>;
}

/// Errors raised by a [`TemplateEngine`].
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Render(String),
}

impl TemplateError {
    fn from_minijinja(name: &str, err: minijinja::Error) -> Self {
        if err.kind() == ErrorKind::TemplateNotFound {
            Self::NotFound(name.to_string())
        } else {
            Self::Render(err.to_string())
        }
    }
}

/// Minijinja theme: layouts from a directory plus built-in fallbacks.
pub struct Theme {
    env: Environment<'static>,
}

impl Theme {
    /// A theme with only the built-in layouts.
    pub fn new() -> Self {
        let mut env = Environment::new();

        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("Failed to add built-in template");
        }

        Self { env }
    }

    /// A theme loading layouts from `dir`. Built-ins fill in any of
    /// `base.html`, `nav.html` and `default.html` the directory lacks.
    pub fn from_dir(dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));

        for (name, source) in BUILTIN_TEMPLATES {
            if !dir.join(name).is_file() {
                env.add_template_owned(name.to_string(), source.to_string())
                    .expect("Failed to add built-in template");
            }
        }

        Self { env }
    }

    /// Register a layout from source, replacing any layout with that name.
    pub fn add_layout(&mut self, layout: &str, source: &str) -> Result<(), TemplateError> {
        self.env
            .add_template_owned(template_name(layout), source.to_string())
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for Theme {
    fn render(&self, layout: &str, context: Value) -> Result<String, TemplateError> {
        let name = template_name(layout);
        let tmpl = self
            .env
            .get_template(&name)
            .map_err(|e| TemplateError::from_minijinja(layout, e))?;

        tmpl.render(context)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    fn render_str(&self, source: &str, context: Value) -> Result<String, TemplateError> {
        self.env
            .render_str(source, context)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

/// File name of a layout: `docs` becomes `docs.html`, names with an
/// extension are used as-is.
pub fn template_name(layout: &str) -> String {
    if Path::new(layout).extension().is_some() {
        layout.to_string()
    } else {
        format!("{layout}.html")
    }
}

/// Context used for template-language page sources: nothing page-local.
pub fn empty_context() -> Value {
    context! {}
}

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("base.html", BASE_TEMPLATE),
    ("nav.html", NAV_TEMPLATE),
    ("default.html", DEFAULT_TEMPLATE),
];

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ page.title }}{% if site.title %} - {{ site.title }}{% endif %}</title>
  {% for style in site.styles %}<link rel="stylesheet" href="{{ style }}">
  {% endfor %}
</head>
<body>
  <div class="layout">
    <nav class="sidebar">
      {% include "nav.html" %}
    </nav>
    <main class="main">
      {% block content %}{% endblock %}
    </main>
  </div>
  {% for script in site.scripts %}<script src="{{ script }}"></script>
  {% endfor %}
</body>
</html>"##;

const NAV_TEMPLATE: &str = r##"<div class="nav-header">
  <a href="{{ site.base_url or "/" }}" class="nav-logo">{{ site.title or "Documentation" }}</a>
</div>
{% for group in site.groups %}
<div class="nav-group">
  {% if group.name %}<h2 class="nav-group-title">{{ group.name }}</h2>{% endif %}
  <ul class="nav-list">
  {% for item in group.pages %}
    <li class="nav-item{% if item.output_path == page.output_path %} active{% endif %}">
      <a href="{{ site.base_url or "/" }}{{ item.output_path }}">{{ item.title }}</a>
    </li>
  {% endfor %}
  </ul>
</div>
{% endfor %}"##;

const DEFAULT_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="doc">
  <h1>{{ page.title }}</h1>
  <div class="content">
    {{ page.body | safe }}
  </div>
</article>

{% for adapter, kinds in page.docs | items %}{% if kinds is mapping %}
<section class="docs docs-{{ adapter }}">
{% for kind, doclets in kinds | items %}{% if doclets %}
  <h2 id="{{ adapter }}-{{ kind }}">{{ kind | title }}</h2>
  {% for doclet in doclets %}
  {% set label = doclet.name if doclet.name is defined else (doclet.context.name if doclet.context is defined else kind) %}
  <article class="doclet doclet-{{ kind }}" id="{{ adapter }}-{{ kind }}-{{ helpers.slugify(label) }}">
    <h3><code>{{ label }}</code></h3>
    {% if doclet.description %}{{ helpers.markdown(doclet.description) | safe }}{% endif %}
  </article>
  {% endfor %}
{% endif %}{% endfor %}
</section>
{% endif %}{% endfor %}
{% endblock %}"##;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn layout_names_get_html_extension() {
        assert_eq!(template_name("default"), "default.html");
        assert_eq!(template_name("api.html"), "api.html");
        assert_eq!(template_name("feed.xml"), "feed.xml");
    }

    #[test]
    fn missing_layout_is_not_found() {
        let theme = Theme::new();

        let result = theme.render("nope", context! {});

        assert!(matches!(result, Err(TemplateError::NotFound(name)) if name == "nope"));
    }

    #[test]
    fn renders_added_layout() {
        let mut theme = Theme::new();
        theme
            .add_layout("plain", "<h1>{{ page.title }}</h1>{{ page.body | safe }}")
            .unwrap();

        let html = theme
            .render(
                "plain",
                context! { page => context! { title => "Intro", body => "<p>Hi</p>" } },
            )
            .unwrap();

        assert_eq!(html, "<h1>Intro</h1><p>Hi</p>");
    }

    #[test]
    fn renders_template_source() {
        let theme = Theme::new();

        let text = theme
            .render_str("{% for i in range(3) %}{{ i }}{% endfor %}", empty_context())
            .unwrap();

        assert_eq!(text, "012");
    }

    #[test]
    fn directory_layouts_override_builtins() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("default.html"), "custom {{ page.title }}").unwrap();
        fs::write(temp.path().join("api.html"), "{% extends \"base.html\" %}").unwrap();

        let theme = Theme::from_dir(temp.path());

        let custom = theme
            .render("default", context! { page => context! { title => "A" } })
            .unwrap();
        assert_eq!(custom, "custom A");

        let extended = theme
            .render(
                "api",
                context! { page => context! { title => "B" }, site => context! {} },
            )
            .unwrap();
        assert!(extended.contains("<title>B</title>"));
    }
}
