//! Doc comment annotation parsing shared by the bundled adapters.
//!
//! A comment body is free-form description text followed by `@name value`
//! annotations. Lines that do not start with `@` continue the previous
//! annotation, or the description if none has started yet.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:\{([^}]*)\}\s*)?(\S+)(?:\s*\[([^\]]*)\])?(?:\s*-?\s*(.*))?$").unwrap()
});

static TYPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(?:\{([^}]*)\}\s*)?(.*)$").unwrap());

/// One `@name value` annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub value: String,
}

/// A parsed doc comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocComment {
    pub description: String,
    pub annotations: Vec<Annotation>,
}

impl DocComment {
    /// Parse comment lines that have already had their comment markers removed.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut description: Vec<&str> = Vec::new();
        let mut annotations: Vec<Annotation> = Vec::new();

        for line in lines {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix('@') {
                let (name, value) = match rest.find(char::is_whitespace) {
                    Some(i) => (&rest[..i], rest[i..].trim()),
                    None => (rest, ""),
                };
                annotations.push(Annotation {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            } else if let Some(current) = annotations.last_mut() {
                if !current.value.is_empty() {
                    current.value.push('\n');
                }
                current.value.push_str(line.trim_end());
            } else {
                description.push(line.trim_end());
            }
        }

        Self {
            description: description.join("\n").trim().to_string(),
            annotations: annotations
                .into_iter()
                .map(|mut a| {
                    a.value = a.value.trim_end().to_string();
                    a
                })
                .collect(),
        }
    }

    /// First value of the named annotation.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.annotations
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All values of the named annotations.
    pub fn all<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a str> {
        self.annotations
            .iter()
            .filter(move |a| names.contains(&a.name.as_str()))
            .map(|a| a.value.as_str())
    }

    /// Annotations other than `skip`, as `name -> [values]`.
    pub fn extra_fields(&self, skip: &[&str]) -> Map<String, Value> {
        let mut fields = Map::new();
        for annotation in &self.annotations {
            if skip.contains(&annotation.name.as_str()) {
                continue;
            }
            let entry = fields
                .entry(annotation.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = entry {
                values.push(Value::String(annotation.value.clone()));
            }
        }
        fields
    }
}

/// Parse a parameter annotation: `{type} name [default] - description`.
///
/// A leading `$` on the name is dropped.
pub fn parse_param(value: &str) -> Value {
    let Some(caps) = PARAM.captures(value.trim()) else {
        return json!({ "name": value.trim() });
    };

    let mut param = Map::new();
    if let Some(ty) = caps.get(1) {
        param.insert("type".to_string(), json!(ty.as_str().trim()));
    }
    let name = caps.get(2).map_or("", |m| m.as_str());
    param.insert("name".to_string(), json!(name.trim_start_matches('$')));
    if let Some(default) = caps.get(3) {
        param.insert("default".to_string(), json!(default.as_str().trim()));
    }
    if let Some(desc) = caps.get(4).map(|m| m.as_str().trim()).filter(|d| !d.is_empty()) {
        param.insert("description".to_string(), json!(desc));
    }
    Value::Object(param)
}

/// Parse a typed annotation such as a return value: `{type} description`.
pub fn parse_typed(value: &str) -> Value {
    let mut typed = Map::new();
    if let Some(caps) = TYPED.captures(value.trim()) {
        if let Some(ty) = caps.get(1) {
            typed.insert("type".to_string(), json!(ty.as_str().trim()));
        }
        if let Some(desc) = caps.get(2).map(|m| m.as_str().trim()).filter(|d| !d.is_empty()) {
            typed.insert("description".to_string(), json!(desc));
        }
    }
    Value::Object(typed)
}
