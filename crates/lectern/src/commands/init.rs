//! Scaffold a lectern project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command. Files are created next to `config_path`; existing
/// files are kept unless `yes` is set.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing lectern...");

    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let files = [
        (config_path.to_path_buf(), DEFAULT_CONFIG),
        (root.join("docs/index.md"), DEFAULT_INDEX),
        (root.join("docs/getting-started.md"), DEFAULT_GETTING_STARTED),
        (root.join("docs/components/button.md"), DEFAULT_BUTTON_DOC),
        (root.join("src/scss/_button.scss"), DEFAULT_BUTTON_SCSS),
    ];

    for (path, contents) in files {
        if path.exists() && !yes {
            tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Created {}", path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'lectern build' to build the site.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lectern Configuration

[pages]
# Source directory for pages
root = "docs"

# Extension of generated pages
extension = "html"

[output]
# Output directory for built site
dir = "dist"

# Prefix each page with its front matter
keep_front_matter = false

[theme]
# Directory of layout templates; built-in layouts are used when missing
layouts = "layouts"
default_layout = "default"

[adapters]
# Directory adapter patterns are resolved against
base_dir = "."
enabled = ["sass", "js"]

[watch]
# Extra paths that trigger a rebuild in watch mode
paths = ["src"]

[site]
title = "My Documentation"
"#;

const DEFAULT_INDEX: &str = r#"---
order: 0
---

# Welcome

This is your documentation site, built by **lectern**.

Start with [Getting Started](getting-started.md).
"#;

const DEFAULT_GETTING_STARTED: &str = r#"---
order: 1
---

# Getting Started

Pages are markdown files under `docs/`. A numeric prefix such as `01-` sets
their position in the navigation and is dropped from the output name.

## Front matter

```yaml
---
title: Page Title
group: Guides
layout: default
order: 2
docs:
  sass: src/scss/*.scss
---
```

Without a `title`, the first `# Heading` is used.

## Building

```bash
lectern build
```

Use `lectern watch` to rebuild pages as you edit them.
"#;

const DEFAULT_BUTTON_DOC: &str = r#"---
title: Button
group: Components
docs:
  sass: src/scss/_button.scss
---

Buttons trigger actions. The mixins and variables below are read from the
stylesheet's doc comments.
"#;

const DEFAULT_BUTTON_SCSS: &str = r#"/// Background of primary buttons.
/// @type Color
$button-primary: #0a7cff !default;

/// Base button styles.
/// @param {Color} $color [$button-primary] - Background color
@mixin button($color: $button-primary) {
  background: $color;
  border-radius: 4px;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_project() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("lectern.toml");

        run(&config, false).await.unwrap();

        assert!(config.exists());
        assert!(temp.path().join("docs/index.md").exists());
        assert!(temp.path().join("docs/components/button.md").exists());
        assert!(temp.path().join("src/scss/_button.scss").exists());
    }

    #[tokio::test]
    async fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("lectern.toml");
        fs::write(&config, "# mine").unwrap();

        run(&config, false).await.unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "# mine");

        run(&config, true).await.unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), DEFAULT_CONFIG);
    }

    #[tokio::test]
    async fn scaffold_builds() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("lectern.toml");
        run(&config, false).await.unwrap();

        crate::commands::build::run(&config, None).await.unwrap();

        let button = fs::read_to_string(temp.path().join("dist/components/button.html")).unwrap();
        assert!(button.contains("<code>button-primary</code>"));
        assert!(temp.path().join("dist/getting-started.html").exists());
    }
}
