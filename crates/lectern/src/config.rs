//! lectern.toml loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lectern_adapters::{AdapterRegistry, SassAdapter, ScriptAdapter};
use lectern_page::CmarkRenderer;
use lectern_site::{ParserConfig, RenderConfig, Site, SiteConfig, Theme};
use serde::Deserialize;

/// Configuration file structure (lectern.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub pages: PagesConfig,
    pub output: OutputConfig,
    pub theme: ThemeConfig,
    pub adapters: AdaptersConfig,
    pub watch: WatchConfig,
    /// Free-form values exposed to layouts under `site`.
    pub site: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    pub root: PathBuf,
    /// Output extension, without the dot
    pub extension: String,
    /// Source extensions treated as pages
    pub sources: Vec<String>,
    /// Pages parsed at once during a full build
    pub concurrency: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        let site = SiteConfig::default();
        Self {
            root: PathBuf::from("docs"),
            extension: "html".to_string(),
            sources: site.page_extensions,
            concurrency: site.concurrency,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub keep_front_matter: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
            keep_front_matter: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub layouts: PathBuf,
    pub default_layout: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            layouts: PathBuf::from("layouts"),
            default_layout: "default".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdaptersConfig {
    /// Directory adapter patterns are resolved against
    pub base_dir: PathBuf,
    /// Bundled adapters to register
    pub enabled: Vec<String>,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            enabled: vec!["sass".to_string(), "js".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Extra paths whose changes trigger a full rebuild, such as adapter sources
    pub paths: Vec<PathBuf>,
}

/// A loaded config and the directory its relative paths are resolved against.
#[derive(Debug)]
pub struct Config {
    pub file: ConfigFile,
    pub base: PathBuf,
}

impl Config {
    /// Load configuration from `path` if it exists, defaults otherwise.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = fs::canonicalize(&base)
            .with_context(|| format!("Failed to resolve {}", base.display()))?;

        let file = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            file
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            ConfigFile::default()
        };

        Ok(Self { file, base })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }

    pub fn page_root(&self) -> PathBuf {
        self.resolve(&self.file.pages.root)
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.resolve(&self.file.theme.layouts)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.file.output.dir)
    }

    pub fn watch_paths(&self) -> Vec<PathBuf> {
        self.file.watch.paths.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn site_config(&self) -> Result<SiteConfig> {
        let site_data = match serde_json::to_value(&self.file.site)
            .context("Failed to convert [site] table")?
        {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        Ok(SiteConfig {
            parser: ParserConfig {
                page_root: self.page_root(),
                extension: self.file.pages.extension.clone(),
            },
            render: RenderConfig {
                default_layout: self.file.theme.default_layout.clone(),
                keep_front_matter: self.file.output.keep_front_matter,
                site_data,
            },
            page_extensions: self.file.pages.sources.clone(),
            concurrency: self.file.pages.concurrency,
        })
    }

    /// Registry holding the enabled bundled adapters.
    pub fn registry(&self) -> AdapterRegistry {
        let base_dir = self.resolve(&self.file.adapters.base_dir);
        let mut registry = AdapterRegistry::new();

        for name in &self.file.adapters.enabled {
            match name.as_str() {
                "sass" => {
                    registry.register("sass", SassAdapter::new(&base_dir));
                }
                "js" => {
                    registry.register("js", ScriptAdapter::new(&base_dir));
                }
                other => tracing::warn!("Unknown adapter '{}' in config, skipping", other),
            }
        }

        registry
    }

    pub fn theme(&self) -> Theme {
        let layouts = self.layouts_dir();
        if layouts.is_dir() {
            Theme::from_dir(&layouts)
        } else {
            Theme::new()
        }
    }

    /// Assemble a site from this config.
    pub fn site(&self) -> Result<Site> {
        Ok(Site::new(
            self.site_config()?,
            self.registry(),
            Arc::new(self.theme()),
            Arc::new(CmarkRenderer::new()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = Config::load(&temp.path().join("lectern.toml")).unwrap();

        let base = fs::canonicalize(temp.path()).unwrap();
        assert_eq!(config.page_root(), base.join("docs"));
        assert_eq!(config.output_dir(), base.join("dist"));
        assert_eq!(config.file.pages.extension, "html");
        assert_eq!(config.registry().names(), vec!["js", "sass"]);
    }

    #[test]
    fn reads_all_tables() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lectern.toml");
        fs::write(
            &path,
            r#"
[pages]
root = "content"
extension = "htm"

[output]
dir = "public"
keep_front_matter = true

[theme]
default_layout = "page"

[adapters]
base_dir = "src"
enabled = ["sass", "cobol"]

[watch]
paths = ["src/scss"]

[site]
title = "Handbook"
version = 3
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let site = config.site_config().unwrap();

        let base = fs::canonicalize(temp.path()).unwrap();
        assert_eq!(site.parser.page_root, base.join("content"));
        assert_eq!(site.parser.extension, "htm");
        assert!(site.render.keep_front_matter);
        assert_eq!(site.render.default_layout, "page");
        assert_eq!(site.render.site_data["title"], "Handbook");
        assert_eq!(site.render.site_data["version"], 3);
        assert_eq!(config.output_dir(), base.join("public"));
        assert_eq!(config.watch_paths(), vec![base.join("src/scss")]);
        assert_eq!(config.registry().names(), vec!["sass"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lectern.toml");
        fs::write(&path, "[pages\nroot = ").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
