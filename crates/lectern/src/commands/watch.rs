//! Watch mode: full build, then incremental rebuilds on change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lectern_site::{ParseMode, ParseOutcome, Site};

use crate::commands::build::build_site;
use crate::config::Config;
use crate::watcher::{FileWatcher, WatchEvent};

/// What a file change requires.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Reparse one page and rewrite the site.
    Reparse(PathBuf),
    /// Drop one page and rewrite the site.
    Remove(PathBuf),
    /// Reload layouts and adapter sources and build from scratch.
    Rebuild,
    Ignore,
}

/// Run the watch command until interrupted.
pub async fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path)?;
    let output_dir = std::path::absolute(output.unwrap_or_else(|| config.output_dir()))
        .context("Failed to resolve output directory")?;

    let mut site = config.site()?;
    build_site(&site, &output_dir).await?;

    let mut paths = vec![config.page_root(), config.layouts_dir()];
    paths.extend(config.watch_paths());
    let (_watcher, mut rx) = FileWatcher::new(&paths).context("Failed to start file watcher")?;

    tracing::info!("Watching {} for changes (Ctrl+C to stop)", config.page_root().display());

    loop {
        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
        };

        match classify(&site, &config, &output_dir, &event) {
            Action::Reparse(path) => {
                match site.parse(&path, ParseMode::Incremental).await {
                    Ok(ParseOutcome::Stored { output_path, .. }) => {
                        tracing::info!("Rebuilt {}", output_path);
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::error!("{}", e);
                        continue;
                    }
                }
                rewrite(&site, &output_dir).await;
            }
            Action::Remove(path) => {
                if let Some(record) = site.remove(&path).await {
                    let stale = output_dir.join(&record.output_path);
                    if let Err(e) = tokio::fs::remove_file(&stale).await {
                        tracing::debug!("Could not remove {}: {}", stale.display(), e);
                    }
                    tracing::info!("Removed {}", record.output_path);
                    rewrite(&site, &output_dir).await;
                }
            }
            Action::Rebuild => {
                tracing::info!("{} changed, rebuilding", event.path().display());
                site = config.site()?;
                if let Err(e) = build_site(&site, &output_dir).await {
                    tracing::error!("{:#}", e);
                }
            }
            Action::Ignore => {}
        }
    }

    Ok(())
}

async fn rewrite(site: &Site, output_dir: &Path) {
    match site.write_output(output_dir).await {
        Ok(report) => {
            for failure in &report.failures {
                tracing::error!("{}", failure);
            }
        }
        Err(e) => tracing::error!("{}", e),
    }
}

fn classify(site: &Site, config: &Config, output_dir: &Path, event: &WatchEvent) -> Action {
    let path = event.path();
    if path.starts_with(output_dir) {
        return Action::Ignore;
    }

    if path.starts_with(config.page_root()) {
        if !site.is_page_source(path) {
            return Action::Ignore;
        }
        return match event {
            WatchEvent::Changed(path) => Action::Reparse(path.clone()),
            WatchEvent::Removed(path) => Action::Remove(path.clone()),
        };
    }

    Action::Rebuild
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn classifies_changes() {
        let temp = tempdir().unwrap();
        let config = Config::load(&temp.path().join("lectern.toml")).unwrap();
        let site = config.site().unwrap();
        let output_dir = config.output_dir();
        let page = config.page_root().join("guide/a.md");

        assert_eq!(
            classify(&site, &config, &output_dir, &WatchEvent::Changed(page.clone())),
            Action::Reparse(page.clone())
        );
        assert_eq!(
            classify(&site, &config, &output_dir, &WatchEvent::Removed(page.clone())),
            Action::Remove(page)
        );
        assert_eq!(
            classify(
                &site,
                &config,
                &output_dir,
                &WatchEvent::Changed(config.page_root().join("logo.png"))
            ),
            Action::Ignore
        );
        assert_eq!(
            classify(
                &site,
                &config,
                &output_dir,
                &WatchEvent::Changed(output_dir.join("a.html"))
            ),
            Action::Ignore
        );
        assert_eq!(
            classify(
                &site,
                &config,
                &output_dir,
                &WatchEvent::Changed(config.layouts_dir().join("default.html"))
            ),
            Action::Rebuild
        );
    }
}
