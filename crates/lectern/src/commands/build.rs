//! Site build command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use lectern_site::{BuildReport, OutputReport, Site};

use crate::config::Config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building documentation site...");

    let config = Config::load(config_path)?;
    let output_dir = output.unwrap_or_else(|| config.output_dir());
    let site = config.site()?;

    let (report, written) = build_site(&site, &output_dir).await?;
    let failed = report.failures.len() + written.failures.len();
    if failed > 0 {
        bail!("{} of {} pages failed", failed, report.pages + report.failures.len());
    }

    tracing::info!("Output: {}", written.output_dir.display());

    Ok(())
}

/// Parse every page source, render the tree and write it to `output_dir`.
/// Page failures are logged and returned in the reports.
pub async fn build_site(site: &Site, output_dir: &Path) -> Result<(BuildReport, OutputReport)> {
    let paths = site.discover_pages()?;
    let report = site.build(&paths).await;
    for failure in &report.failures {
        tracing::error!("{}", failure);
    }

    let written = site.write_output(output_dir).await?;
    for failure in &written.failures {
        tracing::error!("{}", failure);
    }

    tracing::info!(
        "Built {} pages in {}ms, wrote {}",
        report.pages,
        report.duration_ms,
        written.written
    );

    Ok((report, written))
}
