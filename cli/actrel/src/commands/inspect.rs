//! `actrel inspect`: show the inferred orderings of one class.

use std::path::Path;

use actrel_emit::OrderingReport;
use actrel_model::ModelSource;
use anyhow::{bail, Context, Result};

/// Print the forward and inverse ordering maps of `class`.
pub fn run(model: &Path, class: &str, format: Option<&str>) -> Result<()> {
    let source = ModelSource::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let report = OrderingReport::for_class(&source, class)
        .with_context(|| format!("inspecting {class}"))?;
    print!("{}", render(&report, format)?);
    Ok(())
}

/// Format a report as `text` (default) or `json`.
pub(crate) fn render(report: &OrderingReport, format: Option<&str>) -> Result<String> {
    match format.unwrap_or("text") {
        "text" => Ok(report.to_string()),
        "json" => {
            let mut json =
                serde_json::to_string_pretty(report).context("serializing ordering report")?;
            json.push('\n');
            Ok(json)
        }
        other => bail!("unknown format '{other}' (expected text or json)"),
    }
}
