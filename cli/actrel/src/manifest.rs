//! `actrel.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use actrel_model::TranslationOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the manifest file searched for by every command.
pub const MANIFEST_FILE: &str = "actrel.toml";

/// The top-level manifest structure for an actrel project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActrelManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Settings handed to the constraint assembler.
    #[serde(default)]
    pub translation: TranslationOptions,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Default model file, relative to the project directory.
    #[serde(default = "default_model")]
    pub model: PathBuf,
}

fn default_model() -> PathBuf {
    PathBuf::from("model/behavior.toml")
}

/// Output section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for generated `.als` files, relative to the project directory.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl ActrelManifest {
    /// Search upward from `start_dir` for an `actrel.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: ActrelManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing actrel.toml")
    }

    /// Generate the default template for `actrel init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
model = "model/behavior.toml"

[output]
dir = "out"

[translation]
scope = 10
non_zero_duration_only = true
"#
        )
    }
}
