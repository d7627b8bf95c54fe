//! `actrel init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{ActrelManifest, MANIFEST_FILE};

/// Sample model: two atomic steps in sequence.
pub const SAMPLE_MODEL: &str = r#"# Behavior classes to translate. Each attribute is a step; each edge is a
# precedence connector between two steps of the same class.

[[class]]
name = "AtomicBehavior"

[[class]]
name = "SimpleSequence"

[[class.field]]
name = "p1"
type = "AtomicBehavior"

[[class.field]]
name = "p2"
type = "AtomicBehavior"

[[class.edge]]
from = "p1"
to = "p2"
"#;

/// Create a new actrel project named `name` relative to the working directory.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("model")).context("creating model/ directory")?;
    fs::create_dir_all(project_dir.join("out")).context("creating out/ directory")?;

    fs::write(project_dir.join(MANIFEST_FILE), ActrelManifest::template(name))
        .context("writing actrel.toml")?;
    fs::write(project_dir.join("model").join("behavior.toml"), SAMPLE_MODEL)
        .context("writing model/behavior.toml")?;
    fs::write(project_dir.join(".gitignore"), "out/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/model/behavior.toml");
    println!("  {name}/out/");
    println!("  {name}/.gitignore");

    Ok(())
}
