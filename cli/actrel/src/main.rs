//! actrel CLI: translate behavior models into relational specifications.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use actrel_model::TranslationOptions;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::translate::{Destination, Selection};
use manifest::{ActrelManifest, MANIFEST_FILE};

#[derive(Parser)]
#[command(
    name = "actrel",
    version,
    about = "Translate behavior models into relational specifications"
)]
struct Cli {
    /// Log debug events (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new actrel project
    Init {
        /// Project name
        name: String,
    },
    /// Translate behavior classes into specification files
    Translate {
        /// Model file (.toml or .json; default: [project] model in actrel.toml)
        #[arg(long)]
        model: Option<PathBuf>,
        /// Class to translate (repeatable)
        #[arg(long = "class", value_name = "NAME")]
        classes: Vec<String>,
        /// Translate every class that has at least one connector
        #[arg(long, conflicts_with = "classes")]
        all: bool,
        /// Output directory (default: [output] dir in actrel.toml, or out/)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Run-command scope
        #[arg(long)]
        scope: Option<u32>,
        /// Print to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Show the inferred orderings of a class
    Inspect {
        /// Model file (.toml or .json; default: [project] model in actrel.toml)
        #[arg(long)]
        model: Option<PathBuf>,
        /// Class to inspect
        #[arg(long)]
        class: String,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Translate {
            model,
            classes,
            all,
            out,
            scope,
            stdout,
        } => {
            let project = Project::discover(&cwd)?;
            let model = project.model_path(model.as_deref(), &cwd)?;
            let out_dir = project.output_dir(out.as_deref(), &cwd);
            let mut options = project.translation_options();
            if let Some(scope) = scope {
                options.scope = scope;
            }
            let selection = if all {
                Selection::All
            } else {
                Selection::Named(&classes)
            };
            let destination = if stdout {
                Destination::Stdout
            } else {
                Destination::Dir(&out_dir)
            };
            commands::translate::run(&model, selection, destination, &options)
        }

        Commands::Inspect {
            model,
            class,
            format,
        } => {
            let project = Project::discover(&cwd)?;
            let model = project.model_path(model.as_deref(), &cwd)?;
            commands::inspect::run(&model, &class, format.as_deref())
        }
    }
}

/// The manifest in effect, if any, and the directory its paths are relative to.
struct Project {
    manifest: Option<ActrelManifest>,
    dir: PathBuf,
}

impl Project {
    /// Search upward from `cwd` for a manifest. Without one, paths resolve
    /// against `cwd` and built-in defaults apply.
    fn discover(cwd: &Path) -> anyhow::Result<Self> {
        match ActrelManifest::find_and_load(cwd)? {
            Some((manifest, dir)) => {
                debug!(dir = %dir.display(), "using project manifest");
                Ok(Self {
                    manifest: Some(manifest),
                    dir,
                })
            }
            None => Ok(Self {
                manifest: None,
                dir: cwd.to_path_buf(),
            }),
        }
    }

    fn model_path(&self, flag: Option<&Path>, cwd: &Path) -> anyhow::Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(cwd.join(path));
        }
        match &self.manifest {
            Some(manifest) => Ok(self.dir.join(&manifest.project.model)),
            None => anyhow::bail!(
                "no model given (pass --model or run inside a project with {MANIFEST_FILE})"
            ),
        }
    }

    fn output_dir(&self, flag: Option<&Path>, cwd: &Path) -> PathBuf {
        match (flag, &self.manifest) {
            (Some(path), _) => cwd.join(path),
            (None, Some(manifest)) => self.dir.join(&manifest.output.dir),
            (None, None) => cwd.join("out"),
        }
    }

    fn translation_options(&self) -> TranslationOptions {
        self.manifest
            .as_ref()
            .map(|m| m.translation.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod integration_tests {
    use std::fs;

    use actrel_emit::OrderingReport;
    use actrel_model::ModelSource;

    use super::*;

    const MIXED_MODEL: &str = r#"
[[class]]
name = "AtomicBehavior"

[[class]]
name = "Good"
[[class.field]]
name = "a"
type = "AtomicBehavior"
[[class.field]]
name = "b"
type = "AtomicBehavior"
[[class.edge]]
from = "a"
to = "b"

[[class]]
name = "Broken"
[[class.field]]
name = "s"
type = "AtomicBehavior"
[[class.field]]
name = "t"
type = "AtomicBehavior"
[[class.field]]
name = "u"
type = "AtomicBehavior"
[[class.edge]]
from = "s"
to = "t"
choice = true
[[class.edge]]
from = "s"
to = "u"
"#;

    /// Full workflow: init → translate → translate again → inspect.
    #[test]
    fn init_translate_inspect_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("workflow");

        // 1. Init
        commands::init::create_project(&project_path, "workflow").unwrap();

        // 2. Translate with manifest defaults
        let project = Project::discover(&project_path).unwrap();
        assert_eq!(project.dir, project_path);
        let model = project.model_path(None, &project_path).unwrap();
        let out_dir = project.output_dir(None, &project_path);
        assert_eq!(out_dir, project_path.join("out"));

        let classes = vec!["SimpleSequence".to_string()];
        commands::translate::run(
            &model,
            Selection::Named(&classes),
            Destination::Dir(&out_dir),
            &project.translation_options(),
        )
        .unwrap();
        let text = fs::read_to_string(out_dir.join("SimpleSequence.als")).unwrap();
        assert!(text.starts_with("// Generated by actrel from SimpleSequence.\n"));
        assert!(text.contains("functionFiltered[happensBefore, this.p1, this.p2]"));
        assert!(text.contains("for 10\n"));

        // 3. Re-running leaves identical output in place
        commands::translate::run(
            &model,
            Selection::All,
            Destination::Dir(&out_dir),
            &project.translation_options(),
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(out_dir.join("SimpleSequence.als")).unwrap(),
            text
        );

        // 4. Inspect
        let source = ModelSource::load(&model).unwrap();
        let report = OrderingReport::for_class(&source, "SimpleSequence").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&commands::inspect::render(&report, Some("json")).unwrap())
                .unwrap();
        assert_eq!(json["forward"][0]["before"], "p1");
        assert_eq!(json["inverse"][0]["after"], "p2");
        let text = commands::inspect::render(&report, None).unwrap();
        assert!(text.contains("p1 -> p2"));
    }

    #[test]
    fn failures_are_reported_and_others_complete() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.toml");
        fs::write(&model, MIXED_MODEL).unwrap();
        let out_dir = dir.path().join("out");

        let err = commands::translate::run(
            &model,
            Selection::All,
            Destination::Dir(&out_dir),
            &TranslationOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(out_dir.join("Good.als").is_file());
        assert!(!out_dir.join("Broken.als").exists());
    }

    #[test]
    fn flags_override_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("flags");
        commands::init::create_project(&project_path, "flags").unwrap();
        let project = Project::discover(&project_path.join("model")).unwrap();

        let model = project
            .model_path(Some(Path::new("other.json")), &project_path)
            .unwrap();
        assert_eq!(model, project_path.join("other.json"));
        assert_eq!(
            project.output_dir(Some(Path::new("gen")), &project_path),
            project_path.join("gen")
        );
        assert_eq!(
            project.model_path(None, &project_path.join("model")).unwrap(),
            project_path.join("model/behavior.toml")
        );
    }

    #[test]
    fn no_manifest_needs_a_model_flag() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project {
            manifest: None,
            dir: dir.path().to_path_buf(),
        };
        let err = project.model_path(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("--model"));
        assert_eq!(project.output_dir(None, dir.path()), dir.path().join("out"));
        assert_eq!(project.translation_options(), TranslationOptions::default());
    }

    #[test]
    fn empty_selection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.toml");
        fs::write(&model, "[[class]]\nname = \"Lonely\"\n").unwrap();
        let err = commands::translate::run(
            &model,
            Selection::All,
            Destination::Stdout,
            &TranslationOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no classes"));
    }

    #[test]
    fn inspect_rejects_unknown_format() {
        let source = ModelSource::parse_toml(MIXED_MODEL).unwrap();
        let report = OrderingReport::for_class(&source, "Good").unwrap();
        assert!(commands::inspect::render(&report, Some("yaml")).is_err());
    }

    #[test]
    fn cli_parses_translate_flags() {
        let cli = Cli::try_parse_from([
            "actrel", "-v", "translate", "--class", "A", "--class", "B", "--scope", "4",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Translate {
                classes,
                all,
                scope,
                ..
            } => {
                assert_eq!(classes, vec!["A", "B"]);
                assert!(!all);
                assert_eq!(scope, Some(4));
            }
            _ => panic!("expected translate"),
        }

        assert!(Cli::try_parse_from(["actrel", "translate", "--all", "--class", "A"]).is_err());
    }
}
