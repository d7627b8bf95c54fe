//! `actrel translate`: write one specification per requested class.

use std::path::Path;

use actrel_emit::{translate_all, write_translation, WriteOutcome};
use actrel_model::{ModelSource, TranslationOptions};
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Which classes to translate.
#[derive(Clone, Copy)]
pub enum Selection<'a> {
    Named(&'a [String]),
    /// Every class with at least one connector.
    All,
}

/// Where translations go.
#[derive(Clone, Copy)]
pub enum Destination<'a> {
    Dir(&'a Path),
    Stdout,
}

/// Translate the selected classes. Each class is independent: failures are
/// reported as they happen and counted into the final error.
pub fn run(
    model: &Path,
    selection: Selection<'_>,
    destination: Destination<'_>,
    options: &TranslationOptions,
) -> Result<()> {
    let source = ModelSource::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;

    let classes: Vec<String> = match selection {
        Selection::Named(names) => names.to_vec(),
        Selection::All => source
            .classes_with_edges()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    if classes.is_empty() {
        bail!("no classes to translate (pass --class NAME or --all)");
    }
    debug!(count = classes.len(), model = %model.display(), "translating");

    let mut failed = 0;
    for result in translate_all(&source, &classes, options) {
        let translation = match result {
            Ok(translation) => translation,
            Err(e) => {
                eprintln!("error: {e}");
                failed += 1;
                continue;
            }
        };
        match destination {
            Destination::Stdout => print!("{}", translation.text),
            Destination::Dir(dir) => match write_translation(dir, &translation) {
                Ok((path, WriteOutcome::Written)) => println!("  wrote {}", path.display()),
                Ok((path, WriteOutcome::Unchanged)) => {
                    println!("  unchanged {}", path.display())
                }
                Err(e) => {
                    eprintln!("error: {}: {e}", translation.class);
                    failed += 1;
                }
            },
        }
    }

    if failed > 0 {
        bail!("{failed} of {} class(es) failed to translate", classes.len());
    }
    Ok(())
}
