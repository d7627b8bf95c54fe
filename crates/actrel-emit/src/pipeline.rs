//! Class translation: model -> graphs -> orderings -> module -> text.

use std::sync::Arc;

use actrel_core::infer;
use actrel_model::{Assembler, Library, ModelSource, Module, TranslationOptions};
use tracing::{info, info_span, warn};

use crate::error::{ClassError, Result};
use crate::render::render_module;

/// One translated class.
#[derive(Debug, Clone)]
pub struct Translation {
    pub class: String,
    pub module: Module,
    pub text: String,
}

/// Assemble the module for `class`: every declared signature, facts for the
/// class and each behavior it reaches through its fields, and the run command.
pub fn build_module(
    source: &ModelSource,
    class: &str,
    options: &TranslationOptions,
    library: Arc<Library>,
) -> Result<Module> {
    let behaviors = source.behaviors_from(class)?;

    let mut module = Module::new(class, library);
    for signature in source.signatures() {
        module.add_signature(signature)?;
    }

    let mut assembler = Assembler::new(&mut module, options);
    for name in &behaviors {
        let graph = source.graph(name)?;
        let orderings = infer(&graph)?;
        assembler.signature(name, &graph, &orderings)?;
    }
    assembler.finish(class)?;
    Ok(module)
}

/// Translate one class to specification text.
pub fn translate_class(
    source: &ModelSource,
    class: &str,
    options: &TranslationOptions,
    library: Arc<Library>,
) -> Result<Translation> {
    let span = info_span!("translate", class = %class);
    let _enter = span.enter();

    let module = build_module(source, class, options, library)?;
    let text = render_module(&module);
    info!(
        signatures = module.signatures().len(),
        bytes = text.len(),
        "translated"
    );
    Ok(Translation {
        class: class.to_string(),
        module,
        text,
    })
}

/// Translate each class independently. A failure is recorded for its class
/// and the remaining classes still run.
pub fn translate_all(
    source: &ModelSource,
    classes: &[String],
    options: &TranslationOptions,
) -> Vec<std::result::Result<Translation, ClassError>> {
    let library = Arc::new(Library::standard());
    classes
        .iter()
        .map(|class| {
            translate_class(source, class, options, Arc::clone(&library)).map_err(|error| {
                warn!(class = %class, %error, "translation failed");
                ClassError {
                    class: class.clone(),
                    error,
                }
            })
        })
        .collect()
}
