//! Serializer, output writer and translation pipeline for actrel.
//!
//! [`translate_class`] runs one class through ordering inference, constraint
//! assembly and [`render_module`]; [`write_output`] stores the text.

pub mod error;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod report;

pub use error::{ClassError, Result, TranslateError};
pub use output::{output_path, write_output, write_translation, WriteOutcome};
pub use pipeline::{build_module, translate_all, translate_class, Translation};
pub use render::{render_expr, render_module};
pub use report::{EntryReport, OrderingReport};
