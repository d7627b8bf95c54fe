//! Relational constraint model for actrel.
//!
//! A [`Module`] holds the signatures, facts, local predicates and run command
//! generated for one behavior class. The [`Assembler`] fills it from inferred
//! orderings, and [`ModelSource`] reads the classes to translate from a model
//! file.

pub mod assemble;
pub mod error;
pub mod expr;
pub mod library;
pub mod module;
pub mod options;
pub mod signature;
pub mod source;

pub use assemble::{Assembler, EXAMPLE_HOOK};
pub use error::{ConfigurationError, ModelError};
pub use expr::{BinaryOp, Expr, FuncRef, LibraryFn, LocalFn, QuantKind, UnaryOp};
pub use library::{FuncDecl, FuncKind, Library, Param};
pub use module::{Command, Module};
pub use options::{TranslationOptions, DEFAULT_SCOPE};
pub use signature::{Field, Signature, OCCURRENCE};
pub use source::{ClassDecl, EdgeDecl, FieldDecl, ModelSource};
