//! Predicate and function declarations, and the fixed external library.
//!
//! The library predicates (`happensBefore`, `functionFiltered`, ...) are
//! defined by a pre-existing specification module that every generated file
//! opens. They are declared here only so calls can be built and arity-checked;
//! their bodies are never rendered.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::expr::{Expr, FuncRef, LibraryFn};

/// Whether a declaration is a predicate (formula) or a function (expression).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuncKind {
    Pred,
    Fun,
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_name: String,
}

impl Param {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A predicate or function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub kind: FuncKind,
    pub params: Vec<Param>,
    /// Result type of a function; `None` for predicates.
    pub returns: Option<String>,
    /// `None` renders as an empty body.
    pub body: Option<Expr>,
}

impl FuncDecl {
    /// A predicate with no parameters and the given body.
    pub fn pred(name: impl Into<String>, body: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            kind: FuncKind::Pred,
            params: Vec::new(),
            returns: None,
            body,
        }
    }

    /// A function with a result type.
    pub fn fun(name: impl Into<String>, returns: impl Into<String>, body: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            kind: FuncKind::Fun,
            params: Vec::new(),
            returns: Some(returns.into()),
            body,
        }
    }

    pub fn with_param(mut self, name: &str, type_name: &str) -> Self {
        self.params.push(Param::new(name, type_name));
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The fixed, read-only library of predicates and functions.
///
/// Shared between translations; a module keeps an `Arc` to it.
#[derive(Debug, Clone, Default)]
pub struct Library {
    decls: Vec<FuncDecl>,
}

const RELATION: &str = "Occurrence->Occurrence";

impl Library {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordering and transfer library every generated module opens.
    pub fn standard() -> Self {
        let mut lib = Library::new();
        lib.declare(FuncDecl::fun("happensBefore", RELATION, None));
        for name in ["bijectionFiltered", "functionFiltered", "inverseFunctionFiltered"] {
            lib.declare(
                FuncDecl::pred(name, None)
                    .with_param("rel", RELATION)
                    .with_param("from", "set Occurrence")
                    .with_param("to", "set Occurrence"),
            );
        }
        for name in [
            "subsettingItemRuleForSources",
            "subsettingItemRuleForTargets",
            "isAfterSource",
            "isBeforeTarget",
        ] {
            lib.declare(FuncDecl::pred(name, None).with_param("trans", "Occurrence->Occurrence"));
        }
        for name in ["steps", "inputs", "outputs", "items"] {
            lib.declare(FuncDecl::fun(name, "Occurrence->univ", None));
        }
        lib.declare(FuncDecl::pred("nonZeroDurationOnly", None));
        lib
    }

    /// Add a declaration and return its handle.
    pub fn declare(&mut self, decl: FuncDecl) -> LibraryFn {
        self.decls.push(decl);
        LibraryFn((self.decls.len() - 1) as u16)
    }

    /// Find a declaration by name.
    pub fn lookup(&self, name: &str) -> Option<LibraryFn> {
        self.decls
            .iter()
            .position(|d| d.name == name)
            .map(|i| LibraryFn(i as u16))
    }

    pub fn get(&self, id: LibraryFn) -> Option<&FuncDecl> {
        self.decls.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Build an arity-checked call to a library declaration.
    pub fn call(&self, name: &str, args: Vec<Expr>) -> Result<Expr, ConfigurationError> {
        let id = self
            .lookup(name)
            .ok_or_else(|| ConfigurationError::UnknownFunction(name.to_string()))?;
        let expected = self.decls[id.0 as usize].arity();
        if expected != args.len() {
            return Err(ConfigurationError::Arity {
                name: name.to_string(),
                expected,
                found: args.len(),
            });
        }
        Ok(Expr::Call(FuncRef::Library(id), args))
    }

    /// A zero-argument library function used as a relation (`steps`, `happensBefore`).
    pub fn relation(&self, name: &str) -> Result<Expr, ConfigurationError> {
        self.call(name, Vec::new())
    }
}
