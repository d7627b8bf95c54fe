//! The translated output unit: signatures, one combined fact, local
//! predicates and a run command.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::expr::{Expr, FuncRef, LocalFn};
use crate::library::{FuncDecl, Library};
use crate::signature::{Field, Signature};

/// A scoped run command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub label: String,
    pub body: Expr,
    /// Overall instance bound.
    pub scope: u32,
    /// Exact instance counts for individual signatures, in render order.
    pub exact: Vec<(String, u32)>,
}

impl Command {
    pub fn new(label: impl Into<String>, body: Expr, scope: u32) -> Self {
        Self {
            label: label.into(),
            body,
            scope,
            exact: Vec::new(),
        }
    }
}

/// A module under construction for one translated class.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    imports: Vec<String>,
    library: Arc<Library>,
    signatures: Vec<Signature>,
    fact: Option<Expr>,
    functions: Vec<FuncDecl>,
    command: Option<Command>,
}

impl Module {
    pub fn new(name: impl Into<String>, library: Arc<Library>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            library,
            signatures: Vec::new(),
            fact: None,
            functions: Vec::new(),
            command: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn set_imports(&mut self, imports: Vec<String>) {
        self.imports = imports;
    }

    // --- Signatures ---

    /// Declare a signature. Names must be unique.
    pub fn add_signature(&mut self, signature: Signature) -> Result<(), ConfigurationError> {
        if self.signature(&signature.name).is_some() {
            return Err(ConfigurationError::DuplicateSignature(signature.name));
        }
        self.signatures.push(signature);
        Ok(())
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    pub fn require_signature(&self, name: &str) -> Result<&Signature, ConfigurationError> {
        self.signature(name)
            .ok_or_else(|| ConfigurationError::UnknownSignature(name.to_string()))
    }

    /// Signatures in declaration order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// `name` followed by its declared ancestors, nearest first.
    fn lineage(&self, name: &str) -> Vec<&Signature> {
        let mut out = Vec::new();
        let mut current = self.signature(name);
        while let Some(sig) = current {
            // Cycle guard; the source reader rejects cyclic hierarchies.
            if out.len() > self.signatures.len() {
                break;
            }
            out.push(sig);
            current = sig.parent.as_deref().and_then(|p| self.signature(p));
        }
        out
    }

    /// Whether `name` or any of its ancestors declares a parameter field.
    pub fn has_parameters(&self, name: &str) -> bool {
        self.lineage(name).iter().any(|sig| sig.has_parameters())
    }

    /// Step fields of `name` including inherited ones, root-most ancestor
    /// first.
    pub fn inherited_step_fields(&self, name: &str) -> Vec<&Field> {
        self.lineage(name)
            .into_iter()
            .rev()
            .flat_map(|sig| sig.step_fields())
            .collect()
    }

    // --- Facts ---

    /// Conjoin `fact` onto the module fact.
    pub fn add_fact(&mut self, fact: Expr) {
        self.fact = Some(match self.fact.take() {
            Some(existing) => existing.and(fact),
            None => fact,
        });
    }

    pub fn fact(&self) -> Option<&Expr> {
        self.fact.as_ref()
    }

    // --- Local predicates and functions ---

    /// Declare a module-local predicate or function and return its handle.
    pub fn define(&mut self, decl: FuncDecl) -> FuncRef {
        self.functions.push(decl);
        FuncRef::Local(LocalFn((self.functions.len() - 1) as u16))
    }

    /// Resolve any handle, library or local.
    pub fn function(&self, func: FuncRef) -> Option<&FuncDecl> {
        match func {
            FuncRef::Library(id) => self.library.get(id),
            FuncRef::Local(id) => self.functions.get(id.0 as usize),
        }
    }

    pub fn local_functions(&self) -> &[FuncDecl] {
        &self.functions
    }

    // --- Command ---

    pub fn set_command(&mut self, command: Command) {
        self.command = Some(command);
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// Every callable reachable from the fact and the command, following
    /// local bodies transitively. Each handle appears once, in
    /// first-reference order.
    pub fn referenced(&self) -> Vec<FuncRef> {
        let mut pending: VecDeque<FuncRef> = VecDeque::new();
        if let Some(fact) = &self.fact {
            pending.extend(fact.calls());
        }
        if let Some(command) = &self.command {
            pending.extend(command.body.calls());
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        while let Some(func) = pending.pop_front() {
            if !seen.insert(func) {
                continue;
            }
            if let Some(body) = self.function(func).and_then(|d| d.body.as_ref()) {
                pending.extend(body.calls());
            }
            out.push(func);
        }
        out
    }

    /// Check that every field of every declared signature targets a declared
    /// signature.
    pub fn check_field_types(&self) -> Result<(), ConfigurationError> {
        self.signatures
            .iter()
            .try_for_each(|sig| self.require_field_types(sig))
    }

    /// Check the field targets of one signature.
    pub fn require_field_types(&self, sig: &Signature) -> Result<(), ConfigurationError> {
        match sig.fields.iter().find(|f| self.signature(&f.target).is_none()) {
            Some(field) => Err(ConfigurationError::UnknownFieldType {
                field: field.qualified_name(),
                type_name: field.target.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Module {
        Module::new("Test", Arc::new(Library::standard()))
    }

    #[test]
    fn duplicate_signature_rejected() {
        let mut m = module();
        m.add_signature(Signature::occurrence()).unwrap();
        let err = m.add_signature(Signature::occurrence()).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateSignature(_)));
    }

    #[test]
    fn facts_are_conjoined_in_order() {
        let mut m = module();
        assert!(m.fact().is_none());
        m.add_fact(Expr::var("a"));
        m.add_fact(Expr::var("b"));
        m.add_fact(Expr::var("c"));
        assert_eq!(m.fact().unwrap().conjuncts().len(), 3);
    }

    fn names(m: &Module, refs: &[FuncRef]) -> Vec<String> {
        refs.iter()
            .filter_map(|&f| m.function(f).map(|d| d.name.clone()))
            .collect()
    }

    #[test]
    fn referenced_follows_local_bodies_in_order() {
        let mut m = module();
        let hb = m.library().relation("happensBefore").unwrap();
        let inner = m.define(FuncDecl::pred("inner", Some(hb.some())));
        let outer = m.define(FuncDecl::pred("outer", Some(Expr::Call(inner, vec![]))));
        let steps = m.library().relation("steps").unwrap();
        m.set_command(Command::new(
            "show",
            Expr::Call(outer, vec![]).and(steps.some()).and(Expr::Call(outer, vec![])),
            10,
        ));

        assert_eq!(
            names(&m, &m.referenced()),
            vec!["outer", "steps", "inner", "happensBefore"]
        );
    }

    #[test]
    fn unreferenced_locals_are_left_out() {
        let mut m = module();
        m.define(FuncDecl::pred("unused", None));
        let used = m.define(FuncDecl::pred("used", None));
        m.add_fact(Expr::Call(used, vec![]));
        assert_eq!(names(&m, &m.referenced()), vec!["used"]);
    }

    #[test]
    fn field_types_checked_across_all_signatures() {
        let mut m = module();
        m.add_signature(Signature::occurrence()).unwrap();
        m.add_signature(
            Signature::new("Seq").with_field(Field::new("Seq", "p", "Occurrence")),
        )
        .unwrap();
        assert!(m.check_field_types().is_ok());

        m.add_signature(
            Signature::new("Dangling")
                .with_field(Field::new("Dangling", "p", "Nowhere")),
        )
        .unwrap();
        match m.check_field_types().unwrap_err() {
            ConfigurationError::UnknownFieldType { field, type_name } => {
                assert_eq!(field, "Dangling.p");
                assert_eq!(type_name, "Nowhere");
            }
            other => panic!("expected UnknownFieldType, got {other:?}"),
        }
    }

    #[test]
    fn local_shadowing_library_name_keeps_identity() {
        let mut m = module();
        let local = m.define(FuncDecl::fun("steps", "set Occurrence", None));
        let library = FuncRef::Library(m.library().lookup("steps").unwrap());
        assert_ne!(local, library);
        assert_eq!(m.function(local).unwrap().kind, crate::library::FuncKind::Fun);
    }

    #[test]
    fn step_fields_include_ancestors() {
        let mut m = module();
        m.add_signature(Signature::occurrence()).unwrap();
        m.add_signature(
            Signature::new("Base")
                .with_field(Field::new("Base", "a", "Occurrence"))
                .with_field(Field::new("Base", "v", "Occurrence").parameter()),
        )
        .unwrap();
        m.add_signature(
            Signature::new("Derived")
                .extends("Base")
                .with_field(Field::new("Derived", "b", "Occurrence")),
        )
        .unwrap();
        let names: Vec<&str> = m
            .inherited_step_fields("Derived")
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(m.inherited_step_fields("Missing").is_empty());
    }

    #[test]
    fn parameters_inherited_from_ancestors() {
        let mut m = module();
        m.add_signature(Signature::occurrence()).unwrap();
        m.add_signature(
            Signature::new("Base")
                .with_field(Field::new("Base", "v", "Occurrence").parameter()),
        )
        .unwrap();
        m.add_signature(Signature::new("Derived").extends("Base")).unwrap();
        assert!(m.has_parameters("Derived"));
        assert!(!m.has_parameters("Occurrence"));
    }
}
