//! Constraint assembly: ordering maps and field declarations become facts.
//!
//! Each behavior signature `S` receives, quantified over one bound variable
//! `x: S`:
//!
//! - steps closure: its step fields, inherited ones included, are exactly
//!   `x.steps`;
//! - cardinality: the entry-point step occurs exactly once;
//! - one `functionFiltered` fact per forward ordering pair and one
//!   `inverseFunctionFiltered` fact per inverse pair;
//! - structural suppression of inputs and outputs where no parameter exists.
//!
//! An OR group is one unioned expression. An AND group is a list of
//! expressions and every member is paired independently with the other side,
//! so an AND of `k` against an AND of `m` yields `k * m` facts.

use actrel_core::{BehaviorGraph, OrderingMap, Orderings, TopologyTerm};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::expr::Expr;
use crate::library::FuncDecl;
use crate::module::{Command, Module};
use crate::options::TranslationOptions;
use crate::signature::Signature;

/// Name of the module-local predicate the run command refers to.
pub const EXAMPLE_HOOK: &str = "instancesDuringExample";

/// Adds facts, local predicates and the run command to a [`Module`].
pub struct Assembler<'a> {
    module: &'a mut Module,
    options: &'a TranslationOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(module: &'a mut Module, options: &'a TranslationOptions) -> Self {
        Self { module, options }
    }

    /// Assemble the facts of one behavior signature. Returns the number of
    /// facts added.
    pub fn signature(
        &mut self,
        name: &str,
        graph: &BehaviorGraph,
        orderings: &Orderings,
    ) -> Result<usize, ConfigurationError> {
        let x = self.options.bound_var.as_str();
        let facts = signature_facts(self.module, name, graph, orderings, x)?;
        let count = facts.len();
        for fact in facts {
            self.module.add_fact(Expr::all(x, name, fact));
        }
        debug!(signature = name, facts = count, "assembled signature facts");
        Ok(count)
    }

    /// Add the global facts, the example hook and the run command for `target`.
    pub fn finish(&mut self, target: &str) -> Result<(), ConfigurationError> {
        self.module.require_signature(target)?;
        // Every declared signature is rendered, assembled or not.
        self.module.check_field_types()?;
        self.module.set_imports(self.options.imports.clone());

        if self.options.non_zero_duration_only {
            let fact = self.module.library().call("nonZeroDurationOnly", Vec::new())?;
            self.module.add_fact(fact);
        }

        let hook = self.module.define(FuncDecl::pred(EXAMPLE_HOOK, None));
        let body = Expr::Call(hook, Vec::new()).and(Expr::var(target).some());
        let mut command = Command::new(format!("show{target}"), body, self.options.scope);
        for (name, count) in &self.options.exact {
            self.module.require_signature(name)?;
            command.exact.push((name.clone(), *count));
        }
        self.module.set_command(command);
        Ok(())
    }
}

fn signature_facts(
    module: &Module,
    name: &str,
    graph: &BehaviorGraph,
    orderings: &Orderings,
    x: &str,
) -> Result<Vec<Expr>, ConfigurationError> {
    let sig = module.require_signature(name)?;
    module.require_field_types(sig)?;

    let mut facts = Vec::new();
    steps_closure(module, sig, x, &mut facts)?;
    cardinality(sig, graph, x, &mut facts)?;
    ordering_facts(module, sig, graph, &orderings.forward, "functionFiltered", x, &mut facts)?;
    ordering_facts(
        module,
        sig,
        graph,
        &orderings.inverse,
        "inverseFunctionFiltered",
        x,
        &mut facts,
    )?;
    structural(module, sig, x, &mut facts)?;
    Ok(facts)
}

fn steps_closure(
    module: &Module,
    sig: &Signature,
    x: &str,
    facts: &mut Vec<Expr>,
) -> Result<(), ConfigurationError> {
    let steps = Expr::var(x).join(module.library().relation("steps")?);
    let fields = module.inherited_step_fields(&sig.name);
    match Expr::union_all(fields.iter().map(|f| Expr::field(x, &f.name))) {
        Some(all_steps) => {
            facts.push(all_steps.clone().within(steps.clone()));
            facts.push(steps.within(all_steps));
        }
        None => facts.push(steps.no()),
    }
    Ok(())
}

fn cardinality(
    sig: &Signature,
    graph: &BehaviorGraph,
    x: &str,
    facts: &mut Vec<Expr>,
) -> Result<(), ConfigurationError> {
    let mut designated: Vec<&str> = sig
        .fields
        .iter()
        .filter(|f| f.exactly_one)
        .map(|f| f.name.as_str())
        .collect();

    if designated.is_empty() {
        if let [entry] = graph.entry_steps().as_slice() {
            designated.push(graph.step_name(*entry));
        }
    }

    for step in designated {
        require_field(sig, step)?;
        facts.push(Expr::field(x, step).cardinality().equals(Expr::Const(1)));
    }
    Ok(())
}

fn ordering_facts(
    module: &Module,
    sig: &Signature,
    graph: &BehaviorGraph,
    map: &OrderingMap,
    predicate: &str,
    x: &str,
    facts: &mut Vec<Expr>,
) -> Result<(), ConfigurationError> {
    let library = module.library();
    let happens_before = library.relation("happensBefore")?;
    for entry in map.entries() {
        let befores = term_exprs(sig, graph, &entry.before, x)?;
        let afters = term_exprs(sig, graph, &entry.after, x)?;
        for before in &befores {
            for after in &afters {
                facts.push(library.call(
                    predicate,
                    vec![happens_before.clone(), before.clone(), after.clone()],
                )?);
            }
        }
    }
    Ok(())
}

/// Expressions standing for one side of an ordering pair.
fn term_exprs(
    sig: &Signature,
    graph: &BehaviorGraph,
    term: &TopologyTerm,
    x: &str,
) -> Result<Vec<Expr>, ConfigurationError> {
    let mut fields = Vec::new();
    for id in term.steps() {
        let step = graph.step_name(id);
        require_field(sig, step)?;
        fields.push(Expr::field(x, step));
    }
    Ok(match term {
        TopologyTerm::And(_) => fields,
        TopologyTerm::Leaf(_) | TopologyTerm::Or(_) => Expr::union_all(fields).into_iter().collect(),
    })
}

fn structural(
    module: &Module,
    sig: &Signature,
    x: &str,
    facts: &mut Vec<Expr>,
) -> Result<(), ConfigurationError> {
    let library = module.library();
    let inputs = library.relation("inputs")?;
    let outputs = library.relation("outputs")?;
    let no_io = |base: Expr| {
        base.clone()
            .join(inputs.clone())
            .union(base.join(outputs.clone()))
            .no()
    };

    if !module.has_parameters(&sig.name) {
        facts.push(no_io(Expr::var(x)));
    }
    for field in sig.step_fields() {
        if !module.has_parameters(&field.target) {
            facts.push(no_io(Expr::field(x, &field.name)));
        }
    }
    Ok(())
}

fn require_field(sig: &Signature, step: &str) -> Result<(), ConfigurationError> {
    match sig.get_field(step) {
        Some(_) => Ok(()),
        None => Err(ConfigurationError::UnknownStep {
            signature: sig.name.clone(),
            step: step.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actrel_core::{infer, GraphBuilder, OrderingDirection, StepId};

    use super::*;
    use crate::expr::{FuncRef, UnaryOp};
    use crate::library::Library;
    use crate::signature::{Field, Signature, OCCURRENCE};

    fn module_with(sig: Signature) -> Module {
        let mut module = Module::new(sig.name.clone(), Arc::new(Library::standard()));
        module.add_signature(Signature::occurrence()).unwrap();
        module.add_signature(Signature::new("AtomicBehavior")).unwrap();
        module.add_signature(sig).unwrap();
        module
    }

    fn graph_for(sig: &Signature, edges: &[(&str, &str, bool)]) -> BehaviorGraph {
        let mut builder = GraphBuilder::new();
        for field in &sig.fields {
            builder.step(&field.name, &field.target).unwrap();
        }
        for (from, to, choice) in edges {
            builder.connect(from, to, *choice).unwrap();
        }
        builder.build()
    }

    fn behavior(name: &str, steps: &[&str]) -> Signature {
        steps
            .iter()
            .fold(Signature::new(name), |sig, step| sig.field(step, "AtomicBehavior"))
    }

    /// Bodies of the `all x: S | ...` facts of the module.
    fn bodies<'m>(module: &'m Module, sig: &str) -> Vec<&'m Expr> {
        module
            .fact()
            .map(|f| f.conjuncts())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| match c {
                Expr::Quantifier { domain, body, .. } if domain == sig => Some(body.as_ref()),
                _ => None,
            })
            .collect()
    }

    fn calls_to<'m>(module: &'m Module, sig: &str, name: &str) -> Vec<&'m [Expr]> {
        let id = FuncRef::Library(module.library().lookup(name).unwrap());
        bodies(module, sig)
            .into_iter()
            .filter_map(|b| match b {
                Expr::Call(f, args) if *f == id => Some(args.as_slice()),
                _ => None,
            })
            .collect()
    }

    fn x(field: &str) -> Expr {
        Expr::field("x", field)
    }

    fn assemble(sig: Signature, edges: &[(&str, &str, bool)]) -> Module {
        let graph = graph_for(&sig, edges);
        let name = sig.name.clone();
        let mut module = module_with(sig);
        let orderings = infer(&graph).unwrap();
        let options = TranslationOptions::default();
        let mut assembler = Assembler::new(&mut module, &options);
        assembler.signature(&name, &graph, &orderings).unwrap();
        assembler.finish(&name).unwrap();
        module
    }

    #[test]
    fn simple_sequence_facts() {
        let module = assemble(behavior("Seq", &["p1", "p2"]), &[("p1", "p2", false)]);
        let steps = Expr::var("x").join(module.library().relation("steps").unwrap());
        let both = x("p1").union(x("p2"));

        let bodies = bodies(&module, "Seq");
        assert!(bodies.contains(&&both.clone().within(steps.clone())));
        assert!(bodies.contains(&&steps.within(both)));
        assert!(bodies.contains(&&x("p1").cardinality().equals(Expr::Const(1))));

        let forward = calls_to(&module, "Seq", "functionFiltered");
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0][1], x("p1"));
        assert_eq!(forward[0][2], x("p2"));
        assert_eq!(calls_to(&module, "Seq", "inverseFunctionFiltered").len(), 1);
    }

    #[test]
    fn fork_join_pairs_and_members_independently() {
        let module = assemble(
            behavior("ForkJoin", &["p1", "p2", "p3", "p4"]),
            &[
                ("p1", "p2", false),
                ("p1", "p3", false),
                ("p2", "p4", false),
                ("p3", "p4", false),
            ],
        );
        // forward: p1 -> AND(p2, p3) gives two facts, p2 -> p4 and p3 -> p4 one each
        assert_eq!(calls_to(&module, "ForkJoin", "functionFiltered").len(), 4);
        // inverse: p1 -> p2, p1 -> p3, AND(p2, p3) -> p4 gives two facts
        let inverse = calls_to(&module, "ForkJoin", "inverseFunctionFiltered");
        assert_eq!(inverse.len(), 4);
        assert!(inverse.iter().any(|a| a[1] == x("p3") && a[2] == x("p4")));
    }

    #[test]
    fn or_group_becomes_one_union() {
        let module = assemble(
            behavior("Decide", &["s", "p", "q"]),
            &[("s", "p", true), ("s", "q", true)],
        );
        let forward = calls_to(&module, "Decide", "functionFiltered");
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0][2], x("p").union(x("q")));
    }

    #[test]
    fn and_against_and_is_a_cross_product() {
        let sig = behavior("Cross", &["a", "b", "c", "d"]);
        let graph = graph_for(&sig, &[]);
        let mut module = module_with(sig);

        let mut forward = OrderingMap::new(OrderingDirection::Forward);
        forward
            .insert(
                &graph,
                TopologyTerm::and([StepId(0), StepId(1)]).unwrap(),
                TopologyTerm::and([StepId(2), StepId(3)]).unwrap(),
            )
            .unwrap();
        let orderings = Orderings {
            forward,
            inverse: OrderingMap::new(OrderingDirection::Inverse),
        };

        let options = TranslationOptions::default();
        Assembler::new(&mut module, &options)
            .signature("Cross", &graph, &orderings)
            .unwrap();
        assert_eq!(calls_to(&module, "Cross", "functionFiltered").len(), 4);
    }

    #[test]
    fn flagged_field_overrides_entry_detection() {
        let sig = Signature::new("Seq")
            .field("p1", "AtomicBehavior")
            .with_field(Field::new("Seq", "p2", "AtomicBehavior").exactly_one());
        let module = assemble(sig, &[("p1", "p2", false)]);
        let bodies = bodies(&module, "Seq");
        assert!(bodies.contains(&&x("p2").cardinality().equals(Expr::Const(1))));
        assert!(!bodies.contains(&&x("p1").cardinality().equals(Expr::Const(1))));
    }

    #[test]
    fn no_cardinality_when_entry_is_ambiguous() {
        let module = assemble(
            behavior("Join", &["p", "q", "t"]),
            &[("p", "t", false), ("q", "t", false)],
        );
        let has_card = bodies(&module, "Join").into_iter().any(|b| match b {
            Expr::Binary(_, lhs, _) => matches!(lhs.as_ref(), Expr::Unary(UnaryOp::Cardinality, _)),
            _ => false,
        });
        assert!(!has_card);
    }

    #[test]
    fn structural_suppression_without_parameters() {
        let module = assemble(behavior("Seq", &["p1"]), &[]);
        let lib = module.library();
        let no_io = Expr::var("x")
            .join(lib.relation("inputs").unwrap())
            .union(Expr::var("x").join(lib.relation("outputs").unwrap()))
            .no();
        assert!(bodies(&module, "Seq").contains(&&no_io));
    }

    #[test]
    fn parameters_suppress_structural_fact() {
        let sig = Signature::new("Param")
            .field("p1", "AtomicBehavior")
            .with_field(Field::new("Param", "v", OCCURRENCE).parameter());
        let module = assemble(sig, &[]);
        let no_facts = bodies(&module, "Param")
            .into_iter()
            .filter(|b| matches!(b, Expr::Unary(UnaryOp::No, _)))
            .count();
        // only `no (x.p1.inputs + x.p1.outputs)` remains
        assert_eq!(no_facts, 1);
    }

    #[test]
    fn signature_without_steps_has_no_steps() {
        let module = assemble(Signature::new("Empty"), &[]);
        let steps = Expr::var("x").join(module.library().relation("steps").unwrap());
        assert!(bodies(&module, "Empty").contains(&&steps.no()));
    }

    #[test]
    fn unknown_field_type_is_configuration_error() {
        let sig = Signature::new("Bad").field("p1", "Missing");
        let graph = graph_for(&sig, &[]);
        let mut module = module_with(sig);
        let orderings = infer(&graph).unwrap();
        let options = TranslationOptions::default();
        let err = Assembler::new(&mut module, &options)
            .signature("Bad", &graph, &orderings)
            .unwrap_err();
        match err {
            ConfigurationError::UnknownFieldType { field, type_name } => {
                assert_eq!(field, "Bad.p1");
                assert_eq!(type_name, "Missing");
            }
            other => panic!("expected UnknownFieldType, got {other:?}"),
        }
    }

    #[test]
    fn step_outside_signature_is_configuration_error() {
        let sig = behavior("Seq", &["p1"]);
        let mut builder = GraphBuilder::new();
        builder.steps(&["p1", "ghost"], "AtomicBehavior").unwrap();
        builder.precede("p1", "ghost").unwrap();
        let graph = builder.build();
        let mut module = module_with(sig);
        let orderings = infer(&graph).unwrap();
        let options = TranslationOptions::default();
        let err = Assembler::new(&mut module, &options)
            .signature("Seq", &graph, &orderings)
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn finish_adds_command_and_hook() {
        let module = assemble(behavior("Seq", &["p1", "p2"]), &[("p1", "p2", false)]);
        let command = module.command().unwrap();
        assert_eq!(command.label, "showSeq");
        assert_eq!(command.scope, 10);
        let referenced: Vec<&str> = module
            .referenced()
            .into_iter()
            .filter_map(|f| module.function(f).map(|d| d.name.as_str()))
            .collect();
        assert!(referenced.contains(&EXAMPLE_HOOK));
        assert!(referenced.contains(&"nonZeroDurationOnly"));
    }

    #[test]
    fn finish_checks_signatures_it_did_not_assemble() {
        let mut module = module_with(Signature::new("Seq"));
        module
            .add_signature(Signature::new("Dangling").field("p", "Nowhere"))
            .unwrap();
        let options = TranslationOptions::default();
        let err = Assembler::new(&mut module, &options).finish("Seq").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownFieldType { ref field, .. } if field == "Dangling.p"
        ));
    }

    #[test]
    fn finish_rejects_unknown_exact_signature() {
        let mut module = module_with(Signature::new("Seq"));
        let mut options = TranslationOptions::default();
        options.exact.insert("Nope".into(), 1);
        let err = Assembler::new(&mut module, &options).finish("Seq").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownSignature(ref n) if n == "Nope"));
    }
}
