//! Declarative model files: classes, their attributes and their connectors.
//!
//! A model is read from TOML or JSON and resolves into the signature list of
//! a module plus one [`BehaviorGraph`] per class. In TOML:
//!
//! ```toml
//! [[class]]
//! name = "SimpleSequence"
//!
//! [[class.field]]
//! name = "p1"
//! type = "AtomicBehavior"
//!
//! [[class.field]]
//! name = "p2"
//! type = "AtomicBehavior"
//!
//! [[class.edge]]
//! from = "p1"
//! to = "p2"
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use actrel_core::{BehaviorGraph, PrecedenceEdge, Step};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::signature::{Field, Signature, OCCURRENCE};

pub type Result<T> = std::result::Result<T, ModelError>;

/// A whole model file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    #[serde(rename = "class", default)]
    pub classes: Vec<ClassDecl>,
}

/// One class: a behavior whose attributes are its steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    /// Supertype; [`OCCURRENCE`] when absent.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(rename = "field", default)]
    pub fields: Vec<FieldDecl>,
    #[serde(rename = "edge", default)]
    pub edges: Vec<EdgeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub parameter: bool,
    #[serde(default)]
    pub exactly_one: bool,
}

/// A connector between two attributes of the same class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDecl {
    pub from: String,
    pub to: String,
    /// Exclusive-choice tag.
    #[serde(default)]
    pub choice: bool,
}

impl ClassDecl {
    fn parent_name(&self) -> &str {
        self.parent.as_deref().unwrap_or(OCCURRENCE)
    }

    fn to_signature(&self) -> Signature {
        let base = Signature::new(self.name.clone())
            .extends(self.parent_name())
            .set_abstract(self.is_abstract);
        self.fields.iter().fold(base, |sig, f| {
            let mut field = Field::new(&self.name, &f.name, &f.type_name);
            field.is_parameter = f.parameter;
            field.exactly_one = f.exactly_one;
            sig.with_field(field)
        })
    }
}

impl ModelSource {
    /// Parse and validate a TOML model.
    pub fn parse_toml(text: &str) -> Result<Self> {
        let source: ModelSource = toml::from_str(text)?;
        source.validate()?;
        Ok(source)
    }

    /// Parse and validate a JSON model.
    pub fn parse_json(text: &str) -> Result<Self> {
        let source: ModelSource = serde_json::from_str(text)?;
        source.validate()?;
        Ok(source)
    }

    /// Load a model file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let parse: fn(&str) -> Result<Self> = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::parse_toml,
            Some("json") => Self::parse_json,
            _ => return Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        };
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source = parse(&text)?;
        debug!(path = %path.display(), classes = source.classes.len(), "loaded model");
        Ok(source)
    }

    /// Check names, the class hierarchy and connector ends.
    pub fn validate(&self) -> Result<()> {
        let mut by_name: HashMap<&str, &ClassDecl> = HashMap::new();
        for class in &self.classes {
            if class.name == OCCURRENCE || by_name.insert(&class.name, class).is_some() {
                return Err(ModelError::DuplicateClass(class.name.clone()));
            }
        }

        for class in &self.classes {
            // Walk to the root, collecting every inherited attribute name.
            let mut seen_fields: HashSet<&str> = HashSet::new();
            let mut seen_classes: HashSet<&str> = HashSet::new();
            let mut current = class;
            loop {
                if !seen_classes.insert(&current.name) {
                    return Err(ModelError::CyclicParent(class.name.clone()));
                }
                for field in &current.fields {
                    if !seen_fields.insert(&field.name) {
                        return Err(ModelError::DuplicateField {
                            class: class.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                }
                let parent = current.parent_name();
                if parent == OCCURRENCE {
                    break;
                }
                current = by_name.get(parent).copied().ok_or_else(|| ModelError::UnknownParent {
                    class: current.name.clone(),
                    parent: parent.to_string(),
                })?;
            }

            for edge in &class.edges {
                for end in [&edge.from, &edge.to] {
                    if !class.fields.iter().any(|f| &f.name == end) {
                        return Err(ModelError::UnknownEdgeEnd {
                            class: class.name.clone(),
                            step: end.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn class(&self, name: &str) -> Result<&ClassDecl> {
        self.classes
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ModelError::UnknownClass(name.to_string()))
    }

    /// Every declared signature: the implicit abstract root first, then the
    /// classes in file order.
    pub fn signatures(&self) -> Vec<Signature> {
        std::iter::once(Signature::occurrence())
            .chain(self.classes.iter().map(ClassDecl::to_signature))
            .collect()
    }

    /// The behavior graph of one class: its attributes as steps, in
    /// declaration order, and its connectors as edges.
    pub fn graph(&self, name: &str) -> Result<BehaviorGraph> {
        let class = self.class(name)?;
        let mut graph = BehaviorGraph::new();
        for field in &class.fields {
            graph.add_step(Step::new(field.name.clone(), field.type_name.clone()))?;
        }
        for edge in &class.edges {
            let resolve = |step: &str| {
                graph.step_id(step).ok_or_else(|| ModelError::UnknownEdgeEnd {
                    class: class.name.clone(),
                    step: step.to_string(),
                })
            };
            let (source, target) = (resolve(&edge.from)?, resolve(&edge.to)?);
            let edge = if edge.choice {
                PrecedenceEdge::choice(source, target)
            } else {
                PrecedenceEdge::new(source, target)
            };
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Classes whose facts go into the module for `name`: the class itself,
    /// then every class reachable through attribute types or parents that
    /// declares or inherits attributes.
    pub fn behaviors_from(&self, name: &str) -> Result<Vec<String>> {
        let root = self.class(name)?;
        let mut order = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(class) = queue.pop_front() {
            if !seen.insert(&class.name) {
                continue;
            }
            if class.name == root.name || self.has_steps(class) {
                order.push(class.name.clone());
            }
            let related = class
                .fields
                .iter()
                .map(|f| f.type_name.as_str())
                .chain(class.parent.as_deref());
            for type_name in related {
                // Built-in or undeclared; the assembler reports the latter.
                if let Ok(target) = self.class(type_name) {
                    queue.push_back(target);
                }
            }
        }
        Ok(order)
    }

    /// Whether `class` or one of its ancestors declares attributes.
    fn has_steps(&self, class: &ClassDecl) -> bool {
        let mut current = Some(class);
        let mut hops = 0;
        while let Some(c) = current {
            if !c.fields.is_empty() {
                return true;
            }
            hops += 1;
            if hops > self.classes.len() {
                break;
            }
            current = c.parent.as_deref().and_then(|p| self.class(p).ok());
        }
        false
    }

    /// Names of every class with at least one connector.
    pub fn classes_with_edges(&self) -> Vec<&str> {
        self.classes
            .iter()
            .filter(|c| !c.edges.is_empty())
            .map(|c| c.name.as_str())
            .collect()
    }
}
