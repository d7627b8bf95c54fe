//! Signatures and their typed fields.

use serde::{Deserialize, Serialize};

/// Name of the abstract root signature every behavior extends.
pub const OCCURRENCE: &str = "Occurrence";

/// A field of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Name of the declaring signature.
    pub owner: String,
    /// Name of the target signature.
    pub target: String,
    /// Parameters (inputs/outputs) are never pairwise disjoint and are not steps.
    pub is_parameter: bool,
    /// The field holds exactly one occurrence per owner instance.
    pub exactly_one: bool,
}

impl Field {
    pub fn new(owner: &str, name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            target: target.to_string(),
            is_parameter: false,
            exactly_one: false,
        }
    }

    pub fn parameter(mut self) -> Self {
        self.is_parameter = true;
        self
    }

    pub fn exactly_one(mut self) -> Self {
        self.exactly_one = true;
        self
    }

    /// `Owner.field`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

/// A declared signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub parent: Option<String>,
    pub is_abstract: bool,
    pub fields: Vec<Field>,
}

impl Signature {
    /// A concrete signature extending [`OCCURRENCE`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(OCCURRENCE.to_string()),
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    /// The abstract built-in root.
    pub fn occurrence() -> Self {
        Self {
            name: OCCURRENCE.to_string(),
            parent: None,
            is_abstract: true,
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn set_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Append a field owned by this signature.
    pub fn field(mut self, name: &str, target: &str) -> Self {
        let field = Field::new(&self.name, name, target);
        self.fields.push(field);
        self
    }

    /// Append a fully specified field, taking ownership of it.
    pub fn with_field(mut self, mut field: Field) -> Self {
        field.owner = self.name.clone();
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that are steps (everything that is not a parameter).
    pub fn step_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_parameter)
    }

    pub fn has_parameters(&self) -> bool {
        self.fields.iter().any(|f| f.is_parameter)
    }
}
