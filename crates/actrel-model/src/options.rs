//! Translation settings, read from the `[translation]` manifest section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default instance bound of the generated run command.
pub const DEFAULT_SCOPE: u32 = 10;

/// Knobs for assembling one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationOptions {
    /// Overall bound of the run command.
    pub scope: u32,
    /// Name of the variable that quantifies over a signature in its facts.
    pub bound_var: String,
    /// Emit the global `nonZeroDurationOnly` fact.
    pub non_zero_duration_only: bool,
    /// `open` lines of the module header.
    pub imports: Vec<String>,
    /// Exact instance counts added to the run command.
    pub exact: BTreeMap<String, u32>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE,
            bound_var: "x".to_string(),
            non_zero_duration_only: true,
            imports: vec![
                "Transfer[Occurrence] as o".to_string(),
                "utilities/types/relation as r".to_string(),
            ],
            exact: BTreeMap::new(),
        }
    }
}
