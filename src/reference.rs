//! Static tumor-reference bundle: read-only descriptive text per
//! classifier category, for downstream consumers such as the report
//! generator. Loaded from an embedded JSON resource.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TumorType;

const TUMOR_REFERENCE_JSON: &str = include_str!("../resources/tumor_reference.json");

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference data parse failed: {0}")]
    Parse(String),

    #[error("Reference data incomplete: missing entry for {0}")]
    MissingEntry(TumorType),
}

/// Descriptive reference text for one tumor category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TumorInfo {
    pub name: String,
    pub description: String,
    pub origin: String,
    pub common_symptoms: Vec<String>,
    pub diagnosis_methods: Vec<String>,
    pub treatment_options: Vec<String>,
    pub prognosis: String,
    pub additional_info: Option<String>,
}

/// Loaded reference data, keyed by the closed category set.
pub struct TumorReference {
    entries: HashMap<TumorType, TumorInfo>,
}

impl TumorReference {
    /// Parse the embedded reference bundle. Fails only if the bundled
    /// resource is malformed or missing a category.
    pub fn load() -> Result<Self, ReferenceError> {
        let entries: HashMap<TumorType, TumorInfo> =
            serde_json::from_str(TUMOR_REFERENCE_JSON)
                .map_err(|e| ReferenceError::Parse(e.to_string()))?;

        for tumor_type in TumorType::ALL {
            if !entries.contains_key(&tumor_type) {
                return Err(ReferenceError::MissingEntry(tumor_type));
            }
        }

        Ok(Self { entries })
    }

    /// Reference text for a category.
    pub fn get(&self, tumor_type: TumorType) -> Option<&TumorInfo> {
        self.entries.get(&tumor_type)
    }

    /// Reference text for a free-form label, resolved through the closed
    /// synonym table. Unresolvable labels are `None`, never guessed.
    pub fn lookup(&self, label: &str) -> Option<&TumorInfo> {
        match TumorType::resolve(label) {
            Some(tumor_type) => self.get(tumor_type),
            None => {
                tracing::warn!("No tumor reference entry for label: {label}");
                None
            }
        }
    }

    /// All categories the bundle describes.
    pub fn types(&self) -> Vec<TumorType> {
        TumorType::ALL
            .iter()
            .copied()
            .filter(|t| self.entries.contains_key(t))
            .collect()
    }
}
