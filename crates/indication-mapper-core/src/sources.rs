//! Interfaces to the external label-data and inference collaborators.

use thiserror::Error;

use crate::models::{EligibilityRequirement, LabelData};

/// Label-data source errors.
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("No label found: {0}")]
    NotFound(String),

    #[error("Label fetch failed: {0}")]
    Fetch(String),
}

/// Eligibility inference failure. Always recovered by the caller.
#[derive(Error, Debug)]
#[error("Eligibility inference failed: {0}")]
pub struct InferenceError(pub String);

/// Source of structured product labeling data.
pub trait LabelSource: Send + Sync {
    /// Fetch label data for a set id.
    fn fetch_label(&self, set_id: &str) -> Result<LabelData, LabelError>;

    /// Resolve a drug name to the set id of its label.
    fn resolve_set_id(&self, drug_name: &str) -> Result<String, LabelError>;
}

/// Source of program eligibility requirements for a drug.
pub trait EligibilitySource: Send + Sync {
    fn infer_eligibility(&self, drug_name: &str)
        -> Result<Vec<EligibilityRequirement>, InferenceError>;
}

/// Eligibility source that never has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEligibility;

impl EligibilitySource for NoEligibility {
    fn infer_eligibility(
        &self,
        drug_name: &str,
    ) -> Result<Vec<EligibilityRequirement>, InferenceError> {
        Err(InferenceError(format!(
            "no eligibility source configured for {}",
            drug_name
        )))
    }
}
