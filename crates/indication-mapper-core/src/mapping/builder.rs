//! Mapping record assembly.

use std::sync::Mutex;

use crate::db::Database;
use crate::models::{EligibilityRequirement, IndicationMapping, MappingRecord, NewMapping, ScoredMatch};
use crate::sources::{EligibilitySource, InferenceError, LabelSource};

use super::extractor::extract_statements;
use super::matcher::MatchPolicy;
use super::vocabulary::Vocabulary;
use super::{MappingError, MappingResult};

/// Orchestrates extraction, matching and persistence for one label.
pub struct MappingBuilder<'a> {
    vocabulary: &'a Vocabulary,
    policy: &'a dyn MatchPolicy,
    labels: &'a dyn LabelSource,
    eligibility: &'a dyn EligibilitySource,
}

impl<'a> MappingBuilder<'a> {
    /// Create a new builder.
    pub fn new(
        vocabulary: &'a Vocabulary,
        policy: &'a dyn MatchPolicy,
        labels: &'a dyn LabelSource,
        eligibility: &'a dyn EligibilitySource,
    ) -> Self {
        Self {
            vocabulary,
            policy,
            labels,
            eligibility,
        }
    }

    /// Extract and match every statement, keeping misses.
    pub fn match_statements(&self, indications_text: &str) -> Vec<(String, ScoredMatch)> {
        extract_statements(indications_text)
            .into_iter()
            .map(|statement| {
                let scored = self.policy.match_statement(&statement, self.vocabulary);
                (statement, scored)
            })
            .collect()
    }

    /// Extract, match and drop statements without codes.
    pub fn map_indications(&self, indications_text: &str) -> Vec<IndicationMapping> {
        self.match_statements(indications_text)
            .iter()
            .filter(|(_, scored)| scored.is_match())
            .map(|(statement, scored)| IndicationMapping::from_match(statement, scored))
            .collect()
    }

    /// Fetch the label (and eligibility, when a drug name is given) and assemble
    /// the mapping without persisting it.
    pub fn assemble(&self, set_id: &str, drug_name: Option<&str>) -> MappingResult<NewMapping> {
        let set_id = set_id.trim();
        if set_id.is_empty() {
            return Err(MappingError::Validation("setid is required".into()));
        }
        let drug_name = drug_name.map(str::trim).filter(|d| !d.is_empty());

        // Inference only runs once the label is known to exist.
        let label = self.labels.fetch_label(set_id)?;

        let eligibility_requirements = drug_name
            .and_then(|drug| recover_eligibility(drug, self.eligibility.infer_eligibility(drug)));

        let indications = self.map_indications(&label.indications);

        tracing::info!(
            set_id = %set_id,
            policy = self.policy.name(),
            mapped = indications.len(),
            "Assembled indication mapping"
        );

        Ok(NewMapping {
            set_id: set_id.to_string(),
            drug_name: drug_name.map(|d| d.to_string()),
            indications,
            last_update_date: label.last_update_date,
            eligibility_requirements,
        })
    }

    /// Assemble the mapping and upsert it into the store.
    pub fn build(
        &self,
        store: &Mutex<Database>,
        set_id: &str,
        drug_name: Option<&str>,
    ) -> MappingResult<MappingRecord> {
        let mapping = self.assemble(set_id, drug_name)?;
        let mut db = store.lock()?;
        Ok(db.upsert_mapping(&mapping)?)
    }
}

/// Turn an inference result into "data or absent".
fn recover_eligibility(
    drug_name: &str,
    result: Result<Vec<EligibilityRequirement>, InferenceError>,
) -> Option<Vec<EligibilityRequirement>> {
    match result {
        Ok(requirements) => Some(requirements),
        Err(e) => {
            tracing::warn!(
                drug_name = %drug_name,
                error = %e,
                "Eligibility inference failed, continuing without it"
            );
            None
        }
    }
}
