//! Indication mapping models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CodeEntry;

/// Result of matching one candidate statement against the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    /// Canonical indication name, or the statement itself when nothing matched
    pub indication: String,
    /// Codes of the matched entry (empty when nothing matched)
    pub codes: Vec<CodeEntry>,
    /// Match strength in [0, 1]
    pub confidence: f64,
}

impl ScoredMatch {
    /// The no-match sentinel for a statement.
    pub fn no_match(statement: &str) -> Self {
        Self {
            indication: statement.to_string(),
            codes: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Whether the match produced at least one code.
    pub fn is_match(&self) -> bool {
        !self.codes.is_empty()
    }
}

/// A code attached to a mapped indication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappedCode {
    pub code: String,
    pub description: String,
    pub confidence: f64,
}

/// One label statement together with the codes it mapped to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndicationMapping {
    /// Statement as extracted from the label
    pub original: String,
    #[serde(rename = "icd10Codes")]
    pub icd10_codes: Vec<MappedCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmapped_terms: Option<Vec<String>>,
}

impl IndicationMapping {
    /// Build a mapping from a statement and its match result.
    pub fn from_match(original: &str, scored: &ScoredMatch) -> Self {
        Self {
            original: original.to_string(),
            icd10_codes: scored
                .codes
                .iter()
                .map(|c| MappedCode {
                    code: c.code.clone(),
                    description: c.description.clone(),
                    confidence: scored.confidence,
                })
                .collect(),
            unmapped_terms: None,
        }
    }
}

/// A single eligibility requirement inferred for a drug's assistance program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EligibilityRequirement {
    pub name: String,
    pub value: String,
}

impl EligibilityRequirement {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// A mapping ready to be written to the store.
///
/// The update date is kept in its raw `YYYYMMDD` form; the store validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMapping {
    pub set_id: String,
    pub drug_name: Option<String>,
    pub indications: Vec<IndicationMapping>,
    pub last_update_date: String,
    pub eligibility_requirements: Option<Vec<EligibilityRequirement>>,
}

/// Persisted mapping record, one per set id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    /// Generated row identity (UUID), stable across updates
    pub id: String,
    pub set_id: String,
    pub drug_name: Option<String>,
    pub indications: Vec<IndicationMapping>,
    pub last_update_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility_requirements: Option<Vec<EligibilityRequirement>>,
    pub created_at: String,
    pub updated_at: String,
}
