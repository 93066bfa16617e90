//! Diagnostic code reference data.

use serde::{Deserialize, Serialize};

/// A single ICD-10 code entry in the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeEntry {
    /// ICD-10 code (e.g., "J45.901")
    pub code: String,
    /// Human readable description of the code
    pub description: String,
    /// Alternative names for the condition, matched exactly (case-insensitive)
    pub synonyms: Vec<String>,
}

impl CodeEntry {
    /// Create a new code entry.
    pub fn new(code: &str, description: &str, synonyms: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check whether any synonym equals the given text, ignoring case.
    pub fn has_synonym(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.synonyms.iter().any(|s| s.to_lowercase() == lower)
    }
}
