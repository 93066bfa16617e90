//! Indication Mapper Core Library
//!
//! Maps the indications section of structured drug labels to ICD-10 codes and
//! keeps one mapping record per label set id.
//!
//! # Architecture
//!
//! ```text
//! Label Source ──▶ Indications Text ──▶ Extractor ──▶ Statements
//!                                                        │
//!                                              Matcher (MatchPolicy)
//!                                                        │
//!                                         drop statements without codes
//!                                                        │
//! Eligibility Source ──(optional)──▶ Mapping Builder ◀───┘
//!                                          │
//!                               ┌──────────▼──────────┐
//!                               │   Mapping Store     │
//!                               │  upsert by set_id   │
//!                               └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite mapping store
//! - [`models`]: Domain types (CodeEntry, ScoredMatch, MappingRecord, etc.)
//! - [`mapping`]: Vocabulary, extractor, matcher policies and builder
//! - [`sources`]: Label-data and eligibility collaborator interfaces

pub mod db;
pub mod mapping;
pub mod models;
pub mod sources;

// Re-export commonly used types
pub use db::Database;
pub use mapping::{
    MappingBuilder, MappingError, MappingResult, MatchPolicy, PolicyKind, SubstringPolicy,
    TokenOverlapPolicy, Vocabulary,
};
pub use models::{
    CodeEntry, EligibilityRequirement, IndicationMapping, LabelData, MappedCode, MappingRecord,
    NewMapping, ScoredMatch,
};
pub use sources::{EligibilitySource, InferenceError, LabelError, LabelSource, NoEligibility};

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Number of vocabulary suggestions returned for an unmatched statement.
const SUGGESTION_LIMIT: usize = 3;

/// Diagnostic result of matching a single statement. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndicationLookup {
    pub statement: String,
    #[serde(rename = "match")]
    pub scored: ScoredMatch,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmapped_terms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Thread-safe entry point shared by request handlers.
pub struct MapperCore {
    db: Arc<Mutex<Database>>,
    vocabulary: Arc<Vocabulary>,
    policy: Box<dyn MatchPolicy>,
    labels: Arc<dyn LabelSource>,
    eligibility: Arc<dyn EligibilitySource>,
}

impl MapperCore {
    /// Create a core over an open database.
    pub fn new(
        db: Database,
        vocabulary: Vocabulary,
        policy: Box<dyn MatchPolicy>,
        labels: Arc<dyn LabelSource>,
        eligibility: Arc<dyn EligibilitySource>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            vocabulary: Arc::new(vocabulary),
            policy,
            labels,
            eligibility,
        }
    }

    /// Open or create the database at `path` (`:memory:` for in-memory).
    pub fn open(
        path: &str,
        policy: PolicyKind,
        labels: Arc<dyn LabelSource>,
        eligibility: Arc<dyn EligibilitySource>,
    ) -> MappingResult<Self> {
        let db = if path == ":memory:" {
            Database::open_in_memory()?
        } else {
            Database::open(Path::new(path))?
        };
        Ok(Self::new(db, Vocabulary::new(), policy.build(), labels, eligibility))
    }

    fn builder(&self) -> MappingBuilder<'_> {
        MappingBuilder::new(
            &self.vocabulary,
            self.policy.as_ref(),
            self.labels.as_ref(),
            self.eligibility.as_ref(),
        )
    }

    /// Map a label's indications and upsert the record.
    pub fn map_label(&self, set_id: &str, drug_name: Option<&str>) -> MappingResult<MappingRecord> {
        self.builder().build(&self.db, set_id, drug_name)
    }

    /// Read a stored mapping without recomputing it.
    pub fn stored_mapping(&self, set_id: &str) -> MappingResult<MappingRecord> {
        let set_id = set_id.trim();
        if set_id.is_empty() {
            return Err(MappingError::Validation("setid is required".into()));
        }
        let db = self.db.lock()?;
        db.get_mapping(set_id)?
            .ok_or_else(|| MappingError::NotFound(format!("no mapping stored for {}", set_id)))
    }

    /// All stored mappings.
    pub fn list_mappings(&self) -> MappingResult<Vec<MappingRecord>> {
        let db = self.db.lock()?;
        Ok(db.list_mappings()?)
    }

    /// Match one free-text indication, with diagnostics when nothing matched.
    pub fn lookup_indication(&self, text: &str) -> MappingResult<IndicationLookup> {
        let statement = text.trim();
        if statement.is_empty() {
            return Err(MappingError::Validation("indication text is required".into()));
        }

        let scored = self.policy.match_statement(statement, &self.vocabulary);
        let (unmapped_terms, suggestions) = if scored.is_match() {
            (Vec::new(), Vec::new())
        } else {
            (
                self.vocabulary.unmapped_terms(statement),
                self.vocabulary.suggest(statement, SUGGESTION_LIMIT),
            )
        };

        Ok(IndicationLookup {
            statement: statement.to_string(),
            scored,
            unmapped_terms,
            suggestions,
        })
    }

    /// Fetch raw label data from the label source.
    pub fn fetch_label(&self, set_id: &str) -> MappingResult<LabelData> {
        let set_id = set_id.trim();
        if set_id.is_empty() {
            return Err(MappingError::Validation("setid is required".into()));
        }
        Ok(self.labels.fetch_label(set_id)?)
    }

    /// Resolve a drug name to a label set id.
    pub fn resolve_set_id(&self, drug_name: &str) -> MappingResult<String> {
        let drug_name = drug_name.trim();
        if drug_name.is_empty() {
            return Err(MappingError::Validation("drugName is required".into()));
        }
        Ok(self.labels.resolve_set_id(drug_name)?)
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}
