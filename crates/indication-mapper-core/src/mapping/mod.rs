//! Indication-to-code mapping pipeline.
//!
//! Pipeline: Label Text → Extraction → Matching → Filtering → Upsert

mod builder;
mod extractor;
mod matcher;
mod vocabulary;

pub use builder::*;
pub use extractor::*;
pub use matcher::*;
pub use vocabulary::*;

use thiserror::Error;

use crate::db::DbError;
use crate::sources::LabelError;

/// Errors surfaced by the mapping pipeline.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Malformed last update date: {0}")]
    MalformedDate(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LabelError> for MappingError {
    fn from(e: LabelError) -> Self {
        match e {
            LabelError::NotFound(id) => MappingError::NotFound(id),
            LabelError::Fetch(msg) => MappingError::UpstreamFetch(msg),
        }
    }
}

impl From<DbError> for MappingError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::MalformedDate(raw) => MappingError::MalformedDate(raw),
            other => MappingError::Storage(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MappingError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MappingError::Storage(format!("Lock poisoned: {}", e))
    }
}

pub type MappingResult<T> = Result<T, MappingError>;
