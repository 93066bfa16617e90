//! SQLite schema definition.

/// Complete database schema for the indication mapper.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Indication Mappings (one row per label set id)
-- ============================================================================

CREATE TABLE IF NOT EXISTS indication_mappings (
    id TEXT PRIMARY KEY,                         -- generated UUID, stable across updates
    set_id TEXT NOT NULL UNIQUE,
    drug_name TEXT,
    indications TEXT NOT NULL DEFAULT '[]',      -- JSON array of IndicationMapping
    last_update_date TEXT NOT NULL,              -- ISO date (YYYY-MM-DD)
    eligibility_requirements TEXT,               -- JSON array of {name, value}
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_mappings_drug_name ON indication_mappings(drug_name);
"#;
