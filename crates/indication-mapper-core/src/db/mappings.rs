//! Indication mapping database operations.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{Database, DbError, DbResult};
use crate::models::{MappingRecord, NewMapping};

const SELECT_COLUMNS: &str = r#"
    SELECT id, set_id, drug_name, indications, last_update_date,
           eligibility_requirements, created_at, updated_at
    FROM indication_mappings
"#;

/// Parse a `YYYYMMDD` label date.
pub fn parse_update_date(raw: &str) -> DbResult<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DbError::MalformedDate(raw.to_string()));
    }

    let malformed = || DbError::MalformedDate(raw.to_string());
    let year: i32 = raw[0..4].parse().map_err(|_| malformed())?;
    let month: u32 = raw[4..6].parse().map_err(|_| malformed())?;
    let day: u32 = raw[6..8].parse().map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}

impl Database {
    /// Insert a mapping, or overwrite the existing row for its set id.
    ///
    /// The row keeps its original `id` and `created_at` on update.
    pub fn upsert_mapping(&mut self, mapping: &NewMapping) -> DbResult<MappingRecord> {
        let last_update_date = parse_update_date(&mapping.last_update_date)?;
        let indications_json = serde_json::to_string(&mapping.indications)?;
        let eligibility_json = mapping
            .eligibility_requirements
            .as_ref()
            .map(|reqs| serde_json::to_string(reqs))
            .transpose()?;

        let tx = self.transaction()?;
        tx.execute(
            r#"
            INSERT INTO indication_mappings (
                id, set_id, drug_name, indications, last_update_date,
                eligibility_requirements, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
            ON CONFLICT(set_id) DO UPDATE SET
                drug_name = excluded.drug_name,
                indications = excluded.indications,
                last_update_date = excluded.last_update_date,
                eligibility_requirements = excluded.eligibility_requirements,
                updated_at = datetime('now')
            "#,
            params![
                Uuid::new_v4().to_string(),
                mapping.set_id,
                mapping.drug_name,
                indications_json,
                last_update_date.format("%Y-%m-%d").to_string(),
                eligibility_json,
            ],
        )?;

        let record = query_mapping(&tx, &mapping.set_id)?
            .ok_or_else(|| DbError::NotFound(mapping.set_id.clone()))?;
        tx.commit()?;

        Ok(record)
    }

    /// Get the mapping for a set id.
    pub fn get_mapping(&self, set_id: &str) -> DbResult<Option<MappingRecord>> {
        query_mapping(&self.conn, set_id)
    }

    /// List all mappings ordered by set id.
    pub fn list_mappings(&self) -> DbResult<Vec<MappingRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY set_id", SELECT_COLUMNS))?;
        let rows = stmt.query_map([], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Number of stored mappings.
    pub fn count_mappings(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM indication_mappings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn query_mapping(conn: &Connection, set_id: &str) -> DbResult<Option<MappingRecord>> {
    conn.query_row(&format!("{} WHERE set_id = ?", SELECT_COLUMNS), [set_id], read_row)
        .optional()?
        .map(|row| row.try_into())
        .transpose()
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<MappingRow> {
    Ok(MappingRow {
        id: row.get(0)?,
        set_id: row.get(1)?,
        drug_name: row.get(2)?,
        indications: row.get(3)?,
        last_update_date: row.get(4)?,
        eligibility_requirements: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Intermediate row struct for database mapping.
struct MappingRow {
    id: String,
    set_id: String,
    drug_name: Option<String>,
    indications: String,
    last_update_date: String,
    eligibility_requirements: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<MappingRow> for MappingRecord {
    type Error = DbError;

    fn try_from(row: MappingRow) -> Result<Self, Self::Error> {
        let last_update_date = NaiveDate::parse_from_str(&row.last_update_date, "%Y-%m-%d")
            .map_err(|_| {
                DbError::Constraint(format!(
                    "stored date '{}' for {} is not ISO formatted",
                    row.last_update_date, row.set_id
                ))
            })?;

        Ok(MappingRecord {
            id: row.id,
            set_id: row.set_id,
            drug_name: row.drug_name,
            indications: serde_json::from_str(&row.indications)?,
            last_update_date,
            eligibility_requirements: row
                .eligibility_requirements
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
