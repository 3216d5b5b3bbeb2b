//! Medication formulary queries

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Maximum rows returned by a medication search
pub const MEDICATION_SEARCH_LIMIT: i64 = 10;

/// Medication record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub manufacturer: Option<String>,
    pub created_at: String,
}

/// Medication repository
pub struct MedicationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MedicationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Case-insensitive substring search over name and generic name
    pub async fn search(&self, term: &str) -> Result<Vec<Medication>> {
        let search_pattern = format!("%{}%", escape_like(term));

        let medications = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, generic_name, dosage, form, manufacturer, created_at
            FROM medications
            WHERE name LIKE ? ESCAPE '\' OR generic_name LIKE ? ESCAPE '\'
            ORDER BY name ASC
            LIMIT ?
            "#,
        )
        .bind(&search_pattern)
        .bind(&search_pattern)
        .bind(MEDICATION_SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(medications)
    }

    /// Formulary entry whose name appears in free text, preferring the longest name
    pub async fn find_in_text(&self, text: &str) -> Result<Option<Medication>> {
        let medication = sqlx::query_as::<_, Medication>(
            r#"
            SELECT id, name, generic_name, dosage, form, manufacturer, created_at
            FROM medications
            WHERE instr(lower(?), lower(name)) > 0
            ORDER BY length(name) DESC
            LIMIT 1
            "#,
        )
        .bind(text)
        .fetch_optional(self.pool)
        .await?;

        Ok(medication)
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
