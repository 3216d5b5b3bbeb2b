//! Patient lookups

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Patient repository
pub struct PatientRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PatientRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Exact, case-insensitive name match
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, name, email, phone, date_of_birth, address, created_at, updated_at
            FROM patients
            WHERE name = ? COLLATE NOCASE
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_find_by_name() {
        let (_dir, pool) = test_pool().await;
        let repo = PatientRepository::new(&pool);

        let patient = repo.find_by_name(" jane smith ").await.unwrap().unwrap();
        assert_eq!(patient.name, "Jane Smith");
        assert_eq!(patient.email.as_deref(), Some("jane.smith@email.com"));

        assert!(repo.find_by_name("Unknown Patient").await.unwrap().is_none());
    }
}
