//! Prescription database operations

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::ocr::{OcrResult, FAILED_OCR_SENTINEL};

/// Prescription record: the outcome of one OCR attempt
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: i64,
    pub extracted_text: String,
    pub confidence_score: f64,
    pub ocr_method: String,
    pub image_path: Option<String>,
    pub created_at: String,
}

/// Data for a new prescription row
#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub extracted_text: String,
    pub confidence_score: f64,
    pub ocr_method: String,
    pub image_path: Option<String>,
}

impl NewPrescription {
    /// Record an OCR outcome, using the sentinel text when nothing was recognized
    pub fn from_ocr(result: &OcrResult, image_path: Option<String>) -> Self {
        let extracted_text = if result.text.trim().is_empty() {
            FAILED_OCR_SENTINEL.to_string()
        } else {
            result.text.clone()
        };

        Self {
            extracted_text,
            confidence_score: result.confidence,
            ocr_method: result.method.as_str().to_string(),
            image_path,
        }
    }
}

/// Prescription repository
pub struct PrescriptionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PrescriptionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a prescription by id
    pub async fn get(&self, id: i64) -> Result<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT id, extracted_text, confidence_score, ocr_method, image_path, created_at
            FROM prescriptions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(prescription)
    }

    /// Insert a prescription
    pub async fn insert(&self, data: &NewPrescription) -> Result<Prescription> {
        let now = super::now_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO prescriptions (extracted_text, confidence_score, ocr_method, image_path, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.extracted_text)
        .bind(data.confidence_score)
        .bind(&data.ocr_method)
        .bind(&data.image_path)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created prescription".to_string()))
    }

    /// Whether an order already references this prescription
    pub async fn is_linked(&self, id: i64) -> Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE prescription_id = ?")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }
}
