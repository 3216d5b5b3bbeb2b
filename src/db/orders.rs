//! Order database operations

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::orders::OrderStatus;

/// Order record, joined with the OCR details of its prescription
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub quantity: i64,
    pub instructions: String,
    pub status: OrderStatus,
    pub prescribed_by: String,
    pub prescription_text: String,
    pub prescription_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub medication_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub ocr_method: Option<String>,
    pub confidence_score: Option<f64>,
    pub image_path: Option<String>,
}

/// Data for a new order row
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub quantity: u32,
    pub instructions: String,
    pub prescribed_by: String,
    pub prescription_text: String,
    pub prescription_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub medication_id: Option<i64>,
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
    pub today_orders: i64,
}

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_id, o.patient_name, o.medication_name, o.dosage, o.quantity,
           o.instructions, o.status, o.prescribed_by, o.prescription_text,
           o.prescription_id, o.patient_id, o.medication_id, o.created_at, o.updated_at,
           p.ocr_method, p.confidence_score, p.image_path
    FROM orders o
    LEFT JOIN prescriptions p ON o.prescription_id = p.id
"#;

/// Order repository
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an order by its public order id
    pub async fn get_by_order_id(&self, order_id: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{} WHERE o.order_id = ?", ORDER_SELECT))
            .bind(order_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    pub async fn order_id_exists(&self, order_id: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// List all orders, newest first
    pub async fn list(&self) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{} ORDER BY o.created_at DESC, o.id DESC",
            ORDER_SELECT
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Insert a new pending order
    ///
    /// A uniqueness violation (order id taken, or prescription already used)
    /// is reported as a conflict so the caller can retry.
    pub async fn insert(&self, data: &NewOrder) -> Result<Order> {
        let now = super::now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, patient_id, medication_id, prescription_id, patient_name,
                medication_name, dosage, quantity, instructions, status, prescribed_by,
                prescription_text, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.order_id)
        .bind(data.patient_id)
        .bind(data.medication_id)
        .bind(data.prescription_id)
        .bind(&data.patient_name)
        .bind(&data.medication_name)
        .bind(&data.dosage)
        .bind(data.quantity)
        .bind(&data.instructions)
        .bind(OrderStatus::Pending)
        .bind(&data.prescribed_by)
        .bind(&data.prescription_text)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                if db.message().contains("prescription_id") {
                    AppError::Conflict("Prescription is already linked to an order".to_string())
                } else {
                    AppError::Conflict(format!("Order ID {} already exists", data.order_id))
                }
            }
            other => AppError::Database(other),
        })?;

        self.get_by_order_id(&data.order_id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created order".to_string()))
    }

    /// Set the status of an order; `None` when the order does not exist
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Option<Order>> {
        let now = super::now_timestamp();

        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ?")
            .bind(status)
            .bind(&now)
            .bind(order_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_order_id(order_id).await
    }

    /// Set the status only while the order is still in `from`
    ///
    /// `None` when the order is missing or its status has moved on.
    pub async fn update_status_from(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>> {
        let now = super::now_timestamp();

        let result = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? AND status = ?",
        )
        .bind(to)
        .bind(&now)
        .bind(order_id)
        .bind(from)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_order_id(order_id).await
    }

    /// Dashboard counters for the current local day
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.dashboard_stats_at(Local::now()).await
    }

    /// Dashboard counters, with "today" being the local calendar day of `now`
    pub async fn dashboard_stats_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<DashboardStats> {
        let (day_start, day_end) = day_bounds(now.timezone(), now.date_naive());

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_orders,
                COALESCE(SUM(CASE WHEN status = 'dispensed' THEN 1 ELSE 0 END), 0) AS completed_orders,
                COALESCE(SUM(CASE WHEN created_at >= ? AND created_at < ? THEN 1 ELSE 0 END), 0) AS today_orders
            FROM orders
            "#,
        )
        .bind(super::timestamp(day_start))
        .bind(super::timestamp(day_end))
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}

/// UTC instants bounding a calendar day in `tz`: `[start, end)`
pub fn day_bounds<Tz: TimeZone>(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = midnight_utc(&tz, date);
    let end = date
        .succ_opt()
        .map(|next| midnight_utc(&tz, next))
        .unwrap_or_else(|| start + Duration::days(1));
    (start, end)
}

fn midnight_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    // Midnight skipped by a DST change: the day starts at the first
    // local minute that exists
    (0..24 * 60)
        .find_map(|minutes| {
            tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
