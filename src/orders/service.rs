//! Order creation and lifecycle

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{OrderStatus, TransitionPolicy};
use crate::db::{
    DashboardStats, Medication, MedicationRepository, NewOrder, Order, OrderRepository,
    PatientRepository, PrescriptionRepository,
};
use crate::error::{AppError, Result};
use crate::extract::{extract_fields, UNKNOWN_MEDICATION, UNKNOWN_PATIENT};

/// Highest collision suffix tried before giving up on an order id
const MAX_ORDER_ID_SUFFIX: u32 = 99;

/// Turns prescription text into orders and moves them through fulfilment
#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    policy: TransitionPolicy,
}

impl OrderService {
    pub fn new(pool: SqlitePool, policy: TransitionPolicy) -> Self {
        Self { pool, policy }
    }

    /// Create a pending order from prescription text
    pub async fn create_order(
        &self,
        prescription_text: &str,
        prescription_id: Option<i64>,
    ) -> Result<Order> {
        if prescription_text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Prescription text is required".to_string(),
            ));
        }

        if let Some(id) = prescription_id {
            let prescriptions = PrescriptionRepository::new(&self.pool);
            if prescriptions.get(id).await?.is_none() {
                return Err(AppError::InvalidInput(format!("Unknown prescription {}", id)));
            }
            if prescriptions.is_linked(id).await? {
                return Err(AppError::Conflict(format!(
                    "Prescription {} is already linked to an order",
                    id
                )));
            }
        }

        let fields = extract_fields(prescription_text);

        let medication_id = if fields.medication_name == UNKNOWN_MEDICATION {
            None
        } else {
            MedicationRepository::new(&self.pool)
                .find_in_text(&fields.medication_name)
                .await?
                .map(|m| m.id)
        };

        let patient_id = if fields.patient_name == UNKNOWN_PATIENT {
            None
        } else {
            PatientRepository::new(&self.pool)
                .find_by_name(&fields.patient_name)
                .await?
                .map(|p| p.id)
        };

        let orders = OrderRepository::new(&self.pool);
        let order_id = self.allocate_order_id(&orders, Utc::now()).await?;

        let order = orders
            .insert(&NewOrder {
                order_id,
                patient_name: fields.patient_name,
                medication_name: fields.medication_name,
                instructions: fields.dosage.clone(),
                dosage: fields.dosage,
                quantity: fields.quantity,
                prescribed_by: fields.prescribed_by,
                prescription_text: prescription_text.to_string(),
                prescription_id,
                patient_id,
                medication_id,
            })
            .await?;

        tracing::info!(
            order_id = %order.order_id,
            prescription_id = ?order.prescription_id,
            medication_id = ?order.medication_id,
            patient_id = ?order.patient_id,
            "Order created"
        );

        Ok(order)
    }

    /// First free id derived from `now`, suffixed on collision
    async fn allocate_order_id(
        &self,
        orders: &OrderRepository<'_>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let base = generate_order_id(now);
        if !orders.order_id_exists(&base).await? {
            return Ok(base);
        }

        for suffix in 2..=MAX_ORDER_ID_SUFFIX {
            let candidate = format!("{}-{}", base, suffix);
            if !orders.order_id_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "Could not allocate an order id near {}, retry",
            base
        )))
    }

    /// Move an order to a new status, subject to the transition policy
    pub async fn update_status(&self, order_id: &str, new_status: &str) -> Result<Order> {
        let to: OrderStatus = new_status.parse().map_err(|s: String| {
            AppError::InvalidStatus(format!(
                "Invalid status '{}'. Must be one of: pending, processing, ready, dispensed, cancelled",
                s
            ))
        })?;

        let orders = OrderRepository::new(&self.pool);
        let current = orders
            .get_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

        self.apply_transition(&orders, &current, to).await
    }

    /// Write a transition checked against `current`
    ///
    /// Under the strict policy the write only lands while the row still holds
    /// `current.status`; a concurrent change is reported against the status
    /// found afterwards.
    async fn apply_transition(
        &self,
        orders: &OrderRepository<'_>,
        current: &Order,
        to: OrderStatus,
    ) -> Result<Order> {
        let order_id = current.order_id.as_str();
        let from = current.status;

        if !self.policy.allows(from, to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        let updated = match self.policy {
            TransitionPolicy::Strict => orders.update_status_from(order_id, from, to).await?,
            TransitionPolicy::Permissive => orders.update_status(order_id, to).await?,
        };

        let order = match updated {
            Some(order) => order,
            None => {
                let latest = orders
                    .get_by_order_id(order_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
                tracing::warn!(
                    order_id = %order_id,
                    expected = %from,
                    found = %latest.status,
                    "Order status changed concurrently"
                );
                return Err(AppError::InvalidTransition {
                    from: latest.status,
                    to,
                });
            }
        };

        tracing::info!(order_id = %order_id, from = %from, to = %to, "Order status updated");

        Ok(order)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        OrderRepository::new(&self.pool).list().await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        OrderRepository::new(&self.pool)
            .get_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        OrderRepository::new(&self.pool).dashboard_stats().await
    }

    /// Formulary search; blank terms are rejected
    pub async fn search_medications(&self, term: &str) -> Result<Vec<Medication>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::InvalidInput("Search query is required".to_string()));
        }
        MedicationRepository::new(&self.pool).search(term).await
    }
}

/// `ORD-` followed by the last six digits of the epoch milliseconds
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    format!("ORD-{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, NewPrescription};
    use crate::ocr::{OcrMethod, OcrResult};
    use chrono::TimeZone;

    const SAMPLE: &str = "Patient: Jane Roe\nRx: Amoxicillin 500mg\nTake twice daily\nQty: 20\nDr. Smith";

    async fn service(policy: TransitionPolicy) -> (tempfile::TempDir, OrderService) {
        let (dir, pool) = test_pool().await;
        (dir, OrderService::new(pool, policy))
    }

    async fn stored_prescription(service: &OrderService) -> i64 {
        let ocr = OcrResult::recognized(SAMPLE.to_string(), 0.85, OcrMethod::OcrSpace);
        PrescriptionRepository::new(&service.pool)
            .insert(&NewPrescription::from_ocr(&ocr, None))
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_generate_order_id() {
        let at = Utc.timestamp_millis_opt(1_760_000_012_345).unwrap();
        assert_eq!(generate_order_id(at), "ORD-012345");

        let at = Utc.timestamp_millis_opt(1_760_000_000_007).unwrap();
        assert_eq!(generate_order_id(at), "ORD-000007");
    }

    #[tokio::test]
    async fn test_create_order_from_text() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;

        let order = service.create_order(SAMPLE, None).await.unwrap();

        assert!(order.order_id.starts_with("ORD-"));
        assert_eq!(order.patient_name, "Jane Roe");
        assert_eq!(order.medication_name, "Amoxicillin 500mg");
        assert_eq!(order.dosage, "Take twice daily");
        assert_eq!(order.instructions, "Take twice daily");
        assert_eq!(order.quantity, 20);
        assert_eq!(order.prescribed_by, "Smith");
        assert_eq!(order.prescription_text, SAMPLE);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.medication_id.is_some());
        assert!(order.patient_id.is_none());
    }

    #[tokio::test]
    async fn test_links_known_patient() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;

        let order = service
            .create_order("Patient: John Doe\nRx: Lisinopril 10mg", None)
            .await
            .unwrap();
        assert!(order.patient_id.is_some());
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;

        let result = service.create_order("  \n\t", None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(service.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identical_text_gives_distinct_orders() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;

        let first = service.create_order(SAMPLE, None).await.unwrap();
        let second = service.create_order(SAMPLE, None).await.unwrap();

        assert_ne!(first.order_id, second.order_id);
        assert_eq!(service.list_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_order_id_collision_suffix() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;
        let orders = OrderRepository::new(&service.pool);
        let now = Utc.timestamp_millis_opt(1_760_000_123_456).unwrap();

        assert_eq!(service.allocate_order_id(&orders, now).await.unwrap(), "ORD-123456");

        sqlx::query(
            "INSERT INTO orders (order_id, patient_name, medication_name, prescription_text, created_at, updated_at)
             VALUES ('ORD-123456', 'a', 'b', 'c', 'x', 'x'), ('ORD-123456-2', 'a', 'b', 'c', 'x', 'x')",
        )
        .execute(&service.pool)
        .await
        .unwrap();

        assert_eq!(service.allocate_order_id(&orders, now).await.unwrap(), "ORD-123456-3");
    }

    #[tokio::test]
    async fn test_prescription_links_once() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;
        let id = stored_prescription(&service).await;

        let order = service.create_order(SAMPLE, Some(id)).await.unwrap();
        assert_eq!(order.prescription_id, Some(id));
        assert_eq!(order.ocr_method.as_deref(), Some("ocr-space"));

        let again = service.create_order(SAMPLE, Some(id)).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let unknown = service.create_order(SAMPLE, Some(9999)).await;
        assert!(matches!(unknown, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_strict_policy() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;
        let order = service.create_order(SAMPLE, None).await.unwrap();

        let skipped = service.update_status(&order.order_id, "dispensed").await;
        assert!(matches!(
            skipped,
            Err(AppError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Dispensed
            })
        ));

        for status in ["processing", "ready", "dispensed"] {
            let updated = service.update_status(&order.order_id, status).await.unwrap();
            assert_eq!(updated.status.as_str(), status);
        }

        let reopened = service.update_status(&order.order_id, "cancelled").await;
        assert!(matches!(reopened, Err(AppError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_strict_transition_checks_status_at_write_time() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;
        let order = service.create_order(SAMPLE, None).await.unwrap();
        for status in ["processing", "ready"] {
            service.update_status(&order.order_id, status).await.unwrap();
        }

        // Both requests read the order while it was ready
        let orders = OrderRepository::new(&service.pool);
        let seen_ready = orders.get_by_order_id(&order.order_id).await.unwrap().unwrap();

        let dispensed = service
            .apply_transition(&orders, &seen_ready, OrderStatus::Dispensed)
            .await
            .unwrap();
        assert_eq!(dispensed.status, OrderStatus::Dispensed);

        let cancelled = service
            .apply_transition(&orders, &seen_ready, OrderStatus::Cancelled)
            .await;
        assert!(matches!(
            cancelled,
            Err(AppError::InvalidTransition {
                from: OrderStatus::Dispensed,
                to: OrderStatus::Cancelled
            })
        ));

        let stored = service.get_order(&order.order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Dispensed);
    }

    #[tokio::test]
    async fn test_permissive_policy() {
        let (_dir, service) = service(TransitionPolicy::Permissive).await;
        let order = service.create_order(SAMPLE, None).await.unwrap();

        let dispensed = service.update_status(&order.order_id, "dispensed").await.unwrap();
        assert_eq!(dispensed.status, OrderStatus::Dispensed);

        let back = service.update_status(&order.order_id, "pending").await.unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;
        let order = service.create_order(SAMPLE, None).await.unwrap();

        let bad = service.update_status(&order.order_id, "completed").await;
        assert!(matches!(bad, Err(AppError::InvalidStatus(_))));

        let missing = service.update_status("ORD-404404", "processing").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        assert!(matches!(
            service.get_order("ORD-404404").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let (_dir, service) = service(TransitionPolicy::Permissive).await;
        let a = service.create_order(SAMPLE, None).await.unwrap();
        service.create_order(SAMPLE, None).await.unwrap();
        service.update_status(&a.order_id, "dispensed").await.unwrap();

        let stats = service.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.completed_orders, 1);
        assert_eq!(stats.today_orders, 2);
    }

    #[tokio::test]
    async fn test_search_medications() {
        let (_dir, service) = service(TransitionPolicy::Strict).await;

        assert!(matches!(
            service.search_medications("  ").await,
            Err(AppError::InvalidInput(_))
        ));
        let found = service.search_medications("omep").await.unwrap();
        assert_eq!(found[0].name, "Omeprazole");
    }
}
