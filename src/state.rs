//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::ocr::OcrService;
use crate::orders::OrderService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    ocr: Arc<OcrService>,
    orders: OrderService,
}

impl AppState {
    /// Create a new application state
    ///
    /// The order service shares the pool and takes its transition policy
    /// from `config.orders`.
    pub fn new(config: Config, db: SqlitePool, ocr: OcrService) -> Self {
        let orders = OrderService::new(db.clone(), config.orders.transition_policy);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                ocr: Arc::new(ocr),
                orders,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the OCR service
    pub fn ocr(&self) -> &OcrService {
        &self.inner.ocr
    }

    /// Get the order service
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
