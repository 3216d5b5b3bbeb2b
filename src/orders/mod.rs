//! Pharmacy orders
//!
//! Orders are created from prescription text and advance through
//! pending → processing → ready → dispensed, or end in cancelled.

mod service;
mod status;

pub use service::{generate_order_id, OrderService};
pub use status::{OrderStatus, TransitionPolicy};
