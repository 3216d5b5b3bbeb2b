//! Pharmacy Assistant Server
//!
//! Prescription intake for a retail pharmacy: photographed prescriptions are
//! run through hosted OCR, parsed into draft order fields, and tracked as
//! orders through fulfilment. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `ocr`: provider chain with client-side fallback
//! - `extract`: line-rule field extraction from OCR text
//! - `orders`: order lifecycle and transition policy
//! - `db`: SQLite repositories
//! - `routes`: the HTTP API

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod orders;
pub mod routes;
pub mod state;
