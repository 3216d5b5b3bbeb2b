//! Draft order fields produced from OCR text

use serde::{Deserialize, Serialize};

pub const UNKNOWN_PATIENT: &str = "Unknown Patient";
pub const UNKNOWN_MEDICATION: &str = "Unknown Medication";
pub const DEFAULT_QUANTITY: u32 = 1;

/// Structured fields extracted from a prescription
///
/// Never persisted on its own; the order service copies these into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFields {
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub quantity: u32,
    pub prescribed_by: String,
}

impl Default for DraftFields {
    fn default() -> Self {
        Self {
            patient_name: UNKNOWN_PATIENT.to_string(),
            medication_name: UNKNOWN_MEDICATION.to_string(),
            dosage: String::new(),
            quantity: DEFAULT_QUANTITY,
            prescribed_by: String::new(),
        }
    }
}
