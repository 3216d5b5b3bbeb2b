//! Prescription Field Extraction
//!
//! Heuristic, line-based parsing of OCR text into draft order fields.
//! Extraction is pure and total: a field with no matching line keeps its
//! default, and the same line may feed more than one field.

pub mod rules;
mod types;

pub use types::{DraftFields, DEFAULT_QUANTITY, UNKNOWN_MEDICATION, UNKNOWN_PATIENT};

use rules::LineRule;

/// Non-empty trimmed lines, in source order
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Extract draft order fields from free-form prescription text
pub fn extract_fields(text: &str) -> DraftFields {
    let lines = split_lines(text);
    let defaults = DraftFields::default();

    DraftFields {
        patient_name: cleaned(&rules::PATIENT, &lines).unwrap_or(defaults.patient_name),
        medication_name: cleaned(&rules::MEDICATION, &lines).unwrap_or(defaults.medication_name),
        dosage: cleaned(&rules::DOSAGE, &lines).unwrap_or(defaults.dosage),
        quantity: rules::QUANTITY
            .first_match(&lines)
            .and_then(rules::first_number)
            .unwrap_or(defaults.quantity),
        prescribed_by: cleaned(&rules::PRESCRIBER, &lines).unwrap_or(defaults.prescribed_by),
    }
}

fn cleaned(rule: &LineRule, lines: &[&str]) -> Option<String> {
    rule.first_match(lines)
        .map(|line| rule.clean(line))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prescription() {
        let text = "Patient: Jane Roe\nRx: Amoxicillin 500mg\nTake twice daily\nQty: 20\nDr. Smith";

        assert_eq!(
            extract_fields(text),
            DraftFields {
                patient_name: "Jane Roe".to_string(),
                medication_name: "Amoxicillin 500mg".to_string(),
                dosage: "Take twice daily".to_string(),
                quantity: 20,
                prescribed_by: "Smith".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_text_yields_defaults() {
        assert_eq!(extract_fields(""), DraftFields::default());
        assert_eq!(extract_fields("\n \r\n\t\n"), DraftFields::default());

        let fields = extract_fields("illegible scribble");
        assert_eq!(fields.patient_name, UNKNOWN_PATIENT);
        assert_eq!(fields.medication_name, UNKNOWN_MEDICATION);
        assert_eq!(fields.dosage, "");
        assert_eq!(fields.quantity, 1);
        assert_eq!(fields.prescribed_by, "");
    }

    #[test]
    fn test_quantity_variants() {
        assert_eq!(extract_fields("Quantity: 30 tablets").quantity, 30);
        assert_eq!(extract_fields("Qty #2").quantity, 2);
        assert_eq!(extract_fields("Qty: as needed").quantity, 1);
        assert_eq!(extract_fields("Qty: \u{0663} 30").quantity, 30);
    }

    #[test]
    fn test_medication_name_header_is_not_a_patient() {
        let text = "Medication Name: Amoxicillin\nPatient Name: John Doe";
        let fields = extract_fields(text);

        assert_eq!(fields.patient_name, "John Doe");
        assert_eq!(fields.medication_name, "Name: Amoxicillin");
    }

    #[test]
    fn test_patient_name_label() {
        assert_eq!(extract_fields("Patient Name: John Doe").patient_name, "John Doe");
    }

    #[test]
    fn test_line_can_feed_several_fields() {
        let fields = extract_fields("Qty 14: Ibuprofen 200mg twice daily");

        assert_eq!(fields.medication_name, "Qty 14: Ibuprofen 200mg twice daily");
        assert_eq!(fields.dosage, "Qty 14: Ibuprofen 200mg twice daily");
        assert_eq!(fields.quantity, 14);

        // The first digit run wins even when it is the strength
        assert_eq!(extract_fields("Ibuprofen 200mg, qty 14").quantity, 200);
    }

    #[test]
    fn test_label_only_line_falls_back() {
        let fields = extract_fields("Patient:\nRx:");
        assert_eq!(fields.patient_name, UNKNOWN_PATIENT);
        assert_eq!(fields.medication_name, UNKNOWN_MEDICATION);
    }

    #[test]
    fn test_windows_line_endings() {
        let fields = extract_fields("Patient: Ana Lima\r\nRx: Metformin 850mg\r\nDr. Costa\r\n");
        assert_eq!(fields.patient_name, "Ana Lima");
        assert_eq!(fields.medication_name, "Metformin 850mg");
        assert_eq!(fields.prescribed_by, "Costa");
    }

    #[test]
    fn test_deterministic() {
        let text = "Name: Bob\nLisinopril 10mg\nonce every morning\n#30\nDoctor Who";
        assert_eq!(extract_fields(text), extract_fields(text));

        let fields = extract_fields(text);
        assert_eq!(fields.patient_name, "Bob");
        assert_eq!(fields.medication_name, "Lisinopril 10mg");
        assert_eq!(fields.dosage, "once every morning");
        assert_eq!(fields.quantity, 30);
        assert_eq!(fields.prescribed_by, "Who");
    }
}
