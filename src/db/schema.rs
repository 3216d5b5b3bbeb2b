//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema and reference data
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;
    sqlx::query(SEED_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Patients table
CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    phone TEXT,
    date_of_birth TEXT,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name COLLATE NOCASE);

-- Medications table (formulary)
CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    generic_name TEXT,
    dosage TEXT,
    form TEXT,
    manufacturer TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Prescriptions table (one row per OCR attempt, never updated)
CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_path TEXT,
    extracted_text TEXT NOT NULL,
    confidence_score REAL NOT NULL DEFAULT 0,
    ocr_method TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_created_at ON prescriptions(created_at);

-- Orders table
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id TEXT NOT NULL UNIQUE,
    patient_id INTEGER REFERENCES patients(id),
    medication_id INTEGER REFERENCES medications(id),
    prescription_id INTEGER REFERENCES prescriptions(id),
    patient_name TEXT NOT NULL,
    medication_name TEXT NOT NULL,
    dosage TEXT NOT NULL DEFAULT '',
    quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 1),
    instructions TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'processing', 'ready', 'dispensed', 'cancelled')),
    prescribed_by TEXT NOT NULL DEFAULT '',
    prescription_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);
-- A prescription backs at most one order
CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_prescription_id
    ON orders(prescription_id) WHERE prescription_id IS NOT NULL;
"#;

const SEED_SQL: &str = r#"
INSERT OR IGNORE INTO patients (name, email, phone, date_of_birth, address) VALUES
    ('John Doe', 'john.doe@email.com', '+1234567890', '1985-06-15', '123 Main St, City'),
    ('Jane Smith', 'jane.smith@email.com', '+1234567891', '1990-03-22', '456 Oak Ave, City'),
    ('Bob Johnson', 'bob.johnson@email.com', '+1234567892', '1978-11-08', '789 Pine Rd, City');

INSERT OR IGNORE INTO medications (name, generic_name, dosage, form, manufacturer) VALUES
    ('Amoxicillin', 'Amoxicillin', '500mg', 'Capsule', 'Generic Pharma'),
    ('Lisinopril', 'Lisinopril', '10mg', 'Tablet', 'Heart Meds Inc'),
    ('Metformin', 'Metformin HCl', '850mg', 'Tablet', 'Diabetes Care'),
    ('Ibuprofen', 'Ibuprofen', '200mg', 'Tablet', 'Pain Relief Co'),
    ('Omeprazole', 'Omeprazole', '20mg', 'Capsule', 'Gastro Meds');
"#;
