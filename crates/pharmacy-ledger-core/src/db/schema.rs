//! SQLite schema definition.

/// Complete database schema for the pharmacy ledger.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Medicines (inventory)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    strength TEXT NOT NULL,
    form TEXT NOT NULL,
    pack_purchase_rate REAL NOT NULL CHECK (pack_purchase_rate >= 0),
    pack_retail_rate REAL NOT NULL CHECK (pack_retail_rate >= 0),
    units_per_pack INTEGER NOT NULL CHECK (units_per_pack >= 1),
    total_units INTEGER NOT NULL CHECK (total_units >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- FTS5 virtual table for name/strength search
CREATE VIRTUAL TABLE IF NOT EXISTS medicines_fts USING fts5(
    name,
    strength,
    content='medicines',
    content_rowid='rowid'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS medicines_ai AFTER INSERT ON medicines BEGIN
    INSERT INTO medicines_fts(rowid, name, strength)
    VALUES (new.rowid, new.name, new.strength);
END;

CREATE TRIGGER IF NOT EXISTS medicines_ad AFTER DELETE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name, strength)
    VALUES ('delete', old.rowid, old.name, old.strength);
END;

CREATE TRIGGER IF NOT EXISTS medicines_au AFTER UPDATE ON medicines BEGIN
    INSERT INTO medicines_fts(medicines_fts, rowid, name, strength)
    VALUES ('delete', old.rowid, old.name, old.strength);
    INSERT INTO medicines_fts(rowid, name, strength)
    VALUES (new.rowid, new.name, new.strength);
END;

CREATE INDEX IF NOT EXISTS idx_medicines_name ON medicines(name COLLATE NOCASE);

-- ============================================================================
-- Patient records (sales)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_records (
    id TEXT PRIMARY KEY,
    patient_name TEXT NOT NULL,
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    diagnosis TEXT,
    vitals TEXT NOT NULL DEFAULT '{}',           -- JSON object
    doctor_fees REAL NOT NULL DEFAULT 0,
    medicines TEXT NOT NULL DEFAULT '[]',        -- JSON array of line items
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_date ON patient_records(date);
CREATE INDEX IF NOT EXISTS idx_records_patient ON patient_records(patient_name COLLATE NOCASE);

-- ============================================================================
-- Cash entries (other income and expenses)
-- ============================================================================

CREATE TABLE IF NOT EXISTS cash_entries (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
    name TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    created_at TEXT NOT NULL
);

-- ============================================================================
-- Insurance bills (claims, no stock movement)
-- ============================================================================

CREATE TABLE IF NOT EXISTS insurance_bills (
    id TEXT PRIMARY KEY,
    insurance_number TEXT NOT NULL UNIQUE,
    patient_name TEXT NOT NULL,
    patient_age TEXT NOT NULL,
    patient_contact TEXT,
    patient_cnic TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female', 'Other')),
    date TEXT NOT NULL,                          -- YYYY-MM-DD
    diagnosis TEXT NOT NULL,
    medicines TEXT NOT NULL DEFAULT '[]',        -- JSON array of prescriptions
    labs TEXT NOT NULL DEFAULT '[]',             -- JSON array of lab names
    medicine_total REAL NOT NULL CHECK (medicine_total >= 0),
    doctor_fees REAL NOT NULL CHECK (doctor_fees >= 0),
    total_amount REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bills_date ON insurance_bills(date);
"#;
