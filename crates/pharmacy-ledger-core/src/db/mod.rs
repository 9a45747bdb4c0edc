//! SQLite storage for the pharmacy ledger.

mod schema;
mod medicines;
mod records;
mod entries;
mod bills;

pub use schema::*;

use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::models::{CashEntry, InsuranceBill, Medicine, PatientRecord};
use crate::store::{rank_fuzzy, LedgerStore, Write, WriteBatch};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn apply_write(conn: &Connection, write: &Write) -> DbResult<()> {
    match write {
        Write::PutMedicine(medicine) => medicines::put_medicine(conn, medicine),
        Write::DeleteMedicine(id) => medicines::delete_medicine(conn, id),
        Write::AdjustStock { medicine_id, delta } => {
            medicines::adjust_stock(conn, medicine_id, *delta)
        }
        Write::PutRecord(record) => records::put_record(conn, record),
        Write::DeleteRecord(id) => records::delete_record(conn, id),
        Write::PutEntry(entry) => entries::put_entry(conn, entry),
        Write::DeleteEntry(id) => entries::delete_entry(conn, id),
        Write::PutBill(bill) => bills::put_bill(conn, bill),
        Write::DeleteBill(id) => bills::delete_bill(conn, id),
        Write::Clear => {
            conn.execute_batch(
                "DELETE FROM patient_records; DELETE FROM cash_entries; \
                 DELETE FROM insurance_bills; DELETE FROM medicines;",
            )?;
            Ok(())
        }
    }
}

impl LedgerStore for Database {
    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        medicines::get_medicine(&self.conn, id)
    }

    fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        medicines::list_medicines(&self.conn)
    }

    fn get_record(&self, id: &str) -> DbResult<Option<PatientRecord>> {
        records::get_record(&self.conn, id)
    }

    fn list_records(&self) -> DbResult<Vec<PatientRecord>> {
        records::list_records(&self.conn)
    }

    fn list_entries(&self) -> DbResult<Vec<CashEntry>> {
        entries::list_entries(&self.conn)
    }

    fn get_bill(&self, id: &str) -> DbResult<Option<InsuranceBill>> {
        bills::get_bill(&self.conn, id)
    }

    fn list_bills(&self) -> DbResult<Vec<InsuranceBill>> {
        bills::list_bills(&self.conn)
    }

    fn apply(&mut self, batch: &WriteBatch) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        for write in batch.writes() {
            apply_write(&tx, write)?;
        }
        tx.commit()?;
        tracing::debug!(writes = batch.len(), "Committed batch to SQLite");
        Ok(())
    }

    /// FTS5 prefix search, then fuzzy ranking when nothing matches.
    fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        if query.trim().is_empty() {
            return Ok(self.list_medicines()?.into_iter().take(limit).collect());
        }
        let found = medicines::search_medicines(&self.conn, query, limit)?;
        if !found.is_empty() {
            return Ok(found);
        }
        Ok(rank_fuzzy(self.list_medicines()?, query, limit))
    }

    fn stock_levels(&self) -> DbResult<HashMap<String, u32>> {
        medicines::stock_levels(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{claim, medicine};

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"medicines".to_string()));
        assert!(tables.contains(&"patient_records".to_string()));
        assert!(tables.contains(&"cash_entries".to_string()));
        assert!(tables.contains(&"insurance_bills".to_string()));
    }

    #[test]
    fn test_batch_rolls_back_on_oversell() {
        let mut db = Database::open_in_memory().unwrap();
        let a = medicine("A", 10, 30);
        let b = medicine("B", 10, 1);
        db.apply(&vec![Write::PutMedicine(a.clone()), Write::PutMedicine(b.clone())].into())
            .unwrap();

        let batch: WriteBatch = vec![
            Write::AdjustStock { medicine_id: a.id.clone(), delta: -5 },
            Write::AdjustStock { medicine_id: b.id.clone(), delta: -2 },
        ]
        .into();
        assert!(matches!(db.apply(&batch), Err(DbError::Constraint(_))));
        assert_eq!(db.get_medicine(&a.id).unwrap().unwrap().total_units, 30);
        assert_eq!(db.get_medicine(&b.id).unwrap().unwrap().total_units, 1);
    }

    #[test]
    fn test_batch_adjust_missing_medicine() {
        let mut db = Database::open_in_memory().unwrap();
        let batch: WriteBatch =
            vec![Write::AdjustStock { medicine_id: "nope".into(), delta: 3 }].into();
        assert!(matches!(db.apply(&batch), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_clear() {
        let mut db = Database::open_in_memory().unwrap();
        let bill = claim().validate().unwrap();
        db.apply(&vec![Write::PutMedicine(medicine("A", 10, 30)), Write::PutBill(bill)].into())
            .unwrap();
        db.apply(&vec![Write::Clear].into()).unwrap();
        assert!(db.list_medicines().unwrap().is_empty());
        assert!(db.list_bills().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let med = medicine("Panadol", 10, 30);
        {
            let mut db = Database::open(&path).unwrap();
            db.apply(&vec![Write::PutMedicine(med.clone())].into()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_medicine(&med.id).unwrap(), Some(med));
    }
}
