//! The ledger service: every user-facing operation over a [`LedgerStore`].
//!
//! Each mutating operation reads what it needs, plans the full change with
//! the pure rules in [`crate::stock`], and commits a single [`WriteBatch`].
//! A failed check returns before anything is written.

mod insurance;
mod inventory;
mod records;
mod reports;

pub use records::{EditReport, RestoreReport};

use thiserror::Error;

use crate::config::LedgerConfig;
use crate::db::DbError;
use crate::export::ExportError;
use crate::models::{CashEntry, EntryKind, ValidationError};
use crate::stock::StockError;
use crate::store::{LedgerStore, Write, WriteBatch};

/// Ledger operation errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Insufficient stock for {name}: requested {requested} units, {available} available")]
    InsufficientStock {
        medicine_id: String,
        name: String,
        requested: u64,
        available: u64,
    },

    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Cash entry not found: {0}")]
    EntryNotFound(String),

    #[error("Insurance bill not found: {0}")]
    BillNotFound(String),

    #[error("Record {0} was changed since it was loaded")]
    StaleRecord(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] DbError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl From<StockError> for LedgerError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::InsufficientStock {
                medicine_id,
                requested,
                available,
            } => LedgerError::InsufficientStock {
                name: medicine_id.clone(),
                medicine_id,
                requested,
                available,
            },
            StockError::MedicineNotFound(id) => LedgerError::MedicineNotFound(id),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Pharmacy ledger over a storage backend.
pub struct Ledger<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LedgerConfig) {
        self.config = config;
    }

    fn commit(&mut self, batch: WriteBatch) -> LedgerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.store.apply(&batch)?;
        Ok(())
    }

    /// Turn a stock planning failure into a ledger error carrying the
    /// medicine's display name.
    fn reject(&self, err: StockError) -> LedgerError {
        let mut err = LedgerError::from(err);
        if let LedgerError::InsufficientStock {
            medicine_id,
            name,
            requested,
            available,
        } = &mut err
        {
            if let Ok(Some(medicine)) = self.store.get_medicine(medicine_id) {
                *name = medicine.full_name();
            }
            tracing::warn!(
                medicine_id = %medicine_id,
                requested = *requested,
                available = *available,
                "Rejected: insufficient stock"
            );
        } else if let LedgerError::MedicineNotFound(id) = &err {
            tracing::warn!(medicine_id = %id, "Rejected: medicine no longer exists");
        }
        err
    }

    // =========================================================================
    // Cash entries
    // =========================================================================

    /// Record other income or an expense.
    pub fn add_entry(&mut self, kind: EntryKind, name: &str, amount: &str) -> LedgerResult<CashEntry> {
        let entry = CashEntry::new(kind, name, amount)?;
        self.commit(vec![Write::PutEntry(entry.clone())].into())?;
        tracing::info!(entry_id = %entry.id, kind = entry.kind.as_str(), amount = entry.amount, "Added cash entry");
        Ok(entry)
    }

    pub fn delete_entry(&mut self, id: &str) -> LedgerResult<CashEntry> {
        let entry = self
            .store
            .list_entries()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| LedgerError::EntryNotFound(id.to_string()))?;
        self.commit(vec![Write::DeleteEntry(entry.id.clone())].into())?;
        tracing::info!(entry_id = %entry.id, "Deleted cash entry");
        Ok(entry)
    }

    pub fn list_entries(&self) -> LedgerResult<Vec<CashEntry>> {
        Ok(self.store.list_entries()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_stock_error_conversion() {
        let err: LedgerError = StockError::InsufficientStock {
            medicine_id: "m1".into(),
            requested: 10,
            available: 3,
        }
        .into();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { requested: 10, available: 3, .. }
        ));

        let err: LedgerError = StockError::MedicineNotFound("m2".into()).into();
        assert!(matches!(err, LedgerError::MedicineNotFound(ref id) if id == "m2"));
    }

    #[test]
    fn test_cash_entries() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let rent = ledger.add_entry(EntryKind::Expense, "Rent", "15000").unwrap();
        ledger.add_entry(EntryKind::Income, "Lab share", "2500").unwrap();
        assert_eq!(ledger.list_entries().unwrap().len(), 2);

        ledger.delete_entry(&rent.id).unwrap();
        assert_eq!(ledger.list_entries().unwrap().len(), 1);
        assert!(matches!(
            ledger.delete_entry(&rent.id),
            Err(LedgerError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_entry_writes_nothing() {
        let mut ledger = Ledger::new(MemoryStore::new());
        assert!(matches!(
            ledger.add_entry(EntryKind::Expense, "Rent", "abc"),
            Err(LedgerError::Validation(_))
        ));
        assert!(ledger.list_entries().unwrap().is_empty());
    }
}
