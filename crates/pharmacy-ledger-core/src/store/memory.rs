//! In-memory store with an optional JSON snapshot file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{LedgerStore, Write, WriteBatch};
use crate::db::{DbError, DbResult};
use crate::models::{CashEntry, InsuranceBill, Medicine, PatientRecord};

/// Everything the ledger persists, as one serializable document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub medicines: BTreeMap<String, Medicine>,
    #[serde(default)]
    pub records: BTreeMap<String, PatientRecord>,
    #[serde(default)]
    pub entries: BTreeMap<String, CashEntry>,
    #[serde(default)]
    pub bills: BTreeMap<String, InsuranceBill>,
}

impl LedgerSnapshot {
    fn apply_write(&mut self, write: &Write) -> DbResult<()> {
        match write {
            Write::PutMedicine(medicine) => {
                self.medicines.insert(medicine.id.clone(), medicine.clone());
            }
            Write::DeleteMedicine(id) => {
                self.medicines
                    .remove(id)
                    .ok_or_else(|| DbError::NotFound(id.clone()))?;
            }
            Write::AdjustStock { medicine_id, delta } => {
                let medicine = self
                    .medicines
                    .get_mut(medicine_id)
                    .ok_or_else(|| DbError::NotFound(medicine_id.clone()))?;
                let adjusted = i64::from(medicine.total_units) + delta;
                medicine.total_units = u32::try_from(adjusted).map_err(|_| {
                    DbError::Constraint(format!(
                        "stock of {} cannot become {}",
                        medicine_id, adjusted
                    ))
                })?;
                medicine.touch();
            }
            Write::PutRecord(record) => {
                self.records.insert(record.id.clone(), record.clone());
            }
            Write::DeleteRecord(id) => {
                self.records
                    .remove(id)
                    .ok_or_else(|| DbError::NotFound(id.clone()))?;
            }
            Write::PutEntry(entry) => {
                self.entries.insert(entry.id.clone(), entry.clone());
            }
            Write::DeleteEntry(id) => {
                self.entries
                    .remove(id)
                    .ok_or_else(|| DbError::NotFound(id.clone()))?;
            }
            Write::PutBill(bill) => {
                self.bills.insert(bill.id.clone(), bill.clone());
            }
            Write::DeleteBill(id) => {
                self.bills
                    .remove(id)
                    .ok_or_else(|| DbError::NotFound(id.clone()))?;
            }
            Write::Clear => *self = Self::default(),
        }
        Ok(())
    }
}

/// Store that keeps state in memory and, when opened on a path, rewrites
/// the snapshot file after every committed batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    path: Option<PathBuf>,
    state: LedgerSnapshot,
}

impl MemoryStore {
    /// Empty store with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path`, or start empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            LedgerSnapshot::default()
        };
        tracing::debug!(
            path = %path.display(),
            medicines = state.medicines.len(),
            records = state.records.len(),
            "Opened ledger snapshot"
        );
        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.state
    }

    /// Write the current state to the backing file, if any.
    pub fn save(&self) -> DbResult<()> {
        match &self.path {
            Some(path) => write_snapshot(path, &self.state),
            None => Ok(()),
        }
    }
}

/// Write via a sibling temp file so a crash never leaves a torn snapshot.
fn write_snapshot(path: &Path, state: &LedgerSnapshot) -> DbResult<()> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl LedgerStore for MemoryStore {
    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        Ok(self.state.medicines.get(id).cloned())
    }

    fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut medicines: Vec<Medicine> = self.state.medicines.values().cloned().collect();
        medicines.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.strength.cmp(&b.strength))
        });
        Ok(medicines)
    }

    fn get_record(&self, id: &str) -> DbResult<Option<PatientRecord>> {
        Ok(self.state.records.get(id).cloned())
    }

    fn list_records(&self) -> DbResult<Vec<PatientRecord>> {
        let mut records: Vec<PatientRecord> = self.state.records.values().cloned().collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    fn list_entries(&self) -> DbResult<Vec<CashEntry>> {
        let mut entries: Vec<CashEntry> = self.state.entries.values().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    fn get_bill(&self, id: &str) -> DbResult<Option<InsuranceBill>> {
        Ok(self.state.bills.get(id).cloned())
    }

    fn list_bills(&self) -> DbResult<Vec<InsuranceBill>> {
        let mut bills: Vec<InsuranceBill> = self.state.bills.values().cloned().collect();
        bills.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(bills)
    }

    fn apply(&mut self, batch: &WriteBatch) -> DbResult<()> {
        let mut scratch = self.state.clone();
        for write in batch.writes() {
            scratch.apply_write(write)?;
        }
        if let Some(path) = &self.path {
            write_snapshot(path, &scratch)?;
        }
        tracing::debug!(writes = batch.len(), "Applied batch to memory store");
        self.state = scratch;
        Ok(())
    }
}
