//! Patient record operations and their stock bookkeeping.

use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{LineItem, NewPatientRecord, PatientRecord};
use crate::stock::{plan_reconciliation, plan_reservation, plan_restoration, StockAdjustment};
use crate::store::{LedgerStore, Write, WriteBatch};

/// Outcome of deleting a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestoreReport {
    /// The record that was deleted
    pub record: PatientRecord,
    /// Units given back per medicine
    pub restored: Vec<StockAdjustment>,
    /// Medicines that no longer exist, so nothing was restored for them
    pub skipped: Vec<String>,
}

/// Outcome of editing a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditReport {
    /// The record as saved
    pub record: PatientRecord,
    /// Net stock change per medicine (positive restores)
    pub adjustments: Vec<StockAdjustment>,
    /// Removed medicines that no longer exist
    pub skipped: Vec<String>,
}

impl<S: LedgerStore> Ledger<S> {
    /// Save a new visit and deduct its medicines from stock.
    pub fn save_record(&mut self, new: NewPatientRecord) -> LedgerResult<PatientRecord> {
        let record = new.validate()?;
        let levels = self.store.stock_levels()?;
        let plan = plan_reservation(&record.medicines, &levels).map_err(|e| self.reject(e))?;
        self.check_line_rates(&record.medicines, &[])?;

        let mut batch = WriteBatch::new();
        batch
            .adjust_stock(&plan)
            .push(Write::PutRecord(record.clone()));
        self.commit(batch)?;

        tracing::info!(
            record_id = %record.id,
            medicines = record.medicines.len(),
            units = record.medicines.iter().map(|m| u64::from(m.quantity)).sum::<u64>(),
            "Saved patient record"
        );
        Ok(record)
    }

    /// Delete a visit and give its medicines back to stock.
    pub fn delete_record(&mut self, id: &str) -> LedgerResult<RestoreReport> {
        let record = self.require_record(id)?;
        let levels = self.store.stock_levels()?;
        let plan = plan_restoration(&record.medicines, &levels);
        for medicine_id in &plan.skipped {
            tracing::warn!(
                record_id = %record.id,
                medicine_id = %medicine_id,
                "Medicine no longer exists, skipping stock restoration"
            );
        }

        let mut batch = WriteBatch::new();
        batch
            .adjust_stock(&plan)
            .push(Write::DeleteRecord(record.id.clone()));
        self.commit(batch)?;

        tracing::info!(
            record_id = %record.id,
            restored = plan.adjustments.len(),
            skipped = plan.skipped.len(),
            "Deleted patient record"
        );
        Ok(RestoreReport {
            record,
            restored: plan.adjustments,
            skipped: plan.skipped,
        })
    }

    /// Replace `original` with `edited`, applying only the net stock change.
    ///
    /// `original` must be the record as the caller loaded it; if the stored
    /// line items differ, someone else changed the record and the edit is
    /// refused with [`LedgerError::StaleRecord`].
    pub fn edit_record(
        &mut self,
        original: &PatientRecord,
        edited: PatientRecord,
    ) -> LedgerResult<EditReport> {
        let stored = self.require_record(&original.id)?;
        if stored.medicines != original.medicines {
            tracing::warn!(record_id = %original.id, "Rejected edit of stale record");
            return Err(LedgerError::StaleRecord(original.id.clone()));
        }

        let mut record = edited.validate()?;
        record.id = stored.id.clone();
        record.created_at = stored.created_at.clone();
        record.touch();

        let levels = self.store.stock_levels()?;
        let plan = plan_reconciliation(&stored.medicines, &record.medicines, &levels)
            .map_err(|e| self.reject(e))?;
        self.check_line_rates(&record.medicines, &stored.medicines)?;
        for medicine_id in &plan.skipped {
            tracing::warn!(
                record_id = %record.id,
                medicine_id = %medicine_id,
                "Medicine no longer exists, skipping stock restoration"
            );
        }

        let mut batch = WriteBatch::new();
        batch
            .adjust_stock(&plan)
            .push(Write::PutRecord(record.clone()));
        self.commit(batch)?;

        tracing::info!(
            record_id = %record.id,
            adjusted = plan.adjustments.len(),
            "Edited patient record"
        );
        Ok(EditReport {
            record,
            adjustments: plan.adjustments,
            skipped: plan.skipped,
        })
    }

    pub fn get_record(&self, id: &str) -> LedgerResult<Option<PatientRecord>> {
        Ok(self.store.get_record(id)?)
    }

    /// All records, newest visit first.
    pub fn list_records(&self) -> LedgerResult<Vec<PatientRecord>> {
        Ok(self.store.list_records()?)
    }

    /// Every line must carry the medicine's current rates, unless it keeps
    /// the snapshot of a line in `previous`.
    fn check_line_rates(&self, items: &[LineItem], previous: &[LineItem]) -> LedgerResult<()> {
        for item in items {
            if previous.iter().any(|p| item.same_rates(p)) {
                continue;
            }
            let medicine = self
                .store
                .get_medicine(&item.medicine_id)?
                .ok_or_else(|| LedgerError::MedicineNotFound(item.medicine_id.clone()))?;
            item.check_rates(&medicine)?;
        }
        Ok(())
    }

    fn require_record(&self, id: &str) -> LedgerResult<PatientRecord> {
        self.store
            .get_record(id)?
            .ok_or_else(|| LedgerError::RecordNotFound(id.to_string()))
    }
}
