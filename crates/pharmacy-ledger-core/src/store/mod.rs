//! Persistence boundary for the ledger.
//!
//! Reads are plain lookups. Every mutation goes through [`LedgerStore::apply`]
//! as a [`WriteBatch`] that a backend must commit all-or-nothing.

mod memory;

pub use memory::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::db::DbResult;
use crate::models::{CashEntry, InsuranceBill, Medicine, PatientRecord};
use crate::stock::StockPlan;

/// Below this similarity a fuzzy search candidate is dropped.
const MIN_FUZZY_SCORE: f64 = 0.55;

/// A single store mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Write {
    /// Insert or replace a medicine
    PutMedicine(Medicine),
    DeleteMedicine(String),
    /// Add `delta` units to a medicine's stock. The backend must refuse to
    /// take stock below zero or touch a missing medicine.
    AdjustStock { medicine_id: String, delta: i64 },
    /// Insert or replace a patient record
    PutRecord(PatientRecord),
    DeleteRecord(String),
    PutEntry(CashEntry),
    DeleteEntry(String),
    /// Insert or replace an insurance bill
    PutBill(InsuranceBill),
    DeleteBill(String),
    /// Remove everything the ledger stores
    Clear,
}

/// Ordered writes committed atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Append one `AdjustStock` per planned adjustment.
    pub fn adjust_stock(&mut self, plan: &StockPlan) -> &mut Self {
        for adjustment in &plan.adjustments {
            self.writes.push(Write::AdjustStock {
                medicine_id: adjustment.medicine_id.clone(),
                delta: adjustment.delta,
            });
        }
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl From<Vec<Write>> for WriteBatch {
    fn from(writes: Vec<Write>) -> Self {
        Self { writes }
    }
}

/// Storage backend for medicines, patient records, cash entries and
/// insurance bills.
pub trait LedgerStore {
    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>>;

    /// All medicines ordered by name.
    fn list_medicines(&self) -> DbResult<Vec<Medicine>>;

    fn get_record(&self, id: &str) -> DbResult<Option<PatientRecord>>;

    /// All records, newest visit date first.
    fn list_records(&self) -> DbResult<Vec<PatientRecord>>;

    /// All cash entries, newest first.
    fn list_entries(&self) -> DbResult<Vec<CashEntry>>;

    fn get_bill(&self, id: &str) -> DbResult<Option<InsuranceBill>>;

    /// All insurance bills, newest bill date first.
    fn list_bills(&self) -> DbResult<Vec<InsuranceBill>>;

    /// Commit a batch. On error nothing in the batch is visible.
    fn apply(&mut self, batch: &WriteBatch) -> DbResult<()>;

    /// Medicines whose "name strength" contains the query, falling back to
    /// fuzzy ranking when nothing matches.
    fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        let medicines = self.list_medicines()?;
        if query.trim().is_empty() {
            return Ok(medicines.into_iter().take(limit).collect());
        }
        let matches: Vec<Medicine> = medicines
            .iter()
            .filter(|m| m.matches(query))
            .take(limit)
            .cloned()
            .collect();
        if !matches.is_empty() {
            return Ok(matches);
        }
        Ok(rank_fuzzy(medicines, query, limit))
    }

    /// Current stock of every medicine, for stock planning.
    fn stock_levels(&self) -> DbResult<HashMap<String, u32>> {
        Ok(self
            .list_medicines()?
            .into_iter()
            .map(|m| (m.id, m.total_units))
            .collect())
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Box<T> {
    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        (**self).get_medicine(id)
    }

    fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        (**self).list_medicines()
    }

    fn get_record(&self, id: &str) -> DbResult<Option<PatientRecord>> {
        (**self).get_record(id)
    }

    fn list_records(&self) -> DbResult<Vec<PatientRecord>> {
        (**self).list_records()
    }

    fn list_entries(&self) -> DbResult<Vec<CashEntry>> {
        (**self).list_entries()
    }

    fn get_bill(&self, id: &str) -> DbResult<Option<InsuranceBill>> {
        (**self).get_bill(id)
    }

    fn list_bills(&self) -> DbResult<Vec<InsuranceBill>> {
        (**self).list_bills()
    }

    fn apply(&mut self, batch: &WriteBatch) -> DbResult<()> {
        (**self).apply(batch)
    }

    fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        (**self).search_medicines(query, limit)
    }

    fn stock_levels(&self) -> DbResult<HashMap<String, u32>> {
        (**self).stock_levels()
    }
}

/// Rank medicines by name similarity, best first.
pub(crate) fn rank_fuzzy(medicines: Vec<Medicine>, query: &str, limit: usize) -> Vec<Medicine> {
    let query = query.trim().to_lowercase();
    let mut scored: Vec<(f64, Medicine)> = medicines
        .into_iter()
        .map(|m| {
            let name = m.name.to_lowercase();
            let full = format!("{} {}", name, m.strength.to_lowercase());
            (fuzzy_match(&query, &name).max(fuzzy_match(&query, &full)), m)
        })
        .filter(|(score, _)| *score >= MIN_FUZZY_SCORE)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(_, m)| m).collect()
}

/// Jaro-Winkler catches typos, Levenshtein overall similarity.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
