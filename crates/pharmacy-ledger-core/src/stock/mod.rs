//! Inventory bookkeeping for patient-record changes.
//!
//! Saving a record reserves stock, deleting it restores stock, and editing
//! it reconciles the difference. Each rule turns line items plus current
//! stock levels into a [`StockPlan`] without touching storage; the plan is
//! either fully valid or rejected, so callers can commit it in one batch.

mod planner;

pub use planner::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock planning errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("Insufficient stock for {medicine_id}: requested {requested}, available {available}")]
    InsufficientStock {
        medicine_id: String,
        requested: u64,
        available: u64,
    },

    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),
}

pub type StockResult<T> = Result<T, StockError>;

/// Read-only view of current stock, in units, keyed by medicine ID.
pub trait StockLevels {
    /// Units on hand, or `None` if the medicine does not exist.
    fn units(&self, medicine_id: &str) -> Option<u32>;
}

impl StockLevels for HashMap<String, u32> {
    fn units(&self, medicine_id: &str) -> Option<u32> {
        self.get(medicine_id).copied()
    }
}

/// A signed change to one medicine's stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockAdjustment {
    pub medicine_id: String,
    /// Positive restores units, negative deducts them
    pub delta: i64,
}

/// The full set of stock changes an operation will commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockPlan {
    /// Adjustments ordered by medicine ID; never contains a zero delta
    pub adjustments: Vec<StockAdjustment>,
    /// Medicines whose restoration was skipped because they no longer exist
    pub skipped: Vec<String>,
}

impl StockPlan {
    /// True when the plan changes no stock.
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Net delta planned for a medicine (zero if untouched).
    pub fn delta_for(&self, medicine_id: &str) -> i64 {
        self.adjustments
            .iter()
            .filter(|a| a.medicine_id == medicine_id)
            .map(|a| a.delta)
            .sum()
    }

    fn push(&mut self, medicine_id: &str, delta: i64) {
        if delta != 0 {
            self.adjustments.push(StockAdjustment {
                medicine_id: medicine_id.to_string(),
                delta,
            });
        }
    }
}
