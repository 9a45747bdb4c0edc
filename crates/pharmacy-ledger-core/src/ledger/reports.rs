//! Totals, summaries and CSV export over stored data.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{Ledger, LedgerResult};
use crate::export::{self, ReportKind};
use crate::store::LedgerStore;
use crate::totals::{
    self, CashSummary, DailySummary, OverallTotals, PatientGroup, PatientSuggestion,
};

impl<S: LedgerStore> Ledger<S> {
    pub fn overall_totals(&self) -> LedgerResult<OverallTotals> {
        Ok(totals::overall_totals(&self.store.list_records()?))
    }

    /// Per-day totals, newest first, optionally filtered by ISO date substring.
    pub fn daily_summaries(&self, date_filter: Option<&str>) -> LedgerResult<Vec<DailySummary>> {
        Ok(totals::daily_summaries(&self.store.list_records()?, date_filter))
    }

    pub fn patient_groups(&self, query: &str) -> LedgerResult<Vec<PatientGroup>> {
        Ok(totals::patient_groups(&self.store.list_records()?, query))
    }

    pub fn patient_suggestions(&self, query: &str, limit: usize) -> LedgerResult<Vec<PatientSuggestion>> {
        Ok(totals::patient_suggestions(&self.store.list_records()?, query, limit))
    }

    pub fn cash_summary(&self) -> LedgerResult<CashSummary> {
        Ok(totals::cash_summary(
            &self.store.list_records()?,
            &self.store.list_entries()?,
        ))
    }

    pub fn records_csv(&self) -> LedgerResult<String> {
        let records = self.store.list_records()?;
        Ok(export::records_csv(&records, &self.config.currency_label)?)
    }

    pub fn inventory_csv(&self) -> LedgerResult<String> {
        let medicines = self.store.list_medicines()?;
        Ok(export::inventory_csv(&medicines, self.config.low_stock_threshold)?)
    }

    /// Render a report and write it to `dir` as
    /// `{report_prefix}_{Records|Inventory}_{date}.csv`.
    pub fn write_csv(&self, dir: &Path, kind: ReportKind, date: NaiveDate) -> LedgerResult<PathBuf> {
        let contents = match kind {
            ReportKind::Records => self.records_csv()?,
            ReportKind::Inventory => self.inventory_csv()?,
        };
        Ok(export::write_csv(
            dir,
            &self.config.report_prefix,
            kind,
            date,
            &contents,
        )?)
    }
}
