//! Pharmacy Ledger Core Library
//!
//! Point-of-sale and record keeping for a small clinic pharmacy: patient
//! visits, medicine inventory, sales summaries, expenses and CSV reports.
//!
//! # Architecture
//!
//! ```text
//!   Save visit ──► plan_reservation ─────┐
//!   Delete visit ► plan_restoration ─────┼──► WriteBatch ──► LedgerStore::apply
//!   Edit visit ──► plan_reconciliation ──┘   (one atomic      ├─ Database (SQLite)
//!                                              commit)         └─ MemoryStore (JSON)
//!
//!   Stored records ──► totals (daily / patient / cash) ──► export (CSV)
//! ```
//!
//! # Core Principle
//!
//! **Stock follows the records.** Saving a visit deducts its medicines,
//! deleting it gives them back, editing it applies only the difference,
//! and each of those either fully succeeds or changes nothing.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Medicine, LineItem, PatientRecord, CashEntry, InsuranceBill)
//! - [`stock`]: Reservation, restoration and reconciliation planning
//! - [`totals`]: Sales, cost and profit derivation and summaries
//! - [`store`]: Storage trait, write batches and the JSON-backed store
//! - [`db`]: SQLite storage with FTS5 medicine search
//! - [`ledger`]: The operations, tying the above together
//! - [`export`]: CSV reports
//! - [`config`]: Settings and logging setup

pub mod config;
pub mod db;
pub mod export;
pub mod ledger;
pub mod models;
pub mod stock;
pub mod store;
pub mod totals;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use db::Database;
pub use ledger::{EditReport, Ledger, LedgerError, RestoreReport};
pub use models::{
    CashEntry, DosageForm, EntryKind, Gender, InsuranceBill, LineItem, Medicine, MedicineDetails,
    NewInsuranceBill, NewMedicine, NewPatientRecord, PatientRecord, Prescription, Vitals,
};
pub use store::{LedgerStore, MemoryStore, WriteBatch};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use export::ReportKind;
use models::{parse_date, ValidationError};
use totals::{
    CashSummary, DailySummary, OverallTotals, PatientGroup, PatientSuggestion, RecordTotals,
};

type SharedStore = Box<dyn LedgerStore + Send>;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyLedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stale record: {0}")]
    StaleRecord(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl From<LedgerError> for PharmacyLedgerError {
    fn from(e: LedgerError) -> Self {
        let message = e.to_string();
        match e {
            LedgerError::Validation(_) => PharmacyLedgerError::InvalidInput(message),
            LedgerError::InsufficientStock { .. } => PharmacyLedgerError::InsufficientStock(message),
            LedgerError::MedicineNotFound(_)
            | LedgerError::RecordNotFound(_)
            | LedgerError::EntryNotFound(_)
            | LedgerError::BillNotFound(_) => PharmacyLedgerError::NotFound(message),
            LedgerError::StaleRecord(_) => PharmacyLedgerError::StaleRecord(message),
            LedgerError::Persistence(_) => PharmacyLedgerError::DatabaseError(message),
            LedgerError::Export(_) => PharmacyLedgerError::ExportError(message),
        }
    }
}

impl From<ValidationError> for PharmacyLedgerError {
    fn from(e: ValidationError) -> Self {
        PharmacyLedgerError::InvalidInput(e.to_string())
    }
}

impl From<db::DbError> for PharmacyLedgerError {
    fn from(e: db::DbError) -> Self {
        PharmacyLedgerError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for PharmacyLedgerError {
    fn from(e: config::ConfigError) -> Self {
        PharmacyLedgerError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacyLedgerError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacyLedgerError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a SQLite ledger at the given path.
#[uniffi::export]
pub fn open_ledger(path: String) -> Result<Arc<PharmacyLedger>, PharmacyLedgerError> {
    let db = Database::open(&path)?;
    tracing::info!(path = %path, "Opened SQLite ledger");
    Ok(PharmacyLedger::wrap(Box::new(db)))
}

/// Open or create a ledger kept as a single JSON snapshot file.
#[uniffi::export]
pub fn open_snapshot_ledger(path: String) -> Result<Arc<PharmacyLedger>, PharmacyLedgerError> {
    let store = MemoryStore::open(&path)?;
    Ok(PharmacyLedger::wrap(Box::new(store)))
}

/// Create an in-memory ledger (for testing).
#[uniffi::export]
pub fn open_ledger_in_memory() -> Result<Arc<PharmacyLedger>, PharmacyLedgerError> {
    let db = Database::open_in_memory()?;
    Ok(PharmacyLedger::wrap(Box::new(db)))
}

/// Install the log subscriber. `RUST_LOG` overrides `filter`. Returns false
/// if logging was already set up.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let filter = filter.unwrap_or_else(|| config::default_log_filter().to_string());
    config::init_logging(&filter)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe ledger wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PharmacyLedger {
    ledger: Arc<Mutex<Ledger<SharedStore>>>,
}

impl PharmacyLedger {
    fn wrap(store: SharedStore) -> Arc<Self> {
        Arc::new(Self {
            ledger: Arc::new(Mutex::new(Ledger::new(store))),
        })
    }
}

#[uniffi::export]
impl PharmacyLedger {
    // =========================================================================
    // Settings
    // =========================================================================

    /// Load settings from a JSON file (defaults if it does not exist).
    pub fn load_config(&self, path: String) -> Result<FfiConfig, PharmacyLedgerError> {
        let config = LedgerConfig::load(&path)?;
        let mut ledger = self.ledger.lock()?;
        ledger.set_config(config.clone());
        Ok(config.into())
    }

    pub fn get_config(&self) -> Result<FfiConfig, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.config().clone().into())
    }

    pub fn set_config(&self, config: FfiConfig) -> Result<(), PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        ledger.set_config(config.into());
        Ok(())
    }

    // =========================================================================
    // Inventory Operations
    // =========================================================================

    pub fn add_medicine(&self, medicine: FfiNewMedicine) -> Result<FfiMedicine, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        let new = NewMedicine::try_from(medicine)?;
        Ok(ledger.add_medicine(new)?.into())
    }

    /// Update descriptive and pricing fields. Stock is unchanged.
    pub fn update_medicine(
        &self,
        medicine_id: String,
        details: FfiMedicineDetails,
    ) -> Result<FfiMedicine, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        let details = MedicineDetails::try_from(details)?;
        Ok(ledger.update_medicine(&medicine_id, details)?.into())
    }

    pub fn restock(&self, medicine_id: String, packs: u32) -> Result<FfiMedicine, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.restock(&medicine_id, packs)?.into())
    }

    pub fn delete_medicine(&self, medicine_id: String) -> Result<(), PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        ledger.delete_medicine(&medicine_id)?;
        Ok(())
    }

    pub fn get_medicine(&self, medicine_id: String) -> Result<Option<FfiMedicine>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        let threshold = ledger.config().low_stock_threshold;
        Ok(ledger
            .get_medicine(&medicine_id)?
            .map(|m| FfiMedicine::from_medicine(m, threshold)))
    }

    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        let threshold = ledger.config().low_stock_threshold;
        Ok(ledger
            .list_medicines()?
            .into_iter()
            .map(|m| FfiMedicine::from_medicine(m, threshold))
            .collect())
    }

    /// Search inventory by name and strength.
    pub fn search_medicines(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiMedicine>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        let threshold = ledger.config().low_stock_threshold;
        Ok(ledger
            .search_medicines(&query, limit as usize)?
            .into_iter()
            .map(|m| FfiMedicine::from_medicine(m, threshold))
            .collect())
    }

    pub fn low_stock_medicines(&self) -> Result<Vec<FfiMedicine>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        let threshold = ledger.config().low_stock_threshold;
        Ok(ledger
            .low_stock_medicines()?
            .into_iter()
            .map(|m| FfiMedicine::from_medicine(m, threshold))
            .collect())
    }

    /// Bulk-add medicines from a JSON seed list.
    pub fn import_medicines(&self, json: String) -> Result<u32, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.import_seeds(&json)?.len() as u32)
    }

    /// Erase all data, then load the given seed list (may be empty).
    pub fn clear_all(&self, seeds_json: String) -> Result<u32, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.clear_all(&seeds_json)?.len() as u32)
    }

    // =========================================================================
    // Patient Record Operations
    // =========================================================================

    /// Build a line item from the medicine's current rates.
    pub fn line_item(
        &self,
        medicine_id: String,
        quantity: u32,
        discount: f64,
    ) -> Result<FfiLineItem, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.line_item(&medicine_id, quantity, discount)?.into())
    }

    /// Save a visit, deducting its medicines from stock.
    pub fn save_record(&self, record: FfiNewRecord) -> Result<FfiRecord, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        let new = NewPatientRecord::try_from(record)?;
        Ok(ledger.save_record(new)?.into())
    }

    /// Delete a visit, restoring its medicines to stock.
    pub fn delete_record(&self, record_id: String) -> Result<FfiRestoreReport, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.delete_record(&record_id)?.into())
    }

    /// Replace `original` (as loaded) with `edited`.
    pub fn edit_record(
        &self,
        original: FfiRecord,
        edited: FfiRecord,
    ) -> Result<FfiEditReport, PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        let original = PatientRecord::try_from(original)?;
        let edited = PatientRecord::try_from(edited)?;
        Ok(ledger.edit_record(&original, edited)?.into())
    }

    pub fn get_record(&self, record_id: String) -> Result<Option<FfiRecord>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.get_record(&record_id)?.map(|r| r.into()))
    }

    pub fn list_records(&self) -> Result<Vec<FfiRecord>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.list_records()?.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Cash Entries
    // =========================================================================

    /// Add other income or an expense. `kind` is "income" or "expense".
    pub fn add_entry(
        &self,
        kind: String,
        name: String,
        amount: String,
    ) -> Result<FfiEntry, PharmacyLedgerError> {
        let kind = EntryKind::parse(&kind)
            .ok_or_else(|| PharmacyLedgerError::InvalidInput(format!("Unknown entry kind: {}", kind)))?;
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.add_entry(kind, &name, &amount)?.into())
    }

    pub fn delete_entry(&self, entry_id: String) -> Result<(), PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        ledger.delete_entry(&entry_id)?;
        Ok(())
    }

    pub fn list_entries(&self) -> Result<Vec<FfiEntry>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.list_entries()?.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Insurance Bills
    // =========================================================================

    pub fn save_insurance_bill(
        &self,
        bill: FfiNewInsuranceBill,
    ) -> Result<FfiInsuranceBill, PharmacyLedgerError> {
        let bill = NewInsuranceBill::try_from(bill)?;
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.save_bill(bill)?.into())
    }

    pub fn delete_insurance_bill(&self, bill_id: String) -> Result<(), PharmacyLedgerError> {
        let mut ledger = self.ledger.lock()?;
        ledger.delete_bill(&bill_id)?;
        Ok(())
    }

    pub fn get_insurance_bill(
        &self,
        bill_id: String,
    ) -> Result<Option<FfiInsuranceBill>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.get_bill(&bill_id)?.map(|b| b.into()))
    }

    /// Bills newest first; `query` matches patient name, CNIC or insurance number.
    pub fn list_insurance_bills(
        &self,
        query: String,
    ) -> Result<Vec<FfiInsuranceBill>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.list_bills(&query)?.into_iter().map(|b| b.into()).collect())
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    pub fn overall_totals(&self) -> Result<FfiOverallTotals, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.overall_totals()?.into())
    }

    pub fn daily_summaries(
        &self,
        date_filter: Option<String>,
    ) -> Result<Vec<FfiDailySummary>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger
            .daily_summaries(date_filter.as_deref())?
            .into_iter()
            .map(|d| d.into())
            .collect())
    }

    pub fn patient_groups(&self, query: String) -> Result<Vec<FfiPatientGroup>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger
            .patient_groups(&query)?
            .into_iter()
            .map(|g| g.into())
            .collect())
    }

    pub fn patient_suggestions(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatientSuggestion>, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger
            .patient_suggestions(&query, limit as usize)?
            .into_iter()
            .map(|s| s.into())
            .collect())
    }

    pub fn cash_summary(&self) -> Result<FfiCashSummary, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.cash_summary()?.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    pub fn export_records_csv(&self) -> Result<String, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.records_csv()?)
    }

    pub fn export_inventory_csv(&self) -> Result<String, PharmacyLedgerError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.inventory_csv()?)
    }

    /// Write a report ("records" or "inventory") into `dir`, returning its path.
    pub fn write_report(
        &self,
        dir: String,
        kind: String,
        date: String,
    ) -> Result<String, PharmacyLedgerError> {
        let kind = match kind.to_lowercase().as_str() {
            "records" => ReportKind::Records,
            "inventory" => ReportKind::Inventory,
            other => {
                return Err(PharmacyLedgerError::InvalidInput(format!(
                    "Unknown report kind: {}",
                    other
                )))
            }
        };
        let date = parse_date(&date)?;
        let ledger = self.ledger.lock()?;
        let path = ledger.write_csv(&PathBuf::from(dir), kind, date)?;
        Ok(path.display().to_string())
    }
}

/// Totals for a record that has not been saved yet (live form preview).
#[uniffi::export]
pub fn preview_record_totals(
    medicines: Vec<FfiLineItem>,
    doctor_fees: String,
) -> Result<FfiRecordTotals, PharmacyLedgerError> {
    let doctor_fees = models::parse_amount("doctor fees", &doctor_fees)?;
    let medicines: Vec<LineItem> = medicines.into_iter().map(|m| m.into()).collect();
    Ok(totals::items_totals(&medicines, doctor_fees).into())
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConfig {
    pub low_stock_threshold: u32,
    pub currency_label: String,
    pub report_prefix: String,
    pub log_filter: String,
}

impl From<LedgerConfig> for FfiConfig {
    fn from(c: LedgerConfig) -> Self {
        Self {
            low_stock_threshold: c.low_stock_threshold,
            currency_label: c.currency_label,
            report_prefix: c.report_prefix,
            log_filter: c.log_filter,
        }
    }
}

impl From<FfiConfig> for LedgerConfig {
    fn from(c: FfiConfig) -> Self {
        LedgerConfig {
            low_stock_threshold: c.low_stock_threshold,
            currency_label: c.currency_label,
            report_prefix: c.report_prefix,
            log_filter: c.log_filter,
        }
    }
}

/// FFI-safe medicine, with derived figures filled in.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: String,
    pub name: String,
    pub strength: String,
    pub form: String,
    pub full_name: String,
    pub pack_purchase_rate: f64,
    pub pack_retail_rate: f64,
    pub units_per_pack: u32,
    pub total_units: u32,
    pub total_packs: u32,
    pub purchase_per_unit: f64,
    pub retail_per_unit: f64,
    pub stock_status: String,
}

impl FfiMedicine {
    fn from_medicine(m: Medicine, low_stock_threshold: u32) -> Self {
        Self {
            full_name: m.full_name(),
            total_packs: m.total_packs(),
            purchase_per_unit: m.purchase_per_unit(),
            retail_per_unit: m.retail_per_unit(),
            stock_status: m.stock_status(low_stock_threshold).label().to_string(),
            form: m.form.to_string(),
            id: m.id,
            name: m.name,
            strength: m.strength,
            pack_purchase_rate: m.pack_purchase_rate,
            pack_retail_rate: m.pack_retail_rate,
            units_per_pack: m.units_per_pack,
            total_units: m.total_units,
        }
    }
}

impl From<Medicine> for FfiMedicine {
    fn from(m: Medicine) -> Self {
        Self::from_medicine(m, models::DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

/// FFI-safe medicine details, as entered on the form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineDetails {
    pub name: String,
    pub strength: String,
    pub form: String,
    pub pack_purchase_rate: f64,
    pub pack_retail_rate: f64,
    pub units_per_pack: u32,
}

impl TryFrom<FfiMedicineDetails> for MedicineDetails {
    type Error = ValidationError;

    fn try_from(d: FfiMedicineDetails) -> Result<Self, Self::Error> {
        let form = DosageForm::parse(&d.form)
            .ok_or_else(|| ValidationError::UnknownForm(d.form.clone()))?;
        Ok(MedicineDetails {
            name: d.name,
            strength: d.strength,
            form,
            pack_purchase_rate: d.pack_purchase_rate,
            pack_retail_rate: d.pack_retail_rate,
            units_per_pack: d.units_per_pack,
        })
    }
}

/// FFI-safe new medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewMedicine {
    pub details: FfiMedicineDetails,
    pub packs: u32,
}

impl TryFrom<FfiNewMedicine> for NewMedicine {
    type Error = ValidationError;

    fn try_from(m: FfiNewMedicine) -> Result<Self, Self::Error> {
        Ok(NewMedicine {
            details: m.details.try_into()?,
            packs: m.packs,
        })
    }
}

/// FFI-safe line item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineItem {
    pub medicine_id: String,
    pub name: String,
    pub quantity: u32,
    pub purchase_rate: f64,
    pub retail_rate: f64,
    pub discount: f64,
    pub final_price: f64,
    pub medicine_total: f64,
}

impl From<LineItem> for FfiLineItem {
    fn from(item: LineItem) -> Self {
        Self {
            medicine_total: item.medicine_total(),
            medicine_id: item.medicine_id,
            name: item.name,
            quantity: item.quantity,
            purchase_rate: item.purchase_rate,
            retail_rate: item.retail_rate,
            discount: item.discount,
            final_price: item.final_price,
        }
    }
}

impl From<FfiLineItem> for LineItem {
    fn from(item: FfiLineItem) -> Self {
        LineItem {
            medicine_id: item.medicine_id,
            name: item.name,
            quantity: item.quantity,
            purchase_rate: item.purchase_rate,
            retail_rate: item.retail_rate,
            discount: item.discount,
            final_price: item.final_price,
        }
    }
}

/// FFI-safe vital signs.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitals {
    pub blood_pressure: Option<String>,
    pub glucose: Option<String>,
    pub temperature: Option<String>,
}

impl From<Vitals> for FfiVitals {
    fn from(v: Vitals) -> Self {
        Self {
            blood_pressure: v.blood_pressure,
            glucose: v.glucose,
            temperature: v.temperature,
        }
    }
}

impl From<FfiVitals> for Vitals {
    fn from(v: FfiVitals) -> Self {
        Vitals {
            blood_pressure: v.blood_pressure,
            glucose: v.glucose,
            temperature: v.temperature,
        }
    }
}

/// FFI-safe visit form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewRecord {
    pub patient_name: String,
    /// YYYY-MM-DD
    pub date: String,
    pub diagnosis: Option<String>,
    pub vitals: FfiVitals,
    pub doctor_fees: String,
    pub medicines: Vec<FfiLineItem>,
}

impl TryFrom<FfiNewRecord> for NewPatientRecord {
    type Error = ValidationError;

    fn try_from(r: FfiNewRecord) -> Result<Self, Self::Error> {
        Ok(NewPatientRecord {
            patient_name: r.patient_name,
            date: parse_date(&r.date)?,
            diagnosis: r.diagnosis,
            vitals: r.vitals.into(),
            doctor_fees: r.doctor_fees,
            medicines: r.medicines.into_iter().map(|m| m.into()).collect(),
        })
    }
}

/// FFI-safe saved patient record, with its totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecord {
    pub id: String,
    pub patient_name: String,
    pub date: String,
    pub diagnosis: Option<String>,
    pub vitals: FfiVitals,
    pub doctor_fees: f64,
    pub medicines: Vec<FfiLineItem>,
    pub totals: FfiRecordTotals,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PatientRecord> for FfiRecord {
    fn from(r: PatientRecord) -> Self {
        Self {
            totals: totals::record_totals(&r).into(),
            date: r.date_string(),
            id: r.id,
            patient_name: r.patient_name,
            diagnosis: r.diagnosis,
            vitals: r.vitals.into(),
            doctor_fees: r.doctor_fees,
            medicines: r.medicines.into_iter().map(|m| m.into()).collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl TryFrom<FfiRecord> for PatientRecord {
    type Error = ValidationError;

    fn try_from(r: FfiRecord) -> Result<Self, Self::Error> {
        Ok(PatientRecord {
            id: r.id,
            patient_name: r.patient_name,
            date: parse_date(&r.date)?,
            diagnosis: r.diagnosis,
            vitals: r.vitals.into(),
            doctor_fees: r.doctor_fees,
            medicines: r.medicines.into_iter().map(|m| m.into()).collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// FFI-safe stock change.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockAdjustment {
    pub medicine_id: String,
    pub delta: i64,
}

impl From<stock::StockAdjustment> for FfiStockAdjustment {
    fn from(a: stock::StockAdjustment) -> Self {
        Self {
            medicine_id: a.medicine_id,
            delta: a.delta,
        }
    }
}

/// FFI-safe delete outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRestoreReport {
    pub record_id: String,
    pub restored: Vec<FfiStockAdjustment>,
    pub skipped: Vec<String>,
}

impl From<RestoreReport> for FfiRestoreReport {
    fn from(r: RestoreReport) -> Self {
        Self {
            record_id: r.record.id,
            restored: r.restored.into_iter().map(|a| a.into()).collect(),
            skipped: r.skipped,
        }
    }
}

/// FFI-safe edit outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEditReport {
    pub record: FfiRecord,
    pub adjustments: Vec<FfiStockAdjustment>,
    pub skipped: Vec<String>,
}

impl From<EditReport> for FfiEditReport {
    fn from(r: EditReport) -> Self {
        Self {
            record: r.record.into(),
            adjustments: r.adjustments.into_iter().map(|a| a.into()).collect(),
            skipped: r.skipped,
        }
    }
}

/// FFI-safe cash entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEntry {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub amount: f64,
    pub created_at: String,
}

impl From<CashEntry> for FfiEntry {
    fn from(e: CashEntry) -> Self {
        Self {
            id: e.id,
            kind: e.kind.as_str().to_string(),
            name: e.name,
            amount: e.amount,
            created_at: e.created_at,
        }
    }
}

/// FFI-safe prescription line on an insurance bill.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub name: String,
    pub morning: String,
    pub daily: String,
    pub evening: String,
    pub dosage: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(p: Prescription) -> Self {
        Self {
            name: p.name,
            morning: p.morning,
            daily: p.daily,
            evening: p.evening,
            dosage: p.dosage,
        }
    }
}

impl From<FfiPrescription> for Prescription {
    fn from(p: FfiPrescription) -> Self {
        Self {
            name: p.name,
            morning: p.morning,
            daily: p.daily,
            evening: p.evening,
            dosage: p.dosage,
        }
    }
}

/// FFI-safe insurance bill form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewInsuranceBill {
    pub patient_name: String,
    pub patient_age: String,
    pub patient_contact: Option<String>,
    pub patient_cnic: String,
    /// "Male", "Female" or "Other"; blank means Male
    pub gender: String,
    /// YYYY-MM-DD
    pub date: String,
    pub diagnosis: String,
    pub medicines: Vec<FfiPrescription>,
    pub labs: Vec<String>,
    pub medicine_total: String,
    pub doctor_fees: String,
}

impl TryFrom<FfiNewInsuranceBill> for NewInsuranceBill {
    type Error = ValidationError;

    fn try_from(b: FfiNewInsuranceBill) -> Result<Self, Self::Error> {
        let gender =
            Gender::parse(&b.gender).ok_or_else(|| ValidationError::UnknownGender(b.gender.clone()))?;
        Ok(NewInsuranceBill {
            patient_name: b.patient_name,
            patient_age: b.patient_age,
            patient_contact: b.patient_contact,
            patient_cnic: b.patient_cnic,
            gender,
            date: parse_date(&b.date)?,
            diagnosis: b.diagnosis,
            medicines: b.medicines.into_iter().map(|m| m.into()).collect(),
            labs: b.labs,
            medicine_total: b.medicine_total,
            doctor_fees: b.doctor_fees,
        })
    }
}

/// FFI-safe saved insurance bill.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInsuranceBill {
    pub id: String,
    pub insurance_number: String,
    pub patient_name: String,
    pub patient_age: String,
    pub patient_contact: Option<String>,
    pub patient_cnic: String,
    pub gender: String,
    pub date: String,
    pub diagnosis: String,
    pub medicines: Vec<FfiPrescription>,
    pub labs: Vec<String>,
    pub medicine_total: f64,
    pub doctor_fees: f64,
    pub total_amount: f64,
    pub created_at: String,
}

impl From<InsuranceBill> for FfiInsuranceBill {
    fn from(b: InsuranceBill) -> Self {
        Self {
            date: b.date_string(),
            gender: b.gender.as_str().to_string(),
            id: b.id,
            insurance_number: b.insurance_number,
            patient_name: b.patient_name,
            patient_age: b.patient_age,
            patient_contact: b.patient_contact,
            patient_cnic: b.patient_cnic,
            diagnosis: b.diagnosis,
            medicines: b.medicines.into_iter().map(|m| m.into()).collect(),
            labs: b.labs,
            medicine_total: b.medicine_total,
            doctor_fees: b.doctor_fees,
            total_amount: b.total_amount,
            created_at: b.created_at,
        }
    }
}

/// FFI-safe record totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordTotals {
    pub medicine_sale: f64,
    pub medicine_cost: f64,
    pub doctor_fees: f64,
    pub total_sale: f64,
    pub profit: f64,
}

impl From<RecordTotals> for FfiRecordTotals {
    fn from(t: RecordTotals) -> Self {
        Self {
            medicine_sale: t.medicine_sale,
            medicine_cost: t.medicine_cost,
            doctor_fees: t.doctor_fees,
            total_sale: t.total_sale,
            profit: t.profit,
        }
    }
}

/// FFI-safe overall totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverallTotals {
    pub medicine_sales: f64,
    pub total_sales: f64,
    pub total_costs: f64,
    pub total_doctor_fees: f64,
    pub total_profit: f64,
}

impl From<OverallTotals> for FfiOverallTotals {
    fn from(t: OverallTotals) -> Self {
        Self {
            medicine_sales: t.medicine_sales,
            total_sales: t.total_sales,
            total_costs: t.total_costs,
            total_doctor_fees: t.total_doctor_fees,
            total_profit: t.total_profit,
        }
    }
}

/// FFI-safe daily summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailySummary {
    pub date: String,
    pub record_count: u32,
    pub totals: FfiRecordTotals,
}

impl From<DailySummary> for FfiDailySummary {
    fn from(d: DailySummary) -> Self {
        Self {
            date: d.date.format(models::DATE_FORMAT).to_string(),
            record_count: d.record_count as u32,
            totals: d.totals.into(),
        }
    }
}

/// FFI-safe patient history.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientGroup {
    pub patient_name: String,
    pub records: Vec<FfiRecord>,
}

impl From<PatientGroup> for FfiPatientGroup {
    fn from(g: PatientGroup) -> Self {
        Self {
            patient_name: g.patient_name,
            records: g.records.into_iter().map(|r| r.into()).collect(),
        }
    }
}

/// FFI-safe autocomplete suggestion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSuggestion {
    pub name: String,
    pub visit_count: u32,
    pub last_visit: String,
}

impl From<PatientSuggestion> for FfiPatientSuggestion {
    fn from(s: PatientSuggestion) -> Self {
        Self {
            name: s.name,
            visit_count: s.visit_count as u32,
            last_visit: s.last_visit.format(models::DATE_FORMAT).to_string(),
        }
    }
}

/// FFI-safe cash position.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCashSummary {
    pub medicine_cost: f64,
    pub medicine_profit: f64,
    pub doctor_fees: f64,
    pub medical_profit: f64,
    pub other_income: f64,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub cash_in_hand: f64,
}

impl From<CashSummary> for FfiCashSummary {
    fn from(c: CashSummary) -> Self {
        Self {
            medicine_cost: c.medicine_cost,
            medicine_profit: c.medicine_profit,
            doctor_fees: c.doctor_fees,
            medical_profit: c.medical_profit,
            other_income: c.other_income,
            total_revenue: c.total_revenue,
            total_expenses: c.total_expenses,
            cash_in_hand: c.cash_in_hand,
        }
    }
}
