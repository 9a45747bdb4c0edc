//! Sales, cost and profit derivation.
//!
//! All arithmetic keeps full `f64` precision; rounding to two places
//! happens only when a figure is formatted for display or export.

mod summary;

pub use summary::*;

use serde::{Deserialize, Serialize};

use crate::models::{LineItem, PatientRecord};

/// Revenue for one line item.
pub fn line_total(item: &LineItem) -> f64 {
    item.medicine_total()
}

/// Cost of goods for one line item.
pub fn line_cost(item: &LineItem) -> f64 {
    item.medicine_cost()
}

/// Financial totals for a single record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordTotals {
    pub medicine_sale: f64,
    pub medicine_cost: f64,
    pub doctor_fees: f64,
    pub total_sale: f64,
    pub profit: f64,
}

impl RecordTotals {
    fn add(&mut self, other: &RecordTotals) {
        self.medicine_sale += other.medicine_sale;
        self.medicine_cost += other.medicine_cost;
        self.doctor_fees += other.doctor_fees;
        self.total_sale += other.total_sale;
        self.profit += other.profit;
    }
}

/// Compute the totals for one record.
pub fn record_totals(record: &PatientRecord) -> RecordTotals {
    items_totals(&record.medicines, record.doctor_fees)
}

/// Totals for line items and fees that are not saved yet.
pub fn items_totals(medicines: &[LineItem], doctor_fees: f64) -> RecordTotals {
    let medicine_sale: f64 = medicines.iter().map(line_total).sum();
    let medicine_cost: f64 = medicines.iter().map(line_cost).sum();
    let total_sale = medicine_sale + doctor_fees;
    RecordTotals {
        medicine_sale,
        medicine_cost,
        doctor_fees,
        total_sale,
        profit: total_sale - medicine_cost,
    }
}

/// Totals across many records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct OverallTotals {
    pub medicine_sales: f64,
    pub total_sales: f64,
    pub total_costs: f64,
    pub total_doctor_fees: f64,
    pub total_profit: f64,
}

/// Componentwise sum of [`record_totals`] over all records.
pub fn overall_totals<'a, I>(records: I) -> OverallTotals
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    let mut overall = OverallTotals::default();
    for record in records {
        let totals = record_totals(record);
        overall.medicine_sales += totals.medicine_sale;
        overall.total_sales += totals.total_sale;
        overall.total_costs += totals.medicine_cost;
        overall.total_doctor_fees += totals.doctor_fees;
    }
    overall.total_profit = overall.total_sales - overall.total_costs;
    overall
}

/// Format a currency figure with two decimal places.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{line, medicine};
    use crate::models::{parse_date, NewPatientRecord, Vitals};

    fn record(medicines: Vec<LineItem>, fees: &str) -> PatientRecord {
        NewPatientRecord {
            patient_name: "Bilal".into(),
            date: parse_date("2024-05-01").unwrap(),
            diagnosis: None,
            vitals: Vitals::default(),
            doctor_fees: fees.into(),
            medicines,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_record_totals_example() {
        // quantity=2, final 47.50, purchase 40.00, fees "300.00"
        let med = medicine("Panadol", 10, 30);
        let totals = record_totals(&record(vec![line(&med, 2)], "300.00"));
        assert!((totals.medicine_sale - 95.0).abs() < 1e-9);
        assert!((totals.medicine_cost - 80.0).abs() < 1e-9);
        assert!((totals.doctor_fees - 300.0).abs() < 1e-9);
        assert!((totals.total_sale - 395.0).abs() < 1e-9);
        assert!((totals.profit - 315.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_totals_fees_only() {
        let totals = record_totals(&record(vec![], "500"));
        assert_eq!(totals.medicine_sale, 0.0);
        assert_eq!(totals.total_sale, 500.0);
        assert_eq!(totals.profit, 500.0);
    }

    #[test]
    fn test_overall_totals() {
        let med = medicine("Panadol", 10, 30);
        let records = vec![
            record(vec![line(&med, 2)], "300.00"),
            record(vec![line(&med, 1)], ""),
        ];
        let overall = overall_totals(&records);
        assert!((overall.total_sales - 442.5).abs() < 1e-9);
        assert!((overall.total_costs - 120.0).abs() < 1e-9);
        assert!((overall.total_doctor_fees - 300.0).abs() < 1e-9);
        assert!((overall.total_profit - 322.5).abs() < 1e-9);
        assert!((overall.medicine_sales - 142.5).abs() < 1e-9);
    }

    #[test]
    fn test_overall_totals_empty() {
        assert_eq!(overall_totals(&Vec::new()), OverallTotals::default());
    }

    #[test]
    fn test_no_mid_calculation_rounding() {
        // Per-unit price is 0.333...; rounding it first would give 0.99
        let mut med = medicine("Tiny", 3, 10);
        med.pack_retail_rate = 1.0;
        let totals = record_totals(&record(vec![line(&med, 3)], ""));
        assert!((totals.medicine_sale - 1.0).abs() < 1e-9);
        assert_eq!(format_amount(totals.medicine_sale), "1.00");
    }
}
