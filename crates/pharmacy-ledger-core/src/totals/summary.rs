//! Daily, per-patient and cash-in-hand summaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{overall_totals, record_totals, RecordTotals};
use crate::models::{CashEntry, EntryKind, PatientRecord, DATE_FORMAT};

/// Sales for a single day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub record_count: usize,
    pub totals: RecordTotals,
}

/// Group records by visit date, newest day first.
///
/// `date_filter` is matched as a substring of the ISO date, so "2024-03"
/// selects a month.
pub fn daily_summaries(records: &[PatientRecord], date_filter: Option<&str>) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.date).or_insert_with(|| DailySummary {
            date: record.date,
            record_count: 0,
            totals: RecordTotals::default(),
        });
        day.record_count += 1;
        day.totals.add(&record_totals(record));
    }

    let filter = date_filter.map(str::trim).filter(|f| !f.is_empty());
    days.into_values()
        .rev()
        .filter(|day| match filter {
            Some(f) => day.date.format(DATE_FORMAT).to_string().contains(f),
            None => true,
        })
        .collect()
}

/// All visits of one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientGroup {
    /// Name as first entered
    pub patient_name: String,
    pub records: Vec<PatientRecord>,
}

/// Group records by patient name (case-insensitive), keeping first-seen order.
///
/// A group is labelled with the spelling of the patient's earliest visit,
/// whatever order `records` comes in.
pub fn patient_groups(records: &[PatientRecord], query: &str) -> Vec<PatientGroup> {
    let query = query.trim().to_lowercase();
    let mut groups: Vec<PatientGroup> = Vec::new();
    let mut earliest: Vec<&PatientRecord> = Vec::new();
    for record in records {
        let key = record.patient_name.to_lowercase();
        if !key.contains(&query) {
            continue;
        }
        match groups
            .iter()
            .position(|g| g.patient_name.to_lowercase() == key)
        {
            Some(idx) => {
                groups[idx].records.push(record.clone());
                if entered_before(record, earliest[idx]) {
                    earliest[idx] = record;
                    groups[idx].patient_name = record.patient_name.clone();
                }
            }
            None => {
                groups.push(PatientGroup {
                    patient_name: record.patient_name.clone(),
                    records: vec![record.clone()],
                });
                earliest.push(record);
            }
        }
    }
    groups
}

/// Visit date first, then creation time.
fn entered_before(a: &PatientRecord, b: &PatientRecord) -> bool {
    (a.date, &a.created_at) < (b.date, &b.created_at)
}

/// A returning patient offered for autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSuggestion {
    pub name: String,
    pub visit_count: usize,
    pub last_visit: NaiveDate,
}

/// Distinct patient names containing `query` (case-insensitive), most
/// frequent visitors first.
pub fn patient_suggestions(records: &[PatientRecord], query: &str, limit: usize) -> Vec<PatientSuggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut by_name: BTreeMap<String, (PatientSuggestion, &PatientRecord)> = BTreeMap::new();
    for record in records {
        let name = record.patient_name.trim();
        let key = name.to_lowercase();
        if !key.contains(&query) {
            continue;
        }
        by_name
            .entry(key)
            .and_modify(|(s, first)| {
                s.visit_count += 1;
                s.last_visit = s.last_visit.max(record.date);
                if entered_before(record, *first) {
                    *first = record;
                    s.name = name.to_string();
                }
            })
            .or_insert_with(|| {
                let suggestion = PatientSuggestion {
                    name: name.to_string(),
                    visit_count: 1,
                    last_visit: record.date,
                };
                (suggestion, record)
            });
    }

    let mut suggestions: Vec<PatientSuggestion> = by_name.into_values().map(|(s, _)| s).collect();
    suggestions.sort_by(|a, b| b.visit_count.cmp(&a.visit_count).then_with(|| a.name.cmp(&b.name)));
    suggestions.truncate(limit);
    suggestions
}

/// Clinic cash position combining patient sales with other income and expenses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CashSummary {
    /// Medicine cost of goods sold
    pub medicine_cost: f64,
    /// Medicine sales minus medicine cost
    pub medicine_profit: f64,
    pub doctor_fees: f64,
    /// Medicine profit plus doctor fees
    pub medical_profit: f64,
    pub other_income: f64,
    /// Medical profit plus other income
    pub total_revenue: f64,
    pub total_expenses: f64,
    /// Total revenue minus expenses
    pub cash_in_hand: f64,
}

/// Compute the cash position.
pub fn cash_summary(records: &[PatientRecord], entries: &[CashEntry]) -> CashSummary {
    let overall = overall_totals(records);
    let sum_kind = |kind: EntryKind| -> f64 {
        entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.amount)
            .sum()
    };
    let other_income = sum_kind(EntryKind::Income);
    let total_expenses = sum_kind(EntryKind::Expense);

    let medicine_profit = overall.medicine_sales - overall.total_costs;
    let medical_profit = medicine_profit + overall.total_doctor_fees;
    let total_revenue = medical_profit + other_income;
    CashSummary {
        medicine_cost: overall.total_costs,
        medicine_profit,
        doctor_fees: overall.total_doctor_fees,
        medical_profit,
        other_income,
        total_revenue,
        total_expenses,
        cash_in_hand: total_revenue - total_expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{line, medicine};
    use crate::models::{parse_date, LineItem, NewPatientRecord, Vitals};

    fn visit(name: &str, date: &str, medicines: Vec<LineItem>, fees: &str) -> PatientRecord {
        NewPatientRecord {
            patient_name: name.into(),
            date: parse_date(date).unwrap(),
            diagnosis: None,
            vitals: Vitals::default(),
            doctor_fees: fees.into(),
            medicines,
        }
        .validate()
        .unwrap()
    }

    fn sample() -> Vec<PatientRecord> {
        let med = medicine("Panadol", 10, 100);
        vec![
            visit("Sara", "2024-03-01", vec![line(&med, 2)], "300"),
            visit("Omar", "2024-03-02", vec![], "200"),
            visit("sara", "2024-03-02", vec![line(&med, 1)], "100"),
            visit("Zain", "2024-04-10", vec![], "150"),
        ]
    }

    #[test]
    fn test_daily_summaries_grouped_newest_first() {
        let days = daily_summaries(&sample(), None);
        let dates: Vec<String> = days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-04-10", "2024-03-02", "2024-03-01"]);

        let march_second = &days[1];
        assert_eq!(march_second.record_count, 2);
        assert!((march_second.totals.doctor_fees - 300.0).abs() < 1e-9);
        assert!((march_second.totals.medicine_sale - 47.5).abs() < 1e-9);
        assert!((march_second.totals.total_sale - 347.5).abs() < 1e-9);
        assert!((march_second.totals.profit - 307.5).abs() < 1e-9);
    }

    #[test]
    fn test_daily_summaries_filter() {
        let days = daily_summaries(&sample(), Some("2024-03"));
        assert_eq!(days.len(), 2);
        assert!(daily_summaries(&sample(), Some("1999")).is_empty());
        assert_eq!(daily_summaries(&sample(), Some("  ")).len(), 3);
    }

    #[test]
    fn test_patient_groups_case_insensitive() {
        let groups = patient_groups(&sample(), "");
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].patient_name, "Sara");
        assert_eq!(groups[0].records.len(), 2);

        let filtered = patient_groups(&sample(), "SAR");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_patient_suggestions() {
        let mut records = sample();
        records.push(visit("Sara", "2024-05-01", vec![], "100"));
        let suggestions = patient_suggestions(&records, "a", 10);
        // "Sara" and "sara" are one patient, shown as first entered
        assert_eq!(suggestions[0].name, "Sara");
        assert_eq!(suggestions[0].visit_count, 3);
        assert_eq!(suggestions[0].last_visit.to_string(), "2024-05-01");
        assert!(patient_suggestions(&records, " ", 10).is_empty());
        assert_eq!(patient_suggestions(&records, "a", 1).len(), 1);
    }

    #[test]
    fn test_display_name_is_earliest_spelling() {
        // Stored order is newest first, as the stores list them
        let newest_first = vec![
            visit("Ali Khan", "2024-03-09", vec![], "100"),
            visit("ALI KHAN", "2024-03-05", vec![], "100"),
            visit("ali khan", "2024-03-01", vec![], "100"),
        ];
        let groups = patient_groups(&newest_first, "ali");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].patient_name, "ali khan");
        assert_eq!(groups[0].records[0].patient_name, "Ali Khan");

        let suggestions = patient_suggestions(&newest_first, "khan", 5);
        assert_eq!(suggestions[0].name, "ali khan");
        assert_eq!(suggestions[0].visit_count, 3);
        assert_eq!(suggestions[0].last_visit.to_string(), "2024-03-09");
    }

    #[test]
    fn test_cash_summary() {
        let entries = vec![
            CashEntry::new(EntryKind::Income, "Lab share", "250").unwrap(),
            CashEntry::new(EntryKind::Expense, "Rent", "400").unwrap(),
            CashEntry::new(EntryKind::Expense, "Electricity", "100").unwrap(),
        ];
        let cash = cash_summary(&sample(), &entries);
        // Sales 142.50 at cost 120.00, fees 750
        assert!((cash.medicine_profit - 22.5).abs() < 1e-9);
        assert!((cash.medical_profit - 772.5).abs() < 1e-9);
        assert!((cash.total_revenue - 1022.5).abs() < 1e-9);
        assert!((cash.total_expenses - 500.0).abs() < 1e-9);
        assert!((cash.cash_in_hand - 522.5).abs() < 1e-9);
    }
}
