//! Patient records report.

use super::csv_line;
use crate::models::{PatientRecord, ValidationError, ValidationResult};
use crate::totals::{format_amount, overall_totals, record_totals};

/// Column header of the records report.
pub const RECORDS_HEADER: [&str; 13] = [
    "Date",
    "Patient Name",
    "Diagnosis",
    "Medicine",
    "Quantity",
    "Purchase Rate/Unit",
    "Retail Rate/Unit",
    "Discount %",
    "Final Price/Unit",
    "Medicine Total",
    "Doctor Fees",
    "Total Sale",
    "Profit",
];

/// Render the records report.
///
/// One row per line item; doctor fees, total sale and profit appear only on
/// a record's first row. A record without medicines gets a single row. A
/// summary block with overall totals follows the rows.
pub fn records_csv(records: &[PatientRecord], currency_label: &str) -> ValidationResult<String> {
    if records.is_empty() {
        return Err(ValidationError::NothingToExport);
    }

    let mut csv = csv_line(RECORDS_HEADER);
    for record in records {
        let totals = record_totals(record);
        let date = record.date_string();
        let diagnosis = record.diagnosis.as_deref().unwrap_or("");
        let record_fields = [
            format_amount(record.doctor_fees),
            format_amount(totals.total_sale),
            format_amount(totals.profit),
        ];

        if record.medicines.is_empty() {
            let mut row = vec![date, record.patient_name.clone(), diagnosis.to_string()];
            row.extend(std::iter::repeat(String::new()).take(7));
            row.extend(record_fields);
            csv.push_str(&csv_line(row));
            continue;
        }

        for (idx, item) in record.medicines.iter().enumerate() {
            let mut row = vec![
                date.clone(),
                record.patient_name.clone(),
                diagnosis.to_string(),
                item.name.clone(),
                item.quantity.to_string(),
                format_amount(item.purchase_rate),
                format_amount(item.retail_rate),
                item.discount.to_string(),
                format_amount(item.final_price),
                format_amount(item.medicine_total()),
            ];
            if idx == 0 {
                row.extend(record_fields.iter().cloned());
            } else {
                row.extend([String::new(), String::new(), String::new()]);
            }
            csv.push_str(&csv_line(row));
        }
    }

    let overall = overall_totals(records);
    csv.push('\n');
    csv.push_str(&summary_line("SUMMARY", ""));
    for (label, amount) in [
        ("Total Sales", overall.total_sales),
        ("Total Costs", overall.total_costs),
        ("Total Doctor Fees", overall.total_doctor_fees),
        ("Total Profit", overall.total_profit),
    ] {
        let value = format!("{} {}", currency_label, format_amount(amount));
        csv.push_str(&summary_line(label, value.trim()));
    }
    Ok(csv)
}

/// Summary rows put the label under "Medicine Total" and the value under
/// "Total Sale".
fn summary_line(label: &str, value: &str) -> String {
    let mut row = vec![""; RECORDS_HEADER.len()];
    row[9] = label;
    row[11] = value;
    csv_line(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{line, medicine};
    use crate::models::{parse_date, LineItem, NewPatientRecord, Vitals};

    fn visit(name: &str, diagnosis: Option<&str>, medicines: Vec<LineItem>, fees: &str) -> PatientRecord {
        NewPatientRecord {
            patient_name: name.into(),
            date: parse_date("2024-03-05").unwrap(),
            diagnosis: diagnosis.map(String::from),
            vitals: Vitals::default(),
            doctor_fees: fees.into(),
            medicines,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(records_csv(&[], "Rs."), Err(ValidationError::NothingToExport));
    }

    #[test]
    fn test_header_and_rows() {
        let a = medicine("Panadol", 10, 30);
        let b = medicine("Brufen", 10, 30);
        let records = vec![
            visit("Ayesha", Some("Fever"), vec![line(&a, 2), line(&b, 1)], "300"),
            visit("Bilal", None, vec![], "150"),
        ];
        let csv = records_csv(&records, "Rs.").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Patient Name,Diagnosis,Medicine,Quantity,Purchase Rate/Unit,Retail Rate/Unit,Discount %,Final Price/Unit,Medicine Total,Doctor Fees,Total Sale,Profit"
        );
        assert_eq!(
            lines[1],
            "2024-03-05,Ayesha,Fever,Panadol 500mg (Tablet),2,40.00,47.50,0,47.50,95.00,300.00,442.50,322.50"
        );
        // Record totals only on the first line item
        assert_eq!(
            lines[2],
            "2024-03-05,Ayesha,Fever,Brufen 500mg (Tablet),1,40.00,47.50,0,47.50,47.50,,,"
        );
        assert_eq!(lines[3], "2024-03-05,Bilal,,,,,,,,,150.00,150.00,150.00");
    }

    #[test]
    fn test_summary_block() {
        let a = medicine("Panadol", 10, 30);
        let records = vec![visit("Ayesha", None, vec![line(&a, 2)], "300")];
        let csv = records_csv(&records, "Rs.").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[2], "");
        assert_eq!(lines[3], ",,,,,,,,,SUMMARY,,,");
        assert_eq!(lines[4], ",,,,,,,,,Total Sales,,Rs. 395.00,");
        assert_eq!(lines[5], ",,,,,,,,,Total Costs,,Rs. 80.00,");
        assert_eq!(lines[6], ",,,,,,,,,Total Doctor Fees,,Rs. 300.00,");
        assert_eq!(lines[7], ",,,,,,,,,Total Profit,,Rs. 315.00,");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let records = vec![visit("Khan, Ayesha", Some("Fever, \"viral\""), vec![], "100")];
        let csv = records_csv(&records, "Rs.").unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("2024-03-05,\"Khan, Ayesha\",\"Fever, \"\"viral\"\"\","));
    }
}
