//! Patient visit records and their medicine line items.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    now_timestamp, optional, parse_amount, required, Medicine, ValidationError, ValidationResult,
};

/// Date format used for record dates everywhere (ISO 8601).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// A single medicine sold during a visit.
///
/// Rates are snapshots taken when the line was added; later price changes
/// to the medicine never alter a saved line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Inventory medicine this line draws stock from
    pub medicine_id: String,
    /// Full display name at the time of sale
    pub name: String,
    /// Units sold
    pub quantity: u32,
    /// Purchase rate per unit (snapshot)
    pub purchase_rate: f64,
    /// Retail rate per unit (snapshot)
    pub retail_rate: f64,
    /// Discount percentage applied to the retail rate
    pub discount: f64,
    /// Price per unit after discount
    pub final_price: f64,
}

impl LineItem {
    /// Snapshot a line item from an inventory medicine.
    pub fn from_medicine(medicine: &Medicine, quantity: u32, discount: f64) -> ValidationResult<Self> {
        let line = Self {
            medicine_id: medicine.id.clone(),
            name: medicine.full_name(),
            quantity,
            purchase_rate: medicine.purchase_per_unit(),
            retail_rate: medicine.retail_per_unit(),
            discount,
            final_price: discounted(medicine.retail_per_unit(), discount),
        };
        line.check()?;
        Ok(line)
    }

    /// Revenue for this line: quantity times the discounted unit price.
    pub fn medicine_total(&self) -> f64 {
        f64::from(self.quantity) * self.final_price
    }

    /// Cost of goods for this line.
    pub fn medicine_cost(&self) -> f64 {
        f64::from(self.quantity) * self.purchase_rate
    }

    fn check(&self) -> ValidationResult<()> {
        if self.medicine_id.trim().is_empty() {
            return Err(ValidationError::MissingField("medicine"));
        }
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity);
        }
        if !self.discount.is_finite() || !(0.0..=100.0).contains(&self.discount) {
            return Err(ValidationError::InvalidDiscount(self.discount));
        }
        for (field, value) in [
            ("purchase rate", self.purchase_rate),
            ("retail rate", self.retail_rate),
            ("final price", self.final_price),
        ] {
            super::check_amount(field, value)?;
        }
        if !same_price(self.final_price, discounted(self.retail_rate, self.discount)) {
            return Err(ValidationError::InvalidAmount {
                field: "final price",
                value: self.final_price.to_string(),
            });
        }
        Ok(())
    }

    /// Check the rate snapshot against the medicine's current per-unit rates.
    pub fn check_rates(&self, medicine: &Medicine) -> ValidationResult<()> {
        if same_price(self.purchase_rate, medicine.purchase_per_unit())
            && same_price(self.retail_rate, medicine.retail_per_unit())
        {
            Ok(())
        } else {
            Err(ValidationError::RateMismatch(medicine.full_name()))
        }
    }

    /// Whether this line carries the same snapshot as `other` for one medicine.
    pub fn same_rates(&self, other: &LineItem) -> bool {
        self.medicine_id == other.medicine_id
            && same_price(self.purchase_rate, other.purchase_rate)
            && same_price(self.retail_rate, other.retail_rate)
    }
}

/// Largest difference tolerated between two currency figures.
const PRICE_TOLERANCE: f64 = 1e-6;

fn same_price(a: f64, b: f64) -> bool {
    (a - b).abs() <= PRICE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn discounted(price: f64, discount_percent: f64) -> f64 {
    price - price * discount_percent / 100.0
}

/// Optional vital signs recorded during a visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vitals {
    pub blood_pressure: Option<String>,
    pub glucose: Option<String>,
    pub temperature: Option<String>,
}

impl Vitals {
    fn normalized(self) -> Self {
        Self {
            blood_pressure: optional(self.blood_pressure),
            glucose: optional(self.glucose),
            temperature: optional(self.temperature),
        }
    }
}

/// A saved patient visit (sale).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Unique record ID
    pub id: String,
    /// Patient name as entered
    pub patient_name: String,
    /// Visit date
    pub date: NaiveDate,
    /// Diagnosis, if any
    pub diagnosis: Option<String>,
    /// Vital signs
    pub vitals: Vitals,
    /// Consultation fee
    pub doctor_fees: f64,
    /// Medicines sold, in entry order
    pub medicines: Vec<LineItem>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl PatientRecord {
    /// Re-validate a record that was edited in place.
    pub fn validate(mut self) -> ValidationResult<Self> {
        self.patient_name = required("patient name", &self.patient_name)?;
        self.diagnosis = optional(self.diagnosis);
        self.vitals = self.vitals.normalized();
        self.doctor_fees = super::check_amount("doctor fees", self.doctor_fees)?;
        for line in &self.medicines {
            line.check()?;
        }
        if self.medicines.is_empty() && self.doctor_fees <= 0.0 {
            return Err(ValidationError::EmptyRecord);
        }
        Ok(self)
    }

    /// The visit date formatted as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}

/// A patient visit as entered on the form, before it is saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatientRecord {
    pub patient_name: String,
    pub date: NaiveDate,
    pub diagnosis: Option<String>,
    pub vitals: Vitals,
    /// Fees as typed; blank means zero
    pub doctor_fees: String,
    pub medicines: Vec<LineItem>,
}

impl NewPatientRecord {
    /// Validate and build the record with a fresh ID.
    pub fn validate(self) -> ValidationResult<PatientRecord> {
        let doctor_fees = parse_amount("doctor fees", &self.doctor_fees)?;
        let now = now_timestamp();
        PatientRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_name: self.patient_name,
            date: self.date,
            diagnosis: self.diagnosis,
            vitals: self.vitals,
            doctor_fees,
            medicines: self.medicines,
            created_at: now.clone(),
            updated_at: now,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::medicine;

    fn form(medicines: Vec<LineItem>, fees: &str) -> NewPatientRecord {
        NewPatientRecord {
            patient_name: "Ayesha Khan".into(),
            date: parse_date("2024-03-05").unwrap(),
            diagnosis: Some("Fever".into()),
            vitals: Vitals::default(),
            doctor_fees: fees.into(),
            medicines,
        }
    }

    #[test]
    fn test_line_item_snapshot() {
        let med = medicine("Panadol", 10, 30);
        let line = LineItem::from_medicine(&med, 2, 0.0).unwrap();
        assert_eq!(line.medicine_id, med.id);
        assert_eq!(line.name, "Panadol 500mg (Tablet)");
        assert!((line.purchase_rate - 40.0).abs() < 1e-9);
        assert!((line.retail_rate - 47.5).abs() < 1e-9);
        assert!((line.final_price - 47.5).abs() < 1e-9);
        assert!((line.medicine_total() - 95.0).abs() < 1e-9);
        assert!((line.medicine_cost() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_item_discount() {
        let med = medicine("Panadol", 10, 30);
        let line = LineItem::from_medicine(&med, 4, 10.0).unwrap();
        assert!((line.final_price - 42.75).abs() < 1e-9);
        assert!((line.medicine_total() - 171.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_item_snapshot_survives_price_change() {
        let mut med = medicine("Panadol", 10, 30);
        let line = LineItem::from_medicine(&med, 1, 0.0).unwrap();
        med.pack_retail_rate = 1000.0;
        assert!((line.retail_rate - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_line_item_rejects_bad_input() {
        let med = medicine("Panadol", 10, 30);
        assert_eq!(
            LineItem::from_medicine(&med, 0, 0.0),
            Err(ValidationError::InvalidQuantity)
        );
        assert_eq!(
            LineItem::from_medicine(&med, 1, 120.0),
            Err(ValidationError::InvalidDiscount(120.0))
        );
        assert!(LineItem::from_medicine(&med, 1, -1.0).is_err());
    }

    #[test]
    fn test_line_item_final_price_must_match_discount() {
        let med = medicine("Panadol", 10, 30);
        let mut line = LineItem::from_medicine(&med, 2, 0.0).unwrap();
        line.final_price = 1000.0;
        assert!(matches!(
            form(vec![line.clone()], "").validate(),
            Err(ValidationError::InvalidAmount { field: "final price", .. })
        ));

        line.discount = 10.0;
        line.final_price = 42.75;
        assert!(form(vec![line], "").validate().is_ok());
    }

    #[test]
    fn test_line_item_rate_checks() {
        let mut med = medicine("Panadol", 10, 30);
        let line = LineItem::from_medicine(&med, 1, 0.0).unwrap();
        assert!(line.check_rates(&med).is_ok());
        assert!(line.same_rates(&line.clone()));

        med.pack_retail_rate = 600.0;
        assert_eq!(
            line.check_rates(&med),
            Err(ValidationError::RateMismatch("Panadol 500mg (Tablet)".into()))
        );
        let repriced = LineItem::from_medicine(&med, 1, 0.0).unwrap();
        assert!(!line.same_rates(&repriced));
    }

    #[test]
    fn test_new_record_parses_fees() {
        let record = form(vec![], "300.00").validate().unwrap();
        assert_eq!(record.doctor_fees, 300.0);
        assert_eq!(record.id.len(), 36);
        assert_eq!(record.date_string(), "2024-03-05");
    }

    #[test]
    fn test_new_record_requires_name() {
        let mut f = form(vec![], "100");
        f.patient_name = " ".into();
        assert_eq!(f.validate(), Err(ValidationError::MissingField("patient name")));
    }

    #[test]
    fn test_new_record_requires_medicine_or_fees() {
        assert_eq!(form(vec![], "").validate(), Err(ValidationError::EmptyRecord));
        assert_eq!(form(vec![], "0").validate(), Err(ValidationError::EmptyRecord));

        let med = medicine("Panadol", 10, 30);
        let line = LineItem::from_medicine(&med, 1, 0.0).unwrap();
        assert!(form(vec![line], "").validate().is_ok());
    }

    #[test]
    fn test_new_record_normalizes_optional_text() {
        let mut f = form(vec![], "50");
        f.diagnosis = Some("   ".into());
        f.vitals.glucose = Some(" 110 ".into());
        let record = f.validate().unwrap();
        assert_eq!(record.diagnosis, None);
        assert_eq!(record.vitals.glucose.as_deref(), Some("110"));
        assert_eq!(record.vitals.blood_pressure, None);
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("05/03/2024").is_err());
        assert_eq!(parse_date(" 2024-12-31 ").unwrap().to_string(), "2024-12-31");
    }
}
