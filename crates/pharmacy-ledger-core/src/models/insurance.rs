//! Insurance claim bills.
//!
//! A bill is a standalone claim document: prescriptions on it are free text
//! and never draw from inventory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{now_timestamp, optional, parse_amount, required, ValidationResult, DATE_FORMAT};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Case-insensitive; blank means the form default.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// One prescribed medicine with its schedule, as written by the doctor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub name: String,
    #[serde(default)]
    pub morning: String,
    #[serde(default)]
    pub daily: String,
    #[serde(default)]
    pub evening: String,
    #[serde(default)]
    pub dosage: String,
}

impl Prescription {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            morning: self.morning.trim().to_string(),
            daily: self.daily.trim().to_string(),
            evening: self.evening.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
        }
    }
}

/// A saved insurance bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceBill {
    pub id: String,
    /// `INS-<unix millis>-<4 digits>`
    pub insurance_number: String,
    pub patient_name: String,
    pub patient_age: String,
    pub patient_contact: Option<String>,
    pub patient_cnic: String,
    pub gender: Gender,
    pub date: NaiveDate,
    pub diagnosis: String,
    pub medicines: Vec<Prescription>,
    pub labs: Vec<String>,
    pub medicine_total: f64,
    pub doctor_fees: f64,
    /// Always `medicine_total + doctor_fees`
    pub total_amount: f64,
    pub created_at: String,
}

impl InsuranceBill {
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// An insurance bill as entered on the form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInsuranceBill {
    pub patient_name: String,
    pub patient_age: String,
    pub patient_contact: Option<String>,
    pub patient_cnic: String,
    pub gender: Gender,
    pub date: NaiveDate,
    pub diagnosis: String,
    pub medicines: Vec<Prescription>,
    pub labs: Vec<String>,
    /// Amounts as typed; blank means zero
    pub medicine_total: String,
    pub doctor_fees: String,
}

impl NewInsuranceBill {
    /// Validate and build the bill with a fresh ID and insurance number.
    ///
    /// Prescriptions without a name and blank lab entries are dropped.
    pub fn validate(self) -> ValidationResult<InsuranceBill> {
        let patient_name = required("patient name", &self.patient_name)?;
        let patient_age = required("patient age", &self.patient_age)?;
        let patient_cnic = required("patient CNIC", &self.patient_cnic)?;
        let diagnosis = required("diagnosis", &self.diagnosis)?;
        let medicine_total = parse_amount("medicine total", &self.medicine_total)?;
        let doctor_fees = parse_amount("doctor fees", &self.doctor_fees)?;

        let medicines = self
            .medicines
            .into_iter()
            .map(Prescription::normalized)
            .filter(|p| !p.name.is_empty())
            .collect();
        let labs = self
            .labs
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(InsuranceBill {
            id: uuid::Uuid::new_v4().to_string(),
            insurance_number: insurance_number(),
            patient_name,
            patient_age,
            patient_contact: optional(self.patient_contact),
            patient_cnic,
            gender: self.gender,
            date: self.date,
            diagnosis,
            medicines,
            labs,
            medicine_total,
            doctor_fees,
            total_amount: medicine_total + doctor_fees,
            created_at: now_timestamp(),
        })
    }
}

/// Human-facing claim number: creation time plus four random digits.
fn insurance_number() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let random = u16::from_le_bytes([bytes[0], bytes[1]]) % 10_000;
    format!("INS-{}-{:04}", chrono::Utc::now().timestamp_millis(), random)
}
