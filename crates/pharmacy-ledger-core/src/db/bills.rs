//! Insurance bill database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbError, DbResult};
use crate::models::{parse_date, Gender, InsuranceBill};

const BILL_COLUMNS: &str = "id, insurance_number, patient_name, patient_age, patient_contact, \
     patient_cnic, gender, date, diagnosis, medicines, labs, medicine_total, doctor_fees, \
     total_amount, created_at";

/// Insert or replace a bill. Prescriptions and labs are stored as JSON.
pub(super) fn put_bill(conn: &Connection, bill: &InsuranceBill) -> DbResult<()> {
    let medicines_json = serde_json::to_string(&bill.medicines)?;
    let labs_json = serde_json::to_string(&bill.labs)?;

    conn.execute(
        r#"
        INSERT INTO insurance_bills (
            id, insurance_number, patient_name, patient_age, patient_contact,
            patient_cnic, gender, date, diagnosis, medicines, labs,
            medicine_total, doctor_fees, total_amount, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(id) DO UPDATE SET
            patient_name = excluded.patient_name,
            patient_age = excluded.patient_age,
            patient_contact = excluded.patient_contact,
            patient_cnic = excluded.patient_cnic,
            gender = excluded.gender,
            date = excluded.date,
            diagnosis = excluded.diagnosis,
            medicines = excluded.medicines,
            labs = excluded.labs,
            medicine_total = excluded.medicine_total,
            doctor_fees = excluded.doctor_fees,
            total_amount = excluded.total_amount
        "#,
        params![
            bill.id,
            bill.insurance_number,
            bill.patient_name,
            bill.patient_age,
            bill.patient_contact,
            bill.patient_cnic,
            bill.gender.as_str(),
            bill.date_string(),
            bill.diagnosis,
            medicines_json,
            labs_json,
            bill.medicine_total,
            bill.doctor_fees,
            bill.total_amount,
            bill.created_at,
        ],
    )?;
    Ok(())
}

pub(super) fn delete_bill(conn: &Connection, id: &str) -> DbResult<()> {
    let rows_affected = conn.execute("DELETE FROM insurance_bills WHERE id = ?", [id])?;
    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

pub(super) fn get_bill(conn: &Connection, id: &str) -> DbResult<Option<InsuranceBill>> {
    let sql = format!("SELECT {} FROM insurance_bills WHERE id = ?", BILL_COLUMNS);
    let row = conn.query_row(&sql, [id], BillRow::from_row).optional()?;
    row.map(|r| r.try_into()).transpose()
}

pub(super) fn list_bills(conn: &Connection) -> DbResult<Vec<InsuranceBill>> {
    let sql = format!(
        "SELECT {} FROM insurance_bills ORDER BY date DESC, created_at DESC",
        BILL_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], BillRow::from_row)?;

    let mut bills = Vec::new();
    for row in rows {
        bills.push(row?.try_into()?);
    }
    Ok(bills)
}

struct BillRow {
    id: String,
    insurance_number: String,
    patient_name: String,
    patient_age: String,
    patient_contact: Option<String>,
    patient_cnic: String,
    gender: String,
    date: String,
    diagnosis: String,
    medicines: String,
    labs: String,
    medicine_total: f64,
    doctor_fees: f64,
    total_amount: f64,
    created_at: String,
}

impl BillRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            insurance_number: row.get(1)?,
            patient_name: row.get(2)?,
            patient_age: row.get(3)?,
            patient_contact: row.get(4)?,
            patient_cnic: row.get(5)?,
            gender: row.get(6)?,
            date: row.get(7)?,
            diagnosis: row.get(8)?,
            medicines: row.get(9)?,
            labs: row.get(10)?,
            medicine_total: row.get(11)?,
            doctor_fees: row.get(12)?,
            total_amount: row.get(13)?,
            created_at: row.get(14)?,
        })
    }
}

impl TryFrom<BillRow> for InsuranceBill {
    type Error = DbError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date).map_err(|e| DbError::Constraint(e.to_string()))?;
        let gender = Gender::parse(&row.gender)
            .ok_or_else(|| DbError::Constraint(format!("unknown gender: {}", row.gender)))?;
        Ok(InsuranceBill {
            id: row.id,
            insurance_number: row.insurance_number,
            patient_name: row.patient_name,
            patient_age: row.patient_age,
            patient_contact: row.patient_contact,
            patient_cnic: row.patient_cnic,
            gender,
            date,
            diagnosis: row.diagnosis,
            medicines: serde_json::from_str(&row.medicines)?,
            labs: serde_json::from_str(&row.labs)?,
            medicine_total: row.medicine_total,
            doctor_fees: row.doctor_fees,
            total_amount: row.total_amount,
            created_at: row.created_at,
        })
    }
}
