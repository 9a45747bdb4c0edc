//! Patient record database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbError, DbResult};
use crate::models::{parse_date, PatientRecord};

const RECORD_COLUMNS: &str = "id, patient_name, date, diagnosis, vitals, doctor_fees, \
     medicines, created_at, updated_at";

/// Insert or replace a patient record. Line items and vitals are stored as JSON.
pub(super) fn put_record(conn: &Connection, record: &PatientRecord) -> DbResult<()> {
    let vitals_json = serde_json::to_string(&record.vitals)?;
    let medicines_json = serde_json::to_string(&record.medicines)?;

    conn.execute(
        r#"
        INSERT INTO patient_records (
            id, patient_name, date, diagnosis, vitals, doctor_fees,
            medicines, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            patient_name = excluded.patient_name,
            date = excluded.date,
            diagnosis = excluded.diagnosis,
            vitals = excluded.vitals,
            doctor_fees = excluded.doctor_fees,
            medicines = excluded.medicines,
            updated_at = excluded.updated_at
        "#,
        params![
            record.id,
            record.patient_name,
            record.date_string(),
            record.diagnosis,
            vitals_json,
            record.doctor_fees,
            medicines_json,
            record.created_at,
            record.updated_at,
        ],
    )?;
    Ok(())
}

pub(super) fn delete_record(conn: &Connection, id: &str) -> DbResult<()> {
    let rows_affected = conn.execute("DELETE FROM patient_records WHERE id = ?", [id])?;
    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

pub(super) fn get_record(conn: &Connection, id: &str) -> DbResult<Option<PatientRecord>> {
    let sql = format!("SELECT {} FROM patient_records WHERE id = ?", RECORD_COLUMNS);
    let row = conn.query_row(&sql, [id], RecordRow::from_row).optional()?;
    row.map(|r| r.try_into()).transpose()
}

/// All records, newest visit first.
pub(super) fn list_records(conn: &Connection) -> DbResult<Vec<PatientRecord>> {
    let sql = format!(
        "SELECT {} FROM patient_records ORDER BY date DESC, created_at DESC",
        RECORD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], RecordRow::from_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?.try_into()?);
    }
    Ok(records)
}

struct RecordRow {
    id: String,
    patient_name: String,
    date: String,
    diagnosis: Option<String>,
    vitals: String,
    doctor_fees: f64,
    medicines: String,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_name: row.get(1)?,
            date: row.get(2)?,
            diagnosis: row.get(3)?,
            vitals: row.get(4)?,
            doctor_fees: row.get(5)?,
            medicines: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl TryFrom<RecordRow> for PatientRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date).map_err(|e| DbError::Constraint(e.to_string()))?;
        Ok(PatientRecord {
            id: row.id,
            patient_name: row.patient_name,
            date,
            diagnosis: row.diagnosis,
            vitals: serde_json::from_str(&row.vitals)?,
            doctor_fees: row.doctor_fees,
            medicines: serde_json::from_str(&row.medicines)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::fixtures::{line, medicine};
    use crate::models::{NewPatientRecord, Vitals};

    fn record(name: &str, date: &str) -> PatientRecord {
        let med = medicine("Panadol", 10, 30);
        NewPatientRecord {
            patient_name: name.into(),
            date: parse_date(date).unwrap(),
            diagnosis: Some("Fever".into()),
            vitals: Vitals {
                blood_pressure: Some("120/80".into()),
                ..Vitals::default()
            },
            doctor_fees: "300".into(),
            medicines: vec![line(&med, 2)],
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let db = Database::open_in_memory().unwrap();
        let rec = record("Ayesha", "2024-03-05");
        put_record(db.conn(), &rec).unwrap();

        let retrieved = get_record(db.conn(), &rec.id).unwrap().unwrap();
        assert_eq!(retrieved, rec);
    }

    #[test]
    fn test_list_newest_first() {
        let db = Database::open_in_memory().unwrap();
        put_record(db.conn(), &record("Old", "2024-01-01")).unwrap();
        put_record(db.conn(), &record("New", "2024-06-01")).unwrap();

        let names: Vec<String> = list_records(db.conn())
            .unwrap()
            .into_iter()
            .map(|r| r.patient_name)
            .collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let rec = record("Ayesha", "2024-03-05");
        put_record(db.conn(), &rec).unwrap();
        delete_record(db.conn(), &rec.id).unwrap();
        assert!(get_record(db.conn(), &rec.id).unwrap().is_none());
        assert!(matches!(delete_record(db.conn(), &rec.id), Err(DbError::NotFound(_))));
    }
}
