//! Medicine (inventory) database operations.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbError, DbResult};
use crate::models::{now_timestamp, DosageForm, Medicine};

const MEDICINE_COLUMNS: &str = "m.id, m.name, m.strength, m.form, m.pack_purchase_rate, \
     m.pack_retail_rate, m.units_per_pack, m.total_units, m.created_at, m.updated_at";

/// Insert or replace a medicine.
pub(super) fn put_medicine(conn: &Connection, medicine: &Medicine) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO medicines (
            id, name, strength, form, pack_purchase_rate, pack_retail_rate,
            units_per_pack, total_units, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            strength = excluded.strength,
            form = excluded.form,
            pack_purchase_rate = excluded.pack_purchase_rate,
            pack_retail_rate = excluded.pack_retail_rate,
            units_per_pack = excluded.units_per_pack,
            total_units = excluded.total_units,
            updated_at = excluded.updated_at
        "#,
        params![
            medicine.id,
            medicine.name,
            medicine.strength,
            medicine.form.as_str(),
            medicine.pack_purchase_rate,
            medicine.pack_retail_rate,
            medicine.units_per_pack,
            medicine.total_units,
            medicine.created_at,
            medicine.updated_at,
        ],
    )?;
    Ok(())
}

pub(super) fn delete_medicine(conn: &Connection, id: &str) -> DbResult<()> {
    let rows_affected = conn.execute("DELETE FROM medicines WHERE id = ?", [id])?;
    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Add `delta` units, refusing to go below zero or past `u32::MAX`.
///
/// The guard is part of the UPDATE so the check and the write see the same
/// row inside the enclosing transaction.
pub(super) fn adjust_stock(conn: &Connection, id: &str, delta: i64) -> DbResult<()> {
    let rows_affected = conn.execute(
        r#"
        UPDATE medicines
        SET total_units = total_units + ?2, updated_at = ?3
        WHERE id = ?1 AND total_units + ?2 BETWEEN 0 AND ?4
        "#,
        params![id, delta, now_timestamp(), i64::from(u32::MAX)],
    )?;
    if rows_affected > 0 {
        return Ok(());
    }

    let current: Option<i64> = conn
        .query_row("SELECT total_units FROM medicines WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    match current {
        None => Err(DbError::NotFound(id.to_string())),
        Some(units) => Err(DbError::Constraint(format!(
            "stock of {} cannot become {}",
            id,
            units + delta
        ))),
    }
}

pub(super) fn get_medicine(conn: &Connection, id: &str) -> DbResult<Option<Medicine>> {
    let sql = format!("SELECT {} FROM medicines m WHERE m.id = ?", MEDICINE_COLUMNS);
    let row = conn.query_row(&sql, [id], MedicineRow::from_row).optional()?;
    row.map(|r| r.try_into()).transpose()
}

pub(super) fn list_medicines(conn: &Connection) -> DbResult<Vec<Medicine>> {
    let sql = format!(
        "SELECT {} FROM medicines m ORDER BY m.name COLLATE NOCASE, m.strength",
        MEDICINE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], MedicineRow::from_row)?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(row?.try_into()?);
    }
    Ok(medicines)
}

/// Search by name and strength using FTS5 (BM25 ranking).
pub(super) fn search_medicines(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> DbResult<Vec<Medicine>> {
    let escaped_query = escape_fts_query(query);
    if escaped_query.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT {}, bm25(medicines_fts) as rank
        FROM medicines m
        JOIN medicines_fts fts ON m.rowid = fts.rowid
        WHERE medicines_fts MATCH ?
        ORDER BY rank
        LIMIT ?
        "#,
        MEDICINE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![escaped_query, limit as i64], MedicineRow::from_row)?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(row?.try_into()?);
    }
    Ok(medicines)
}

pub(super) fn stock_levels(conn: &Connection) -> DbResult<HashMap<String, u32>> {
    let mut stmt = conn.prepare("SELECT id, total_units FROM medicines")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;

    let mut levels = HashMap::new();
    for row in rows {
        let (id, units) = row?;
        levels.insert(id, units);
    }
    Ok(levels)
}

/// Intermediate row struct for database mapping.
struct MedicineRow {
    id: String,
    name: String,
    strength: String,
    form: String,
    pack_purchase_rate: f64,
    pack_retail_rate: f64,
    units_per_pack: u32,
    total_units: u32,
    created_at: String,
    updated_at: String,
}

impl MedicineRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            strength: row.get(2)?,
            form: row.get(3)?,
            pack_purchase_rate: row.get(4)?,
            pack_retail_rate: row.get(5)?,
            units_per_pack: row.get(6)?,
            total_units: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = DbError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let form = DosageForm::parse(&row.form)
            .ok_or_else(|| DbError::Constraint(format!("unknown dosage form: {}", row.form)))?;
        Ok(Medicine {
            id: row.id,
            name: row.name,
            strength: row.strength,
            form,
            pack_purchase_rate: row.pack_purchase_rate,
            pack_retail_rate: row.pack_retail_rate,
            units_per_pack: row.units_per_pack,
            total_units: row.total_units,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::fixtures::medicine;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let db = setup_db();
        let med = medicine("Panadol", 10, 30);
        put_medicine(db.conn(), &med).unwrap();

        let retrieved = get_medicine(db.conn(), &med.id).unwrap().unwrap();
        assert_eq!(retrieved, med);
        assert!(get_medicine(db.conn(), "missing").unwrap().is_none());
    }

    #[test]
    fn test_put_updates() {
        let db = setup_db();
        let mut med = medicine("Original", 10, 30);
        put_medicine(db.conn(), &med).unwrap();

        med.name = "Updated".into();
        med.total_units = 12;
        put_medicine(db.conn(), &med).unwrap();

        let retrieved = get_medicine(db.conn(), &med.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Updated");
        assert_eq!(retrieved.total_units, 12);
    }

    #[test]
    fn test_adjust_stock_guard() {
        let db = setup_db();
        let med = medicine("Panadol", 10, 30);
        put_medicine(db.conn(), &med).unwrap();

        adjust_stock(db.conn(), &med.id, -30).unwrap();
        assert_eq!(stock_levels(db.conn()).unwrap()[&med.id], 0);

        let err = adjust_stock(db.conn(), &med.id, -1).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));

        adjust_stock(db.conn(), &med.id, 7).unwrap();
        assert_eq!(get_medicine(db.conn(), &med.id).unwrap().unwrap().total_units, 7);
    }

    #[test]
    fn test_adjust_stock_rejects_overflow() {
        let db = setup_db();
        let med = medicine("Panadol", 10, 30);
        put_medicine(db.conn(), &med).unwrap();

        let headroom = i64::from(u32::MAX) - 30;
        let err = adjust_stock(db.conn(), &med.id, headroom + 1).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
        assert_eq!(stock_levels(db.conn()).unwrap()[&med.id], 30);

        adjust_stock(db.conn(), &med.id, headroom).unwrap();
        assert_eq!(get_medicine(db.conn(), &med.id).unwrap().unwrap().total_units, u32::MAX);
    }

    #[test]
    fn test_delete_missing() {
        let db = setup_db();
        assert!(matches!(delete_medicine(db.conn(), "nope"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_search_medicines() {
        let db = setup_db();
        put_medicine(db.conn(), &medicine("Augmentin", 6, 12)).unwrap();
        put_medicine(db.conn(), &medicine("Brufen", 10, 30)).unwrap();

        let results = search_medicines(db.conn(), "augmentin", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Augmentin");

        // Prefix search
        let results = search_medicines(db.conn(), "bru", 10).unwrap();
        assert_eq!(results.len(), 1);

        // Strength is indexed too
        let results = search_medicines(db.conn(), "500", 10).unwrap();
        assert_eq!(results.len(), 2);

        // FTS operators are stripped
        assert!(search_medicines(db.conn(), "\"*", 10).unwrap().is_empty());
    }

    #[test]
    fn test_escape_fts_query() {
        assert_eq!(escape_fts_query("panadol 500mg"), "panadol* 500mg*");
        assert_eq!(escape_fts_query("co-amoxiclav"), "co* amoxiclav*");
        assert_eq!(escape_fts_query("  "), "");
    }
}
