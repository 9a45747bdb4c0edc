//! Cash entry database operations.

use rusqlite::{params, Connection};

use super::{DbError, DbResult};
use crate::models::{CashEntry, EntryKind};

pub(super) fn put_entry(conn: &Connection, entry: &CashEntry) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO cash_entries (id, kind, name, amount, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            kind = excluded.kind,
            name = excluded.name,
            amount = excluded.amount
        "#,
        params![
            entry.id,
            entry.kind.as_str(),
            entry.name,
            entry.amount,
            entry.created_at,
        ],
    )?;
    Ok(())
}

pub(super) fn delete_entry(conn: &Connection, id: &str) -> DbResult<()> {
    let rows_affected = conn.execute("DELETE FROM cash_entries WHERE id = ?", [id])?;
    if rows_affected == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

pub(super) fn list_entries(conn: &Connection) -> DbResult<Vec<CashEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, name, amount, created_at FROM cash_entries ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, kind, name, amount, created_at) = row?;
        let kind = EntryKind::parse(&kind)
            .ok_or_else(|| DbError::Constraint(format!("unknown entry kind: {}", kind)))?;
        entries.push(CashEntry {
            id,
            kind,
            name,
            amount,
            created_at,
        });
    }
    Ok(entries)
}
