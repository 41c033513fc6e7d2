use rusqlite::{Connection, OptionalExtension, Row, params};
use tidemark_types::ScanBatch;

use crate::Result;

fn from_row(row: &Row) -> rusqlite::Result<ScanBatch> {
    Ok(ScanBatch {
        id: row.get(0)?,
        root: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        discovered: row.get::<_, i64>(4)? as u64,
        updated: row.get::<_, i64>(5)? as u64,
        errored: row.get::<_, i64>(6)? as u64,
        complete: row.get(7)?,
    })
}

const COLUMNS: &str = "id, root, started_at, finished_at, discovered, updated, errored, complete";

pub fn record_start(conn: &Connection, batch: &ScanBatch) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO scan_batches (id, root, started_at, finished_at, discovered, updated, errored, complete)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            &batch.id,
            &batch.root,
            &batch.started_at,
            &batch.finished_at,
            batch.discovered as i64,
            batch.updated as i64,
            batch.errored as i64,
            &batch.complete,
        ],
    )?;
    Ok(())
}

pub fn finalize(conn: &Connection, batch: &ScanBatch) -> Result<()> {
    conn.execute(
        r#"
        UPDATE scan_batches
        SET finished_at = ?2, discovered = ?3, updated = ?4, errored = ?5, complete = ?6
        WHERE id = ?1
        "#,
        params![
            &batch.id,
            &batch.finished_at,
            batch.discovered as i64,
            batch.updated as i64,
            batch.errored as i64,
            &batch.complete,
        ],
    )?;
    Ok(())
}

pub fn list(conn: &Connection, limit: usize) -> Result<Vec<ScanBatch>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM scan_batches ORDER BY started_at DESC LIMIT ?1",
        COLUMNS
    ))?;
    let batches = stmt
        .query_map([limit as i64], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(batches)
}

/// Most recent scan that finished with the full-listing path intact.
pub fn last_complete(conn: &Connection) -> Result<Option<ScanBatch>> {
    let result = conn
        .query_row(
            &format!(
                r#"
                SELECT {} FROM scan_batches
                WHERE complete = 1 AND finished_at IS NOT NULL
                ORDER BY started_at DESC LIMIT 1
                "#,
                COLUMNS
            ),
            [],
            from_row,
        )
        .optional()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn batch(id: &str, started_at: &str, complete: bool) -> ScanBatch {
        ScanBatch {
            id: id.to_string(),
            root: "/".to_string(),
            started_at: started_at.to_string(),
            finished_at: Some(format!("{}+1", started_at)),
            discovered: 10,
            updated: 10,
            errored: 0,
            complete,
        }
    }

    #[test]
    fn test_scan_history_is_append_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.record_scan_start(&batch("s1", "2026-01-01T00:00:00Z", true))?;
        db.record_scan_start(&batch("s2", "2026-01-02T00:00:00Z", false))?;

        let all = db.scan_batches(10)?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "s2");
        Ok(())
    }

    #[test]
    fn test_last_complete_skips_fallback_scans() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.record_scan_start(&batch("full", "2026-01-01T00:00:00Z", true))?;
        db.record_scan_start(&batch("partial", "2026-01-02T00:00:00Z", false))?;

        let last = db.last_complete_scan()?.unwrap();
        assert_eq!(last.id, "full");
        Ok(())
    }

    #[test]
    fn test_finalize_updates_counts() -> Result<()> {
        let db = Database::open_in_memory()?;
        let mut b = batch("s1", "2026-01-01T00:00:00Z", true);
        b.finished_at = None;
        db.record_scan_start(&b)?;

        b.finished_at = Some("2026-01-01T00:05:00Z".to_string());
        b.errored = 3;
        b.updated = 997;
        db.finish_scan(&b)?;

        let rows = db.scan_batches(1)?;
        assert_eq!(rows[0].errored, 3);
        assert_eq!(rows[0].updated, 997);
        Ok(())
    }
}
