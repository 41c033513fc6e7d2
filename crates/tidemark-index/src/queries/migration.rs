use rusqlite::{Connection, OptionalExtension, Row, params};
use tidemark_types::{MigrationBatch, MigrationLogEntry, MigrationPhase, MigrationStatus};

use crate::{Error, Result};

fn entry_from_row(row: &Row) -> rusqlite::Result<MigrationLogEntry> {
    let phase_num: i64 = row.get(2)?;
    let phase = MigrationPhase::from_number(phase_num).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    let status_str: String = row.get(5)?;
    let status = MigrationStatus::parse(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MigrationLogEntry {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        phase,
        source_path: row.get(3)?,
        destination_path: row.get(4)?,
        status,
        error: row.get(6)?,
        applied_at: row.get(7)?,
    })
}

const ENTRY_COLUMNS: &str =
    "id, batch_id, phase, source_path, destination_path, status, error, applied_at";

pub fn create_batch(conn: &Connection, batch_id: &str, created_at: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO migration_batches (batch_id, created_at, last_completed_phase) VALUES (?1, ?2, NULL)",
        params![batch_id, created_at],
    )?;
    Ok(())
}

pub fn get_batch(conn: &Connection, batch_id: &str) -> Result<Option<MigrationBatch>> {
    let result = conn
        .query_row(
            "SELECT batch_id, created_at, last_completed_phase FROM migration_batches WHERE batch_id = ?1",
            [batch_id],
            |row| {
                let phase_num: Option<i64> = row.get(2)?;
                let last_completed_phase = match phase_num {
                    Some(n) => Some(MigrationPhase::from_number(n).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Integer,
                            Box::new(e),
                        )
                    })?),
                    None => None,
                };
                Ok(MigrationBatch {
                    batch_id: row.get(0)?,
                    created_at: row.get(1)?,
                    last_completed_phase,
                })
            },
        )
        .optional()?;
    Ok(result)
}

pub fn list_batches(conn: &Connection) -> Result<Vec<MigrationBatch>> {
    let mut stmt = conn.prepare(
        "SELECT batch_id, created_at, last_completed_phase FROM migration_batches ORDER BY created_at DESC",
    )?;
    let batches = stmt
        .query_map([], |row| {
            let phase_num: Option<i64> = row.get(2)?;
            Ok(MigrationBatch {
                batch_id: row.get(0)?,
                created_at: row.get(1)?,
                last_completed_phase: phase_num.and_then(|n| MigrationPhase::from_number(n).ok()),
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(batches)
}

/// Persist the phase checkpoint. Checkpoints only advance.
pub fn complete_phase(conn: &Connection, batch_id: &str, phase: MigrationPhase) -> Result<()> {
    let batch = get_batch(conn, batch_id)?
        .ok_or_else(|| Error::Query(format!("unknown migration batch: {}", batch_id)))?;

    if let Some(last) = batch.last_completed_phase
        && phase.number() < last.number()
    {
        return Err(Error::InvalidTransition(format!(
            "phase checkpoint cannot move from {} back to {}",
            last.label(),
            phase.label()
        )));
    }

    conn.execute(
        "UPDATE migration_batches SET last_completed_phase = ?2 WHERE batch_id = ?1",
        params![batch_id, phase.number()],
    )?;
    Ok(())
}

pub fn append_entry(
    conn: &Connection,
    batch_id: &str,
    phase: MigrationPhase,
    source_path: &str,
    destination_path: &str,
    status: MigrationStatus,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO migration_log (batch_id, phase, source_path, destination_path, status, error, applied_at)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL)
        "#,
        params![
            batch_id,
            phase.number(),
            source_path,
            destination_path,
            status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Advance one entry's status. Transitions are forward-only; the audit
/// trail never rewinds and rows are never deleted.
pub fn update_status(
    conn: &Connection,
    entry_id: i64,
    status: MigrationStatus,
    error: Option<&str>,
    applied_at: Option<&str>,
) -> Result<()> {
    let current: String = conn
        .query_row(
            "SELECT status FROM migration_log WHERE id = ?1",
            [entry_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::Query(format!("unknown migration entry: {}", entry_id)))?;
    let current = MigrationStatus::parse(&current)?;

    if !current.can_advance_to(status) {
        return Err(Error::InvalidTransition(format!(
            "entry {} cannot move from {} to {}",
            entry_id,
            current.as_str(),
            status.as_str()
        )));
    }

    conn.execute(
        "UPDATE migration_log SET status = ?2, error = ?3, applied_at = COALESCE(?4, applied_at) WHERE id = ?1",
        params![entry_id, status.as_str(), error, applied_at],
    )?;
    Ok(())
}

pub fn entries_for_batch(conn: &Connection, batch_id: &str) -> Result<Vec<MigrationLogEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM migration_log WHERE batch_id = ?1 ORDER BY id",
        ENTRY_COLUMNS
    ))?;
    let entries = stmt
        .query_map([batch_id], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(entries)
}

/// Applied entries for a batch, newest first: the rollback order.
pub fn applied_entries_desc(conn: &Connection, batch_id: &str) -> Result<Vec<MigrationLogEntry>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM migration_log
        WHERE batch_id = ?1 AND status = 'applied'
        ORDER BY applied_at DESC, id DESC
        "#,
        ENTRY_COLUMNS
    ))?;
    let entries = stmt
        .query_map([batch_id], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_entry_status_forward_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.create_migration_batch("b1", "2026-01-01T00:00:00Z")?;
        let id = db.append_migration_log(
            "b1",
            MigrationPhase::AutoMigrate,
            "/src",
            "/dst",
            MigrationStatus::Planned,
        )?;

        db.update_migration_status(id, MigrationStatus::Applied, None, Some("2026-01-01T00:01:00Z"))?;

        let err = db
            .update_migration_status(id, MigrationStatus::Planned, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        Ok(())
    }

    #[test]
    fn test_applied_entries_reverse_chronological() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.create_migration_batch("b1", "2026-01-01T00:00:00Z")?;

        for (i, ts) in ["00:01", "00:02", "00:03"].iter().enumerate() {
            let id = db.append_migration_log(
                "b1",
                MigrationPhase::AutoMigrate,
                &format!("/src{}", i),
                &format!("/dst{}", i),
                MigrationStatus::Planned,
            )?;
            db.update_migration_status(
                id,
                MigrationStatus::Applied,
                None,
                Some(&format!("2026-01-01T{}:00Z", ts)),
            )?;
        }
        // One entry stays planned; rollback must not see it.
        db.append_migration_log(
            "b1",
            MigrationPhase::AutoMigrate,
            "/src9",
            "/dst9",
            MigrationStatus::Planned,
        )?;

        let applied = db.applied_entries_desc("b1")?;
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[0].source_path, "/src2");
        assert_eq!(applied[2].source_path, "/src0");
        Ok(())
    }

    #[test]
    fn test_batches_are_isolated() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.create_migration_batch("b1", "2026-01-01T00:00:00Z")?;
        db.create_migration_batch("b2", "2026-01-02T00:00:00Z")?;
        let id = db.append_migration_log(
            "b2",
            MigrationPhase::AutoMigrate,
            "/s",
            "/d",
            MigrationStatus::Planned,
        )?;
        db.update_migration_status(id, MigrationStatus::Applied, None, Some("2026-01-02T00:01:00Z"))?;

        assert!(db.applied_entries_desc("b1")?.is_empty());
        assert_eq!(db.applied_entries_desc("b2")?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_phase_checkpoint_advances_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.create_migration_batch("b1", "2026-01-01T00:00:00Z")?;
        db.complete_migration_phase("b1", MigrationPhase::Structure)?;
        db.complete_migration_phase("b1", MigrationPhase::AutoMigrate)?;

        let err = db
            .complete_migration_phase("b1", MigrationPhase::Structure)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        let batch = db.migration_batch("b1")?.unwrap();
        assert_eq!(batch.last_completed_phase, Some(MigrationPhase::AutoMigrate));
        Ok(())
    }
}
