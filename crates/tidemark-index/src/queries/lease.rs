use rusqlite::{Connection, OptionalExtension, params};

use crate::{Error, Result};

/// Try to take the single advisory write lease. Governance jobs are
/// mutually exclusive: migrate mutates paths that a concurrent scan or
/// dedup would otherwise see as renamed-but-unindexed.
pub fn acquire(conn: &Connection, job: &str, pid: u32, acquired_at: &str) -> Result<()> {
    let existing: Option<(String, i64, String)> = conn
        .query_row(
            "SELECT job, pid, acquired_at FROM leases WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    if let Some((held_job, held_pid, held_at)) = existing {
        return Err(Error::LeaseHeld(format!(
            "'{}' job (pid {}) has held the write lease since {}; \
             wait for it to finish or clear a stale lease with `tidemark status --clear-lease`",
            held_job, held_pid, held_at
        )));
    }

    conn.execute(
        "INSERT INTO leases (id, job, pid, acquired_at) VALUES (1, ?1, ?2, ?3)",
        params![job, pid as i64, acquired_at],
    )?;
    Ok(())
}

pub fn release(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM leases WHERE id = 1", [])?;
    Ok(())
}

pub fn holder(conn: &Connection) -> Result<Option<(String, u32, String)>> {
    let existing = conn
        .query_row(
            "SELECT job, pid, acquired_at FROM leases WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u32,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;
    Ok(existing)
}
