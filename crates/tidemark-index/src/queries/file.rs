use rusqlite::{Connection, OptionalExtension, Row, params};
use tidemark_types::FileRecord;

use crate::Result;

fn from_row(row: &Row) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        remote_id: row.get(1)?,
        content_hash: row.get(2)?,
        size_bytes: row.get(3)?,
        modified_time: row.get(4)?,
        is_dir: row.get(5)?,
        extension: row.get(6)?,
        parent_dir: row.get(7)?,
        scanned_at: row.get(8)?,
    })
}

const COLUMNS: &str =
    "path, remote_id, content_hash, size_bytes, modified_time, is_dir, extension, parent_dir, scanned_at";

pub fn upsert(conn: &Connection, file: &FileRecord) -> Result<bool> {
    // Idempotent by path. The WHERE clause makes an unchanged re-upsert
    // affect zero rows, so scan "updated" counts reflect real diffs;
    // scanned_at alone never counts as a change.
    let changed = conn.execute(
        r#"
        INSERT INTO files (path, remote_id, content_hash, size_bytes, modified_time,
                           is_dir, extension, parent_dir, scanned_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(path) DO UPDATE SET
            remote_id = COALESCE(excluded.remote_id, files.remote_id),
            content_hash = COALESCE(excluded.content_hash, files.content_hash),
            size_bytes = excluded.size_bytes,
            modified_time = COALESCE(excluded.modified_time, files.modified_time),
            is_dir = excluded.is_dir,
            extension = excluded.extension,
            parent_dir = excluded.parent_dir,
            scanned_at = COALESCE(excluded.scanned_at, files.scanned_at)
        WHERE files.size_bytes IS NOT excluded.size_bytes
           OR files.is_dir IS NOT excluded.is_dir
           OR COALESCE(excluded.content_hash, files.content_hash) IS NOT files.content_hash
           OR COALESCE(excluded.modified_time, files.modified_time) IS NOT files.modified_time
           OR COALESCE(excluded.remote_id, files.remote_id) IS NOT files.remote_id
        "#,
        params![
            &file.path,
            &file.remote_id,
            &file.content_hash,
            &file.size_bytes,
            &file.modified_time,
            &file.is_dir,
            &file.extension,
            &file.parent_dir,
            &file.scanned_at,
        ],
    )?;

    Ok(changed > 0)
}

pub fn get(conn: &Connection, path: &str) -> Result<Option<FileRecord>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM files WHERE path = ?1", COLUMNS),
            [path],
            from_row,
        )
        .optional()?;
    Ok(result)
}

pub fn all(conn: &Connection, include_dirs: bool) -> Result<Vec<FileRecord>> {
    let query = if include_dirs {
        format!("SELECT {} FROM files ORDER BY path", COLUMNS)
    } else {
        format!("SELECT {} FROM files WHERE is_dir = 0 ORDER BY path", COLUMNS)
    };
    let mut stmt = conn.prepare(&query)?;
    let files = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(files)
}

pub fn under_prefix(conn: &Connection, prefix: &str) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM files WHERE (path = ?1 OR path LIKE ?2) AND is_dir = 0 ORDER BY path",
        COLUMNS
    ))?;
    let pattern = format!("{}/%", prefix.trim_end_matches('/'));
    let files = stmt
        .query_map(params![prefix, pattern], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(files)
}

/// Directory rows strictly below `prefix`, shallowest first.
pub fn dirs_under_prefix(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT path FROM files WHERE path LIKE ?1 AND is_dir = 1 ORDER BY path",
    )?;
    let pattern = format!("{}/%", prefix.trim_end_matches('/'));
    let dirs = stmt
        .query_map([pattern], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(dirs)
}

pub fn by_hash(conn: &Connection, content_hash: &str) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM files WHERE content_hash = ?1 AND is_dir = 0 ORDER BY path",
        COLUMNS
    ))?;
    let files = stmt
        .query_map([content_hash], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(files)
}

/// Hash groups with more than one member (non-empty files only), the
/// raw material for deduplication.
pub fn duplicate_groups(conn: &Connection) -> Result<Vec<(String, Vec<FileRecord>)>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT content_hash FROM files
        WHERE is_dir = 0 AND content_hash IS NOT NULL AND size_bytes > 0
        GROUP BY content_hash HAVING COUNT(*) > 1
        ORDER BY content_hash
        "#,
    )?;
    let hashes = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut groups = Vec::with_capacity(hashes.len());
    for hash in hashes {
        let files = by_hash(conn, &hash)?;
        groups.push((hash, files));
    }
    Ok(groups)
}

/// Directory rows with no child rows in the index.
pub fn empty_directories(conn: &Connection) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM files d
        WHERE d.is_dir = 1
          AND NOT EXISTS (SELECT 1 FROM files f WHERE f.parent_dir = d.path)
        ORDER BY d.path
        "#,
        COLUMNS
    ))?;
    let dirs = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(dirs)
}

pub fn larger_than(conn: &Connection, threshold_bytes: i64) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM files WHERE is_dir = 0 AND size_bytes >= ?1 ORDER BY size_bytes DESC",
        COLUMNS
    ))?;
    let files = stmt
        .query_map([threshold_bytes], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(files)
}

pub fn modified_before(conn: &Connection, cutoff: &str) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM files
        WHERE is_dir = 0 AND modified_time IS NOT NULL AND modified_time < ?1
        ORDER BY modified_time
        "#,
        COLUMNS
    ))?;
    let files = stmt
        .query_map([cutoff], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(files)
}

/// Rewrite a record's path in place after a remote move. Classification
/// rows follow the file so the active classification stays joined.
pub fn move_path(conn: &Connection, source: &str, destination: &str) -> Result<()> {
    let (parent_dir, _) = tidemark_types::split_path(destination);
    conn.execute(
        "UPDATE files SET path = ?2, parent_dir = ?3 WHERE path = ?1",
        params![source, destination, parent_dir],
    )?;
    conn.execute(
        "UPDATE classifications SET path = ?2 WHERE path = ?1",
        params![source, destination],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, path: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM files WHERE path = ?1", [path])?;
    conn.execute("DELETE FROM classifications WHERE path = ?1", [path])?;
    Ok(n > 0)
}
