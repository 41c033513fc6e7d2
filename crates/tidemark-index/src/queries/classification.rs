use rusqlite::{Connection, OptionalExtension, Row, params};
use tidemark_types::{ClassificationResult, ConfidenceTier};

use crate::Result;

fn from_row(row: &Row) -> rusqlite::Result<ClassificationResult> {
    let tier_str: String = row.get(2)?;
    let tier = ConfidenceTier::parse(&tier_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ClassificationResult {
        path: row.get(0)?,
        category_path: row.get(1)?,
        tier,
        rule_matched: row.get(3)?,
        reason: row.get(4)?,
        classified_at: row.get(5)?,
    })
}

const COLUMNS: &str = "path, category_path, tier, rule_matched, reason, classified_at";

/// Upsert by path: re-classification supersedes, it never appends.
pub fn save(conn: &Connection, result: &ClassificationResult) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO classifications (path, category_path, tier, rule_matched, reason, classified_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(path) DO UPDATE SET
            category_path = ?2,
            tier = ?3,
            rule_matched = ?4,
            reason = ?5,
            classified_at = ?6
        "#,
        params![
            &result.path,
            &result.category_path,
            result.tier.as_str(),
            &result.rule_matched,
            &result.reason,
            &result.classified_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, path: &str) -> Result<Option<ClassificationResult>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM classifications WHERE path = ?1", COLUMNS),
            [path],
            from_row,
        )
        .optional()?;
    Ok(result)
}

pub fn all(conn: &Connection) -> Result<Vec<ClassificationResult>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM classifications ORDER BY path",
        COLUMNS
    ))?;
    let results = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(results)
}

pub fn by_tier(conn: &Connection, tier: ConfidenceTier) -> Result<Vec<ClassificationResult>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM classifications WHERE tier = ?1 ORDER BY path",
        COLUMNS
    ))?;
    let results = stmt
        .query_map([tier.as_str()], from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(results)
}

/// Paths of files that currently lack an active classification.
pub fn unclassified_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT f.path FROM files f
        LEFT JOIN classifications c ON f.path = c.path
        WHERE f.is_dir = 0 AND c.path IS NULL
        ORDER BY f.path
        "#,
    )?;
    let paths = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tidemark_types::FileRecord;

    fn result(path: &str, category: &str, tier: ConfidenceTier) -> ClassificationResult {
        ClassificationResult {
            path: path.to_string(),
            category_path: category.to_string(),
            tier,
            rule_matched: "keyword_match".to_string(),
            reason: "test".to_string(),
            classified_at: Some("2026-01-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_reclassification_supersedes() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.save_classifications(&[result("/a.txt", "/Docs", ConfidenceTier::Medium)])?;
        db.save_classifications(&[result("/a.txt", "/Docs/Finance", ConfidenceTier::High)])?;

        let all = db.all_classifications()?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category_path, "/Docs/Finance");
        assert_eq!(all[0].tier, ConfidenceTier::High);
        Ok(())
    }

    #[test]
    fn test_by_tier_filter() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.save_classifications(&[
            result("/a.txt", "/Docs", ConfidenceTier::High),
            result("/b.txt", "/Docs", ConfidenceTier::Medium),
            result("/c.txt", "/Docs", ConfidenceTier::Low),
        ])?;

        assert_eq!(db.classifications_by_tier(ConfidenceTier::High)?.len(), 1);
        assert_eq!(db.classifications_by_tier(ConfidenceTier::Medium)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_unclassified_paths() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.upsert_files(&[
            FileRecord::new("/a.txt", 1, false),
            FileRecord::new("/b.txt", 1, false),
            FileRecord::new("/dir", 0, true),
        ])?;
        db.save_classifications(&[result("/a.txt", "/Docs", ConfidenceTier::High)])?;

        let missing = db.unclassified_paths()?;
        assert_eq!(missing, vec!["/b.txt"]);
        Ok(())
    }
}
