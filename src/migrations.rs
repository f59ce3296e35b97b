//! Schema migration framework.
//!
//! Numbered SQL migrations are embedded at compile time via `include_str!`.
//! Each migration runs exactly once, tracked by the `schema_version` table.

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

/// Create the `schema_version` table if it doesn't exist.
fn ensure_schema_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("Failed to create schema_version table: {}", e))
}

/// Return the highest applied migration version, or 0 if none.
fn current_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("Failed to read schema version: {}", e))
}

/// Back up the database before applying migrations.
///
/// Uses SQLite's online backup API to create a hot copy at
/// `<db_path>.pre-migration.bak`. Skipped for a database that has never been
/// migrated, since there is nothing in it worth keeping.
fn backup_before_migration(conn: &Connection, current: i32) -> Result<(), String> {
    if current == 0 {
        return Ok(());
    }

    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to get database path: {}", e))?;

    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    let backup_path = format!("{}.pre-migration.bak", db_path);
    let mut backup_conn = Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file: {}", e))?;

    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to initialize pre-migration backup: {}", e))?;

    backup
        .step(-1)
        .map_err(|e| format!("Pre-migration backup failed: {}", e))?;

    log::info!("Pre-migration backup created at {}", backup_path);
    Ok(())
}

/// Run all pending migrations.
///
/// Returns the number of migrations applied (0 if already up-to-date).
///
/// Forward-compat guard: if the database has a higher version than the highest
/// known migration, returns an error instead of touching it.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_schema_version_table(conn)?;

    let current = current_version(conn)?;
    let max_known = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);

    if current > max_known {
        return Err(format!(
            "Database schema version ({}) is newer than this build supports ({}). \
             Please upgrade preplist.",
            current, max_known
        ));
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        return Ok(0);
    }

    backup_before_migration(conn, current)?;

    for migration in &pending {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("Migration v{} failed: {}", migration.version, e))?;

        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|e| format!("Failed to record migration v{}: {}", migration.version, e))?;

        log::info!("Applied migration v{}", migration.version);
    }

    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_fresh_db_applies_baseline() {
        let conn = mem_db();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 1);
        assert_eq!(current_version(&conn).expect("version query"), 1);

        conn.execute(
            "INSERT INTO items (id, name, par_level, updated_at) VALUES ('i1', 'Salsa', 4, '2026-01-01')",
            [],
        )
        .expect("items should accept minimal row");
        conn.execute(
            "INSERT INTO prep_list (id, item_id, date, name, priority, created_at, updated_at)
             VALUES ('p1', 'i1', '2026-01-01', 'Salsa', 'A', '2026-01-01', '2026-01-01')",
            [],
        )
        .expect("prep_list should accept minimal row");
    }

    #[test]
    fn test_prep_list_rejects_unknown_priority() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrate");
        let result = conn.execute(
            "INSERT INTO prep_list (id, item_id, date, name, priority, created_at, updated_at)
             VALUES ('p1', 'i1', '2026-01-01', 'Salsa', 'D', '2026-01-01', '2026-01-01')",
            [],
        );
        assert!(result.is_err(), "priority D must be rejected");
    }

    #[test]
    fn test_prep_list_unique_per_day_and_item() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrate");
        let insert = |id: &str| {
            conn.execute(
                "INSERT INTO prep_list (id, item_id, date, name, priority, created_at, updated_at)
                 VALUES (?1, 'i1', '2026-01-01', 'Salsa', 'A', '2026-01-01', '2026-01-01')",
                [id],
            )
        };
        insert("p1").expect("first insert");
        assert!(insert("p2").is_err(), "second row for same (date, item) must fail");
    }

    #[test]
    fn test_forward_compat_guard() {
        let conn = mem_db();
        ensure_schema_version_table(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (999)", [])
            .unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(
            err.contains("newer than this build"),
            "error should mention version mismatch: {}",
            err
        );
    }

    #[test]
    fn test_idempotency() {
        let conn = mem_db();
        assert_eq!(run_migrations(&conn).expect("first run"), 1);
        assert_eq!(run_migrations(&conn).expect("second run"), 0);
        assert_eq!(current_version(&conn).expect("version query"), 1);
    }

    #[test]
    fn test_fresh_file_db_skips_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("fresh.db");

        let conn = Connection::open(&db_path).expect("open db");
        conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();
        assert_eq!(run_migrations(&conn).expect("migrate"), 1);

        let backup_path = dir.path().join("fresh.db.pre-migration.bak");
        assert!(!backup_path.exists(), "no backup for a brand-new database");
    }
}
