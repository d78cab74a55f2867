use anyhow::{ensure, Context, Result};
use rusqlite::Connection;

use crate::log_info;

const ENABLE_LOGS: bool = true;

/// One schema step. `user_version` is bumped inside the same transaction, so
/// a failed step leaves the store at the previous version.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create kv_store",
        sql: "CREATE TABLE kv_store (
                  key TEXT PRIMARY KEY NOT NULL,
                  value TEXT NOT NULL
              );",
    },
    Migration {
        version: 2,
        description: "track last write per key",
        sql: "ALTER TABLE kv_store ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';
              UPDATE kv_store
                 SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
               WHERE updated_at = '';",
    },
];

fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn schema_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Brings the store to the newest schema and returns that version.
pub fn migrate(conn: &mut Connection) -> Result<i32> {
    migrate_to(conn, latest_version())
}

fn migrate_to(conn: &mut Connection, target: i32) -> Result<i32> {
    let current = schema_version(conn).context("failed to read storage schema version")?;
    ensure!(
        current <= latest_version(),
        "storage schema {current} is newer than this build understands ({})",
        latest_version()
    );

    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current && migration.version <= target)
    {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
            .with_context(|| {
                format!(
                    "storage migration {} ({}) failed",
                    migration.version, migration.description
                )
            })?;
        tx.commit()?;
        log_info!(
            "STORAGE",
            "Applied storage migration {}: {}",
            migration.version,
            migration.description
        );
    }

    Ok(schema_version(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_reaches_latest_and_stays_there() {
        let mut conn = Connection::open_in_memory().expect("open");
        assert_eq!(migrate(&mut conn).expect("migrate"), latest_version());
        assert_eq!(migrate(&mut conn).expect("again"), latest_version());
    }

    #[test]
    fn existing_rows_get_a_write_time_when_upgrading() {
        let mut conn = Connection::open_in_memory().expect("open");
        assert_eq!(migrate_to(&mut conn, 1).expect("v1"), 1);
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES ('parkwise.theme', 'dark')",
            [],
        )
        .expect("insert");

        assert_eq!(migrate(&mut conn).expect("upgrade"), 2);
        let (value, updated_at): (String, String) = conn
            .query_row(
                "SELECT value, updated_at FROM kv_store WHERE key = 'parkwise.theme'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("row");
        assert_eq!(value, "dark");
        assert!(updated_at.ends_with('Z'), "unexpected write time {updated_at}");
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().expect("open");
        conn.pragma_update(None, "user_version", latest_version() + 1)
            .expect("bump");
        assert!(migrate(&mut conn).is_err());
    }
}
