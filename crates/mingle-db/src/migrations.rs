use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Ordered, append-only migration steps. `PRAGMA user_version` records how
/// many have been applied, so existing databases pick up only the tail.
const MIGRATIONS: &[&str] = &["
    CREATE TABLE member (
        id          INTEGER PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "];

pub fn run(conn: &Connection) -> Result<()> {
    let applied: usize =
        conn.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
            row.get::<_, i64>(0)
        })? as usize;

    for (version, step) in MIGRATIONS.iter().enumerate().skip(applied) {
        conn.execute_batch(step)?;
        conn.pragma_update(None, "user_version", version as i64 + 1)?;
        info!("member store migrated to schema version {}", version + 1);
    }

    Ok(())
}
