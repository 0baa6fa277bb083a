use rusqlite::Connection;
use tracing::info;

use crate::error::GraphError;

/// Ordered, append-only migration steps, tracked via `PRAGMA user_version`.
/// Duplicate parallel edges are excluded at the schema level; edge rows
/// cascade away with either endpoint node.
const MIGRATIONS: &[&str] = &["
    CREATE TABLE graph_nodes (
        id     INTEGER PRIMARY KEY,
        label  TEXT NOT NULL,
        props  TEXT NOT NULL DEFAULT '{}'
    );

    CREATE INDEX idx_graph_nodes_label ON graph_nodes(label);

    CREATE TABLE graph_edges (
        id   INTEGER PRIMARY KEY,
        rel  TEXT NOT NULL,
        src  INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        dst  INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        UNIQUE(src, rel, dst)
    );

    CREATE INDEX idx_graph_edges_dst ON graph_edges(dst, rel);
    "];

pub fn run(conn: &Connection) -> Result<(), GraphError> {
    let applied: usize =
        conn.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
            row.get::<_, i64>(0)
        })? as usize;

    for (version, step) in MIGRATIONS.iter().enumerate().skip(applied) {
        conn.execute_batch(step)?;
        conn.pragma_update(None, "user_version", version as i64 + 1)?;
        info!("graph store migrated to schema version {}", version + 1);
    }

    Ok(())
}
