use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{DecodeError, GraphError};
use crate::migrations;

pub type NodeId = i64;

/// A node row: label plus a JSON property bag. Typed views are produced by
/// [`Node::decode`], which fails with a [`DecodeError`] on shape mismatch
/// instead of panicking on a property cast.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub props: serde_json::Value,
}

impl Node {
    fn from_raw(id: NodeId, label: String, raw: &str) -> Result<Self, DecodeError> {
        let props = serde_json::from_str(raw).map_err(|source| DecodeError {
            id,
            label: label.clone(),
            source,
        })?;
        Ok(Self { id, label, props })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_value(self.props.clone()).map_err(|source| DecodeError {
            id: self.id,
            label: self.label.clone(),
            source,
        })
    }
}

/// Property-graph store over SQLite. The engine above this layer only ever
/// talks to [`GraphTx`] primitives, so the backing engine is swappable
/// behind this seam; what it relies on is that `write_tx` is all-or-nothing
/// and that reads inside it see the transaction's own prior writes.
pub struct GraphStore {
    conn: Mutex<Connection>,
}

impl GraphStore {
    pub fn open(path: &Path) -> Result<Self, GraphError> {
        let conn = Connection::open(path)?;
        Self::init(conn, path.display().to_string())
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, GraphError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, ":memory:".into())
    }

    fn init(conn: Connection, name: String) -> Result<Self, GraphError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Cascading edge deletion depends on this.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        migrations::run(&conn)?;

        info!("graph store opened at {}", name);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Read-only snapshot access.
    pub fn read<T, F>(&self, f: F) -> Result<T, GraphError>
    where
        F: FnOnce(&GraphTx) -> Result<T, GraphError>,
    {
        let conn = self.lock()?;
        f(&GraphTx { conn: &*conn })
    }

    /// One atomic read-then-write transaction. The closure's reads see its
    /// own prior writes; any error rolls the whole transaction back.
    /// Writers on the same store serialize here, which is what keeps two
    /// racing mutations on the same user pair from interleaving.
    pub fn write_tx<T, F>(&self, f: F) -> Result<T, GraphError>
    where
        F: FnOnce(&GraphTx) -> Result<T, GraphError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&GraphTx { conn: &*tx })?;
        tx.commit()?;
        Ok(out)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, GraphError> {
        self.conn
            .lock()
            .map_err(|e| GraphError::Unavailable(e.to_string()))
    }
}

/// Generic property-graph operations, domain-free. Inside `write_tx` these
/// run against the open transaction; inside `read` against a plain snapshot.
pub struct GraphTx<'c> {
    conn: &'c Connection,
}

impl GraphTx<'_> {
    pub fn create_node(
        &self,
        label: &str,
        props: &serde_json::Value,
    ) -> Result<NodeId, GraphError> {
        self.conn.execute(
            "INSERT INTO graph_nodes (label, props) VALUES (?1, ?2)",
            (label, props.to_string()),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// First node with the given label whose `prop` property equals `value`.
    pub fn match_node(
        &self,
        label: &str,
        prop: &str,
        value: &str,
    ) -> Result<Option<Node>, GraphError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, props FROM graph_nodes
             WHERE label = ?1 AND json_extract(props, '$.' || ?2) = ?3
             LIMIT 1",
        )?;
        let row = stmt
            .query_row((label, prop, value), |row| {
                Ok((
                    row.get::<_, NodeId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map(Some)
            .or_else(no_rows_to_none)?;

        row.map(|(id, label, raw)| Node::from_raw(id, label, &raw))
            .transpose()
            .map_err(GraphError::from)
    }

    pub fn nodes_with_label(&self, label: &str) -> Result<Vec<Node>, GraphError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, props FROM graph_nodes WHERE label = ?1")?;
        let raw = stmt
            .query_map([label], |row| {
                Ok((
                    row.get::<_, NodeId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        decode_rows(raw)
    }

    /// Deleting a node detaches it: every edge touching it goes with it.
    pub fn delete_node(&self, id: NodeId) -> Result<(), GraphError> {
        self.conn
            .execute("DELETE FROM graph_nodes WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Merge-style edge creation: a second identical edge is a no-op.
    pub fn create_edge(&self, src: NodeId, rel: &str, dst: NodeId) -> Result<(), GraphError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO graph_edges (rel, src, dst) VALUES (?1, ?2, ?3)",
            (rel, src, dst),
        )?;
        Ok(())
    }

    pub fn edge_exists(&self, src: NodeId, rel: &str, dst: NodeId) -> Result<bool, GraphError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM graph_edges WHERE src = ?1 AND rel = ?2 AND dst = ?3",
                (src, rel, dst),
                |row| row.get(0),
            )
            .map(Some)
            .or_else(no_rows_to_none)?;
        Ok(found.is_some())
    }

    /// Returns how many edges were removed (0 is not an error).
    pub fn delete_edge(&self, src: NodeId, rel: &str, dst: NodeId) -> Result<usize, GraphError> {
        let n = self.conn.execute(
            "DELETE FROM graph_edges WHERE src = ?1 AND rel = ?2 AND dst = ?3",
            (src, rel, dst),
        )?;
        Ok(n)
    }

    pub fn out_neighbors(&self, src: NodeId, rel: &str) -> Result<Vec<Node>, GraphError> {
        self.neighbors(
            "SELECT n.id, n.label, n.props FROM graph_edges e
             JOIN graph_nodes n ON n.id = e.dst
             WHERE e.src = ?1 AND e.rel = ?2",
            src,
            rel,
        )
    }

    pub fn in_neighbors(&self, dst: NodeId, rel: &str) -> Result<Vec<Node>, GraphError> {
        self.neighbors(
            "SELECT n.id, n.label, n.props FROM graph_edges e
             JOIN graph_nodes n ON n.id = e.src
             WHERE e.dst = ?1 AND e.rel = ?2",
            dst,
            rel,
        )
    }

    /// RFC 7386 merge of `patch` onto the node's property bag. Fails with
    /// `NotFound` if the node does not exist.
    pub fn merge_props(&self, id: NodeId, patch: &serde_json::Value) -> Result<(), GraphError> {
        let n = self.conn.execute(
            "UPDATE graph_nodes SET props = json_patch(props, ?2) WHERE id = ?1",
            (id, patch.to_string()),
        )?;
        if n == 0 {
            return Err(GraphError::NotFound);
        }
        Ok(())
    }

    fn neighbors(&self, sql: &str, node: NodeId, rel: &str) -> Result<Vec<Node>, GraphError> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map((node, rel), |row| {
                Ok((
                    row.get::<_, NodeId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        decode_rows(raw)
    }
}

fn decode_rows(raw: Vec<(NodeId, String, String)>) -> Result<Vec<Node>, GraphError> {
    raw.into_iter()
        .map(|(id, label, props)| Node::from_raw(id, label, &props).map_err(GraphError::from))
        .collect()
}

fn no_rows_to_none<T>(e: rusqlite::Error) -> Result<Option<T>, rusqlite::Error> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}
