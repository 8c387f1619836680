//! SQLite adapter for `GraphStore`
//!
//! # Schema
//!
//! ```text
//! nodes(identifier PK, primary_label, notation, uri, tags JSON, properties JSON)
//! edges(from_id, relation, to_id)  PK(from_id, relation, to_id)
//! ```
//!
//! `notation` and `uri` are denormalized out of the property bag so that key
//! and reference lookups hit an index. The connection sits behind a mutex;
//! a transaction holds the lock from `BEGIN IMMEDIATE` until it commits,
//! rolls back, or is dropped.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::domain::{GraphEdge, GraphNode, GraphStore, GraphTransaction};
use crate::{Result, StorageError};

const NODE_COLUMNS: &str = "identifier, primary_label, tags, properties";

/// SQLite-based `GraphStore`
#[derive(Clone)]
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
    /// Open (or create) a store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                identifier TEXT PRIMARY KEY,
                primary_label TEXT NOT NULL,
                notation TEXT,
                uri TEXT,
                tags TEXT NOT NULL,
                properties TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_notation ON nodes(notation)",
            [],
        )?;

        conn.execute("CREATE INDEX IF NOT EXISTS idx_nodes_uri ON nodes(uri)", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS edges (
                from_id TEXT NOT NULL,
                relation TEXT NOT NULL,
                to_id TEXT NOT NULL,
                PRIMARY KEY (from_id, relation, to_id),
                FOREIGN KEY (from_id) REFERENCES nodes(identifier),
                FOREIGN KEY (to_id) REFERENCES nodes(identifier)
            )",
            [],
        )?;

        conn.execute("CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id)", [])?;

        Ok(())
    }
}

impl GraphStore for SqliteGraphStore {
    fn begin(&self) -> Result<Box<dyn GraphTransaction + '_>> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StorageError::transaction(format!("BEGIN failed: {}", e)).with_source(e))?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_node(
    (identifier, primary_label, tags, properties): (String, String, String, String),
) -> Result<GraphNode> {
    Ok(GraphNode {
        identifier,
        primary_label,
        tags: serde_json::from_str(&tags)?,
        properties: serde_json::from_str(&properties)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl SqliteTransaction<'_> {
    fn query_nodes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<GraphNode>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map(params, row_to_node)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(decode_node).collect()
    }

    fn query_node(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<GraphNode>> {
        let raw = self.conn.query_row(sql, params, row_to_node).optional()?;
        raw.map(decode_node).transpose()
    }

    fn exists(&self, identifier: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM nodes WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn query_edges(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<GraphEdge>> {
        let mut stmt = self.conn.prepare(sql)?;
        let edges = stmt
            .query_map(params, |row| {
                Ok(GraphEdge {
                    from: row.get(0)?,
                    relation: row.get(1)?,
                    to: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    fn write_node(&self, node: &GraphNode, replace: bool) -> Result<()> {
        let sql = if replace {
            "INSERT OR REPLACE INTO nodes (identifier, primary_label, notation, uri, tags, properties)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        } else {
            "INSERT INTO nodes (identifier, primary_label, notation, uri, tags, properties)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        };
        self.conn
            .execute(
                sql,
                params![
                    &node.identifier,
                    &node.primary_label,
                    node.notation(),
                    node.uri(),
                    serde_json::to_string(&node.tags)?,
                    serde_json::to_string(&node.properties)?,
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::conflict(&node.identifier).with_source(e)
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    fn finish(&mut self, statement: &str) -> Result<()> {
        self.finished = true;
        self.conn
            .execute_batch(statement)
            .map_err(|e| StorageError::transaction(format!("{} failed: {}", statement, e)).with_source(e))
    }
}

impl GraphTransaction for SqliteTransaction<'_> {
    fn get_node(&self, identifier: &str) -> Result<Option<GraphNode>> {
        self.query_node(
            &format!("SELECT {} FROM nodes WHERE identifier = ?1", NODE_COLUMNS),
            params![identifier],
        )
    }

    fn find_by_key(&self, key: &str) -> Result<Option<GraphNode>> {
        self.query_node(
            &format!(
                "SELECT {} FROM nodes WHERE identifier = ?1 OR notation = ?1
                 ORDER BY identifier = ?1 DESC, identifier LIMIT 1",
                NODE_COLUMNS
            ),
            params![key],
        )
    }

    fn resolve_reference(&self, reference: &str) -> Result<Option<GraphNode>> {
        if let Some(node) = self.find_by_key(reference)? {
            return Ok(Some(node));
        }
        self.query_node(
            &format!(
                "SELECT {} FROM nodes WHERE uri = ?1 ORDER BY identifier LIMIT 1",
                NODE_COLUMNS
            ),
            params![reference],
        )
    }

    fn find_by_label(&self, label: &str) -> Result<Vec<GraphNode>> {
        // Labels live inside the JSON property bag.
        Ok(self
            .nodes()?
            .into_iter()
            .filter(|n| n.matches_label(label))
            .collect())
    }

    fn nodes(&self) -> Result<Vec<GraphNode>> {
        self.query_nodes(
            &format!("SELECT {} FROM nodes ORDER BY identifier", NODE_COLUMNS),
            [],
        )
    }

    fn nodes_with_key_prefix(&self, prefix: &str) -> Result<Vec<GraphNode>> {
        self.query_nodes(
            &format!(
                "SELECT {} FROM nodes
                 WHERE substr(COALESCE(notation, identifier), 1, length(?1)) = ?1
                 ORDER BY identifier",
                NODE_COLUMNS
            ),
            params![prefix],
        )
    }

    fn create_node(&mut self, node: &GraphNode) -> Result<()> {
        self.write_node(node, false)
    }

    fn put_node(&mut self, node: &GraphNode) -> Result<()> {
        self.write_node(node, true)
    }

    fn create_edge(&mut self, edge: &GraphEdge) -> Result<bool> {
        if !self.exists(&edge.from)? || !self.exists(&edge.to)? {
            return Err(StorageError::dangling_edge(
                &edge.from,
                &edge.relation,
                &edge.to,
            ));
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO edges (from_id, relation, to_id) VALUES (?1, ?2, ?3)",
            params![&edge.from, &edge.relation, &edge.to],
        )?;
        Ok(inserted > 0)
    }

    fn delete_outgoing(&mut self, from: &str, relation: &str) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM edges WHERE from_id = ?1 AND relation = ?2",
            params![from, relation],
        )?;
        Ok(deleted)
    }

    fn outgoing(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>> {
        self.query_edges(
            "SELECT from_id, relation, to_id FROM edges
             WHERE from_id = ?1 AND (?2 IS NULL OR relation = ?2)
             ORDER BY relation, to_id",
            params![identifier, relation],
        )
    }

    fn incoming(&self, identifier: &str, relation: Option<&str>) -> Result<Vec<GraphEdge>> {
        self.query_edges(
            "SELECT from_id, relation, to_id FROM edges
             WHERE to_id = ?1 AND (?2 IS NULL OR relation = ?2)
             ORDER BY from_id, relation",
            params![identifier, relation],
        )
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("transaction dropped without commit, rolling back");
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "rollback on drop failed");
        }
    }
}
