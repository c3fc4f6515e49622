//! Reference `GraphBackend` adapter: one SQLite file per tenant namespace.
//!
//! This is a development/test stand-in, not the production graph engine —
//! §1 treats the graph backend as an external collaborator and only
//! specifies its interface. Uses a `rusqlite` connection per tenant
//! (separate `Mutex<Connection>`, `PRAGMA` setup), one database file per
//! `engram_{org_slug}_{org_id}` namespace. The lexical recall fallback
//! (§4.6.2 step 3) is a case-insensitive substring match against the stored
//! `content` field rather than an FTS5 index, matching the substring-match
//! semantics the memory service's query builder actually issues.
//!
//! `query()` interprets the subset of the ASCII-arrow lingua franca this
//! workspace's own path-expression builder (and the validator-gated
//! free-form read path) ever produces: a single-node `MATCH` with an
//! optional `WHERE`/`ORDER BY`/`LIMIT`/`SKIP`, or a one-hop traversal
//! `MATCH (a:L1)-[r:T]->(b:L2)`. It is not a general Cypher engine.

use super::{CollaboratorError, GraphBackend, NamespaceHandle, Result, Row};
use async_trait::async_trait;
use dashmap::DashMap;
use engram_core::Value;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

struct TenantDb {
    conn: Mutex<Connection>,
}

/// SQLite-backed `GraphBackend`. One logical database per tenant, lazily
/// opened and migrated on first use.
pub struct SqliteGraphBackend {
    data_dir: PathBuf,
    tenants: DashMap<String, std::sync::Arc<TenantDb>>,
}

impl SqliteGraphBackend {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            tenants: DashMap::new(),
        }
    }

    fn open(&self, name: &str) -> Result<std::sync::Arc<TenantDb>> {
        if let Some(db) = self.tenants.get(name) {
            return Ok(db.clone());
        }
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| CollaboratorError::Graph(format!("create data dir: {e}")))?;
        let path = self.data_dir.join(format!("{name}.sqlite3"));
        let conn = Connection::open(&path)
            .map_err(|e| CollaboratorError::Graph(format!("open {path:?}: {e}")))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS nodes (
                 id TEXT NOT NULL,
                 label TEXT NOT NULL,
                 org_id TEXT NOT NULL,
                 vt_start INTEGER NOT NULL,
                 vt_end INTEGER NOT NULL,
                 tt_start INTEGER NOT NULL,
                 tt_end INTEGER NOT NULL,
                 props TEXT NOT NULL,
                 PRIMARY KEY (id, tt_start)
             );
             CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);
             CREATE TABLE IF NOT EXISTS edges (
                 id TEXT NOT NULL,
                 edge_type TEXT NOT NULL,
                 from_id TEXT NOT NULL,
                 to_id TEXT NOT NULL,
                 org_id TEXT NOT NULL,
                 vt_start INTEGER NOT NULL,
                 vt_end INTEGER NOT NULL,
                 tt_start INTEGER NOT NULL,
                 tt_end INTEGER NOT NULL,
                 props TEXT NOT NULL,
                 PRIMARY KEY (id, tt_start)
             );
             CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(edge_type);
             CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);",
        )
        .map_err(|e| CollaboratorError::Graph(format!("migrate {name}: {e}")))?;
        let db = std::sync::Arc::new(TenantDb {
            conn: Mutex::new(conn),
        });
        self.tenants.insert(name.to_string(), db.clone());
        Ok(db)
    }
}

fn bind_value(v: &Value) -> rusqlite::types::Value {
    match v {
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Int(i) => rusqlite::types::Value::Integer(*i),
        Value::Float(f) => rusqlite::types::Value::Real(*f),
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Timestamp(t) => rusqlite::types::Value::Integer(*t),
        Value::StringArray(items) => {
            rusqlite::types::Value::Text(serde_json::to_string(items).unwrap_or_default())
        }
    }
}

fn row_to_map(row: &rusqlite::Row, columns: &[String]) -> rusqlite::Result<Row> {
    let mut map = Row::new();
    for (i, name) in columns.iter().enumerate() {
        let value: rusqlite::types::Value = row.get(i)?;
        let json = match value {
            rusqlite::types::Value::Null => serde_json::Value::Null,
            rusqlite::types::Value::Integer(n) => serde_json::json!(n),
            rusqlite::types::Value::Real(f) => serde_json::json!(f),
            rusqlite::types::Value::Text(s) => serde_json::Value::String(s),
            rusqlite::types::Value::Blob(_) => serde_json::Value::Null,
        };
        map.insert(name.clone(), json);
    }
    Ok(map)
}

#[async_trait]
impl GraphBackend for SqliteGraphBackend {
    async fn query(
        &self,
        namespace: &NamespaceHandle,
        expression: &str,
        params: &[Value],
    ) -> Result<Vec<Row>> {
        let db = self.open(&namespace.name)?;
        let expression = expression.to_string();
        let params: Vec<rusqlite::types::Value> = params.iter().map(bind_value).collect();

        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            execute_path_expression(&conn, &expression, &params)
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn ensure_namespace(&self, name: &str) -> Result<NamespaceHandle> {
        self.open(name)?;
        Ok(NamespaceHandle {
            name: name.to_string(),
        })
    }

    async fn insert_node(&self, namespace: &NamespaceHandle, write: super::NodeWrite) -> Result<()> {
        let db = self.open(&namespace.name)?;
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            conn.execute(
                "INSERT INTO nodes (id, label, org_id, vt_start, vt_end, tt_start, tt_end, props) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    write.id,
                    write.label,
                    write.org_id,
                    write.vt_start,
                    write.vt_end,
                    write.tt_start,
                    write.tt_end,
                    serde_json::to_string(&write.fields).unwrap_or_default(),
                ],
            )
            .map_err(|e| CollaboratorError::Graph(format!("insert node: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn insert_edge(&self, namespace: &NamespaceHandle, write: super::EdgeWrite) -> Result<()> {
        let db = self.open(&namespace.name)?;
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            conn.execute(
                "INSERT INTO edges (id, edge_type, from_id, to_id, org_id, vt_start, vt_end, tt_start, tt_end, props) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    write.id,
                    write.edge_type,
                    write.from_id,
                    write.to_id,
                    write.org_id,
                    write.vt_start,
                    write.vt_end,
                    write.tt_start,
                    write.tt_end,
                    serde_json::to_string(&write.properties).unwrap_or_default(),
                ],
            )
            .map_err(|e| CollaboratorError::Graph(format!("insert edge: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn close_valid_time(
        &self,
        namespace: &NamespaceHandle,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<()> {
        let db = self.open(&namespace.name)?;
        let (label, id) = (label.to_string(), id.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            conn.execute(
                "UPDATE nodes SET vt_end = ?1 \
                 WHERE id = ?2 AND label = ?3 AND tt_end = ?4",
                rusqlite::params![at, id, label, engram_core::MAX_DATE],
            )
            .map_err(|e| CollaboratorError::Graph(format!("close valid time: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn close_transaction_time(
        &self,
        namespace: &NamespaceHandle,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<()> {
        let db = self.open(&namespace.name)?;
        let (label, id) = (label.to_string(), id.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            conn.execute(
                "UPDATE nodes SET tt_end = ?1 \
                 WHERE id = ?2 AND label = ?3 AND tt_end = ?4",
                rusqlite::params![at, id, label, engram_core::MAX_DATE],
            )
            .map_err(|e| CollaboratorError::Graph(format!("close transaction time: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn record_memory_access(
        &self,
        namespace: &NamespaceHandle,
        id: &str,
        now: i64,
    ) -> Result<()> {
        let db = self.open(&namespace.name)?;
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            conn.execute(
                "UPDATE nodes SET props = json_set( \
                     json_set(props, '$.last_accessed', ?1), \
                     '$.access_count', COALESCE(json_extract(props, '$.access_count'), 0) + 1 \
                 ) WHERE id = ?2 AND label = 'Memory' AND tt_end = ?3",
                rusqlite::params![now, id, engram_core::MAX_DATE],
            )
            .map_err(|e| CollaboratorError::Graph(format!("record memory access: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn read_decay(
        &self,
        namespace: &NamespaceHandle,
        ids: &[String],
    ) -> Result<std::collections::BTreeMap<String, (f64, bool)>> {
        if ids.is_empty() {
            return Ok(std::collections::BTreeMap::new());
        }
        let db = self.open(&namespace.name)?;
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || {
            let conn = db.conn.lock().expect("tenant connection mutex poisoned");
            let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "SELECT id, json_extract(props, '$.decay_score'), json_extract(props, '$.pinned') \
                 FROM nodes WHERE label = 'Memory' AND tt_end = {} AND id IN ({placeholders})",
                engram_core::MAX_DATE
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| CollaboratorError::Graph(format!("prepare: {e}")))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                    let id: String = row.get(0)?;
                    let decay: Option<f64> = row.get(1)?;
                    let pinned: Option<i64> = row.get(2)?;
                    Ok((id, decay.unwrap_or(1.0), pinned.unwrap_or(0) != 0))
                })
                .map_err(|e| CollaboratorError::Graph(format!("query_map: {e}")))?;
            let mut out = std::collections::BTreeMap::new();
            for row in rows {
                let (id, decay, pinned) =
                    row.map_err(|e| CollaboratorError::Graph(format!("row: {e}")))?;
                out.insert(id, (decay, pinned));
            }
            Ok(out)
        })
        .await
        .map_err(|e| CollaboratorError::Graph(format!("blocking task panicked: {e}")))?
    }

    async fn find_replacement(
        &self,
        namespace: &NamespaceHandle,
        old_id: &str,
    ) -> Result<Option<String>> {
        use engram_core::query::{Direction, HopRange, TB};

        // §4.6.2 step 6: "traverse (new:Memory) -[:REPLACES]-> (old:Memory)".
        let built = TB::from("Memory")
            .via(vec!["REPLACES".to_string()], Direction::Outgoing, HopRange::default())
            .to(Some("Memory".to_string()))
            .where_to("id", old_id.to_string())
            .returning(vec!["a".to_string()]);
        let rendered = built.render();
        let rows = self.query(namespace, &rendered, built.params.values()).await?;
        Ok(rows.into_iter().next().and_then(|row| {
            row.get("id").and_then(|v| v.as_str()).map(str::to_string)
        }))
    }
}

/// Translates a rendered node-query or one-hop-traversal expression into
/// SQL against the `nodes`/`edges` tables. See module docs for the scope
/// of what this reference adapter understands.
fn execute_path_expression(
    conn: &Connection,
    expression: &str,
    params: &[rusqlite::types::Value],
) -> Result<Vec<Row>> {
    if expression.contains("]-") || expression.contains("]->") || expression.contains("]<-") {
        execute_traversal(conn, expression, params)
    } else {
        execute_node_match(conn, expression, params)
    }
}

fn execute_node_match(
    conn: &Connection,
    expression: &str,
    params: &[rusqlite::types::Value],
) -> Result<Vec<Row>> {
    let label = extract_label(expression, '(')
        .ok_or_else(|| CollaboratorError::Graph("no node pattern found".to_string()))?;
    let returns_count = expression.contains("count(");
    let returns_exists = expression.contains("AS exists");

    let mut sql = String::from("SELECT id, label, org_id, vt_start, vt_end, tt_start, tt_end, props FROM nodes WHERE label = ?1");
    let mut bound: Vec<rusqlite::types::Value> = vec![rusqlite::types::Value::Text(label)];

    if let Some(where_clause) = extract_where(expression) {
        let (sql_fragment, mut extra) = translate_predicates(&where_clause, "n", params, bound.len());
        if !sql_fragment.is_empty() {
            sql.push_str(" AND (");
            sql.push_str(&sql_fragment);
            sql.push(')');
        }
        bound.append(&mut extra);
    }

    if let Some((field, order)) = extract_order_by(expression) {
        sql.push_str(&format!(" ORDER BY json_extract(props, '$.{field}') {order}"));
    }
    if let Some(limit) = extract_limit(expression) {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = extract_skip(expression) {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| CollaboratorError::Graph(format!("prepare: {e} ({sql})")))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(bound.iter()), |row| {
            row_to_map(row, &columns)
        })
        .map_err(|e| CollaboratorError::Graph(format!("query_map: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| CollaboratorError::Graph(format!("row: {e}")))?);
    }

    if returns_count {
        let count = out.len();
        return Ok(vec![Row::from_iter([(
            "count".to_string(),
            serde_json::json!(count),
        )])]);
    }
    if returns_exists {
        let exists = !out.is_empty();
        return Ok(vec![Row::from_iter([(
            "exists".to_string(),
            serde_json::json!(exists),
        )])]);
    }
    Ok(out)
}

fn execute_traversal(
    conn: &Connection,
    expression: &str,
    params: &[rusqlite::types::Value],
) -> Result<Vec<Row>> {
    let edge_type = expression
        .split('[')
        .nth(1)
        .and_then(|s| s.split(':').nth(1))
        .and_then(|s| s.split(|c| c == ']' || c == '*').next())
        .map(|s| s.split('|').next().unwrap_or(s).trim().to_string())
        .ok_or_else(|| CollaboratorError::Graph("no edge pattern found".to_string()))?;

    let from_label = extract_label(expression, '(');
    let to_label = {
        let parts: Vec<&str> = expression.split('(').collect();
        parts.last().and_then(|p| extract_label_from_fragment(p))
    };

    // `<-[` marks an incoming traversal (pattern `(a)<-[r]-(b)`, i.e. an edge
    // b -> a); everything else — outgoing `)-[r]->` and the undirected `any`
    // form this adapter doesn't distinguish from outgoing — means `b` is the
    // edge's `to_id` and `a` is its `from_id`.
    let incoming = expression.contains("<-[");
    let b_join_column = if incoming { "from_id" } else { "to_id" };
    let a_join_column = if incoming { "to_id" } else { "from_id" };

    // `RETURN a` alone projects the from-node instead of the default to-node
    // — the shape `find_replacement` uses to walk a `REPLACES` edge back to
    // its source. Any other `RETURN` list (the default `a, b`, or `b` alone)
    // keeps returning the to-node; from-node predicates beyond the label
    // baked into the MATCH pattern still aren't applied in that case.
    let returns_from_node_only = extract_return_aliases(expression) == ["a"];

    let mut sql = if returns_from_node_only {
        format!(
            "SELECT a.id, a.label, a.org_id, a.vt_start, a.vt_end, a.tt_start, a.tt_end, a.props \
             FROM edges r JOIN nodes a ON a.id = r.{a_join_column} \
             JOIN nodes b ON b.id = r.{b_join_column} WHERE r.edge_type = ?1",
        )
    } else {
        format!(
            "SELECT b.id, b.label, b.org_id, b.vt_start, b.vt_end, b.tt_start, b.tt_end, b.props \
             FROM edges r JOIN nodes b ON b.id = r.{b_join_column} WHERE r.edge_type = ?1",
        )
    };
    let mut bound: Vec<rusqlite::types::Value> = vec![rusqlite::types::Value::Text(edge_type)];
    if returns_from_node_only {
        if let Some(label) = from_label {
            sql.push_str(&format!(" AND a.label = ?{}", bound.len() + 1));
            bound.push(rusqlite::types::Value::Text(label));
        }
    }
    if let Some(label) = to_label {
        sql.push_str(&format!(" AND b.label = ?{}", bound.len() + 1));
        bound.push(rusqlite::types::Value::Text(label));
    }

    if let Some(where_clause) = extract_where(expression) {
        let (sql_fragment, mut extra) = translate_predicates(&where_clause, "b", params, bound.len());
        if !sql_fragment.is_empty() {
            sql.push_str(" AND (");
            sql.push_str(&sql_fragment);
            sql.push(')');
        }
        bound.append(&mut extra);
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| CollaboratorError::Graph(format!("prepare: {e} ({sql})")))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(bound.iter()), |row| {
            row_to_map(row, &columns)
        })
        .map_err(|e| CollaboratorError::Graph(format!("query_map: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| CollaboratorError::Graph(format!("row: {e}")))?);
    }
    Ok(out)
}

/// The alias list named by a traversal expression's trailing `RETURN`
/// clause, e.g. `["a"]` for `RETURN a` or `["a", "b"]` for `RETURN a, b`.
fn extract_return_aliases(expression: &str) -> Vec<String> {
    let Some(start) = expression.find(" RETURN ") else {
        return Vec::new();
    };
    let rest = expression[start + 8..].trim();
    let rest = rest.strip_prefix("DISTINCT ").unwrap_or(rest);
    rest.split(',').map(|s| s.trim().to_string()).collect()
}

fn extract_label(expression: &str, _open: char) -> Option<String> {
    let start = expression.find('(')? + 1;
    let fragment = &expression[start..];
    extract_label_from_fragment(fragment)
}

fn extract_label_from_fragment(fragment: &str) -> Option<String> {
    let colon = fragment.find(':')?;
    let rest = &fragment[colon + 1..];
    let end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
    Some(rest[..end].to_string())
}

fn extract_where(expression: &str) -> Option<String> {
    let start = expression.find(" WHERE ")? + 7;
    let rest = &expression[start..];
    let end = [" RETURN ", " ORDER BY ", " LIMIT ", " SKIP "]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

fn extract_order_by(expression: &str) -> Option<(String, &'static str)> {
    let start = expression.find(" ORDER BY ")? + 10;
    let rest = &expression[start..];
    let end = [" LIMIT ", " SKIP "]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    let clause = rest[..end].trim();
    let desc = clause.ends_with("DESC");
    let field_part = clause.split('.').nth(1)?;
    let field = field_part.split_whitespace().next()?.to_string();
    Some((field, if desc { "DESC" } else { "ASC" }))
}

fn extract_limit(expression: &str) -> Option<u64> {
    let start = expression.find(" LIMIT ")? + 7;
    let rest = &expression[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}

fn extract_skip(expression: &str) -> Option<u64> {
    let start = expression.find(" SKIP ")? + 6;
    let rest = &expression[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}

/// Translates `alias.field OP $pN` clauses joined by `AND` into a SQLite
/// boolean expression over `json_extract(props, ...)`, falling back to the
/// literal bitemporal columns for the four reserved field names.
///
/// `start_index` is how many `?N` placeholders the caller has already bound
/// ahead of this fragment (e.g. a `label = ?1` the caller prepended) — SQLite
/// numbered parameters are a single global namespace, so this fragment's own
/// placeholders must continue numbering from `start_index + 1`, not restart
/// at `?1` and collide with the caller's earlier binding.
fn translate_predicates(
    clause: &str,
    alias: &str,
    params: &[rusqlite::types::Value],
    start_index: usize,
) -> (String, Vec<rusqlite::types::Value>) {
    let mut sql_parts = Vec::new();
    let mut bound: Vec<rusqlite::types::Value> = Vec::new();
    for part in clause.split(" AND ") {
        let part = part.trim();
        let Some((lhs, op, rhs)) = split_predicate(part) else {
            continue;
        };
        let Some(field) = lhs.strip_prefix(&format!("{alias}.")) else {
            continue;
        };
        let column = if matches!(field, "vt_start" | "vt_end" | "tt_start" | "tt_end" | "id" | "org_id") {
            field.to_string()
        } else {
            format!("json_extract(props, '$.{field}')")
        };
        if op == "CONTAINS" {
            if let Some(idx) = rhs.strip_prefix("$p").and_then(|s| s.parse::<usize>().ok()) {
                let needle = match params.get(idx) {
                    Some(rusqlite::types::Value::Text(s)) => s.to_lowercase(),
                    _ => String::new(),
                };
                bound.push(rusqlite::types::Value::Text(format!("%{needle}%")));
                sql_parts.push(format!("LOWER({column}) LIKE ?{}", start_index + bound.len()));
            }
            continue;
        }
        if let Some(idx) = rhs.strip_prefix("$p").and_then(|s| s.parse::<usize>().ok()) {
            bound.push(params.get(idx).cloned().unwrap_or(rusqlite::types::Value::Null));
            sql_parts.push(format!("{column} {op} ?{}", start_index + bound.len()));
        } else if rhs == "MAX_DATE" {
            // A literal bound, not a parameter — no placeholder to number.
            sql_parts.push(format!("{column} {op} {}", engram_core::MAX_DATE));
        }
    }
    (sql_parts.join(" AND "), bound)
}

fn split_predicate(part: &str) -> Option<(&str, &str, &str)> {
    for op in ["<=", ">=", "<>", "=", "<", ">", "CONTAINS"] {
        if let Some(idx) = part.find(op) {
            let lhs = part[..idx].trim();
            let rhs = part[idx + op.len()..].trim();
            return Some((lhs, op, rhs));
        }
    }
    None
}
