//! SQLite node store
//!
//! The store is the single source of truth for nodes and their tags. It
//! lives in `.vmgr/vm.db` and holds two tables:
//!
//! - `nodes`: one row per node, `parent_id` referencing another row
//! - `node_tags`: zero or more tag rows per node, removed with their node
//!
//! `parent_id` is intentionally not a foreign key: hard-deleting a parent
//! leaves its children pointing at the missing row. Such nodes are
//! reported by [`NodeStore::orphans`].
//!
//! The store is owned by the caller and passed to every operation; there is
//! no global handle. Writes are not wrapped in transactions, so bulk updates
//! (priority renormalization, mirror pull) may be partially applied if the
//! process is interrupted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::domain::{
    renormalize, Category, EditField, Hierarchy, HierarchyError, NewNode, Node, NodeId,
    ParseError, SearchFilter, Status, TreeEntry, TreeLine, TreeView,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    Invalid(#[from] ParseError),

    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Returns true for errors caused by bad input rather than storage failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::EmptyTitle | StoreError::Invalid(_) | StoreError::Hierarchy(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

const NODE_COLUMNS: &str =
    "id, title, category, parent_id, status, priority_group, content, created_at, last_updated";

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ParseError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ParseError| FromSqlError::Other(Box::new(e)))
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        parent_id: row.get(3)?,
        status: row.get(4)?,
        priority_group: row.get(5)?,
        content: row.get(6)?,
        created_at: timestamp(row, 7)?,
        last_updated: timestamp(row, 8)?,
    })
}

/// Empty bodies are stored as "no content" so the mirror round trip is exact
fn normalize_content(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.is_empty())
}

/// Persistent store of nodes and tags
pub struct NodeStore {
    /// Database file, `None` for in-memory stores
    path: Option<PathBuf>,

    conn: Connection,
}

impl NodeStore {
    /// Schema version stored in `PRAGMA user_version`
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens a throwaway in-memory store
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        // Needed for node_tags to cascade on hard delete
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let store = Self { path, conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Closes the underlying connection, reporting any error
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    /// Returns the database file path (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn ensure_schema(&self) -> StoreResult<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        if version == Self::SCHEMA_VERSION {
            return Ok(());
        }

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                category TEXT NOT NULL
                    CHECK (category IN ('project', 'recurring', 'manual', 'todo', 'task', 'note', 'folder')),
                parent_id INTEGER,
                status TEXT
                    CHECK (status IS NULL OR status IN ('open', 'closed', 'deprecated', 'deleted')),
                priority_group INTEGER NOT NULL DEFAULT 0,
                content TEXT,
                created_at TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS node_tags (
                node_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                tag TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id);
            CREATE INDEX IF NOT EXISTS idx_node_tags_node ON node_tags(node_id);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Creates a node and its tags, returning the stored row
    ///
    /// When no status is given the category's default applies.
    pub fn create(&self, new: NewNode) -> StoreResult<Node> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        if let Some(parent) = new.parent_id {
            if !self.exists(parent)? {
                return Err(StoreError::NotFound(parent));
            }
        }

        let status = new.status.or_else(|| new.category.default_status());
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO nodes (title, category, parent_id, status, priority_group, content, created_at, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                title,
                new.category,
                new.parent_id,
                status,
                new.priority_group,
                normalize_content(new.content),
                now,
            ],
        )?;

        let id = NodeId::new(self.conn.last_insert_rowid());
        tracing::debug!(%id, category = %new.category, "created node");

        if !new.tags.is_empty() {
            self.add_tags(id, &new.tags)?;
        }

        self.require(id)
    }

    /// Returns true if a node with this id exists
    pub fn exists(&self, id: NodeId) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM nodes WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Looks up a node by id
    pub fn get(&self, id: NodeId) -> StoreResult<Option<Node>> {
        let node = self
            .conn
            .query_row(
                &format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS),
                params![id],
                node_from_row,
            )
            .optional()?;
        Ok(node)
    }

    /// Looks up a node by id, failing with `NotFound` if absent
    pub fn require(&self, id: NodeId) -> StoreResult<Node> {
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Direct children of `parent` (roots when `None`), ordered by id
    pub fn list_children(&self, parent: Option<NodeId>) -> StoreResult<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM nodes WHERE parent_id IS ?1 ORDER BY id",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map(params![parent], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Every node, ordered by id
    pub fn all_nodes(&self) -> StoreResult<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM nodes ORDER BY id", NODE_COLUMNS))?;
        let nodes = stmt
            .query_map([], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Nodes whose `parent_id` points at a row that no longer exists
    pub fn orphans(&self) -> StoreResult<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM nodes n
             WHERE n.parent_id IS NOT NULL
             AND NOT EXISTS (SELECT 1 FROM nodes p WHERE p.id = n.parent_id)
             ORDER BY n.id",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map([], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Attaches tags to a node, skipping blanks and tags it already has
    ///
    /// Returns the number of tags actually added.
    pub fn add_tags(&self, id: NodeId, tags: &[String]) -> StoreResult<usize> {
        if !self.exists(id)? {
            return Err(StoreError::NotFound(id));
        }

        let mut stmt = self.conn.prepare(
            "INSERT INTO node_tags (node_id, tag)
             SELECT ?1, ?2
             WHERE NOT EXISTS (SELECT 1 FROM node_tags WHERE node_id = ?1 AND tag = ?2)",
        )?;

        let mut added = 0;
        for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            added += stmt.execute(params![id, tag])?;
        }

        Ok(added)
    }

    /// Tags of a node in insertion order
    pub fn tags(&self, id: NodeId) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM node_tags WHERE node_id = ?1 ORDER BY rowid")?;
        let tags = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    /// Tags of every node, keyed by node id
    pub fn all_tags(&self) -> StoreResult<HashMap<NodeId, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT node_id, tag FROM node_tags ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, NodeId>(0)?, row.get::<_, String>(1)?)))?;

        let mut tags: HashMap<NodeId, Vec<String>> = HashMap::new();
        for row in rows {
            let (id, tag) = row?;
            tags.entry(id).or_default().push(tag);
        }
        Ok(tags)
    }

    /// Replaces the whole tag set of a node
    pub fn replace_tags(&self, id: NodeId, tags: &[String]) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM node_tags WHERE node_id = ?1", params![id])?;

        let mut stmt = self
            .conn
            .prepare("INSERT INTO node_tags (node_id, tag) VALUES (?1, ?2)")?;
        for tag in tags {
            stmt.execute(params![id, tag])?;
        }
        Ok(())
    }

    /// Applies field edits to a node and refreshes `last_updated`
    ///
    /// Returns the number of rows updated: 0 if the node does not exist.
    /// Reparenting is checked against the current hierarchy so a node can
    /// never become its own ancestor.
    pub fn update(&self, id: NodeId, edits: &[EditField]) -> StoreResult<usize> {
        let mut columns: Vec<&str> = Vec::with_capacity(edits.len() + 1);
        let mut values: Vec<Value> = Vec::with_capacity(edits.len() + 2);

        for edit in edits {
            match edit {
                EditField::Title(title) => {
                    let title = title.trim();
                    if title.is_empty() {
                        return Err(StoreError::EmptyTitle);
                    }
                    columns.push("title");
                    values.push(Value::Text(title.to_string()));
                }
                EditField::Parent(parent) => {
                    if let Some(parent) = parent {
                        if !self.exists(*parent)? {
                            return Err(StoreError::NotFound(*parent));
                        }
                        self.hierarchy()?.check_reparent(id, *parent)?;
                    }
                    columns.push("parent_id");
                    values.push(parent.map_or(Value::Null, |p| Value::Integer(p.get())));
                }
                EditField::Status(status) => {
                    columns.push("status");
                    values.push(status.map_or(Value::Null, |s| Value::Text(s.as_str().to_string())));
                }
                EditField::Priority(priority) => {
                    columns.push("priority_group");
                    values.push(Value::Integer(*priority));
                }
                EditField::Content(content) => {
                    columns.push("content");
                    values.push(normalize_content(content.clone()).map_or(Value::Null, Value::Text));
                }
            }
        }

        columns.push("last_updated");
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Integer(id.get()));

        let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
        let sql = format!("UPDATE nodes SET {} WHERE id = ?", assignments.join(", "));

        let updated = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        tracing::debug!(%id, fields = edits.len(), updated, "updated node");
        Ok(updated)
    }

    /// Writes every column of `node` over the row with the same id
    ///
    /// This is a blind keyed overwrite (used by mirror pull), including
    /// category and timestamps. Returns 0 if no such row exists.
    pub fn overwrite(&self, node: &Node) -> StoreResult<usize> {
        let updated = self.conn.execute(
            "UPDATE nodes
             SET title = ?1, category = ?2, parent_id = ?3, status = ?4, priority_group = ?5,
                 content = ?6, created_at = ?7, last_updated = ?8
             WHERE id = ?9",
            params![
                node.title,
                node.category,
                node.parent_id,
                node.status,
                node.priority_group,
                normalize_content(node.content.clone()),
                node.created_at.to_rfc3339(),
                node.last_updated.to_rfc3339(),
                node.id,
            ],
        )?;
        Ok(updated)
    }

    /// Marks a node deleted; children stay attached
    pub fn soft_delete(&self, id: NodeId) -> StoreResult<usize> {
        self.update(id, &[EditField::Status(Some(Status::Deleted))])
    }

    /// Removes a node row and its tags
    ///
    /// Children are left in place and keep pointing at the removed id.
    pub fn hard_delete(&self, id: NodeId) -> StoreResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
        if removed > 0 {
            let orphaned: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM nodes WHERE parent_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if orphaned > 0 {
                tracing::warn!(%id, orphaned, "hard delete left children pointing at a removed parent");
            }
        }
        Ok(removed)
    }

    /// Moves a node `delta` ranks within its sibling group
    ///
    /// The whole group is re-ranked densely from zero first; see
    /// [`crate::domain::priority`]. Rows are written one at a time and a
    /// failing row is logged and skipped. Returns the number of rows written.
    pub fn change_priority(&self, id: NodeId, delta: i64) -> StoreResult<usize> {
        let node = self.require(id)?;
        let siblings: Vec<(NodeId, i64)> = self
            .list_children(node.parent_id)?
            .iter()
            .map(|s| (s.id, s.priority_group))
            .collect();

        let ranks = renormalize(&siblings, id, delta)?;
        let now = Utc::now().to_rfc3339();

        let mut written = 0;
        for rank in &ranks {
            let result = if rank.id == id {
                self.conn.execute(
                    "UPDATE nodes SET priority_group = ?1, last_updated = ?2 WHERE id = ?3",
                    params![rank.priority_group, now, rank.id],
                )
            } else {
                self.conn.execute(
                    "UPDATE nodes SET priority_group = ?1 WHERE id = ?2",
                    params![rank.priority_group, rank.id],
                )
            };

            match result {
                Ok(n) => written += n,
                Err(e) => tracing::warn!(id = %rank.id, error = %e, "failed to write priority"),
            }
        }

        tracing::debug!(%id, delta, siblings = ranks.len(), written, "renormalized priorities");
        Ok(written)
    }

    /// Nodes matching every filter, ordered by id
    pub fn search(&self, filters: &[SearchFilter]) -> StoreResult<Vec<Node>> {
        let mut clauses: Vec<&str> = Vec::with_capacity(filters.len());
        let mut values: Vec<Value> = Vec::with_capacity(filters.len());

        for filter in filters {
            match filter {
                SearchFilter::Category(category) => {
                    clauses.push("category = ?");
                    values.push(Value::Text(category.as_str().to_string()));
                }
                SearchFilter::Status(status) => {
                    clauses.push("COALESCE(status, 'open') = ?");
                    values.push(Value::Text(status.as_str().to_string()));
                }
                SearchFilter::Tag(tag) => {
                    clauses.push(
                        "EXISTS (SELECT 1 FROM node_tags t WHERE t.node_id = nodes.id AND instr(t.tag, ?) > 0)",
                    );
                    values.push(Value::Text(tag.clone()));
                }
                SearchFilter::Title(text) => {
                    clauses.push("instr(title, ?) > 0");
                    values.push(Value::Text(text.clone()));
                }
                SearchFilter::Content(text) => {
                    clauses.push("instr(COALESCE(content, ''), ?) > 0");
                    values.push(Value::Text(text.clone()));
                }
                SearchFilter::Parent(None) => clauses.push("parent_id IS NULL"),
                SearchFilter::Parent(Some(parent)) => {
                    clauses.push("parent_id = ?");
                    values.push(Value::Integer(parent.get()));
                }
            }
        }

        let mut sql = format!("SELECT {} FROM nodes", NODE_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let nodes = stmt
            .query_map(params_from_iter(values.iter()), node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Parent/child relation of every stored node
    pub fn hierarchy(&self) -> StoreResult<Hierarchy> {
        let mut stmt = self.conn.prepare("SELECT id, parent_id FROM nodes")?;
        let links = stmt
            .query_map([], |row| Ok((row.get::<_, NodeId>(0)?, row.get::<_, Option<NodeId>>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Hierarchy::from_links(links))
    }

    /// Loads the tree view columns of every node in one pass
    pub fn tree_view(&self) -> StoreResult<TreeView> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, parent_id, priority_group, status FROM nodes",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(TreeEntry {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    category: row.get(2)?,
                    parent_id: row.get(3)?,
                    priority_group: row.get(4)?,
                    status: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TreeView::new(entries))
    }

    /// Renders the subtree at `root`, or the whole forest when `None`
    pub fn render_tree(&self, root: Option<NodeId>) -> StoreResult<Vec<TreeLine>> {
        let view = self.tree_view()?;
        if let Some(root) = root {
            if !view.contains(root) {
                return Err(StoreError::NotFound(root));
            }
        }
        Ok(view.walk(root).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> NodeStore {
        NodeStore::in_memory().unwrap()
    }

    fn priorities(store: &NodeStore, ids: &[NodeId]) -> Vec<i64> {
        ids.iter()
            .map(|id| store.require(*id).unwrap().priority_group)
            .collect()
    }

    #[test]
    fn create_assigns_monotonic_ids_and_defaults() {
        let store = store();
        let a = store.create(NewNode::new(Category::Project, "Home")).unwrap();
        let b = store.create(NewNode::new(Category::Task, "Sweep").parent(a.id)).unwrap();

        assert!(b.id > a.id);
        assert_eq!(a.status, Some(Status::Open));
        assert_eq!(b.status, None);
        assert_eq!(b.parent_id, Some(a.id));
        assert_eq!(a.created_at, a.last_updated);
    }

    #[test]
    fn create_rejects_blank_title() {
        let store = store();
        let err = store.create(NewNode::new(Category::Note, "   ")).unwrap_err();
        assert!(matches!(err, StoreError::EmptyTitle));
        assert!(err.is_validation());
    }

    #[test]
    fn create_rejects_missing_parent() {
        let store = store();
        let err = store
            .create(NewNode::new(Category::Task, "Lost").parent(NodeId::new(99)))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == NodeId::new(99)));
    }

    #[test]
    fn create_stores_tags_and_normalizes_empty_content() {
        let store = store();
        let node = store
            .create(NewNode::new(Category::Note, "Idea").content("").tag("a").tag("b"))
            .unwrap();

        assert_eq!(node.content, None);
        assert_eq!(store.tags(node.id).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn add_tags_skips_duplicates_and_blanks() {
        let store = store();
        let node = store.create(NewNode::new(Category::Task, "T").tag("x")).unwrap();

        let added = store
            .add_tags(node.id, &["x".to_string(), " y ".to_string(), "".to_string()])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.tags(node.id).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn add_tags_to_missing_node_fails() {
        let store = store();
        let err = store.add_tags(NodeId::new(3), &["x".to_string()]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn list_children_distinguishes_roots() {
        let store = store();
        let a = store.create(NewNode::new(Category::Folder, "A")).unwrap();
        let b = store.create(NewNode::new(Category::Folder, "B")).unwrap();
        let c = store.create(NewNode::new(Category::Note, "C").parent(a.id)).unwrap();

        let roots: Vec<_> = store.list_children(None).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(roots, vec![a.id, b.id]);

        let kids: Vec<_> = store.list_children(Some(a.id)).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(kids, vec![c.id]);
    }

    #[test]
    fn update_changes_fields_and_touches_timestamp() {
        let store = store();
        let node = store.create(NewNode::new(Category::Todo, "Old")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = store
            .update(
                node.id,
                &[
                    EditField::Title("New".to_string()),
                    EditField::Status(Some(Status::Closed)),
                    EditField::Content(Some("body".to_string())),
                ],
            )
            .unwrap();
        assert_eq!(updated, 1);

        let after = store.require(node.id).unwrap();
        assert_eq!(after.title, "New");
        assert_eq!(after.status, Some(Status::Closed));
        assert_eq!(after.content.as_deref(), Some("body"));
        assert!(after.last_updated > node.last_updated);
        assert_eq!(after.created_at, node.created_at);
    }

    #[test]
    fn update_missing_node_reports_zero() {
        let store = store();
        let updated = store
            .update(NodeId::new(42), &[EditField::Priority(3)])
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[test]
    fn update_rejects_cycles() {
        let store = store();
        let a = store.create(NewNode::new(Category::Project, "A")).unwrap();
        let b = store.create(NewNode::new(Category::Todo, "B").parent(a.id)).unwrap();
        let c = store.create(NewNode::new(Category::Task, "C").parent(b.id)).unwrap();

        let err = store.update(a.id, &[EditField::Parent(Some(c.id))]).unwrap_err();
        assert!(matches!(err, StoreError::Hierarchy(HierarchyError::CycleDetected { .. })));

        let err = store.update(a.id, &[EditField::Parent(Some(a.id))]).unwrap_err();
        assert!(matches!(err, StoreError::Hierarchy(HierarchyError::SelfParent(_))));

        // Moving a leaf to the top is fine
        assert_eq!(store.update(c.id, &[EditField::Parent(None)]).unwrap(), 1);
        assert!(store.require(c.id).unwrap().parent_id.is_none());
    }

    #[test]
    fn soft_delete_keeps_children_attached() {
        let store = store();
        let a = store.create(NewNode::new(Category::Project, "A")).unwrap();
        let b = store.create(NewNode::new(Category::Task, "B").parent(a.id)).unwrap();

        assert_eq!(store.soft_delete(a.id).unwrap(), 1);
        assert_eq!(store.require(a.id).unwrap().status, Some(Status::Deleted));
        assert_eq!(store.require(b.id).unwrap().parent_id, Some(a.id));
    }

    #[test]
    fn hard_delete_orphans_children_and_drops_tags() {
        let store = store();
        let a = store.create(NewNode::new(Category::Project, "A").tag("keep")).unwrap();
        let b = store.create(NewNode::new(Category::Task, "B").parent(a.id)).unwrap();

        assert_eq!(store.hard_delete(a.id).unwrap(), 1);
        assert!(store.get(a.id).unwrap().is_none());
        assert!(store.all_tags().unwrap().get(&a.id).is_none());

        let child = store.require(b.id).unwrap();
        assert_eq!(child.parent_id, Some(a.id));

        let orphans: Vec<_> = store.orphans().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(orphans, vec![b.id]);

        assert_eq!(store.hard_delete(a.id).unwrap(), 0);
    }

    #[test]
    fn change_priority_matches_documented_scenario() {
        let store = store();
        let a = store.create(NewNode::new(Category::Project, "A")).unwrap();
        let b = store.create(NewNode::new(Category::Task, "B").parent(a.id).priority(5)).unwrap();
        let c = store.create(NewNode::new(Category::Task, "C").parent(a.id).priority(5)).unwrap();
        let d = store.create(NewNode::new(Category::Task, "D").parent(a.id).priority(9)).unwrap();

        let written = store.change_priority(b.id, 1).unwrap();
        assert_eq!(written, 3);
        assert_eq!(priorities(&store, &[b.id, c.id, d.id]), vec![1, 0, 1]);
        assert_eq!(store.require(a.id).unwrap().priority_group, 0);
    }

    #[test]
    fn change_priority_rejects_overflowing_delta() {
        let store = store();
        let a = store.create(NewNode::new(Category::Task, "A")).unwrap();
        let b = store.create(NewNode::new(Category::Task, "B").priority(5)).unwrap();

        let err = store.change_priority(b.id, i64::MAX).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(ParseError::InvalidNumber { .. })));
        assert!(err.is_validation());
        assert_eq!(priorities(&store, &[a.id, b.id]), vec![0, 5]);
    }

    #[test]
    fn change_priority_with_zero_delta_is_idempotent() {
        let store = store();
        let ids: Vec<_> = [3, 3, 10, -4]
            .iter()
            .enumerate()
            .map(|(i, p)| {
                store
                    .create(NewNode::new(Category::Note, format!("n{}", i)).priority(*p))
                    .unwrap()
                    .id
            })
            .collect();

        store.change_priority(ids[0], 0).unwrap();
        let first = priorities(&store, &ids);
        store.change_priority(ids[0], 0).unwrap();
        let second = priorities(&store, &ids);

        assert_eq!(first, vec![1, 1, 2, 0]);
        assert_eq!(first, second);
    }

    #[test]
    fn change_priority_on_lone_node_writes_delta() {
        let store = store();
        let a = store.create(NewNode::new(Category::Folder, "A").priority(40)).unwrap();
        store.change_priority(a.id, -2).unwrap();
        assert_eq!(store.require(a.id).unwrap().priority_group, -2);
    }

    #[test]
    fn change_priority_missing_node_fails() {
        let store = store();
        let err = store.change_priority(NodeId::new(5), 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn search_by_category_and_tag_substring() {
        let store = store();
        let hit = store
            .create(NewNode::new(Category::Task, "Read papers").tag("deep-research"))
            .unwrap();
        store
            .create(NewNode::new(Category::Note, "Research notes").tag("research"))
            .unwrap();
        store
            .create(NewNode::new(Category::Task, "Groceries").tag("errands"))
            .unwrap();

        let found = store
            .search(&[
                SearchFilter::Category(Category::Task),
                SearchFilter::Tag("research".to_string()),
            ])
            .unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![hit.id]);
    }

    #[test]
    fn search_open_status_includes_unset() {
        let store = store();
        let task = store.create(NewNode::new(Category::Task, "T")).unwrap();
        let closed = store
            .create(NewNode::new(Category::Todo, "Done list").status(Status::Closed))
            .unwrap();

        let open: Vec<_> = store
            .search(&[SearchFilter::Status(Status::Open)])
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(open, vec![task.id]);

        let closed_hits = store.search(&[SearchFilter::Status(Status::Closed)]).unwrap();
        assert_eq!(closed_hits[0].id, closed.id);
    }

    #[test]
    fn search_without_filters_returns_everything() {
        let store = store();
        store.create(NewNode::new(Category::Task, "a")).unwrap();
        store.create(NewNode::new(Category::Task, "b")).unwrap();
        assert_eq!(store.search(&[]).unwrap().len(), 2);
    }

    #[test]
    fn render_tree_prunes_closed_subtrees() {
        let store = store();
        let root = store.create(NewNode::new(Category::Project, "Root")).unwrap();
        let closed = store
            .create(NewNode::new(Category::Todo, "Finished").parent(root.id).status(Status::Closed))
            .unwrap();
        store
            .create(NewNode::new(Category::Task, "Hidden").parent(closed.id))
            .unwrap();

        let lines = store.render_tree(None).unwrap();
        let titles: Vec<_> = lines.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Root", "Finished"]);
    }

    #[test]
    fn render_tree_unknown_root_fails() {
        let store = store();
        assert!(matches!(
            store.render_tree(Some(NodeId::new(1))),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn overwrite_replaces_all_columns() {
        let store = store();
        let node = store.create(NewNode::new(Category::Folder, "F")).unwrap();

        let mut edited = node.clone();
        edited.title = "Renamed".to_string();
        edited.category = Category::Manual;
        edited.priority_group = 7;
        edited.content = Some("text".to_string());

        assert_eq!(store.overwrite(&edited).unwrap(), 1);
        assert_eq!(store.require(node.id).unwrap(), edited);

        edited.id = NodeId::new(999);
        assert_eq!(store.overwrite(&edited).unwrap(), 0);
    }

    #[test]
    fn replace_tags_swaps_the_set() {
        let store = store();
        let node = store.create(NewNode::new(Category::Note, "N").tag("old")).unwrap();
        store
            .replace_tags(node.id, &["new".to_string(), "new".to_string()])
            .unwrap();
        assert_eq!(store.tags(node.id).unwrap(), vec!["new", "new"]);
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vm.db");

        let store = NodeStore::open(&path).unwrap();
        let node = store.create(NewNode::new(Category::Project, "Persisted")).unwrap();
        store.close().unwrap();

        let store = NodeStore::open(&path).unwrap();
        assert_eq!(store.require(node.id).unwrap().title, "Persisted");
        assert_eq!(store.path(), Some(path.as_path()));
    }
}
