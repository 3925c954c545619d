//! Node domain model
//!
//! A node is any manageable item in the hierarchy: projects, recurring
//! chores, manuals, todo lists, tasks, notes and plain folders. The
//! category decides the structural role of a node when it is mirrored to
//! disk, the status decides whether its subtree is shown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::{IdError, NodeId};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unknown category '{0}' (expected one of: project, recurring, manual, todo, task, note, folder)")]
    UnknownCategory(String),

    #[error("Unknown status '{0}' (expected one of: open, closed, deprecated, deleted)")]
    UnknownStatus(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Expected key=value, got '{0}'")]
    MissingValue(String),

    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error(transparent)]
    Id(#[from] IdError),
}

/// Closed set of node categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Project,
    Recurring,
    Manual,
    Todo,
    Task,
    Note,
    Folder,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Project,
        Category::Recurring,
        Category::Manual,
        Category::Todo,
        Category::Task,
        Category::Note,
        Category::Folder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Project => "project",
            Category::Recurring => "recurring",
            Category::Manual => "manual",
            Category::Todo => "todo",
            Category::Task => "task",
            Category::Note => "note",
            Category::Folder => "folder",
        }
    }

    /// Returns true if this category becomes a directory in the mirror
    ///
    /// Tasks and notes are leaves: they become a single file, and any
    /// children they have are mirrored next to them.
    pub fn is_container(&self) -> bool {
        !matches!(self, Category::Task | Category::Note)
    }

    /// Status given to new nodes of this category when none is supplied
    pub fn default_status(&self) -> Option<Status> {
        if self.is_container() {
            Some(Status::Open)
        } else {
            None
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownCategory(s.to_string()))
    }
}

/// Lifecycle status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Open,
    Closed,
    Deprecated,
    Deleted,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Open, Status::Closed, Status::Deprecated, Status::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Closed => "closed",
            Status::Deprecated => "deprecated",
            Status::Deleted => "deleted",
        }
    }

    /// Returns true if the tree view stops descending at a node with this status
    pub fn hides_children(&self) -> bool {
        !matches!(self, Status::Open)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownStatus(s.to_string()))
    }
}

/// A stored node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    pub title: String,

    pub category: Category,

    /// `None` for roots
    pub parent_id: Option<NodeId>,

    /// `None` is treated as open
    pub status: Option<Status>,

    /// Higher groups come first among siblings; ties are allowed
    pub priority_group: i64,

    pub content: Option<String>,

    pub created_at: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,
}

impl Node {
    /// Effective status, with a missing status read as open
    pub fn effective_status(&self) -> Status {
        self.status.unwrap_or_default()
    }
}

/// Attribute bundle for creating a node
///
/// Everything except category and title is optional; the store fills in
/// identity, timestamps and the category's default status.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub category: Category,
    pub title: String,
    pub parent_id: Option<NodeId>,
    pub status: Option<Status>,
    pub priority_group: i64,
    pub content: Option<String>,
    pub tags: Vec<String>,
}

impl NewNode {
    pub fn new(category: Category, title: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            parent_id: None,
            status: None,
            priority_group: 0,
            content: None,
            tags: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority_group: i64) -> Self {
        self.priority_group = priority_group;
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Project".parse::<Category>().unwrap(), Category::Project);
        assert_eq!(" note ".parse::<Category>().unwrap(), Category::Note);
        assert_eq!(
            "routine".parse::<Category>(),
            Err(ParseError::UnknownCategory("routine".to_string()))
        );
    }

    #[test]
    fn only_tasks_and_notes_are_leaves() {
        let leaves: Vec<_> = Category::ALL
            .into_iter()
            .filter(|c| !c.is_container())
            .collect();
        assert_eq!(leaves, vec![Category::Task, Category::Note]);
    }

    #[test]
    fn default_status_follows_structural_role() {
        assert_eq!(Category::Todo.default_status(), Some(Status::Open));
        assert_eq!(Category::Task.default_status(), None);
    }

    #[test]
    fn only_open_shows_children() {
        assert!(!Status::Open.hides_children());
        assert!(Status::Closed.hides_children());
        assert!(Status::Deprecated.hides_children());
        assert!(Status::Deleted.hides_children());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Deprecated).unwrap(), "\"deprecated\"");
        assert_eq!(serde_json::to_string(&Category::Recurring).unwrap(), "\"recurring\"");
    }

    #[test]
    fn new_node_builder_collects_attributes() {
        let new = NewNode::new(Category::Task, "Write report")
            .parent(NodeId::new(3))
            .priority(2)
            .tag("work")
            .tag("q3");

        assert_eq!(new.parent_id, Some(NodeId::new(3)));
        assert_eq!(new.priority_group, 2);
        assert_eq!(new.tags, vec!["work", "q3"]);
        assert_eq!(new.status, None);
    }
}
