//! vmgr - a personal knowledge and task tree
//!
//! Nodes (projects, todos, tasks, notes, ...) live in a SQLite store and
//! form a forest through parent links. Siblings are ordered by priority
//! group, the forest renders as a text tree, and the whole thing can be
//! mirrored to a directory of Markdown files for editing and read back.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Category, EditField, NewNode, Node, NodeId, SearchFilter, Status};
pub use storage::{NodeStore, StoreError, Workspace};
