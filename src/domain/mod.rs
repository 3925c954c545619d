//! Domain models for vmgr
//!
//! Contains the node model and the pure algorithms over it (priority
//! renormalization, tree rendering, cycle checks) without any I/O concerns.

mod id;
mod node;
mod fields;
mod hierarchy;
pub mod priority;
pub mod tree;

pub use id::{IdError, NodeId};
pub use node::{Category, NewNode, Node, ParseError, Status};
pub use fields::{EditField, SearchFilter};
pub use hierarchy::{Hierarchy, HierarchyError};
pub use priority::{renormalize, Rank};
pub use tree::{Glyph, TreeEntry, TreeLine, TreeView, TreeWalk};
