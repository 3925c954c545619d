//! # Storage Layer
//!
//! Persistence for vmgr: the SQLite node store and the Markdown mirror.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Nodes and tags | SQLite (`nodes`, `node_tags`) | `.vmgr/vm.db` |
//! | Mirror | Markdown, sentinel + JSON header | `mirror/` (configurable) |
//! | Config | TOML | `.vmgr/config.toml` |
//!
//! ## Concurrency
//!
//! Single process, single writer. There is no file locking, and neither
//! bulk store updates nor mirror writes are atomic: an interrupted priority
//! change, push or pull can leave a partially applied result.
//!
//! ## Workspace Structure
//!
//! ```text
//! workspace/
//! ├── .vmgr/
//! │   ├── vm.db           # Node store
//! │   └── config.toml     # Workspace configuration
//! └── mirror/             # Written by `vm push`, read by `vm pull`
//! ```
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for locating a workspace
//! - [`NodeStore`] - CRUD over nodes and tags
//! - [`codec`] - Mirror file encoding
//! - [`mirror`] - Push and pull
//! - [`Config`] - Workspace and global configuration

mod config;
mod store;
mod workspace;
pub mod codec;
pub mod mirror;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, WorkspaceConfig, WORKSPACE_DIR};
pub use store::{NodeStore, StoreError, StoreResult};
pub use workspace::{Workspace, WorkspaceError};
pub use codec::CodecError;
pub use mirror::{MirrorError, PullReport, PullWarning, PushReport};
