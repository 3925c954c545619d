//! Workspace management
//!
//! A workspace is a directory containing `.vmgr/`, which holds the node
//! database and configuration. This module handles initialization and
//! hands out the store and mirror location.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::WORKSPACE_DIR;
use super::{Config, NodeStore};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in a vmgr workspace. Run 'vm init' first.")]
    NotInWorkspace,
}

const DEFAULT_CONFIG: &str = r#"# vmgr configuration

# Where `vm push` writes and `vm pull` reads the Markdown mirror.
# Relative paths are resolved against the workspace root.
mirror_dir = "mirror"

# Priority group for new nodes when --priority is not given
default_priority = 0

# Uncomment to override the global colour setting for the tree view
# color = false
"#;

/// A vmgr workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at `start` or the closest parent that has one
    pub fn discover(start: &Path) -> Result<Self> {
        let root = Config::find_workspace_root(start).ok_or(WorkspaceError::NotInWorkspace)?;
        Self::open(root)
    }

    /// Opens the workspace containing the current directory
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::discover(&cwd)
    }

    /// Initializes a workspace at the given path (idempotent)
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let vmgr_dir = root.join(WORKSPACE_DIR);

        fs::create_dir_all(&vmgr_dir).with_context(|| {
            format!("Failed to create {} directory: {}", WORKSPACE_DIR, vmgr_dir.display())
        })?;

        let config_path = vmgr_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let workspace = Self::open(root)?;

        // Creates the schema
        workspace.store()?.close()?;

        Ok(workspace)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .vmgr directory path
    pub fn vmgr_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Returns the database path
    pub fn db_path(&self) -> PathBuf {
        self.vmgr_dir().join("vm.db")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the node store
    pub fn store(&self) -> Result<NodeStore> {
        let path = self.db_path();
        NodeStore::open(&path)
            .with_context(|| format!("Failed to open node store: {}", path.display()))
    }

    /// Returns the configured mirror directory
    pub fn mirror_dir(&self) -> Result<PathBuf> {
        self.config.mirror_dir()
    }
}
