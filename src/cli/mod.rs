//! # Command-Line Interface
//!
//! User-facing `vm` commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Workspace setup | `init` |
//! | Nodes | Create, inspect and change nodes | `add`, `show`, `edit`, `tag`, `delete` |
//! | Ordering | Sibling priority | `priority` |
//! | Query | Views over the forest | `tree`, `search`, `orphans` |
//! | Mirror | Markdown round trip | `push`, `pull` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and debug-level logs:
//! ```bash
//! vm --verbose pull
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod node_cmd;
mod mirror_cmd;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
