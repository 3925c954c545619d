//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{mirror_cmd, node_cmd};
use crate::domain::{Category, EditField, NodeId, SearchFilter, Status};
use crate::storage::Workspace;

#[derive(Parser)]
#[command(name = "vm")]
#[command(author, version, about = "Personal knowledge and task tree with a Markdown mirror")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace directory (defaults to the closest parent with .vmgr/)
    #[arg(long, short = 'w', global = true, env = "VMGR_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create a node
    ///
    /// Examples:
    ///   vm add project "Home"
    ///   vm add task "Call plumber" --parent 1 --priority 2 --tag house
    Add {
        /// project, recurring, manual, todo, task, note or folder
        category: Category,

        /// Node title
        title: String,

        /// Parent node ID (omit for a root node)
        #[arg(long, short)]
        parent: Option<NodeId>,

        /// Initial status (defaults to open for containers, unset for tasks and notes)
        #[arg(long, short)]
        status: Option<Status>,

        /// Priority group; higher comes first among siblings
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i64>,

        /// Body text
        #[arg(long, short)]
        content: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", short)]
        tags: Vec<String>,
    },

    /// Show node details
    Show {
        /// Node ID
        id: NodeId,
    },

    /// Show the node tree, by priority
    Tree {
        /// Start from this node instead of all roots
        root: Option<NodeId>,
    },

    /// Edit node fields
    ///
    /// Fields: title, parent, status, priority, content.
    /// Use parent=none or status=none to clear.
    Edit {
        /// Node ID
        id: NodeId,

        /// key=value pairs
        #[arg(required = true, num_args = 1..)]
        fields: Vec<EditField>,
    },

    /// Move a node among its siblings by a relative amount
    Priority {
        /// Node ID
        id: NodeId,

        /// Ranks to move (positive moves earlier)
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Attach tags to a node
    Tag {
        /// Node ID
        id: NodeId,

        /// Tags to add
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
    },

    /// Find nodes matching all filters
    ///
    /// Filters: category, status, tag, title, content, parent.
    /// Example: vm search category=task tag=research
    Search {
        /// key=value filters
        filters: Vec<SearchFilter>,
    },

    /// Delete a node (marks it deleted unless --hard)
    Delete {
        /// Node ID
        id: NodeId,

        /// Remove the row; children keep pointing at the removed ID
        #[arg(long)]
        hard: bool,
    },

    /// List nodes whose parent no longer exists
    Orphans,

    /// Write the node tree to the Markdown mirror
    Push {
        /// Mirror directory (defaults to mirror_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Apply edits from the Markdown mirror back to the store
    Pull {
        /// Mirror directory (defaults to mirror_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Installs the stderr log subscriber
///
/// `RUST_LOG` wins; otherwise only errors are logged, or everything from
/// this crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "vmgr=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn open_workspace(cli_path: Option<&PathBuf>) -> Result<Workspace> {
    match cli_path {
        Some(path) => Workspace::discover(path),
        None => Workspace::open_current(),
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init { path } = &cli.command {
        let output = Output::new(cli.format.unwrap_or_default(), cli.verbose);
        output.verbose_ctx("init", &format!("Initializing workspace at: {}", path.display()));
        let workspace = Workspace::init(path)?;
        output.verbose_ctx("init", &format!("Created database at: {}", workspace.db_path().display()));
        output.success(&format!("Initialized vmgr workspace at {}", workspace.root().display()));
        return Ok(());
    }

    let workspace = open_workspace(cli.workspace.as_ref())?;
    let config = workspace.config();

    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let mut output = Output::new(format, cli.verbose);
    output.set_color(config.color());

    output.verbose_ctx("workspace", &format!("Using {}", workspace.root().display()));

    let store = workspace.store()?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Add { category, title, parent, status, priority, content, tags } => {
            let priority = priority.unwrap_or(config.workspace.default_priority);
            node_cmd::add(&store, &output, node_cmd::AddArgs {
                category,
                title,
                parent,
                status,
                priority,
                content,
                tags,
            })?
        }
        Commands::Show { id } => node_cmd::show(&store, &output, id)?,
        Commands::Tree { root } => node_cmd::tree(&store, &output, root)?,
        Commands::Edit { id, fields } => node_cmd::edit(&store, &output, id, &fields)?,
        Commands::Priority { id, delta } => node_cmd::priority(&store, &output, id, delta)?,
        Commands::Tag { id, tags } => node_cmd::tag(&store, &output, id, &tags)?,
        Commands::Search { filters } => node_cmd::search(&store, &output, &filters)?,
        Commands::Delete { id, hard } => node_cmd::delete(&store, &output, id, hard)?,
        Commands::Orphans => node_cmd::orphans(&store, &output)?,

        Commands::Push { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => workspace.mirror_dir()?,
            };
            mirror_cmd::push(&store, &output, &dir)?
        }
        Commands::Pull { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => workspace.mirror_dir()?,
            };
            mirror_cmd::pull(&store, &output, &dir)?
        }
    }

    store.close()?;
    output.verbose("Command completed successfully");
    Ok(())
}
