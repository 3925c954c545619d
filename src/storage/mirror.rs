//! Directory mirror of the node forest
//!
//! Push writes the whole forest to a directory tree for editing with any
//! text editor; pull reads edited files back into the store.
//!
//! ## Layout
//!
//! ```text
//! mirror/
//! ├── 1_project_Home/
//! │   ├── _description.md        # the project node itself
//! │   ├── 2_task_Call plumber.md
//! │   ├── 5_note_Quote.md        # child of task 2, next to its parent
//! │   └── 3_todo_Garden/
//! │       └── _description.md
//! └── 4_folder_Archive/
//!     └── _description.md
//! ```
//!
//! Container categories become a directory `{id}_{category}_{title}`
//! holding `_description.md`. Tasks and notes become a single file
//! `{id}_{category}_{title}.md`, and their children are written into the
//! same directory rather than a new one.
//!
//! Neither direction is transactional. Push overwrites managed entries
//! unconditionally, so edits not yet pulled are lost. Pull is a blind
//! overwrite keyed by id: it never creates or deletes nodes.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::codec::{self, CodecError};
use super::store::{NodeStore, StoreError};
use crate::domain::{Category, Node, NodeId};

/// File holding a container node's own content inside its directory
pub const DESCRIPTION_FILE: &str = "_description.md";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

fn io_error<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> MirrorError + 'a {
    move |source| MirrorError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

/// Longest title part of an entry name, in bytes
///
/// Leaves room for the `{id}_{category}_` prefix and `.md` within the
/// usual 255-byte file name limit.
const MAX_TITLE_BYTES: usize = 200;

/// Cuts `text` to at most `max` bytes on a char boundary
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Makes a title safe to use as a single path component
///
/// Long titles are truncated; the id prefix of the entry name keeps names
/// unique.
pub fn sanitize_component(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.').trim();
    let cleaned = truncate_bytes(cleaned, MAX_TITLE_BYTES).trim_end();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Directory or file stem for a node: `{id}_{category}_{title}`
pub fn entry_name(node: &Node) -> String {
    format!("{}_{}_{}", node.id, node.category, sanitize_component(&node.title))
}

/// Returns true if a directory entry name was produced by [`entry_name`]
fn is_managed_entry(name: &str) -> bool {
    let Some((id, rest)) = name.split_once('_') else {
        return false;
    };
    let Some((category, _)) = rest.split_once('_') else {
        return false;
    };
    id.parse::<NodeId>().is_ok() && category.parse::<Category>().is_ok()
}

/// Counts from a push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub directories: usize,
    pub files: usize,
    /// Nodes with a dangling parent, written at the mirror root
    pub orphans: usize,
    /// Nodes only reachable through a parent cycle, not written
    pub skipped: usize,
}

/// Rebuilds the mirror at `root` from the store
///
/// Managed entries already under `root` are removed first; anything else
/// in the directory is left alone.
pub fn push(store: &NodeStore, root: &Path) -> Result<PushReport, MirrorError> {
    let nodes = store.all_nodes()?;
    let tags = store.all_tags()?;

    fs::create_dir_all(root).map_err(io_error("create directory", root))?;
    clear_managed(root)?;

    let known: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    let mut children: HashMap<Option<NodeId>, Vec<&Node>> = HashMap::new();
    let mut orphans = 0;
    for node in &nodes {
        // Dangling parents are treated as roots so nothing drops out of the mirror
        let parent = node.parent_id.filter(|p| known.contains(p));
        if node.parent_id.is_some() && parent.is_none() {
            orphans += 1;
        }
        children.entry(parent).or_default().push(node);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| {
            b.priority_group
                .cmp(&a.priority_group)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let mut pusher = Pusher {
        children,
        tags: &tags,
        visited: HashSet::new(),
        report: PushReport {
            orphans,
            ..PushReport::default()
        },
    };
    pusher.write_children(None, root)?;

    pusher.report.skipped = nodes.len() - pusher.visited.len();
    if pusher.report.skipped > 0 {
        tracing::warn!(
            skipped = pusher.report.skipped,
            "some nodes are only reachable through a parent cycle and were not pushed"
        );
    }

    tracing::debug!(
        root = %root.display(),
        directories = pusher.report.directories,
        files = pusher.report.files,
        "pushed mirror"
    );
    Ok(pusher.report)
}

/// Removes entries under `root` whose names look like [`entry_name`] output
fn clear_managed(root: &Path) -> Result<(), MirrorError> {
    for entry in fs::read_dir(root).map_err(io_error("read directory", root))? {
        let entry = entry.map_err(io_error("read directory", root))?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_managed_entry) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(io_error("remove", &path))?;
        } else {
            fs::remove_file(&path).map_err(io_error("remove", &path))?;
        }
    }
    Ok(())
}

struct Pusher<'a> {
    children: HashMap<Option<NodeId>, Vec<&'a Node>>,
    tags: &'a HashMap<NodeId, Vec<String>>,
    visited: HashSet<NodeId>,
    report: PushReport,
}

impl Pusher<'_> {
    fn write_children(&mut self, parent: Option<NodeId>, dir: &Path) -> Result<(), MirrorError> {
        let kids = self.children.get(&parent).cloned().unwrap_or_default();
        for node in kids {
            self.write_node(node, dir)?;
        }
        Ok(())
    }

    fn write_node(&mut self, node: &Node, dir: &Path) -> Result<(), MirrorError> {
        if !self.visited.insert(node.id) {
            tracing::warn!(id = %node.id, "parent cycle detected, not descending again");
            return Ok(());
        }

        let tags = self.tags.get(&node.id).map(Vec::as_slice).unwrap_or(&[]);
        let text = codec::encode(node, tags)?;
        let name = entry_name(node);

        if node.category.is_container() {
            let own_dir = dir.join(&name);
            fs::create_dir_all(&own_dir).map_err(io_error("create directory", &own_dir))?;
            let path = own_dir.join(DESCRIPTION_FILE);
            fs::write(&path, text).map_err(io_error("write", &path))?;
            self.report.directories += 1;
            self.report.files += 1;
            self.write_children(Some(node.id), &own_dir)
        } else {
            let path = dir.join(format!("{}.md", name));
            fs::write(&path, text).map_err(io_error("write", &path))?;
            self.report.files += 1;
            self.write_children(Some(node.id), dir)
        }
    }
}

/// A per-file problem during pull; the rest of the pull still proceeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullWarning {
    /// The file or a directory could not be read
    Read { path: PathBuf, message: String },
    /// The file is managed but its header could not be parsed
    Decode { path: PathBuf, message: String },
    /// The file names an id that is not in the store; its edits are dropped
    MissingNode { path: PathBuf, id: NodeId },
    /// The store rejected the write
    Write { path: PathBuf, id: NodeId, message: String },
    /// The pulled parent links form a cycle
    Cycle,
}

impl fmt::Display for PullWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullWarning::Read { path, message } => {
                write!(f, "{}: could not read: {}", path.display(), message)
            }
            PullWarning::Decode { path, message } => {
                write!(f, "{}: could not decode: {}", path.display(), message)
            }
            PullWarning::MissingNode { path, id } => {
                write!(f, "{}: node {} does not exist, edits ignored", path.display(), id)
            }
            PullWarning::Write { path, id, message } => {
                write!(f, "{}: failed to update node {}: {}", path.display(), id, message)
            }
            PullWarning::Cycle => write!(f, "parent links now contain a cycle"),
        }
    }
}

/// Outcome of a pull
#[derive(Debug, Default)]
pub struct PullReport {
    /// Files whose node was updated
    pub applied: usize,
    /// Markdown files without the sentinel, skipped silently
    pub unmanaged: usize,
    pub warnings: Vec<PullWarning>,
}

impl PullReport {
    fn warn(&mut self, warning: PullWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Applies every managed file under `root` back to the store
///
/// Fails only if `root` itself cannot be read; per-file problems are
/// collected in the report.
pub fn pull(store: &NodeStore, root: &Path) -> Result<PullReport, MirrorError> {
    let mut report = PullReport::default();

    let mut files = Vec::new();
    let entries = fs::read_dir(root).map_err(io_error("read directory", root))?;
    collect_markdown(entries, root, &mut files, &mut report);
    files.sort();

    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                report.warn(PullWarning::Read { path, message: e.to_string() });
                continue;
            }
        };

        if !codec::is_managed(&text) {
            tracing::debug!(path = %path.display(), "skipping unmanaged file");
            report.unmanaged += 1;
            continue;
        }

        let (node, tags) = match codec::decode(&text) {
            Ok(decoded) => decoded,
            Err(e) => {
                report.warn(PullWarning::Decode { path, message: e.to_string() });
                continue;
            }
        };

        let id = node.id;
        let result = store
            .overwrite(&node)
            .and_then(|updated| match updated {
                0 => Ok(false),
                _ => store.replace_tags(id, &tags).map(|_| true),
            });

        match result {
            Ok(true) => report.applied += 1,
            Ok(false) => report.warn(PullWarning::MissingNode { path, id }),
            Err(e) => report.warn(PullWarning::Write { path, id, message: e.to_string() }),
        }
    }

    if store.hierarchy()?.has_cycle() {
        report.warn(PullWarning::Cycle);
    }

    tracing::debug!(
        root = %root.display(),
        applied = report.applied,
        warnings = report.warnings.len(),
        "pulled mirror"
    );
    Ok(report)
}

fn collect_markdown(
    entries: fs::ReadDir,
    dir: &Path,
    files: &mut Vec<PathBuf>,
    report: &mut PullReport,
) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.warn(PullWarning::Read { path: dir.to_path_buf(), message: e.to_string() });
                continue;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                report.warn(PullWarning::Read { path, message: e.to_string() });
                continue;
            }
        };

        // Links are not followed into directories, so a link loop cannot recurse
        if file_type.is_dir() {
            match fs::read_dir(&path) {
                Ok(nested) => collect_markdown(nested, &path, files, report),
                Err(e) => report.warn(PullWarning::Read { path, message: e.to_string() }),
            }
        } else if path.extension().is_some_and(|e| e == "md") && !path.is_dir() {
            files.push(path);
        }
    }
}
