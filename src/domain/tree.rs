//! Priority-ordered tree view of the node forest
//!
//! The view is built once from a flat list of entries, then walked lazily:
//! [`TreeWalk`] is an iterator producing one [`TreeLine`] per visible node
//! in depth-first order. Walking never mutates the view, so it can be
//! restarted at any root.
//!
//! ## Ordering
//!
//! Siblings are sorted by priority group, highest first. Siblings sharing a
//! priority form a tie-group drawn under one connector:
//!
//! ```text
//! ── Home #1 [project]
//!    ── Taxes #4 [todo]
//!    ┬─ Call plumber #2 [task]
//!    └─ Buy paint #3 [task]
//! ```
//!
//! Within a tie-group siblings are ordered by ascending id.
//!
//! ## Pruning
//!
//! A node whose status is closed, deprecated or deleted is shown (dimmed)
//! but its descendants are not.

use crossterm::style::Color;
use std::collections::{HashMap, HashSet};

use super::id::NodeId;
use super::node::{Category, Node, Status};

/// The columns of a node the tree view needs
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    pub id: NodeId,
    pub title: String,
    pub category: Category,
    pub parent_id: Option<NodeId>,
    pub priority_group: i64,
    pub status: Option<Status>,
}

impl From<&Node> for TreeEntry {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            title: node.title.clone(),
            category: node.category,
            parent_id: node.parent_id,
            priority_group: node.priority_group,
            status: node.status,
        }
    }
}

/// Connector drawn in front of a node, by its place in its tie-group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// Only member of its priority group
    Sole,
    First,
    Middle,
    Last,
}

impl Glyph {
    pub fn as_str(&self) -> &'static str {
        match self {
            Glyph::Sole => "──",
            Glyph::First => "┬─",
            Glyph::Middle => "├─",
            Glyph::Last => "└─",
        }
    }

    fn for_position(index: usize, len: usize) -> Self {
        match (index, len) {
            (_, 1) => Glyph::Sole,
            (0, _) => Glyph::First,
            (i, n) if i + 1 == n => Glyph::Last,
            _ => Glyph::Middle,
        }
    }
}

/// Colour of a category in the tree view
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Project => Color::Magenta,
        Category::Recurring => Color::Cyan,
        Category::Manual => Color::Blue,
        Category::Todo => Color::Yellow,
        Category::Task => Color::Green,
        Category::Note => Color::White,
        Category::Folder => Color::DarkYellow,
    }
}

/// Colour used for nodes whose subtree is hidden
pub const DIMMED_COLOR: Color = Color::DarkGrey;

/// One rendered line of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLine {
    pub depth: usize,
    pub glyph: Glyph,
    pub id: NodeId,
    pub title: String,
    pub category: Category,
    pub status: Option<Status>,
}

impl TreeLine {
    /// True for closed, deprecated and deleted nodes
    pub fn is_dimmed(&self) -> bool {
        self.status.is_some_and(|s| s.hides_children())
    }

    pub fn color(&self) -> Color {
        if self.is_dimmed() {
            DIMMED_COLOR
        } else {
            category_color(self.category)
        }
    }

    /// Plain text of the line, without colour
    pub fn text(&self) -> String {
        let mut line = format!(
            "{}{} {} #{} [{}]",
            "   ".repeat(self.depth),
            self.glyph.as_str(),
            self.title,
            self.id,
            self.category
        );
        if let Some(status) = self.status.filter(|s| *s != Status::Open) {
            line.push_str(&format!(" ({})", status));
        }
        line
    }
}

/// Forest of entries grouped by parent, children pre-sorted
#[derive(Debug, Default)]
pub struct TreeView {
    entries: HashMap<NodeId, TreeEntry>,
    children: HashMap<Option<NodeId>, Vec<(NodeId, Glyph)>>,
}

impl TreeView {
    pub fn new(entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        let entries: HashMap<NodeId, TreeEntry> =
            entries.into_iter().map(|e| (e.id, e)).collect();

        let mut grouped: HashMap<Option<NodeId>, Vec<&TreeEntry>> = HashMap::new();
        for entry in entries.values() {
            grouped.entry(entry.parent_id).or_default().push(entry);
        }

        let children = grouped
            .into_iter()
            .map(|(parent, mut siblings)| {
                siblings.sort_by(|a, b| {
                    b.priority_group
                        .cmp(&a.priority_group)
                        .then_with(|| a.id.cmp(&b.id))
                });
                (parent, with_glyphs(&siblings))
            })
            .collect();

        Self { entries, children }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walks the subtree at `root`, or every root-level node when `None`
    ///
    /// An unknown root yields nothing.
    pub fn walk(&self, root: Option<NodeId>) -> TreeWalk<'_> {
        let stack = match root {
            Some(id) if self.contains(id) => vec![(id, 0, Glyph::Sole)],
            Some(_) => Vec::new(),
            None => self.child_frames(None, 0),
        };

        TreeWalk {
            view: self,
            stack,
            visited: HashSet::new(),
        }
    }

    /// Children of `parent` as stack frames, reversed so the first pops first
    fn child_frames(&self, parent: Option<NodeId>, depth: usize) -> Vec<(NodeId, usize, Glyph)> {
        self.children
            .get(&parent)
            .map(|kids| kids.iter().rev().map(|(id, glyph)| (*id, depth, *glyph)).collect())
            .unwrap_or_default()
    }
}

/// Assigns tie-group glyphs to siblings already sorted by priority
fn with_glyphs(sorted: &[&TreeEntry]) -> Vec<(NodeId, Glyph)> {
    let mut out = Vec::with_capacity(sorted.len());
    for group in sorted.chunk_by(|a, b| a.priority_group == b.priority_group) {
        for (index, entry) in group.iter().enumerate() {
            out.push((entry.id, Glyph::for_position(index, group.len())));
        }
    }
    out
}

/// Lazy depth-first walk over a [`TreeView`]
pub struct TreeWalk<'a> {
    view: &'a TreeView,
    stack: Vec<(NodeId, usize, Glyph)>,
    visited: HashSet<NodeId>,
}

impl Iterator for TreeWalk<'_> {
    type Item = TreeLine;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, depth, glyph) = self.stack.pop()?;

            // A parent cycle in stored data would otherwise loop forever
            if !self.visited.insert(id) {
                continue;
            }

            let entry = &self.view.entries[&id];
            let line = TreeLine {
                depth,
                glyph,
                id,
                title: entry.title.clone(),
                category: entry.category,
                status: entry.status,
            };

            if !line.is_dimmed() {
                self.stack.extend(self.view.child_frames(Some(id), depth + 1));
            }

            return Some(line);
        }
    }
}
