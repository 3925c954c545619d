//! Node CLI commands

use anyhow::Result;
use serde::Serialize;

use super::output::Output;
use crate::domain::{Category, EditField, NewNode, Node, NodeId, SearchFilter, Status};
use crate::storage::{NodeStore, StoreError};

/// Arguments of `vm add`, already merged with config defaults
pub struct AddArgs {
    pub category: Category,
    pub title: String,
    pub parent: Option<NodeId>,
    pub status: Option<Status>,
    pub priority: i64,
    pub content: Option<String>,
    pub tags: Vec<String>,
}

/// A node with its tags, as printed in JSON
#[derive(Serialize)]
struct TaggedNode<'a> {
    #[serde(flatten)]
    node: &'a Node,
    tags: Vec<String>,
}

fn not_found_if_zero(rows: usize, id: NodeId) -> Result<usize> {
    if rows == 0 {
        return Err(StoreError::NotFound(id).into());
    }
    Ok(rows)
}

pub fn add(store: &NodeStore, output: &Output, args: AddArgs) -> Result<()> {
    let mut new = NewNode::new(args.category, args.title).priority(args.priority);
    new.parent_id = args.parent;
    new.status = args.status;
    new.content = args.content;
    new.tags = args.tags;

    let node = store.create(new)?;
    let tags = store.tags(node.id)?;

    if output.is_json() {
        output.data(&TaggedNode { node: &node, tags });
    } else {
        output.success(&format!("Created {} #{}: {}", node.category, node.id, node.title));
    }

    Ok(())
}

pub fn show(store: &NodeStore, output: &Output, id: NodeId) -> Result<()> {
    let node = store.require(id)?;
    let tags = store.tags(id)?;

    if output.is_json() {
        output.data(&TaggedNode { node: &node, tags });
        return Ok(());
    }

    println!("Node: #{}", node.id);
    println!("Title: {}", node.title);
    println!("Category: {}", node.category);
    println!("Status: {}", node.effective_status());
    println!("Priority: {}", node.priority_group);
    match node.parent_id {
        Some(parent) if store.exists(parent)? => println!("Parent: #{}", parent),
        Some(parent) => println!("Parent: #{} (missing)", parent),
        None => println!("Parent: none"),
    }
    if !tags.is_empty() {
        println!("Tags: {}", tags.join(", "));
    }
    println!("Created: {}", node.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", node.last_updated.format("%Y-%m-%d %H:%M"));

    if let Some(content) = &node.content {
        println!("\n{}", content);
    }

    Ok(())
}

pub fn tree(store: &NodeStore, output: &Output, root: Option<NodeId>) -> Result<()> {
    let lines = store.render_tree(root)?;

    if output.is_json() {
        let lines: Vec<_> = lines
            .iter()
            .map(|line| {
                serde_json::json!({
                    "depth": line.depth,
                    "id": line.id,
                    "title": line.title,
                    "category": line.category,
                    "status": line.status,
                    "dimmed": line.is_dimmed(),
                })
            })
            .collect();
        output.data(&lines);
        return Ok(());
    }

    if lines.is_empty() {
        println!("No nodes. Add one with 'vm add project <title>'.");
        return Ok(());
    }

    for line in &lines {
        output.tree_line(line);
    }

    Ok(())
}

pub fn edit(store: &NodeStore, output: &Output, id: NodeId, fields: &[EditField]) -> Result<()> {
    output.verbose_ctx(
        "edit",
        &format!(
            "Setting {} on {}",
            fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", "),
            id
        ),
    );

    not_found_if_zero(store.update(id, fields)?, id)?;

    if output.is_json() {
        let node = store.require(id)?;
        let tags = store.tags(id)?;
        output.data(&TaggedNode { node: &node, tags });
    } else {
        output.success(&format!("Updated #{}", id));
    }

    Ok(())
}

pub fn priority(store: &NodeStore, output: &Output, id: NodeId, delta: i64) -> Result<()> {
    let written = store.change_priority(id, delta)?;
    let node = store.require(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": node.id,
            "priority_group": node.priority_group,
            "siblings_written": written,
        }));
    } else {
        output.success(&format!("#{} is now in priority group {}", node.id, node.priority_group));
    }

    Ok(())
}

pub fn tag(store: &NodeStore, output: &Output, id: NodeId, tags: &[String]) -> Result<()> {
    if !store.exists(id)? {
        return Err(StoreError::NotFound(id).into());
    }

    let added = store.add_tags(id, tags)?;
    let all = store.tags(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "added": added,
            "tags": all,
        }));
    } else {
        output.success(&format!("Added {} tag(s) to #{}: {}", added, id, all.join(", ")));
    }

    Ok(())
}

pub fn search(store: &NodeStore, output: &Output, filters: &[SearchFilter]) -> Result<()> {
    let nodes = store.search(filters)?;

    if output.is_json() {
        output.data(&nodes);
        return Ok(());
    }

    if nodes.is_empty() {
        println!("No matching nodes.");
        return Ok(());
    }

    output.node_table(&nodes);
    Ok(())
}

pub fn delete(store: &NodeStore, output: &Output, id: NodeId, hard: bool) -> Result<()> {
    if hard {
        let children = store.list_children(Some(id))?;
        not_found_if_zero(store.hard_delete(id)?, id)?;

        if output.is_json() {
            output.data(&serde_json::json!({
                "id": id,
                "deleted": "hard",
                "orphaned": children.iter().map(|c| c.id).collect::<Vec<_>>(),
            }));
        } else {
            output.success(&format!("Removed #{}", id));
            if !children.is_empty() {
                output.warning(&format!(
                    "{} child node(s) now point at a missing parent; see 'vm orphans'",
                    children.len()
                ));
            }
        }
    } else {
        not_found_if_zero(store.soft_delete(id)?, id)?;

        if output.is_json() {
            output.data(&serde_json::json!({ "id": id, "deleted": "soft" }));
        } else {
            output.success(&format!("Marked #{} deleted", id));
        }
    }

    Ok(())
}

pub fn orphans(store: &NodeStore, output: &Output) -> Result<()> {
    let nodes = store.orphans()?;

    if output.is_json() {
        output.data(&nodes);
        return Ok(());
    }

    if nodes.is_empty() {
        println!("No orphaned nodes.");
        return Ok(());
    }

    output.node_table(&nodes);
    Ok(())
}
