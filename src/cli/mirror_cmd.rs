//! Mirror CLI commands

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use crate::storage::{mirror, NodeStore};

pub fn push(store: &NodeStore, output: &Output, dir: &Path) -> Result<()> {
    output.verbose_ctx("push", &format!("Writing mirror to {}", dir.display()));

    let report = mirror::push(store, dir)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "dir": dir,
            "directories": report.directories,
            "files": report.files,
            "orphans": report.orphans,
            "skipped": report.skipped,
        }));
    } else {
        output.success(&format!(
            "Pushed {} nodes to {} ({} directories)",
            report.files,
            dir.display(),
            report.directories
        ));
        if report.orphans > 0 {
            output.warning(&format!(
                "{} orphaned node(s) written at the mirror root",
                report.orphans
            ));
        }
        if report.skipped > 0 {
            output.warning(&format!(
                "{} node(s) only reachable through a parent cycle were not written",
                report.skipped
            ));
        }
    }

    Ok(())
}

pub fn pull(store: &NodeStore, output: &Output, dir: &Path) -> Result<()> {
    output.verbose_ctx("pull", &format!("Reading mirror from {}", dir.display()));

    let report = mirror::pull(store, dir)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "dir": dir,
            "applied": report.applied,
            "unmanaged": report.unmanaged,
            "warnings": report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    for warning in &report.warnings {
        output.warning(&warning.to_string());
    }

    output.success(&format!("Pulled {} nodes from {}", report.applied, dir.display()));
    if report.unmanaged > 0 {
        output.verbose(&format!("Skipped {} unmanaged file(s)", report.unmanaged));
    }

    Ok(())
}
