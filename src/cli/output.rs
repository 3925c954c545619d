//! Output formatting for CLI commands

use std::io::IsTerminal;

use crossterm::style::Stylize;
use serde::Serialize;

use crate::domain::{Node, TreeLine};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<crate::storage::OutputFormat> for OutputFormat {
    fn from(format: crate::storage::OutputFormat) -> Self {
        match format {
            crate::storage::OutputFormat::Text => OutputFormat::Text,
            crate::storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
    color: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            color: std::io::stdout().is_terminal(),
        }
    }

    /// Disables colour regardless of the terminal
    pub fn set_color(&mut self, enabled: bool) {
        self.color = self.color && enabled;
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints a warning to stderr
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Warning: {}", message),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({ "warning": message }));
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints one tree line, coloured by category when enabled
    pub fn tree_line(&self, line: &TreeLine) {
        if self.color {
            println!("{}", line.text().with(line.color()));
        } else {
            println!("{}", line.text());
        }
    }

    /// Prints a node table (text only)
    pub fn node_table(&self, nodes: &[Node]) {
        println!("{:<6} {:<10} {:<11} {:<6} TITLE", "ID", "CATEGORY", "STATUS", "PRIO");
        println!("{}", "-".repeat(60));
        for node in nodes {
            println!(
                "{:<6} {:<10} {:<11} {:<6} {}",
                node.id,
                node.category,
                node.effective_status(),
                node.priority_group,
                node.title
            );
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}
