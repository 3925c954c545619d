//! Editable and searchable fields
//!
//! Edits and searches arrive from the command line as `key=value` pairs.
//! They are parsed here into closed sum types so unknown keys fail at the
//! boundary instead of being ignored deeper down.

use std::str::FromStr;

use super::id::NodeId;
use super::node::{Category, ParseError, Status};

/// Splits `key=value`, trimming the key
fn split_pair(s: &str) -> Result<(String, &str), ParseError> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| ParseError::MissingValue(s.to_string()))?;
    Ok((key.trim().to_ascii_lowercase(), value))
}

/// Parses an optional parent reference: an id, or `none`/empty for roots
fn parse_parent(value: &str) -> Result<Option<NodeId>, ParseError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("null") {
        Ok(None)
    } else {
        Ok(Some(value.parse()?))
    }
}

fn parse_priority(value: &str) -> Result<i64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field: "priority",
        value: value.to_string(),
    })
}

/// A single field change applied by `update`
///
/// Category is deliberately absent: it is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditField {
    Title(String),
    Parent(Option<NodeId>),
    Status(Option<Status>),
    Priority(i64),
    Content(Option<String>),
}

impl EditField {
    pub fn name(&self) -> &'static str {
        match self {
            EditField::Title(_) => "title",
            EditField::Parent(_) => "parent",
            EditField::Status(_) => "status",
            EditField::Priority(_) => "priority",
            EditField::Content(_) => "content",
        }
    }
}

impl FromStr for EditField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = split_pair(s)?;

        match key.as_str() {
            "title" => Ok(EditField::Title(value.trim().to_string())),
            "parent" | "parent_id" => Ok(EditField::Parent(parse_parent(value)?)),
            "status" => {
                let value = value.trim();
                if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    Ok(EditField::Status(None))
                } else {
                    Ok(EditField::Status(Some(value.parse()?)))
                }
            }
            "priority" | "priority_group" => Ok(EditField::Priority(parse_priority(value)?)),
            "content" => {
                if value.is_empty() {
                    Ok(EditField::Content(None))
                } else {
                    Ok(EditField::Content(Some(value.to_string())))
                }
            }
            _ => Err(ParseError::UnknownField(key)),
        }
    }
}

/// A single search criterion; filters combine with AND
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    Category(Category),
    Status(Status),
    /// Matches nodes having at least one tag containing this text
    Tag(String),
    /// Substring of the title
    Title(String),
    /// Substring of the content
    Content(String),
    /// Direct children of a node, or roots when `None`
    Parent(Option<NodeId>),
}

impl FromStr for SearchFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = split_pair(s)?;

        match key.as_str() {
            "category" => Ok(SearchFilter::Category(value.parse()?)),
            "status" => Ok(SearchFilter::Status(value.parse()?)),
            "tag" => Ok(SearchFilter::Tag(value.trim().to_string())),
            "title" => Ok(SearchFilter::Title(value.trim().to_string())),
            "content" => Ok(SearchFilter::Content(value.to_string())),
            "parent" | "parent_id" => Ok(SearchFilter::Parent(parse_parent(value)?)),
            _ => Err(ParseError::UnknownField(key)),
        }
    }
}
