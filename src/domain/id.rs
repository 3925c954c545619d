//! Node identity
//!
//! Nodes are identified by a surrogate integer assigned by the store on
//! creation. IDs are monotonic and never reused (`AUTOINCREMENT`).
//!
//! On the command line an ID may be written bare (`42`) or with a leading
//! hash (`#42`), which is how the tree view prints them.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid node ID: expected a positive integer, got '{0}'")]
    InvalidNodeId(String),
}

/// Identity of a node row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Wraps a raw row id
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);

        match digits.parse::<i64>() {
            Ok(raw) if raw > 0 => Ok(Self(raw)),
            _ => Err(IdError::InvalidNodeId(s.to_string())),
        }
    }
}

impl From<i64> for NodeId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl ToSql for NodeId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for NodeId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_hashed_ids() {
        assert_eq!("42".parse::<NodeId>().unwrap(), NodeId::new(42));
        assert_eq!("#7".parse::<NodeId>().unwrap(), NodeId::new(7));
        assert_eq!(" 3 ".parse::<NodeId>().unwrap(), NodeId::new(3));
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert!("0".parse::<NodeId>().is_err());
        assert!("-4".parse::<NodeId>().is_err());
        assert!("abc".parse::<NodeId>().is_err());
        assert!("".parse::<NodeId>().is_err());
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&NodeId::new(12)).unwrap();
        assert_eq!(json, "12");

        let parsed: NodeId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, NodeId::new(12));
    }
}
