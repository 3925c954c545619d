//! Mirror file format
//!
//! Every node mirrored to disk is one Markdown file laid out as:
//!
//! ```text
//! --vmgr
//! {
//!   "id": 3,
//!   "title": "Call plumber",
//!   ...
//!   "tags": ["house"]
//! }
//!
//! free text content, verbatim
//! ```
//!
//! The sentinel line marks the file as managed. The JSON header carries
//! every node column except the content, plus the tag list. One blank line
//! separates header and content. Pretty-printed JSON never contains a blank
//! line, so the first `\n\n` after the sentinel is always the boundary and
//! content may contain anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Category, Node, NodeId, Status};

/// First line of every managed file
pub const SENTINEL: &str = "--vmgr";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not a managed file (missing '--vmgr' line)")]
    NotManaged,

    #[error("Missing blank line between header and content")]
    MissingSeparator,

    #[error("Malformed header: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// JSON header of a mirror file
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    id: NodeId,
    title: String,
    category: Category,
    parent_id: Option<NodeId>,
    status: Option<Status>,
    priority_group: i64,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    tags: Vec<String>,
}

impl Header {
    fn new(node: &Node, tags: &[String]) -> Self {
        Self {
            id: node.id,
            title: node.title.clone(),
            category: node.category,
            parent_id: node.parent_id,
            status: node.status,
            priority_group: node.priority_group,
            created_at: node.created_at,
            last_updated: node.last_updated,
            tags: tags.to_vec(),
        }
    }

    fn into_node(self, content: &str) -> (Node, Vec<String>) {
        let node = Node {
            id: self.id,
            title: self.title,
            category: self.category,
            parent_id: self.parent_id,
            status: self.status,
            priority_group: self.priority_group,
            content: (!content.is_empty()).then(|| content.to_string()),
            created_at: self.created_at,
            last_updated: self.last_updated,
        };
        (node, self.tags)
    }
}

/// Serializes a node and its tags to mirror file text
pub fn encode(node: &Node, tags: &[String]) -> Result<String, CodecError> {
    let header = serde_json::to_string_pretty(&Header::new(node, tags))?;
    let content = node.content.as_deref().unwrap_or("");

    let mut out = String::with_capacity(SENTINEL.len() + header.len() + content.len() + 3);
    out.push_str(SENTINEL);
    out.push('\n');
    out.push_str(&header);
    out.push_str("\n\n");
    out.push_str(content);
    Ok(out)
}

/// Parses mirror file text back into a node and its tags
///
/// Empty content decodes as `None`.
pub fn decode(text: &str) -> Result<(Node, Vec<String>), CodecError> {
    let rest = text
        .strip_prefix(SENTINEL)
        .and_then(|r| r.strip_prefix('\n'))
        .ok_or(CodecError::NotManaged)?;

    let (header, content) = rest
        .split_once("\n\n")
        .ok_or(CodecError::MissingSeparator)?;

    let header: Header = serde_json::from_str(header)?;
    Ok(header.into_node(content))
}

/// Returns true if `text` starts with the managed-file sentinel
pub fn is_managed(text: &str) -> bool {
    text.strip_prefix(SENTINEL)
        .is_some_and(|r| r.starts_with('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn sample() -> Node {
        Node {
            id: NodeId::new(3),
            title: "Call plumber".to_string(),
            category: Category::Task,
            parent_id: Some(NodeId::new(1)),
            status: None,
            priority_group: 2,
            content: Some("Kitchen sink.\n\nAsk about the boiler.".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            last_updated: Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 5).unwrap(),
        }
    }

    #[test]
    fn encoded_layout() {
        let text = encode(&sample(), &["house".to_string()]).unwrap();

        assert!(text.starts_with("--vmgr\n{\n"));
        assert!(text.ends_with("}\n\nKitchen sink.\n\nAsk about the boiler."));
        assert!(text.contains("\"tags\": [\n    \"house\"\n  ]"));
        assert!(!text.contains("\"content\""));
    }

    #[test]
    fn header_fields_in_column_order() {
        let text = encode(&sample(), &[]).unwrap();
        let keys = [
            "\"id\"", "\"title\"", "\"category\"", "\"parent_id\"", "\"status\"",
            "\"priority_group\"", "\"created_at\"", "\"last_updated\"", "\"tags\"",
        ];
        let positions: Vec<_> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn decode_inverts_encode() {
        let node = sample();
        let tags = vec!["house".to_string(), "urgent".to_string()];
        let (decoded, decoded_tags) = decode(&encode(&node, &tags).unwrap()).unwrap();

        assert_eq!(decoded, node);
        assert_eq!(decoded_tags, tags);
    }

    #[test]
    fn missing_content_roundtrips_as_none() {
        let mut node = sample();
        node.content = None;
        let text = encode(&node, &[]).unwrap();
        assert!(text.ends_with("}\n\n"));

        let (decoded, _) = decode(&text).unwrap();
        assert_eq!(decoded.content, None);
    }

    #[test]
    fn content_containing_sentinel_survives() {
        let mut node = sample();
        node.content = Some("--vmgr\n\nnot a header\n".to_string());
        let (decoded, _) = decode(&encode(&node, &[]).unwrap()).unwrap();
        assert_eq!(decoded.content, node.content);
    }

    #[test]
    fn unmanaged_text_is_rejected() {
        assert!(matches!(decode("# Just notes\n\nhello"), Err(CodecError::NotManaged)));
        assert!(matches!(decode("--vmgrx\n{}\n\n"), Err(CodecError::NotManaged)));
        assert!(!is_managed("--vmgr"));
        assert!(is_managed("--vmgr\n{}"));
    }

    #[test]
    fn malformed_header_is_a_decode_error() {
        assert!(matches!(decode("--vmgr\n{\"id\": 1}\n\n"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode("--vmgr\n{\"id\": 1}"), Err(CodecError::MissingSeparator)));
    }

    #[test]
    fn missing_tags_key_defaults_to_empty() {
        let text = "--vmgr\n{\"id\": 9, \"title\": \"t\", \"category\": \"note\", \"parent_id\": null, \
                    \"status\": \"open\", \"priority_group\": 0, \
                    \"created_at\": \"2024-01-01T00:00:00Z\", \"last_updated\": \"2024-01-01T00:00:00Z\"}\n\nbody";
        let (node, tags) = decode(text).unwrap();
        assert_eq!(node.id, NodeId::new(9));
        assert_eq!(node.status, Some(Status::Open));
        assert!(tags.is_empty());
        assert_eq!(node.content.as_deref(), Some("body"));
    }

    fn arb_node() -> impl Strategy<Value = Node> {
        (
            1i64..10_000,
            "[a-zA-Z0-9 ]{1,20}",
            prop::sample::select(Category::ALL.to_vec()),
            prop::option::of(1i64..10_000),
            prop::option::of(prop::sample::select(Status::ALL.to_vec())),
            -20i64..20,
            prop::option::of(".{1,60}"),
            0i64..2_000_000_000,
        )
            .prop_map(|(id, title, category, parent, status, priority, content, secs)| {
                let at = Utc.timestamp_opt(secs, 0).unwrap();
                Node {
                    id: NodeId::new(id),
                    title,
                    category,
                    parent_id: parent.map(NodeId::new),
                    status,
                    priority_group: priority,
                    content,
                    created_at: at,
                    last_updated: at,
                }
            })
    }

    proptest! {
        #[test]
        fn roundtrip_is_lossless(
            node in arb_node(),
            tags in prop::collection::vec("[a-z\\-]{1,8}", 0..4),
        ) {
            let (decoded, decoded_tags) = decode(&encode(&node, &tags).unwrap()).unwrap();
            prop_assert_eq!(decoded, node);
            prop_assert_eq!(decoded_tags, tags);
        }
    }
}
