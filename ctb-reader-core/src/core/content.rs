//! Assembling the full content of one node.

use crate::core::markup::parse_lines;
use crate::core::merge::merge_content;
use crate::core::node::NodeFlags;
use crate::core::storage::NodeStore;
use crate::core::tree::DocumentTree;
use crate::core::widget::extract_widgets;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The body of a node: code (including plain text) or rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBody {
    /// Rich text rebuilt as lines of elements.
    RichText {
        #[serde(rename = "richTexts")]
        rich_texts: DocumentTree,
    },
    /// A code or plain-text node, verbatim.
    Code { language: String, code: String },
}

/// Everything shown for a node: its body plus timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContent {
    pub id: i64,
    pub is_rich_text: bool,
    #[serde(flatten)]
    pub body: ContentBody,
    /// Seconds since the epoch.
    pub create_time: i64,
    /// Seconds since the epoch.
    pub update_time: i64,
}

impl NodeContent {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.create_time, 0)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.update_time, 0)
    }

    /// The rebuilt rich text, if this is a rich-text node.
    pub fn document(&self) -> Option<&DocumentTree> {
        match &self.body {
            ContentBody::RichText { rich_texts } => Some(rich_texts),
            ContentBody::Code { .. } => None,
        }
    }
}

/// Renders an output value (node content, node metadata) as JSON.
///
/// # Errors
///
/// Returns [`crate::CtbError::Json`] if `value` cannot be serialized.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Reads and rebuilds the content of node `id`.
///
/// Code and plain-text nodes are returned verbatim with their language.
/// Rich-text nodes get their widgets extracted (binaries written to `dest`
/// when given), their markup parsed into lines, and both merged.
///
/// # Errors
///
/// Returns [`crate::CtbError::NotFound`] if the node does not exist. Any
/// failure while extracting widgets, parsing markup or merging aborts the
/// request; no partial document is returned.
pub fn build_node_content<S: NodeStore + ?Sized>(
    store: &S,
    id: i64,
    dest: Option<&Path>,
) -> Result<NodeContent> {
    let meta = store.node_meta(id)?;
    let flags = NodeFlags::decode(meta.is_ro, meta.is_richtxt);
    let raw = store.raw_content(id)?;

    let body = if flags.is_rich_text {
        let widgets = extract_widgets(store, id, dest)?;
        let lines = parse_lines(&raw.txt)?;
        let tree = merge_content(&lines, &widgets)?;
        log::debug!(
            "node {id}: rebuilt {} lines with {} widgets",
            tree.lines.len(),
            widgets.len()
        );
        ContentBody::RichText { rich_texts: tree }
    } else {
        ContentBody::Code {
            language: raw.syntax,
            code: raw.txt,
        }
    };

    Ok(NodeContent {
        id: raw.node_id,
        is_rich_text: flags.is_rich_text,
        body,
        create_time: raw.ts_creation,
        update_time: raw.ts_lastsave,
    })
}
