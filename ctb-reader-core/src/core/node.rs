//! Node metadata and the packed flag columns of the `node` table.

use serde::{Deserialize, Serialize};

use crate::core::storage::NodeMetaRow;

/// Semantic properties packed into the `is_ro` and `is_richtxt` columns.
///
/// `is_richtxt`: bit 0 rich text, bit 1 bold title, bit 2 custom title colour,
/// bits 3.. the 24-bit RGB title colour.
/// `is_ro`: bit 0 read-only, bits 1.. the icon id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFlags {
    pub is_read_only: bool,
    pub icon: u32,
    pub is_rich_text: bool,
    pub is_bold: bool,
    pub is_custom_color: bool,
    pub color: u32,
}

impl NodeFlags {
    /// Decodes the two packed flag columns. Total over all inputs.
    pub fn decode(is_ro: i32, is_richtxt: i32) -> Self {
        Self {
            is_read_only: is_ro & 0b1 != 0,
            icon: (is_ro >> 1) as u32,
            is_rich_text: is_richtxt & 0b001 != 0,
            is_bold: is_richtxt & 0b010 != 0,
            is_custom_color: is_richtxt & 0b100 != 0,
            color: (is_richtxt >> 3) as u32,
        }
    }

    /// The title colour as `#rrggbb`, when the node uses a custom colour.
    pub fn color_hex(&self) -> Option<String> {
        self.is_custom_color
            .then(|| format!("#{:06x}", self.color & 0x00ff_ffff))
    }
}

/// A node's metadata, without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    pub name: String,
    /// `custom-colors` for rich text, `plain-text`, or the language of a code node.
    pub syntax: String,
    pub tags: Vec<String>,
    pub level: i32,
    #[serde(flatten)]
    pub flags: NodeFlags,
    pub has_children: bool,
}

impl Node {
    pub(crate) fn from_row(row: NodeMetaRow, has_children: bool) -> Self {
        Self {
            id: row.node_id,
            flags: NodeFlags::decode(row.is_ro, row.is_richtxt),
            name: row.name,
            syntax: row.syntax,
            tags: row.tags.split_whitespace().map(str::to_string).collect(),
            level: row.level,
            has_children,
        }
    }

    pub fn is_rich_text(&self) -> bool {
        self.flags.is_rich_text
    }
}
