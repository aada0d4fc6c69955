//! Core library for reading CherryTree `.ctb` document stores.
//!
//! The primary entry point is [`CtbDocument`], which represents an open `.ctb`
//! SQLite file. It lists nodes and rebuilds a node's content: code nodes come
//! back verbatim, rich-text nodes as a [`DocumentTree`] of lines in which
//! styled [`TextRun`]s and [`AnchoredWidget`]s (images, files, code boxes,
//! tables, anchors) sit in document order.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    color::normalize_color,
    content::{build_node_content, to_json, ContentBody, NodeContent},
    document::CtbDocument,
    error::{CtbError, Result},
    markup::{parse_lines, parse_runs, split_into_lines, TextRun},
    merge::merge_content,
    node::{Node, NodeFlags},
    storage::{
        ChildRow, CodeBoxRow, GridRow, ImageRow, NodeMetaRow, NodeStore, RawContentRow, Storage,
    },
    tree::{DocumentTree, Element},
    widget::{
        binary_filename, extract_widgets, png_dimensions, Anchor, AnchoredWidget, CodeBox,
        EmbeddedFile, PngImage, Table, LATEX_FILENAME,
    },
};
