//! Internal domain modules for the ctb-reader core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod color;
pub mod content;
pub mod document;
pub mod error;
pub mod markup;
pub mod merge;
pub mod node;
pub mod storage;
pub mod tree;
pub mod widget;

#[doc(inline)]
pub use color::normalize_color;
#[doc(inline)]
pub use content::{build_node_content, to_json, ContentBody, NodeContent};
#[doc(inline)]
pub use document::CtbDocument;
#[doc(inline)]
pub use error::{CtbError, Result};
#[doc(inline)]
pub use markup::{parse_lines, parse_runs, split_into_lines, TextRun};
#[doc(inline)]
pub use merge::merge_content;
#[doc(inline)]
pub use node::{Node, NodeFlags};
#[doc(inline)]
pub use storage::{
    ChildRow, CodeBoxRow, GridRow, ImageRow, NodeMetaRow, NodeStore, RawContentRow, Storage,
};
#[doc(inline)]
pub use tree::{DocumentTree, Element};
#[doc(inline)]
pub use widget::{
    binary_filename, extract_widgets, png_dimensions, Anchor, AnchoredWidget, CodeBox,
    EmbeddedFile, PngImage, Table, LATEX_FILENAME,
};
