//! Anchored widgets: the non-text elements of a rich-text node.
//!
//! Every widget occupies exactly one character slot in the node's text stream
//! at its `offset`. [`extract_widgets`] gathers a node's code boxes, tables
//! and image rows into one offset-ordered sequence, ready to be merged with
//! the text runs.
//!
//! ## Image rows
//!
//! The `image` table holds four kinds of element, told apart per row:
//!
//! - a non-empty `anchor` column is an [`Anchor`];
//! - the reserved `__ct_special.tex` filename is a LaTeX placeholder, which is
//!   not supported and is dropped;
//! - any other non-empty `filename` is an [`EmbeddedFile`];
//! - everything else is a [`PngImage`], whose size is read from its bytes.
//!
//! When a destination directory is supplied, image and file bytes are written
//! to `{node_id}_{offset}{ext}` inside it and the widget carries the disk path
//! instead of the bytes.

use crate::core::markup::element_text;
use crate::core::storage::{CodeBoxRow, GridRow, ImageRow, NodeStore};
use crate::{CtbError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Filename marking an image row as a LaTeX formula.
pub const LATEX_FILENAME: &str = "__ct_special.tex";

/// A non-text element anchored at a character offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnchoredWidget {
    #[serde(rename = "code-box")]
    CodeBox(CodeBox),
    #[serde(rename = "grid")]
    Table(Table),
    #[serde(rename = "image-png")]
    Png(PngImage),
    #[serde(rename = "image-embfile")]
    EmbeddedFile(EmbeddedFile),
    #[serde(rename = "image-anchor")]
    Anchor(Anchor),
}

impl AnchoredWidget {
    /// Position of the widget in the node's text stream, in characters.
    pub fn offset(&self) -> i64 {
        match self {
            Self::CodeBox(w) => w.offset,
            Self::Table(w) => w.offset,
            Self::Png(w) => w.offset,
            Self::EmbeddedFile(w) => w.offset,
            Self::Anchor(w) => w.offset,
        }
    }

    /// The `type` tag this widget serializes with.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CodeBox(_) => "code-box",
            Self::Table(_) => "grid",
            Self::Png(_) => "image-png",
            Self::EmbeddedFile(_) => "image-embfile",
            Self::Anchor(_) => "image-anchor",
        }
    }
}

/// A code box embedded in rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBox {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    pub code: String,
    pub language: String,
    pub width: i32,
    pub height: i32,
    /// Width is in pixels rather than percent.
    pub is_width_pixel: bool,
    pub is_highlight_braces: bool,
    pub is_show_line_number: bool,
}

impl From<CodeBoxRow> for CodeBox {
    fn from(row: CodeBoxRow) -> Self {
        Self {
            offset: row.offset,
            justification: row.justification,
            code: row.txt,
            language: row.syntax,
            width: row.width,
            height: row.height,
            is_width_pixel: row.is_width_pix != 0,
            is_highlight_braces: row.do_highl_bra != 0,
            is_show_line_number: row.do_show_linenum != 0,
        }
    }
}

/// A table; `data` is row-major, header row first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    pub data: Vec<Vec<String>>,
    pub min_col_width: i32,
    pub max_col_width: i32,
}

impl Table {
    /// Parses the stored table XML of a `grid` row.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::Markup`] for malformed XML and [`CtbError::Decode`]
    /// when the root element is not `<table>`.
    pub fn from_row(row: GridRow) -> Result<Self> {
        Ok(Self {
            data: parse_table_xml(&row.txt)?,
            offset: row.offset,
            justification: row.justification,
            min_col_width: row.col_min,
            max_col_width: row.col_max,
        })
    }
}

/// Reads `<table><row><cell>..</cell></row>..</table>` into a cell matrix.
///
/// Rows are stored with the logically last row first; the first stored row is
/// rotated to the end, so stored `[R3, R1, R2]` reads as `[R1, R2, R3]`.
/// Older readers rotated the other way (last stored row to the front); this
/// direction is intentional.
fn parse_table_xml(xml: &str) -> Result<Vec<Vec<String>>> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if !root.has_tag_name("table") {
        return Err(CtbError::Decode(format!(
            "expected <table> element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut rows: Vec<Vec<String>> = root
        .children()
        .filter(|n| n.has_tag_name("row"))
        .map(|row| {
            row.children()
                .filter(|n| n.has_tag_name("cell"))
                .map(|cell| element_text(&cell))
                .collect()
        })
        .collect();
    if !rows.is_empty() {
        rows.rotate_left(1);
    }
    Ok(rows)
}

/// An embedded PNG image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PngImage {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_data")]
    pub data: Option<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_path: Option<PathBuf>,
}

/// A file attachment embedded in rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFile {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_data")]
    pub data: Option<Vec<u8>>,
    pub filename: String,
    /// When the file was embedded, in seconds since the epoch.
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_path: Option<PathBuf>,
}

/// A named anchor that links can target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub offset: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    pub name: String,
}

/// Serializes inline binary payloads as standard base64 strings.
mod base64_data {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// What an `image` row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Anchor,
    Latex,
    EmbeddedFile,
    Png,
}

impl ImageKind {
    fn of(row: &ImageRow) -> Self {
        if !row.anchor.is_empty() {
            Self::Anchor
        } else if row.filename == LATEX_FILENAME {
            Self::Latex
        } else if !row.filename.is_empty() {
            Self::EmbeddedFile
        } else {
            Self::Png
        }
    }
}

/// Reads the pixel size from the header of PNG `bytes`.
///
/// # Errors
///
/// Returns [`CtbError::Image`] if the bytes are not a decodable PNG.
pub fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = png::Decoder::new(bytes).read_info()?;
    let info = reader.info();
    Ok((info.width, info.height))
}

/// Where extracted binaries go, created on first use.
struct BinaryDestination<'a> {
    dir: &'a Path,
    ready: bool,
}

impl<'a> BinaryDestination<'a> {
    fn new(dir: &'a Path) -> Self {
        Self { dir, ready: false }
    }

    /// Writes `bytes` to `{node_id}_{offset}{extension}` and returns the path.
    ///
    /// An already existing directory is not an error, so concurrent requests
    /// may share one destination.
    fn write(&mut self, node_id: i64, offset: i64, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        if !self.ready {
            fs::create_dir_all(self.dir)?;
            if !fs::metadata(self.dir)?.is_dir() {
                return Err(CtbError::Io(std::io::Error::other(format!(
                    "{} is not a directory",
                    self.dir.display()
                ))));
            }
            self.ready = true;
        }
        let path = self.dir.join(binary_filename(node_id, offset, extension));
        fs::write(&path, bytes)?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// `{node_id}_{offset}{extension}`, where `extension` includes its dot.
pub fn binary_filename(node_id: i64, offset: i64, extension: &str) -> String {
    format!("{node_id}_{offset}{extension}")
}

/// The extension of `filename` with a leading dot, or `""`.
fn dotted_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Collects the anchored widgets of node `node_id`, sorted by offset.
///
/// The sort is stable: widgets sharing an offset keep their retrieval order
/// (code boxes, then tables, then image rows).
///
/// # Errors
///
/// Any storage failure, malformed table XML, undecodable PNG, or failure to
/// prepare `dest` or write into it aborts the whole extraction.
pub fn extract_widgets<S: NodeStore + ?Sized>(
    store: &S,
    node_id: i64,
    dest: Option<&Path>,
) -> Result<Vec<AnchoredWidget>> {
    let mut widgets: Vec<AnchoredWidget> = store
        .codebox_rows(node_id)?
        .into_iter()
        .map(|row| AnchoredWidget::CodeBox(row.into()))
        .collect();

    for row in store.grid_rows(node_id)? {
        widgets.push(AnchoredWidget::Table(Table::from_row(row)?));
    }

    let mut destination = dest.map(BinaryDestination::new);
    for row in store.image_rows(node_id)? {
        match ImageKind::of(&row) {
            ImageKind::Anchor => widgets.push(AnchoredWidget::Anchor(Anchor {
                offset: row.offset,
                justification: row.justification,
                name: row.anchor,
            })),
            ImageKind::Latex => {
                log::debug!(
                    "skipping LaTeX element at offset {} of node {node_id}",
                    row.offset
                );
            }
            ImageKind::EmbeddedFile => {
                let (data, disk_path) = match destination.as_mut() {
                    Some(dest) => {
                        let ext = dotted_extension(&row.filename);
                        (None, Some(dest.write(node_id, row.offset, &ext, &row.png)?))
                    }
                    None => (Some(row.png), None),
                };
                widgets.push(AnchoredWidget::EmbeddedFile(EmbeddedFile {
                    offset: row.offset,
                    justification: row.justification,
                    data,
                    filename: row.filename,
                    time: row.time,
                    disk_path,
                }));
            }
            ImageKind::Png => {
                let (width, height) = png_dimensions(&row.png)?;
                let (data, disk_path) = match destination.as_mut() {
                    Some(dest) => (None, Some(dest.write(node_id, row.offset, ".png", &row.png)?)),
                    None => (Some(row.png), None),
                };
                widgets.push(AnchoredWidget::Png(PngImage {
                    offset: row.offset,
                    justification: row.justification,
                    data,
                    width,
                    height,
                    link: row.link,
                    disk_path,
                }));
            }
        }
    }

    widgets.sort_by_key(AnchoredWidget::offset);
    Ok(widgets)
}
