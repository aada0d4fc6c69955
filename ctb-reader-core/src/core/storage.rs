//! Read-only access to the tables of a CherryTree SQLite store.
//!
//! [`NodeStore`] is the seam between content reconstruction and the database:
//! the assembler only ever asks for rows by node id, and [`Storage`] is the
//! SQLite-backed implementation. Absent rows surface as
//! [`CtbError::NotFound`], distinct from every other query failure.

use crate::{CtbError, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// The tables a document store must provide.
const REQUIRED_TABLES: [&str; 5] = ["node", "children", "image", "codebox", "grid"];

/// Metadata columns of one `node` row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMetaRow {
    pub node_id: i64,
    pub name: String,
    pub syntax: String,
    pub tags: String,
    pub is_ro: i32,
    pub is_richtxt: i32,
    pub level: i32,
}

/// One `children` row: the position of a node under its father.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChildRow {
    pub node_id: i64,
    pub father_id: i64,
    pub sequence: i64,
}

/// Content columns of one `node` row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawContentRow {
    pub node_id: i64,
    pub txt: String,
    pub syntax: String,
    pub is_richtxt: i32,
    pub ts_creation: i64,
    pub ts_lastsave: i64,
}

/// One `image` row. Holds PNG images, embedded files and anchors alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageRow {
    pub node_id: i64,
    pub offset: i64,
    pub justification: String,
    pub anchor: String,
    pub png: Vec<u8>,
    pub filename: String,
    pub link: String,
    pub time: i64,
}

/// One `grid` row; `txt` is the table XML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridRow {
    pub node_id: i64,
    pub offset: i64,
    pub justification: String,
    pub txt: String,
    pub col_min: i32,
    pub col_max: i32,
}

/// One `codebox` row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBoxRow {
    pub node_id: i64,
    pub offset: i64,
    pub justification: String,
    pub txt: String,
    pub syntax: String,
    pub width: i32,
    pub height: i32,
    pub is_width_pix: i32,
    pub do_highl_bra: i32,
    pub do_show_linenum: i32,
}

/// Row-level read operations over a document store.
pub trait NodeStore {
    /// Number of rows in the `node` table.
    fn node_count(&self) -> Result<i64>;

    /// Metadata of node `id`.
    fn node_meta(&self, id: i64) -> Result<NodeMetaRow>;

    /// The `children` row describing where node `id` sits.
    fn child_row(&self, id: i64) -> Result<ChildRow>;

    /// Direct children of `father_id`, ordered by `sequence`.
    fn child_rows(&self, father_id: i64) -> Result<Vec<ChildRow>>;

    /// Raw content of node `id`.
    fn raw_content(&self, id: i64) -> Result<RawContentRow>;

    fn image_rows(&self, id: i64) -> Result<Vec<ImageRow>>;

    fn codebox_rows(&self, id: i64) -> Result<Vec<CodeBoxRow>>;

    fn grid_rows(&self, id: i64) -> Result<Vec<GridRow>>;
}

/// A read-only connection to a `.ctb` file.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens an existing document store read-only and checks its tables.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::InvalidDocument`] if any of the required tables is
    /// missing, or [`CtbError::Database`] if the file is not SQLite at all.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let placeholders = REQUIRED_TABLES
            .iter()
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let table_count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ({placeholders})"
            ),
            [],
            |row| row.get(0),
        )?;

        if table_count != REQUIRED_TABLES.len() as i64 {
            return Err(CtbError::InvalidDocument(
                "Not a CherryTree SQLite document".to_string(),
            ));
        }

        Ok(Self { conn })
    }
}

impl NodeStore for Storage {
    fn node_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM node", [], |row| row.get(0))?;
        Ok(count)
    }

    fn node_meta(&self, id: i64) -> Result<NodeMetaRow> {
        self.conn
            .query_row(
                "SELECT node_id, COALESCE(name, ''), COALESCE(syntax, ''), COALESCE(tags, ''),
                        COALESCE(is_ro, 0), COALESCE(is_richtxt, 0), COALESCE(level, 0)
                 FROM node WHERE node_id = ?1",
                [id],
                |row| {
                    Ok(NodeMetaRow {
                        node_id: row.get(0)?,
                        name: row.get(1)?,
                        syntax: row.get(2)?,
                        tags: row.get(3)?,
                        is_ro: row.get(4)?,
                        is_richtxt: row.get(5)?,
                        level: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or(CtbError::node_not_found(id))
    }

    fn child_row(&self, id: i64) -> Result<ChildRow> {
        self.conn
            .query_row(
                "SELECT node_id, COALESCE(father_id, 0), COALESCE(sequence, 0)
                 FROM children WHERE node_id = ?1",
                [id],
                map_child_row,
            )
            .optional()?
            .ok_or(CtbError::NotFound { kind: "Child row", id })
    }

    fn child_rows(&self, father_id: i64) -> Result<Vec<ChildRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT node_id, COALESCE(father_id, 0), COALESCE(sequence, 0)
             FROM children WHERE father_id = ?1
             ORDER BY sequence",
        )?;
        let rows = stmt
            .query_map([father_id], map_child_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn raw_content(&self, id: i64) -> Result<RawContentRow> {
        self.conn
            .query_row(
                "SELECT node_id, COALESCE(txt, ''), COALESCE(syntax, ''), COALESCE(is_richtxt, 0),
                        CAST(COALESCE(ts_creation, 0) AS INTEGER),
                        CAST(COALESCE(ts_lastsave, 0) AS INTEGER)
                 FROM node WHERE node_id = ?1",
                [id],
                |row| {
                    Ok(RawContentRow {
                        node_id: row.get(0)?,
                        txt: row.get(1)?,
                        syntax: row.get(2)?,
                        is_richtxt: row.get(3)?,
                        ts_creation: row.get(4)?,
                        ts_lastsave: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(CtbError::NotFound { kind: "Node content", id })
    }

    fn image_rows(&self, id: i64) -> Result<Vec<ImageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT node_id, COALESCE(offset, 0), COALESCE(justification, ''),
                    COALESCE(anchor, ''), png, COALESCE(filename, ''), COALESCE(link, ''),
                    CAST(COALESCE(time, 0) AS INTEGER)
             FROM image WHERE node_id = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok(ImageRow {
                    node_id: row.get(0)?,
                    offset: row.get(1)?,
                    justification: row.get(2)?,
                    anchor: row.get(3)?,
                    png: row.get::<_, Option<Vec<u8>>>(4)?.unwrap_or_default(),
                    filename: row.get(5)?,
                    link: row.get(6)?,
                    time: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn codebox_rows(&self, id: i64) -> Result<Vec<CodeBoxRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT node_id, COALESCE(offset, 0), COALESCE(justification, ''), COALESCE(txt, ''),
                    COALESCE(syntax, ''), COALESCE(width, 0), COALESCE(height, 0),
                    COALESCE(is_width_pix, 0), COALESCE(do_highl_bra, 0),
                    COALESCE(do_show_linenum, 0)
             FROM codebox WHERE node_id = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok(CodeBoxRow {
                    node_id: row.get(0)?,
                    offset: row.get(1)?,
                    justification: row.get(2)?,
                    txt: row.get(3)?,
                    syntax: row.get(4)?,
                    width: row.get(5)?,
                    height: row.get(6)?,
                    is_width_pix: row.get(7)?,
                    do_highl_bra: row.get(8)?,
                    do_show_linenum: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn grid_rows(&self, id: i64) -> Result<Vec<GridRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT node_id, COALESCE(offset, 0), COALESCE(justification, ''), COALESCE(txt, ''),
                    COALESCE(col_min, 0), COALESCE(col_max, 0)
             FROM grid WHERE node_id = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok(GridRow {
                    node_id: row.get(0)?,
                    offset: row.get(1)?,
                    justification: row.get(2)?,
                    txt: row.get(3)?,
                    col_min: row.get(4)?,
                    col_max: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_child_row(row: &rusqlite::Row) -> rusqlite::Result<ChildRow> {
    Ok(ChildRow {
        node_id: row.get(0)?,
        father_id: row.get(1)?,
        sequence: row.get(2)?,
    })
}
