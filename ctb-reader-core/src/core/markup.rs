//! Rich-text markup: parsing `<rich_text>` runs and splitting them into lines.
//!
//! A rich-text node stores its text as
//! `<node><rich_text attr="..">text</rich_text>...</node>`, where every
//! `rich_text` element is one styled run. `\n` inside run text is the only
//! line separator.

use crate::core::color::normalize_color;
use crate::{CtbError, Result};
use serde::{Deserialize, Serialize};

/// One styled run of text.
///
/// A run with empty `text` still matters: it carries style or marker
/// semantics and is kept as its own element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text", rename_all = "camelCase")]
pub struct TextRun {
    /// `#rrggbb`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub foreground: String,
    /// `#rrggbb`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub background: String,
    /// `heavy` for bold.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub weight: String,
    /// `italic`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
    /// `single`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub underline: String,
    /// `true`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strikethrough: String,
    /// `h1`..`h6`, `sup`, `sub`, `small`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scale: String,
    /// `monospace`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family: String,
    /// `webs <url>`, `file <path>`, `fold <path>` or `node <id> [anchor]`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub justification: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indent: i32,
    pub text: String,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl TextRun {
    /// A run with only `text` set.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A copy of this run's style holding `text` instead.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    /// Length of the text in Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// A run with no text; carries style or marker semantics only.
    pub fn is_functional(&self) -> bool {
        self.text.is_empty()
    }

    /// Splits into two runs of the same style at character index `at`.
    pub fn split_at_char(&self, at: usize) -> (Self, Self) {
        let byte = self
            .text
            .char_indices()
            .nth(at)
            .map_or(self.text.len(), |(i, _)| i);
        let (left, right) = self.text.split_at(byte);
        (self.with_text(left), self.with_text(right))
    }

    fn from_element(element: &roxmltree::Node) -> Result<Self> {
        let attr = |name: &str| element.attribute(name).unwrap_or_default().to_string();
        let indent = match element.attribute("indent") {
            None | Some("") => 0,
            Some(value) => value.trim().parse().map_err(|_| {
                CtbError::Decode(format!("invalid indent attribute {value:?}"))
            })?,
        };
        Ok(Self {
            foreground: normalize_color(&attr("foreground"))?,
            background: normalize_color(&attr("background"))?,
            weight: attr("weight"),
            style: attr("style"),
            underline: attr("underline"),
            strikethrough: attr("strikethrough"),
            scale: attr("scale"),
            family: attr("family"),
            link: attr("link"),
            justification: attr("justification"),
            indent,
            text: element_text(element),
        })
    }
}

/// The direct character data of `element`; text inside nested elements is
/// not part of it.
pub(crate) fn element_text(element: &roxmltree::Node) -> String {
    element
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Parses a node's markup into its styled runs, in document order.
///
/// A blank blob is an empty document.
///
/// # Errors
///
/// Returns [`CtbError::Markup`] for malformed XML and [`CtbError::Decode`] for
/// a root element other than `<node>` or an undecodable attribute.
pub fn parse_runs(markup: &str) -> Result<Vec<TextRun>> {
    if markup.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc = roxmltree::Document::parse(markup)?;
    let root = doc.root_element();
    if !root.has_tag_name("node") {
        return Err(CtbError::Decode(format!(
            "expected <node> element, found <{}>",
            root.tag_name().name()
        )));
    }
    root.children()
        .filter(|n| n.has_tag_name("rich_text"))
        .map(|n| TextRun::from_element(&n))
        .collect()
}

/// Splits runs on `\n` into lines of run fragments.
///
/// Functional runs are kept whole on the current line. Text runs are cut at
/// every `\n`; each piece keeps the run's style, empty pieces are dropped, and
/// each `\n` opens a new line. The result always has at least one line.
pub fn split_into_lines(runs: Vec<TextRun>) -> Vec<Vec<TextRun>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for run in runs {
        if run.is_functional() {
            current.push(run);
            continue;
        }
        let mut pieces = run.text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                current.push(run.with_text(piece));
            }
            if pieces.peek().is_some() {
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    lines.push(current);
    lines
}

/// [`parse_runs`] followed by [`split_into_lines`].
pub fn parse_lines(markup: &str) -> Result<Vec<Vec<TextRun>>> {
    Ok(split_into_lines(parse_runs(markup)?))
}
