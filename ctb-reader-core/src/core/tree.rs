//! The reconstructed document tree of a rich-text node.

use crate::core::markup::TextRun;
use crate::core::widget::AnchoredWidget;
use serde::{Deserialize, Serialize};

/// One element of a line: a styled text run or an anchored widget.
///
/// Both serialize with a `type` tag (`text`, `code-box`, `grid`, `image-png`,
/// `image-embfile`, `image-anchor`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Text(TextRun),
    Widget(AnchoredWidget),
}

impl Element {
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Self::Text(run) => Some(run),
            Self::Widget(_) => None,
        }
    }

    pub fn as_widget(&self) -> Option<&AnchoredWidget> {
        match self {
            Self::Text(_) => None,
            Self::Widget(widget) => Some(widget),
        }
    }
}

impl From<TextRun> for Element {
    fn from(run: TextRun) -> Self {
        Self::Text(run)
    }
}

impl From<AnchoredWidget> for Element {
    fn from(widget: AnchoredWidget) -> Self {
        Self::Widget(widget)
    }
}

/// Ordered lines, each an ordered sequence of elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentTree {
    pub lines: Vec<Vec<Element>>,
}

impl DocumentTree {
    /// All widgets, in document order.
    pub fn widgets(&self) -> impl Iterator<Item = &AnchoredWidget> {
        self.lines.iter().flatten().filter_map(Element::as_widget)
    }

    /// The text of each line, widgets left out.
    pub fn line_texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .filter_map(Element::as_text)
                    .map(|run| run.text.as_str())
                    .collect()
            })
            .collect()
    }

    /// The whole text with lines joined by `\n`, widgets left out.
    pub fn plain_text(&self) -> String {
        self.line_texts().join("\n")
    }
}
