//! Error types for the ctb-reader core library.

use thiserror::Error;

/// All errors that can occur while reading a document store.
#[derive(Debug, Error)]
pub enum CtbError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A node or row was requested that does not exist in the store.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// The opened file is not a valid CherryTree document store.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Stored data (colour string, attribute value, table XML) could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The rich-text markup of a node is not well-formed XML.
    #[error("Markup error: {0}")]
    Markup(#[from] roxmltree::Error),

    /// The bytes of an embedded image could not be decoded as PNG.
    #[error("Image error: {0}")]
    Image(#[from] png::DecodingError),

    /// An anchored widget sits at an offset the text stream never reaches.
    #[error(
        "expected offset will not appear: cur={current} expected={expected}\n\
         remaining text in current line:\n{current_line}\n{}",
        describe_next_line(.next_line)
    )]
    OffsetInconsistency {
        current: i64,
        expected: i64,
        current_line: String,
        next_line: Option<String>,
    },

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_next_line(next_line: &Option<String>) -> String {
    match next_line {
        Some(text) => format!("text in next line:\n{text}"),
        None => "no more lines.".to_string(),
    }
}

/// Convenience alias that pins the error type to [`CtbError`].
pub type Result<T> = std::result::Result<T, CtbError>;

impl CtbError {
    /// Builds a [`CtbError::NotFound`] for a node id.
    pub fn node_not_found(id: i64) -> Self {
        Self::NotFound { kind: "Node", id }
    }

    /// Returns `true` when the error means "absent" rather than "broken".
    ///
    /// Callers use this to recover, e.g. by treating a missing node as zero
    /// children.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(self, Self::Database(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to read document: {e}"),
            Self::NotFound { kind, id } => format!("{kind} {id} does not exist"),
            Self::InvalidDocument(_) => "Not a CherryTree document".to_string(),
            Self::Decode(msg) => format!("Stored data is damaged: {msg}"),
            Self::Markup(e) => format!("Rich text could not be read: {e}"),
            Self::Image(e) => format!("Image could not be read: {e}"),
            Self::OffsetInconsistency { current, expected, .. } => format!(
                "Node content is inconsistent: an attachment expected at character {expected} \
                 could not be placed (reached {current})"
            ),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(CtbError::node_not_found(7).is_not_found());
        assert!(CtbError::Database(rusqlite::Error::QueryReturnedNoRows).is_not_found());
        assert!(!CtbError::Decode("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_offset_inconsistency_message_carries_context() {
        let e = CtbError::OffsetInconsistency {
            current: 5,
            expected: 3,
            current_line: "llo".to_string(),
            next_line: None,
        };
        let msg = e.to_string();
        assert!(msg.contains("cur=5 expected=3"));
        assert!(msg.contains("llo"));
        assert!(msg.contains("no more lines."));

        let e = CtbError::OffsetInconsistency {
            current: 5,
            expected: 3,
            current_line: String::new(),
            next_line: Some("second".to_string()),
        };
        assert!(e.to_string().contains("text in next line:\nsecond"));
    }

    #[test]
    fn test_node_not_found_message() {
        let e = CtbError::node_not_found(42);
        assert_eq!(e.to_string(), "Node not found: 42");
        assert_eq!(e.user_message(), "Node 42 does not exist");
    }
}
