//! Normalization of the colour attributes stored in rich-text markup.

use crate::{CtbError, Result};

/// Shortens a stored `#rrrrggggbbbb` colour to `#rrggbb`.
///
/// Takes characters `[0, 3)`, `[5, 7)` and `[9, 11)` of the stored value. An
/// empty value stays empty; a non-empty value shorter than 11 characters is a
/// decode error.
pub fn normalize_color(stored: &str) -> Result<String> {
    if stored.is_empty() {
        return Ok(String::new());
    }
    let chars: Vec<char> = stored.chars().collect();
    if chars.len() < 11 {
        return Err(CtbError::Decode(format!(
            "colour {stored:?} is shorter than 11 characters"
        )));
    }
    Ok(chars[0..3]
        .iter()
        .chain(&chars[5..7])
        .chain(&chars[9..11])
        .collect())
}
