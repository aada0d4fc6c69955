//! Interleaving text runs with anchored widgets.
//!
//! The node's text stream is its lines joined by `\n`, with every widget
//! occupying one character at its offset. [`merge_content`] walks the lines
//! and the offset-sorted widgets together, counting characters as it goes,
//! and places each widget exactly where its offset falls, splitting a run in
//! two when the offset lands inside it.
//!
//! Rules, applied in order on each step:
//!
//! 1. No widgets left: the remaining fragments are copied as they are.
//! 2. The next widget's offset equals the position and the next fragment is
//!    not a functional (empty) run: the widget is placed here. This includes
//!    the end of a line, so a widget right before a line break stays on the
//!    line it ends. Consuming the line break first would put the position
//!    past such a widget's offset and make it unreachable.
//! 3. The line has no fragments left: the line break is consumed.
//! 4. Otherwise the next fragment is consumed: functional runs are copied
//!    without advancing, runs ending at or before the offset are copied
//!    whole, and a run the offset falls inside is split around the widget.
//!
//! An offset behind the current position, or past the end of the text, can
//! never be reached and fails with [`CtbError::OffsetInconsistency`].

use crate::core::markup::TextRun;
use crate::core::tree::{DocumentTree, Element};
use crate::core::widget::AnchoredWidget;
use crate::{CtbError, Result};

/// Read position over the parsed lines.
struct LineCursor<'a> {
    lines: &'a [Vec<TextRun>],
    line: usize,
    index: usize,
    /// Right-hand part of a run that was split around a widget; stands in
    /// front of `lines[line][index]`.
    carry: Option<TextRun>,
}

impl<'a> LineCursor<'a> {
    fn new(lines: &'a [Vec<TextRun>]) -> Self {
        Self {
            lines,
            line: 0,
            index: 0,
            carry: None,
        }
    }

    fn current_line(&self) -> &[TextRun] {
        self.lines.get(self.line).map(Vec::as_slice).unwrap_or_default()
    }

    fn peek(&self) -> Option<&TextRun> {
        self.carry
            .as_ref()
            .or_else(|| self.current_line().get(self.index))
    }

    fn advance(&mut self) {
        if self.carry.take().is_none() {
            self.index += 1;
        }
    }

    /// Consumes the head fragment and puts `rest` in its place.
    fn replace_head(&mut self, rest: TextRun) {
        if self.carry.is_none() {
            self.index += 1;
        }
        self.carry = Some(rest);
    }

    /// Moves to the start of the next line; `false` on the last line.
    fn next_line(&mut self) -> bool {
        if self.line + 1 >= self.lines.len() {
            return false;
        }
        self.line += 1;
        self.index = 0;
        self.carry = None;
        true
    }

    /// The fragments not yet consumed on the current line.
    fn remaining(&self) -> impl Iterator<Item = &TextRun> {
        self.carry
            .iter()
            .chain(self.current_line().iter().skip(self.index))
    }

    fn remaining_text(&self) -> String {
        self.remaining().map(|run| run.text.as_str()).collect()
    }

    fn next_line_text(&self) -> Option<String> {
        self.lines
            .get(self.line + 1)
            .map(|line| line.iter().map(|run| run.text.as_str()).collect())
    }

    /// Copies everything not yet consumed into `out`, one output line per line.
    fn drain_into(mut self, out: &mut Vec<Vec<Element>>) {
        loop {
            let rest: Vec<Element> = self.remaining().cloned().map(Element::from).collect();
            if let Some(line) = out.last_mut() {
                line.extend(rest);
            }
            if !self.next_line() {
                break;
            }
            out.push(Vec::new());
        }
    }
}

/// Builds the document tree from per-line run fragments and offset-sorted
/// widgets. Offsets count Unicode scalar values, never bytes.
///
/// # Errors
///
/// Returns [`CtbError::OffsetInconsistency`] when a widget's offset cannot be
/// reached, with the position reached and the surrounding text.
pub fn merge_content(lines: &[Vec<TextRun>], widgets: &[AnchoredWidget]) -> Result<DocumentTree> {
    let mut out: Vec<Vec<Element>> = vec![Vec::new()];
    let mut cursor = LineCursor::new(lines);
    let mut pending = widgets.iter().peekable();
    let mut chars: i64 = 0;

    loop {
        let Some(widget) = pending.peek().copied() else {
            cursor.drain_into(&mut out);
            break;
        };
        let offset = widget.offset();
        let head = cursor.peek().cloned();

        if offset == chars && head.as_ref().map_or(true, |run| !run.is_functional()) {
            push(&mut out, widget.clone().into());
            pending.next();
            chars += 1;
            continue;
        }

        let Some(run) = head else {
            if !cursor.next_line() {
                return Err(inconsistency(&cursor, chars, offset));
            }
            out.push(Vec::new());
            chars += 1;
            continue;
        };

        if run.is_functional() {
            push(&mut out, run.into());
            cursor.advance();
            continue;
        }
        if offset < chars {
            return Err(inconsistency(&cursor, chars, offset));
        }

        let len = run.char_len() as i64;
        if chars + len <= offset {
            push(&mut out, run.into());
            cursor.advance();
            chars += len;
            continue;
        }

        let (left, right) = run.split_at_char((offset - chars) as usize);
        push(&mut out, left.into());
        push(&mut out, widget.clone().into());
        pending.next();
        chars = offset + 1;
        cursor.replace_head(right);
    }

    Ok(DocumentTree { lines: out })
}

fn push(out: &mut [Vec<Element>], element: Element) {
    if let Some(line) = out.last_mut() {
        line.push(element);
    }
}

fn inconsistency(cursor: &LineCursor, current: i64, expected: i64) -> CtbError {
    CtbError::OffsetInconsistency {
        current,
        expected,
        current_line: cursor.remaining_text(),
        next_line: cursor.next_line_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::split_into_lines;
    use crate::core::widget::Anchor;

    const OBJECT: char = '\u{FFFC}';

    fn anchor(offset: i64) -> AnchoredWidget {
        AnchoredWidget::Anchor(Anchor {
            offset,
            justification: String::new(),
            name: format!("a{offset}"),
        })
    }

    fn lines_of(text: &str) -> Vec<Vec<TextRun>> {
        split_into_lines(vec![TextRun::plain(text)])
    }

    /// The tree flattened back to a stream, widgets as U+FFFC.
    fn stream(tree: &DocumentTree) -> String {
        tree.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|el| match el {
                        Element::Text(run) => run.text.clone(),
                        Element::Widget(_) => OBJECT.to_string(),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `text` with U+FFFC inserted at each char position in `offsets`.
    fn expected_stream(text: &str, offsets: &[usize]) -> String {
        let mut chars: Vec<char> = text.chars().collect();
        for &at in offsets {
            chars.insert(at, OBJECT);
        }
        chars.into_iter().collect()
    }

    #[test]
    fn test_widget_inside_run_splits_it() {
        let run = TextRun {
            weight: "heavy".to_string(),
            ..TextRun::plain("Hello")
        };
        let tree = merge_content(&[vec![run]], &[anchor(2)]).unwrap();

        assert_eq!(tree.lines.len(), 1);
        let line = &tree.lines[0];
        assert_eq!(line.len(), 3);
        assert_eq!(line[0].as_text().unwrap().text, "He");
        assert_eq!(line[1].as_widget().unwrap().offset(), 2);
        assert_eq!(line[2].as_text().unwrap().text, "llo");
        assert_eq!(line[0].as_text().unwrap().weight, "heavy");
        assert_eq!(line[2].as_text().unwrap().weight, "heavy");
    }

    #[test]
    fn test_widget_at_line_end_stays_on_that_line() {
        let lines = vec![vec![TextRun::plain("ab")], vec![TextRun::plain("cd")]];
        let tree = merge_content(&lines, &[anchor(2)]).unwrap();

        assert_eq!(tree.lines.len(), 2);
        assert_eq!(tree.lines[0].len(), 2);
        assert_eq!(tree.lines[0][0].as_text().unwrap().text, "ab");
        assert!(tree.lines[0][1].as_widget().is_some());
        assert_eq!(tree.line_texts(), vec!["ab".to_string(), "cd".to_string()]);
    }

    #[test]
    fn test_widget_after_line_break_starts_next_line() {
        let lines = vec![vec![TextRun::plain("ab")], vec![TextRun::plain("cd")]];
        let tree = merge_content(&lines, &[anchor(3)]).unwrap();

        assert_eq!(tree.lines[0].len(), 1);
        assert!(tree.lines[1][0].as_widget().is_some());
        assert_eq!(tree.lines[1][1].as_text().unwrap().text, "cd");
    }

    #[test]
    fn test_widget_at_start_and_end_of_text() {
        let tree = merge_content(&lines_of("abc"), &[anchor(0), anchor(4)]).unwrap();
        let line = &tree.lines[0];
        assert_eq!(line.len(), 3);
        assert!(line[0].as_widget().is_some());
        assert_eq!(line[1].as_text().unwrap().text, "abc");
        assert!(line[2].as_widget().is_some());
    }

    #[test]
    fn test_adjacent_widgets() {
        let tree = merge_content(&lines_of("ab"), &[anchor(1), anchor(2)]).unwrap();
        assert_eq!(stream(&tree), format!("a{OBJECT}{OBJECT}b"));
    }

    #[test]
    fn test_widget_on_empty_line() {
        let tree = merge_content(&lines_of("ab\n\ncd"), &[anchor(3)]).unwrap();
        assert_eq!(tree.lines.len(), 3);
        assert_eq!(tree.lines[1].len(), 1);
        assert!(tree.lines[1][0].as_widget().is_some());
    }

    #[test]
    fn test_widget_in_empty_document() {
        let tree = merge_content(&[vec![]], &[anchor(0)]).unwrap();
        assert_eq!(tree.lines.len(), 1);
        assert!(tree.lines[0][0].as_widget().is_some());
    }

    #[test]
    fn test_functional_run_is_emitted_before_widget_at_same_position() {
        let marker = TextRun {
            justification: "right".to_string(),
            ..Default::default()
        };
        let lines = vec![vec![TextRun::plain("ab"), marker.clone(), TextRun::plain("cd")]];
        let tree = merge_content(&lines, &[anchor(2)]).unwrap();

        let line = &tree.lines[0];
        assert_eq!(line.len(), 4);
        assert_eq!(line[0].as_text().unwrap().text, "ab");
        assert_eq!(line[1].as_text(), Some(&marker));
        assert!(line[2].as_widget().is_some());
        assert_eq!(line[3].as_text().unwrap().text, "cd");
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let tree = merge_content(&lines_of("héllo wörld"), &[anchor(3), anchor(9)]).unwrap();
        assert_eq!(stream(&tree), expected_stream("héllo wörld", &[3, 9]));
        assert_eq!(tree.lines[0][0].as_text().unwrap().text, "hél");
    }

    #[test]
    fn test_no_widgets_copies_lines_verbatim() {
        let lines = lines_of("one\ntwo\n\nthree");
        let tree = merge_content(&lines, &[]).unwrap();
        assert_eq!(tree.lines.len(), 4);
        assert_eq!(tree.plain_text(), "one\ntwo\n\nthree");
    }

    #[test]
    fn test_every_single_widget_position_round_trips() {
        let text = "ab\ncd\n\nxyz";
        let len = text.chars().count();
        for at in 0..=len {
            let tree = merge_content(&lines_of(text), &[anchor(at as i64)]).unwrap();
            assert_eq!(tree.widgets().count(), 1, "offset {at}");
            assert_eq!(tree.plain_text(), text, "offset {at}");
            assert_eq!(stream(&tree), expected_stream(text, &[at]), "offset {at}");
        }
    }

    #[test]
    fn test_widget_pairs_preserve_order_and_text() {
        let text = "Hé\nwo\nrld";
        let len = text.chars().count();
        for first in 0..=len {
            for second in (first + 1)..=(len + 1) {
                let widgets = [anchor(first as i64), anchor(second as i64)];
                let tree = merge_content(&lines_of(text), &widgets).unwrap();
                let offsets: Vec<i64> = tree.widgets().map(AnchoredWidget::offset).collect();
                assert_eq!(offsets, vec![first as i64, second as i64]);
                assert_eq!(tree.plain_text(), text);
                assert_eq!(stream(&tree), expected_stream(text, &[first, second]));
            }
        }
    }

    #[test]
    fn test_offset_behind_position_is_inconsistency() {
        let err = merge_content(&lines_of("Hello world"), &[anchor(5), anchor(3)]).unwrap_err();
        match err {
            CtbError::OffsetInconsistency {
                current,
                expected,
                current_line,
                next_line,
            } => {
                assert_eq!(current, 6);
                assert_eq!(expected, 3);
                assert_eq!(current_line, " world");
                assert_eq!(next_line, None);
            }
            other => panic!("Wrong error: {other:?}"),
        }
    }

    #[test]
    fn test_offset_past_end_is_inconsistency() {
        let err = merge_content(&lines_of("ab\ncd"), &[anchor(9)]).unwrap_err();
        assert!(matches!(
            err,
            CtbError::OffsetInconsistency { current: 5, expected: 9, .. }
        ));
    }

    #[test]
    fn test_inconsistency_reports_next_line() {
        let lines = lines_of("abc\ndef");
        let err = merge_content(&lines, &[anchor(1), anchor(0)]).unwrap_err();
        match err {
            CtbError::OffsetInconsistency {
                current_line,
                next_line,
                ..
            } => {
                assert_eq!(current_line, "bc");
                assert_eq!(next_line.as_deref(), Some("def"));
            }
            other => panic!("Wrong error: {other:?}"),
        }
    }
}
