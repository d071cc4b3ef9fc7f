//! Single-line text editor state with a grapheme-based cursor.

use unicode_segmentation::UnicodeSegmentation;

/// One editing keystroke, shared by the expression editor and the key modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    InsertText(String),
    Backspace,
    Delete,
    DeleteWordBackward,
    Left,
    Right,
    Home,
    End,
    Clear,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    text: String,
    /// Cursor position in graphemes, `0..=grapheme_count`.
    cursor: usize,
}

impl DraftInput {
    /// Editor holding `text` with the cursor at the end.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut draft = Self::default();
        draft.set_text(text);
        draft
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text before the cursor; used to place the terminal cursor.
    #[must_use]
    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.byte_index()]
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        // Single-line editor: newlines from pastes collapse to spaces.
        self.text = text.into().replace(['\r', '\n'], " ");
        self.move_cursor_end();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn apply(&mut self, action: EditAction) {
        match action {
            EditAction::Insert(c) => self.enter_char(c),
            EditAction::InsertText(text) => {
                for c in text.chars() {
                    self.enter_char(c);
                }
            }
            EditAction::Backspace => self.delete_char(),
            EditAction::Delete => self.delete_char_forward(),
            EditAction::DeleteWordBackward => self.delete_word_backwards(),
            EditAction::Left => self.move_cursor_left(),
            EditAction::Right => self.move_cursor_right(),
            EditAction::Home => self.cursor = 0,
            EditAction::End => self.move_cursor_end(),
            EditAction::Clear => self.clear(),
        }
    }

    fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_cursor_right(&mut self) {
        self.cursor = self.cursor.saturating_add(1).min(self.grapheme_count());
    }

    fn move_cursor_end(&mut self) {
        self.cursor = self.grapheme_count();
    }

    fn enter_char(&mut self, new_char: char) {
        let new_char = if matches!(new_char, '\r' | '\n') {
            ' '
        } else {
            new_char
        };
        if new_char.is_control() {
            return;
        }
        let before = self.grapheme_count();
        let index = self.byte_index();
        self.text.insert(index, new_char);
        // A combining mark merges into the previous grapheme instead of
        // adding one.
        if self.grapheme_count() > before {
            self.move_cursor_right();
        }
    }

    fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }

        let start = self.byte_index_at(self.cursor - 1);
        let end = self.byte_index_at(self.cursor);
        self.text.replace_range(start..end, "");
        self.move_cursor_left();
    }

    fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }

        let start = self.byte_index_at(self.cursor);
        let end = self.byte_index_at(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    fn delete_word_backwards(&mut self) {
        while self.cursor > 0 && self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
        while self.cursor > 0 && !self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn grapheme_is_whitespace(&self, index: usize) -> bool {
        self.text
            .graphemes(true)
            .nth(index)
            .is_some_and(|grapheme| grapheme.chars().all(char::is_whitespace))
    }

    fn byte_index(&self) -> usize {
        self.byte_index_at(self.cursor)
    }

    fn byte_index_at(&self, grapheme_index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::{DraftInput, EditAction};

    fn typed(text: &str) -> DraftInput {
        let mut draft = DraftInput::default();
        draft.apply(EditAction::InsertText(text.to_string()));
        draft
    }

    #[test]
    fn inserts_at_cursor() {
        let mut draft = typed("x+1");
        draft.apply(EditAction::Home);
        draft.apply(EditAction::Insert('2'));
        assert_eq!(draft.text(), "2x+1");
        assert_eq!(draft.cursor(), 1);
        assert_eq!(draft.text_before_cursor(), "2");
    }

    #[test]
    fn backspace_and_delete_work_on_graphemes() {
        let mut draft = typed("ae\u{301}b");
        assert_eq!(draft.cursor(), 3);
        draft.apply(EditAction::Left);
        draft.apply(EditAction::Backspace);
        assert_eq!(draft.text(), "ab");
        draft.apply(EditAction::Delete);
        assert_eq!(draft.text(), "a");
        draft.apply(EditAction::Delete);
        assert_eq!(draft.text(), "a");
    }

    #[test]
    fn delete_word_backward_skips_trailing_space() {
        let mut draft = typed("\\frac{1}{2} + x  ");
        draft.apply(EditAction::DeleteWordBackward);
        assert_eq!(draft.text(), "\\frac{1}{2} + ");
    }

    #[test]
    fn newlines_become_spaces() {
        let draft = DraftInput::with_text("x = 1\ny = 2");
        assert_eq!(draft.text(), "x = 1 y = 2");
        assert_eq!(draft.cursor(), 11);
        assert_eq!(typed("a\nb").text(), "a b");
    }

    #[test]
    fn cursor_is_clamped() {
        let mut draft = typed("ab");
        draft.apply(EditAction::Right);
        assert_eq!(draft.cursor(), 2);
        draft.apply(EditAction::Clear);
        draft.apply(EditAction::Left);
        assert_eq!(draft.cursor(), 0);
        assert_eq!(draft.text(), "");
    }
}
