//! Minimal multi-line text buffer used for the code editor and the runtime
//! inputs box, plus the single-line prompt field.

use serde::{Deserialize, Serialize};

use crate::state::Theme;

pub const WELCOME_CODE: &str =
    "# Welcome to AI IDE\n# Write your Python code here\n\nprint(\"Hello, World!\")\n";

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Options recognized when an editor is created.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorOptions {
    pub language: String,
    pub theme: Theme,
    pub word_wrap: bool,
    pub line_numbers: bool,
    pub minimap: bool,
    pub tab_size: usize,
    #[serde(skip)]
    pub value: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            theme: Theme::Dark,
            word_wrap: true,
            line_numbers: true,
            minimap: true,
            tab_size: 4,
            value: WELCOME_CODE.to_string(),
        }
    }
}

/// The editor widget contract the controller relies on.
pub trait TextEditor {
    fn value(&self) -> String;
    fn set_value(&mut self, text: &str);
    fn set_theme(&mut self, scheme: &str);
}

#[derive(Debug, Clone)]
pub struct EditorBuffer {
    lines: Vec<String>,
    /// (row, column) with the column counted in characters
    cursor: (usize, usize),
    pub scroll: u16,
    pub options: EditorOptions,
    scheme: String,
    /// Cursor position the viewport last scrolled to
    followed: Option<(usize, usize)>,
}

impl EditorBuffer {
    pub fn new(options: EditorOptions) -> Self {
        let scheme = options.theme.editor_scheme().to_string();
        let mut buffer = Self {
            lines: vec![String::new()],
            cursor: (0, 0),
            scroll: 0,
            options,
            scheme,
            followed: None,
        };
        let initial = buffer.options.value.clone();
        buffer.set_value(&initial);
        buffer
    }

    /// A plain buffer without gutter or minimap, for auxiliary text boxes.
    pub fn plain() -> Self {
        Self::new(EditorOptions {
            language: "plaintext".to_string(),
            line_numbers: false,
            minimap: false,
            value: String::new(),
            ..EditorOptions::default()
        })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn insert_char(&mut self, c: char) {
        let (row, col) = self.cursor;
        let line = &mut self.lines[row];
        let byte_pos = char_to_byte_index(line, col);
        line.insert(byte_pos, c);
        self.cursor.1 += 1;
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..self.options.tab_size.max(1) {
            self.insert_char(' ');
        }
    }

    pub fn insert_newline(&mut self) {
        let (row, col) = self.cursor;
        let line = &mut self.lines[row];
        let byte_pos = char_to_byte_index(line, col);
        let rest = line.split_off(byte_pos);
        self.lines.insert(row + 1, rest);
        self.cursor = (row + 1, 0);
    }

    pub fn backspace(&mut self) {
        let (row, col) = self.cursor;
        if col > 0 {
            let line = &mut self.lines[row];
            let byte_pos = char_to_byte_index(line, col - 1);
            line.remove(byte_pos);
            self.cursor.1 -= 1;
        } else if row > 0 {
            let current = self.lines.remove(row);
            let prev = &mut self.lines[row - 1];
            let prev_len = prev.chars().count();
            prev.push_str(&current);
            self.cursor = (row - 1, prev_len);
        }
    }

    pub fn delete(&mut self) {
        let (row, col) = self.cursor;
        let len = self.lines[row].chars().count();
        if col < len {
            let line = &mut self.lines[row];
            let byte_pos = char_to_byte_index(line, col);
            line.remove(byte_pos);
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        let (row, col) = self.cursor;
        if col > 0 {
            self.cursor.1 -= 1;
        } else if row > 0 {
            self.cursor = (row - 1, self.line_len(row - 1));
        }
    }

    pub fn move_right(&mut self) {
        let (row, col) = self.cursor;
        if col < self.line_len(row) {
            self.cursor.1 += 1;
        } else if row + 1 < self.lines.len() {
            self.cursor = (row + 1, 0);
        }
    }

    pub fn move_up(&mut self) {
        let (row, col) = self.cursor;
        if row > 0 {
            self.cursor = (row - 1, col.min(self.line_len(row - 1)));
        }
    }

    pub fn move_down(&mut self) {
        let (row, col) = self.cursor;
        if row + 1 < self.lines.len() {
            self.cursor = (row + 1, col.min(self.line_len(row + 1)));
        }
    }

    pub fn home(&mut self) {
        self.cursor.1 = 0;
    }

    pub fn end(&mut self) {
        self.cursor.1 = self.line_len(self.cursor.0);
    }

    /// Adjusts `scroll` so visual `row` sits inside a viewport of `height` rows.
    pub fn keep_row_visible(&mut self, row: u16, height: u16) {
        if row < self.scroll {
            self.scroll = row;
        } else if height > 0 && row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
    }

    /// Brings visual `row` of the cursor into view, but only when the cursor
    /// moved since the last call; otherwise wheel scrolling is left alone.
    pub fn follow_cursor(&mut self, row: u16, height: u16) {
        if self.followed != Some(self.cursor) {
            self.followed = Some(self.cursor);
            self.keep_row_visible(row, height);
        }
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map(|l| l.chars().count()).unwrap_or(0)
    }
}

impl TextEditor for EditorBuffer {
    fn value(&self) -> String {
        self.lines.join("\n")
    }

    fn set_value(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.cursor = (0, 0);
        self.scroll = 0;
        self.followed = None;
    }

    fn set_theme(&mut self, scheme: &str) {
        self.scheme = scheme.to_string();
    }
}

/// Single-line input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    text: String,
    cursor: usize,
}

impl LineInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}
