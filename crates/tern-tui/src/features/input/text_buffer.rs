//! Multi-line prompt editor.
//!
//! Lines are stored separately with a (row, col) cursor counted in chars.

/// Cursor movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Forward,
    Back,
    Head,
    End,
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }
}

impl TextBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor position as (row, col) in char units.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn on_first_line(&self) -> bool {
        self.row == 0
    }

    pub fn on_last_line(&self) -> bool {
        self.row + 1 >= self.lines.len()
    }

    /// Full contents joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(String::is_empty)
    }

    /// Replaces the contents and puts the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = self.lines.len() - 1;
        self.col = char_len(&self.lines[self.row]);
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// Inserts text at the cursor, which ends up after it. `\r\n` and `\r`
    /// count as newlines.
    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let line = &self.lines[self.row];
        let split = byte_index(line, self.col);
        let suffix = line[split..].to_string();

        let mut parts = normalized.split('\n');
        let first = parts.next().unwrap_or_default();
        let line = &mut self.lines[self.row];
        line.truncate(split);
        line.push_str(first);

        let mut inserted: Vec<String> = parts.map(str::to_string).collect();
        if inserted.is_empty() {
            self.col += char_len(first);
            self.lines[self.row].push_str(&suffix);
            return;
        }

        let new_row = self.row + inserted.len();
        let last_len = inserted.last().map_or(0, |s| char_len(s));
        if let Some(last) = inserted.last_mut() {
            last.push_str(&suffix);
        }
        self.lines.splice(self.row + 1..self.row + 1, inserted);
        self.row = new_row;
        self.col = last_len;
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buf));
    }

    pub fn insert_newline(&mut self) {
        self.insert_str("\n");
    }

    /// Backspace.
    pub fn delete_prev_char(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            remove_chars(&mut self.lines[self.row], self.col, self.col + 1);
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
            self.lines[self.row].push_str(&current);
        }
    }

    /// Delete.
    pub fn delete_next_char(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            remove_chars(&mut self.lines[self.row], self.col, self.col + 1);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    /// Ctrl+K.
    pub fn delete_to_line_end(&mut self) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.truncate(at);
    }

    /// Ctrl+U.
    pub fn delete_to_line_start(&mut self) {
        remove_chars(&mut self.lines[self.row], 0, self.col);
        self.col = 0;
    }

    /// Ctrl+W. Removes one run of word chars, punctuation or whitespace,
    /// joining with the previous line when at column zero.
    pub fn delete_word_left(&mut self) {
        if self.col == 0 {
            self.delete_prev_char();
            return;
        }
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        let start = scan_left(&chars, self.col);
        remove_chars(&mut self.lines[self.row], start, self.col);
        self.col = start;
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        match movement {
            CursorMove::Up if self.row > 0 => {
                self.row -= 1;
                self.clamp_col();
            }
            CursorMove::Down if self.row + 1 < self.lines.len() => {
                self.row += 1;
                self.clamp_col();
            }
            CursorMove::Forward => {
                if self.col < char_len(&self.lines[self.row]) {
                    self.col += 1;
                } else if self.row + 1 < self.lines.len() {
                    self.row += 1;
                    self.col = 0;
                }
            }
            CursorMove::Back => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = char_len(&self.lines[self.row]);
                }
            }
            CursorMove::Head => self.col = 0,
            CursorMove::End => self.col = char_len(&self.lines[self.row]),
            CursorMove::Up | CursorMove::Down => {}
        }
    }

    pub fn move_word_left(&mut self) {
        if self.col == 0 {
            self.move_cursor(CursorMove::Back);
            return;
        }
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        self.col = scan_left(&chars, self.col);
    }

    pub fn move_word_right(&mut self) {
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        if self.col >= chars.len() {
            self.move_cursor(CursorMove::Forward);
            return;
        }
        self.col = scan_right(&chars, self.col);
    }

    fn clamp_col(&mut self) {
        self.col = self.col.min(char_len(&self.lines[self.row]));
    }
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

fn remove_chars(line: &mut String, start: usize, end: usize) {
    let from = byte_index(line, start);
    let to = byte_index(line, end);
    line.replace_range(from..to, "");
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CharClass {
    Whitespace,
    Word,
    Punct,
}

fn char_class(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn scan_left(chars: &[char], idx: usize) -> usize {
    let mut idx = idx.min(chars.len());
    if idx == 0 {
        return 0;
    }
    let class = char_class(chars[idx - 1]);
    while idx > 0 && char_class(chars[idx - 1]) == class {
        idx -= 1;
    }
    idx
}

fn scan_right(chars: &[char], mut idx: usize) -> usize {
    if idx >= chars.len() {
        return chars.len();
    }
    let class = char_class(chars[idx]);
    while idx < chars.len() && char_class(chars[idx]) == class {
        idx += 1;
    }
    idx
}
