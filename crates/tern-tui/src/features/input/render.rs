//! Input feature view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::TextBuffer;
use super::state::InputState;
use crate::theme::Theme;

/// Minimum height of the input area, borders included.
const INPUT_HEIGHT_MIN: u16 = 3;

/// Input never takes more than this share of the screen.
const INPUT_HEIGHT_MAX_PERCENT: u16 = 40;

struct Wrapped {
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
}

/// Breaks each logical line by display width, tracking where the cursor
/// lands.
fn wrap_textarea(textarea: &TextBuffer, width: usize) -> Wrapped {
    let width = width.max(1);
    let (cursor_line, cursor_char) = textarea.cursor();
    let mut out = Wrapped {
        lines: Vec::new(),
        cursor_row: 0,
        cursor_col: 0,
    };

    for (idx, line) in textarea.lines().iter().enumerate() {
        let mut current = String::new();
        let mut used = 0usize;
        for (pos, ch) in line.chars().enumerate() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                out.lines.push(std::mem::take(&mut current));
                used = 0;
            }
            if idx == cursor_line && pos == cursor_char {
                out.cursor_row = out.lines.len();
                out.cursor_col = used;
            }
            current.push(ch);
            used += w;
        }
        if idx == cursor_line && cursor_char >= line.chars().count() {
            if used >= width {
                out.lines.push(std::mem::take(&mut current));
                used = 0;
            }
            out.cursor_row = out.lines.len();
            out.cursor_col = used;
        }
        out.lines.push(current);
    }
    out
}

/// Height for the input area given the terminal size.
pub fn input_height(input: &InputState, area: Rect) -> u16 {
    let inner_width = usize::from(area.width.saturating_sub(2));
    let rows = wrap_textarea(&input.textarea, inner_width).lines.len();
    let wanted = u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2);
    let max = (area.height * INPUT_HEIGHT_MAX_PERCENT / 100).max(INPUT_HEIGHT_MIN);
    wanted.clamp(INPUT_HEIGHT_MIN, max)
}

/// Draws the input box and places the terminal cursor when focused.
pub fn render_input(frame: &mut Frame, input: &InputState, theme: &Theme, area: Rect, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme.accent()
        } else {
            theme.muted()
        });
    let inner = block.inner(area);
    let wrapped = wrap_textarea(&input.textarea, usize::from(inner.width));

    let visible = usize::from(inner.height.max(1));
    let scroll = (wrapped.cursor_row + 1).saturating_sub(visible);
    let lines: Vec<Line> = wrapped
        .lines
        .into_iter()
        .skip(scroll)
        .take(visible)
        .map(Line::from)
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if focused {
        let row = u16::try_from(wrapped.cursor_row - scroll).unwrap_or(0);
        let col = u16::try_from(wrapped.cursor_col).unwrap_or(0);
        frame.set_cursor_position(Position::new(
            inner.x.saturating_add(col),
            inner.y.saturating_add(row),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> TextBuffer {
        let mut buf = TextBuffer::default();
        buf.set_text(text);
        buf
    }

    #[test]
    fn test_wrap_tracks_cursor_at_end() {
        let wrapped = wrap_textarea(&buffer("abcdef"), 4);
        assert_eq!(wrapped.lines, vec!["abcd", "ef"]);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 2));
    }

    #[test]
    fn test_cursor_wraps_when_line_is_full() {
        let wrapped = wrap_textarea(&buffer("abcd"), 4);
        assert_eq!(wrapped.lines, vec!["abcd", ""]);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 0));
    }

    #[test]
    fn test_wide_chars_wrap_by_width() {
        let wrapped = wrap_textarea(&buffer("你好世"), 4);
        assert_eq!(wrapped.lines, vec!["你好", "世"]);
    }

    #[test]
    fn test_height_grows_then_caps() {
        let area = Rect::new(0, 0, 20, 20);
        let mut input = InputState::default();
        assert_eq!(input_height(&input, area), 3);

        input.set_text("a\nb\nc");
        assert_eq!(input_height(&input, area), 5);

        input.set_text(&"line\n".repeat(30));
        assert_eq!(input_height(&input, area), 8);
    }
}
