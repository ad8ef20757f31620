//! Input feature reducer.
//!
//! Edits the buffer in place and reports the keys that need the rest of the
//! app (submission and history recall).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::CursorMove;
use super::state::InputState;

/// What a key press asks of the app beyond editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    None,
    /// Enter on non-blank input.
    Submit(String),
    /// Up on the first line.
    HistoryPrev,
    /// Down on the last line.
    HistoryNext,
}

/// Inserts pasted text, dropping control characters other than newlines
/// and expanding tabs.
pub fn handle_paste(input: &mut InputState, text: &str) {
    let cleaned: String = text
        .replace('\t', "    ")
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r'))
        .collect();
    input.textarea.insert_str(&cleaned);
}

/// Applies `key` to the input.
///
/// `can_submit` is false while an exchange is streaming; Enter then does
/// nothing.
pub fn handle_key(input: &mut InputState, key: KeyEvent, can_submit: bool) -> InputAction {
    if key.kind == KeyEventKind::Release {
        return InputAction::None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let buf = &mut input.textarea;

    match key.code {
        KeyCode::Enter if shift || alt => buf.insert_newline(),
        KeyCode::Char('j') if ctrl => buf.insert_newline(),
        KeyCode::Enter => {
            if !can_submit {
                return InputAction::None;
            }
            return input
                .take_submission()
                .map_or(InputAction::None, InputAction::Submit);
        }
        KeyCode::Up if buf.on_first_line() => return InputAction::HistoryPrev,
        KeyCode::Down if buf.on_last_line() => return InputAction::HistoryNext,
        KeyCode::Up => buf.move_cursor(CursorMove::Up),
        KeyCode::Down => buf.move_cursor(CursorMove::Down),
        KeyCode::Char('a') if ctrl => buf.move_cursor(CursorMove::Head),
        KeyCode::Char('e') if ctrl => buf.move_cursor(CursorMove::End),
        KeyCode::Char('k') if ctrl => buf.delete_to_line_end(),
        KeyCode::Char('u') if ctrl => buf.delete_to_line_start(),
        KeyCode::Char('w') if ctrl => buf.delete_word_left(),
        KeyCode::Backspace if alt || ctrl => buf.delete_word_left(),
        KeyCode::Char('b') if alt => buf.move_word_left(),
        KeyCode::Char('f') if alt => buf.move_word_right(),
        KeyCode::Left if alt || ctrl => buf.move_word_left(),
        KeyCode::Right if alt || ctrl => buf.move_word_right(),
        KeyCode::Char(ch) if !ctrl && !alt => buf.insert_char(ch),
        KeyCode::Backspace => buf.delete_prev_char(),
        KeyCode::Delete => buf.delete_next_char(),
        KeyCode::Left => buf.move_cursor(CursorMove::Back),
        KeyCode::Right => buf.move_cursor(CursorMove::Forward),
        KeyCode::Home => buf.move_cursor(CursorMove::Head),
        KeyCode::End => buf.move_cursor(CursorMove::End),
        _ => {}
    }
    InputAction::None
}
