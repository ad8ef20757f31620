//! Reducer: applies events to [`AppState`] and returns effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::input::{InputAction, handle_key, handle_paste};
use crate::state::{AppState, Focus};

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: usize = 3;

pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Terminal(Event::Key(key)) => handle_key_event(state, key),
        UiEvent::Terminal(Event::Paste(text)) => {
            state.focus = Focus::Input;
            handle_paste(&mut state.input, &text);
            Vec::new()
        }
        UiEvent::Terminal(Event::Mouse(mouse)) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => state.scroll.scroll_up(WHEEL_LINES),
                MouseEventKind::ScrollDown => state.scroll.scroll_down(WHEEL_LINES),
                _ => {}
            }
            Vec::new()
        }
        UiEvent::Terminal(_) => Vec::new(),
        UiEvent::Chunk(chunk) => {
            state.transcript.push_chunk(&chunk);
            Vec::new()
        }
        UiEvent::StreamClosed => match state.transcript.add_response() {
            Ok(entry) => {
                tracing::info!(
                    response_bytes = entry.response.len(),
                    reasoning_bytes = entry.reasoning.len(),
                    failed = !entry.error.is_empty(),
                    "exchange completed"
                );
                vec![UiEffect::FinishExchange {
                    response: entry.response.clone(),
                }]
            }
            Err(e) => {
                tracing::warn!(error = %e, "stream closed without a pending prompt");
                Vec::new()
            }
        },
        UiEvent::Tick => {
            if state.is_streaming() {
                state.spinner_frame = state.spinner_frame.wrapping_add(1);
            }
            Vec::new()
        }
    }
}

/// Starts an exchange for `prompt` as if the user had typed and sent it.
pub fn submit(state: &mut AppState, prompt: String) -> Vec<UiEffect> {
    if let Err(e) = state.transcript.add_prompt(prompt.clone()) {
        tracing::warn!(error = %e, "prompt rejected");
        return Vec::new();
    }
    state.transcript.reset_history();
    state.scroll.to_bottom();
    vec![UiEffect::StartExchange { prompt }]
}

fn handle_key_event(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.kind == KeyEventKind::Release {
        return Vec::new();
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('d') if ctrl => {
            state.should_quit = true;
            return Vec::new();
        }
        KeyCode::Char('c') if ctrl => return clear_or_quit(state),
        KeyCode::Esc => {
            state.focus = state.focus.toggled();
            return Vec::new();
        }
        KeyCode::PageUp => {
            state.scroll.scroll_up(state.scroll.page());
            return Vec::new();
        }
        KeyCode::PageDown => {
            state.scroll.scroll_down(state.scroll.page());
            return Vec::new();
        }
        _ => {}
    }

    match state.focus {
        Focus::Input => handle_input_key(state, key),
        Focus::Transcript => {
            handle_transcript_key(state, key);
            Vec::new()
        }
    }
}

fn clear_or_quit(state: &mut AppState) -> Vec<UiEffect> {
    if state.is_streaming() {
        return Vec::new();
    }
    if state.transcript.is_empty() && state.input.textarea.is_empty() {
        state.should_quit = true;
        return Vec::new();
    }
    state.transcript.clear();
    state.input.textarea.clear();
    state.scroll.to_bottom();
    tracing::info!("transcript cleared");
    vec![UiEffect::ClearHistory]
}

fn handle_input_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let can_submit = !state.is_streaming();
    match handle_key(&mut state.input, key, can_submit) {
        InputAction::None => Vec::new(),
        InputAction::Submit(prompt) => submit(state, prompt),
        InputAction::HistoryPrev => {
            if let Some(text) = state.transcript.history_prev(&state.input.text()) {
                state.input.set_text(&text);
            }
            Vec::new()
        }
        InputAction::HistoryNext => {
            if let Some(text) = state.transcript.history_next(&state.input.text()) {
                state.input.set_text(&text);
            }
            Vec::new()
        }
    }
}

fn handle_transcript_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => state.scroll.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => state.scroll.scroll_down(1),
        KeyCode::Home | KeyCode::Char('g') => state.scroll.to_top(),
        KeyCode::End | KeyCode::Char('G') => state.scroll.to_bottom(),
        KeyCode::Enter | KeyCode::Tab => state.focus = Focus::Input,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use tern_core::chunk::StreamChunk;

    use super::*;
    use crate::features::transcript::RenderConfig;
    use crate::theme::Theme;

    fn app() -> AppState {
        AppState::new(
            Theme::resolve("plain").unwrap(),
            RenderConfig::default(),
            "echo",
        )
    }

    fn press(state: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
        update(
            state,
            UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn ctrl(state: &mut AppState, ch: char) -> Vec<UiEffect> {
        update(
            state,
            UiEvent::Terminal(Event::Key(KeyEvent::new(
                KeyCode::Char(ch),
                KeyModifiers::CONTROL,
            ))),
        )
    }

    fn type_str(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            press(state, KeyCode::Char(ch));
        }
    }

    fn complete(state: &mut AppState, chunks: &[StreamChunk]) -> Vec<UiEffect> {
        for chunk in chunks {
            update(state, UiEvent::Chunk(chunk.clone()));
        }
        update(state, UiEvent::StreamClosed)
    }

    #[test]
    fn test_submit_starts_exchange() {
        let mut state = app();
        type_str(&mut state, "hello");
        let effects = press(&mut state, KeyCode::Enter);

        assert_eq!(
            effects,
            vec![UiEffect::StartExchange {
                prompt: "hello".into()
            }]
        );
        assert!(state.is_streaming());
        assert!(state.input.textarea.is_empty());
    }

    #[test]
    fn test_enter_ignored_while_streaming() {
        let mut state = app();
        type_str(&mut state, "one");
        press(&mut state, KeyCode::Enter);
        type_str(&mut state, "two");

        assert!(press(&mut state, KeyCode::Enter).is_empty());
        assert_eq!(state.transcript.entry_count(), 1);
        assert_eq!(state.input.text(), "two");
    }

    #[test]
    fn test_close_completes_entry() {
        let mut state = app();
        type_str(&mut state, "hello");
        press(&mut state, KeyCode::Enter);

        let effects = complete(
            &mut state,
            &[
                StreamChunk::reasoning("thinking..."),
                StreamChunk::response("Hi"),
                StreamChunk::error("late failure"),
                StreamChunk::response(" there"),
            ],
        );
        assert_eq!(
            effects,
            vec![UiEffect::FinishExchange {
                response: "Hi there".into()
            }]
        );
        assert!(!state.is_streaming());
        assert_eq!(state.transcript.entries()[0].error, "late failure");
    }

    #[test]
    fn test_history_recall_keeps_draft() {
        let mut state = app();
        for prompt in ["first", "second"] {
            type_str(&mut state, prompt);
            press(&mut state, KeyCode::Enter);
            complete(&mut state, &[StreamChunk::response("ok")]);
        }

        type_str(&mut state, "draft");
        press(&mut state, KeyCode::Up);
        assert_eq!(state.input.text(), "second");
        press(&mut state, KeyCode::Up);
        assert_eq!(state.input.text(), "first");
        press(&mut state, KeyCode::Down);
        press(&mut state, KeyCode::Down);
        assert_eq!(state.input.text(), "draft");
    }

    #[test]
    fn test_ctrl_c_clears_then_quits() {
        let mut state = app();
        type_str(&mut state, "hello");
        press(&mut state, KeyCode::Enter);
        assert!(ctrl(&mut state, 'c').is_empty());
        assert_eq!(state.transcript.entry_count(), 1);

        complete(&mut state, &[StreamChunk::response("hi")]);
        assert_eq!(ctrl(&mut state, 'c'), vec![UiEffect::ClearHistory]);
        assert_eq!(state.transcript.entry_count(), 0);
        assert!(!state.should_quit);

        ctrl(&mut state, 'c');
        assert!(state.should_quit);
    }

    #[test]
    fn test_esc_toggles_focus_and_arrows_scroll() {
        let mut state = app();
        state.scroll.layout(100, 10);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.focus, Focus::Transcript);

        press(&mut state, KeyCode::Up);
        assert!(!state.scroll.is_following());
        press(&mut state, KeyCode::End);
        assert!(state.scroll.is_following());

        press(&mut state, KeyCode::Esc);
        assert_eq!(state.focus, Focus::Input);
    }

    #[test]
    fn test_ctrl_d_quits() {
        let mut state = app();
        ctrl(&mut state, 'd');
        assert!(state.should_quit);
    }
}
