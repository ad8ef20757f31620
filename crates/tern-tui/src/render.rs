//! Top-level view.
//!
//! Takes `&mut AppState` because the transcript renders through its cache
//! and the scroll state records the viewport size; nothing else changes.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::features::input::{input_height, render_input};
use crate::features::transcript::render_transcript;
use crate::state::{AppState, Focus};

const HEADER_HEIGHT: u16 = 3;

/// Transcript horizontal margin (each side).
const TRANSCRIPT_MARGIN: u16 = 1;

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

const KEY_HINTS: &str = "enter send · shift+enter newline · esc scroll · ctrl+c clear · ctrl+d quit";

pub fn render(app: &mut AppState, frame: &mut Frame) {
    let area = frame.area();
    let input_rows = input_height(&app.input, area);
    let [header, body, input] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(1),
        Constraint::Length(input_rows),
    ])
    .areas(area);

    render_header(frame, app, header);

    let body = Rect {
        x: body.x + TRANSCRIPT_MARGIN,
        width: body.width.saturating_sub(TRANSCRIPT_MARGIN * 2),
        ..body
    };
    let view = app.transcript.render(usize::from(body.width));
    let offset = app.scroll.layout(view.len(), usize::from(body.height));
    render_transcript(frame, &view, &app.theme, body, offset);

    render_input(
        frame,
        &app.input,
        &app.theme,
        input,
        app.focus == Focus::Input,
    );
}

fn render_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let title = if app.is_streaming() {
        let spinner = SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()];
        format!(" {spinner} streaming ")
    } else {
        " tern ".to_string()
    };
    let model = format!(" {} ", app.model_id);
    let hints = if app.focus == Focus::Transcript {
        "↑/↓ scroll · home/end jump · esc back to input"
    } else {
        KEY_HINTS
    };

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(app.theme.muted())
        .title(Line::from(Span::styled(title, app.theme.accent())))
        .title_top(Line::from(model).right_aligned());

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(hints, app.theme.muted()))).block(block),
        area,
    );
}
