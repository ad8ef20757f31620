//! Transcript feature view.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use super::view::TranscriptView;
use crate::theme::Theme;

/// Draws the slice of `view` starting at line `offset`.
pub fn render_transcript(
    frame: &mut Frame,
    view: &TranscriptView<'_>,
    theme: &Theme,
    area: Rect,
    offset: usize,
) {
    let lines: Vec<Line<'static>> = view
        .window(offset, usize::from(area.height))
        .map(|line| theme.line(line))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
