//! Turns entries into styled lines.

use unicode_width::UnicodeWidthStr;

use super::accumulator::{Preview, StreamAccumulator};
use super::entry::Entry;
use super::markdown::{MarkdownRenderer, MarkdownStyle};
use super::style::{Style, StyledLine, StyledSpan};
use super::wrap::{WrapOptions, render_prefixed_content, wrap_styled_spans, wrap_text};

const ERROR_PREFIX: &str = "Error: ";
const THINKING_LABEL: &str = "Thinking";

/// Layout constants for the transcript, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Prompt bubbles take at most `numerator / denominator` of the width.
    pub prompt_width_ratio: (usize, usize),
    /// Columns left blank on each side.
    pub h_padding: usize,
    /// Blank lines above and below each prompt.
    pub prompt_v_padding: usize,
    /// Include reasoning in completed entries.
    pub show_reasoning: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            prompt_width_ratio: (6, 7),
            h_padding: 1,
            prompt_v_padding: 1,
            show_reasoning: false,
        }
    }
}

impl RenderConfig {
    fn content_width(&self, width: usize) -> usize {
        width.saturating_sub(self.h_padding * 2)
    }

    fn prompt_width(&self, width: usize) -> usize {
        let (num, den) = self.prompt_width_ratio;
        (width * num / den.max(1))
            .saturating_sub(self.h_padding * 2)
            .max(1)
    }
}

/// Renders entries and the live tail with a shared markdown renderer.
#[derive(Debug)]
pub struct EntryPainter {
    markdown: MarkdownRenderer,
    config: RenderConfig,
}

impl EntryPainter {
    pub fn new(markdown: MarkdownStyle, config: RenderConfig) -> Self {
        Self {
            markdown: MarkdownRenderer::new(markdown),
            config,
        }
    }

    /// Appends the lines for a completed entry.
    pub fn paint_entry(&mut self, entry: &Entry, width: usize, out: &mut Vec<StyledLine>) {
        self.markdown.set_width(self.config.content_width(width));
        self.paint_prompt(&entry.prompt, width, out);
        if self.config.show_reasoning {
            self.paint_thinking(&entry.reasoning, width, out);
        }
        self.paint_response(&entry.response, width, out);
        self.paint_error(&entry.error, width, out);
    }

    /// Lines for the in-flight entry and whatever has streamed so far.
    pub fn paint_live(
        &mut self,
        prompt: &str,
        stream: &StreamAccumulator,
        width: usize,
    ) -> Vec<StyledLine> {
        let mut out = Vec::new();
        self.paint_prompt(prompt, width, &mut out);
        match stream.preview() {
            Preview::Response(text) => self.paint_response(text, width, &mut out),
            Preview::Reasoning(text) => self.paint_thinking(text, width, &mut out),
        }
        self.paint_error(stream.error(), width, &mut out);
        out
    }

    fn paint_prompt(&self, prompt: &str, width: usize, out: &mut Vec<StyledLine>) {
        if prompt.is_empty() {
            return;
        }
        let v_pad = self.config.prompt_v_padding;
        let lines: Vec<String> = prompt
            .lines()
            .flat_map(|line| wrap_text(line, self.config.prompt_width(width)))
            .collect();
        let block_width = lines.iter().map(|l| l.width()).max().unwrap_or(0);
        let left = width
            .saturating_sub(self.config.h_padding)
            .saturating_sub(block_width);

        out.extend(std::iter::repeat_with(StyledLine::empty).take(v_pad));
        for line in lines {
            let fill = block_width - line.width();
            let mut text = line;
            text.push_str(&" ".repeat(fill));
            out.push(StyledLine::from_spans(vec![
                StyledSpan::pad(left),
                StyledSpan::new(text, Style::Prompt),
            ]));
        }
        out.extend(std::iter::repeat_with(StyledLine::empty).take(v_pad));
    }

    fn paint_thinking(&mut self, reasoning: &str, width: usize, out: &mut Vec<StyledLine>) {
        if reasoning.is_empty() {
            return;
        }
        let pad = [StyledSpan::pad(self.config.h_padding)];
        out.push(StyledLine::single(THINKING_LABEL, Style::ThinkingLabel).prefixed(&pad));
        let content_width = self.config.content_width(width);
        for mut line in fit(self.markdown.render(reasoning, content_width), content_width) {
            for span in &mut line.spans {
                if matches!(span.style, Style::Response | Style::Plain) {
                    span.style = Style::Thinking;
                }
            }
            out.push(line.prefixed(&pad));
        }
        out.push(StyledLine::empty());
    }

    fn paint_response(&mut self, response: &str, width: usize, out: &mut Vec<StyledLine>) {
        if response.is_empty() {
            return;
        }
        let pad = [StyledSpan::pad(self.config.h_padding)];
        let content_width = self.config.content_width(width);
        let lines = fit(self.markdown.render(response, content_width), content_width);
        out.extend(lines.into_iter().map(|line| line.prefixed(&pad)));
        out.push(StyledLine::empty());
    }

    fn paint_error(&self, error: &str, width: usize, out: &mut Vec<StyledLine>) {
        if error.is_empty() {
            return;
        }
        let pad = [StyledSpan::pad(self.config.h_padding)];
        let lines = render_prefixed_content(
            ERROR_PREFIX,
            error,
            self.config.content_width(width),
            Style::ErrorLabel,
            Style::Error,
        );
        out.extend(lines.into_iter().map(|line| line.prefixed(&pad)));
        out.push(StyledLine::empty());
    }
}

/// Re-wraps lines wider than `width`. Only the raw markdown fallback
/// produces them.
fn fit(lines: Vec<StyledLine>, width: usize) -> Vec<StyledLine> {
    if width == 0 {
        return lines;
    }
    let opts = WrapOptions::new(width);
    lines
        .into_iter()
        .flat_map(|line| {
            if line.width() <= width {
                vec![line]
            } else {
                wrap_styled_spans(&line.spans, &opts)
            }
        })
        .collect()
}
