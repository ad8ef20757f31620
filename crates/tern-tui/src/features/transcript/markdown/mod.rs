//! Markdown rendering for responses and reasoning.
//!
//! [`MarkdownRenderer`] owns a single width-bound [`Formatter`] and rebuilds it
//! only when asked for a different width. Formatting failures never surface:
//! the input comes back as plain lines instead.

mod parse;

use std::fmt;

pub use parse::{Formatter, MIN_FORMAT_WIDTH};
use serde::Deserialize;

use super::style::{Style, StyledLine};

/// Theme-controlled knobs for markdown layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkdownStyle {
    /// Marker for unordered list items.
    pub bullet: String,
    /// Character repeated for horizontal rules.
    pub rule: char,
    /// Prefix repeated per blockquote level.
    pub quote_prefix: String,
    /// Columns of indentation for code block lines.
    pub code_indent: usize,
    /// Show the ``` fence lines around code blocks.
    pub code_fences: bool,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            bullet: "•".to_string(),
            rule: '─',
            quote_prefix: "│ ".to_string(),
            code_indent: 2,
            code_fences: true,
        }
    }
}

/// Why a formatter could not lay out text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    TooNarrow { width: usize, min: usize },
    TooWide { width: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TooNarrow { width, min } => {
                write!(f, "width {width} is below the minimum of {min}")
            }
            RenderError::TooWide { width } => write!(f, "width {width} is too large"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Width-memoized markdown renderer.
#[derive(Debug)]
pub struct MarkdownRenderer {
    style: MarkdownStyle,
    built: Option<Formatter>,
    builds: usize,
}

impl MarkdownRenderer {
    pub fn new(style: MarkdownStyle) -> Self {
        Self {
            style,
            built: None,
            builds: 0,
        }
    }

    /// Makes sure the formatter matches `width`, rebuilding only on change.
    pub fn set_width(&mut self, width: usize) {
        self.get_or_create(width);
    }

    /// Width of the currently built formatter, if any.
    pub fn width(&self) -> Option<usize> {
        self.built.as_ref().map(Formatter::width)
    }

    /// How many formatters have been built so far.
    pub fn build_count(&self) -> usize {
        self.builds
    }

    fn get_or_create(&mut self, width: usize) -> &Formatter {
        if self.built.as_ref().is_some_and(|f| f.width() != width) {
            self.built = None;
        }
        if self.built.is_none() {
            tracing::debug!(width, "building markdown formatter");
            self.builds += 1;
        }
        self.built
            .get_or_insert_with(|| Formatter::new(width, self.style.clone()))
    }

    /// Formats `text` at `width`, falling back to the raw lines on failure.
    pub fn render(&mut self, text: &str, width: usize) -> Vec<StyledLine> {
        match self.get_or_create(width).format(text) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(error = %e, "markdown formatting failed, using raw text");
                raw_lines(text)
            }
        }
    }
}

/// One unstyled line per input line.
fn raw_lines(text: &str) -> Vec<StyledLine> {
    text.lines()
        .map(|line| StyledLine::single(line, Style::Plain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuilds_only_on_width_change() {
        let mut renderer = MarkdownRenderer::new(MarkdownStyle::default());
        assert_eq!(renderer.width(), None);

        renderer.set_width(40);
        renderer.render("one", 40);
        renderer.set_width(40);
        assert_eq!(renderer.build_count(), 1);
        assert_eq!(renderer.width(), Some(40));

        renderer.render("two", 60);
        assert_eq!(renderer.build_count(), 2);
        assert_eq!(renderer.width(), Some(60));
    }

    #[test]
    fn test_failure_returns_input_unmodified() {
        let mut renderer = MarkdownRenderer::new(MarkdownStyle::default());
        let lines = renderer.render("**bold**\nsecond", 0);
        let text: Vec<_> = lines.iter().map(StyledLine::plain_text).collect();
        assert_eq!(text, vec!["**bold**", "second"]);
        assert!(lines.iter().all(|l| l.spans[0].style == Style::Plain));
    }

    #[test]
    fn test_custom_bullet() {
        let style = MarkdownStyle {
            bullet: "-".to_string(),
            ..MarkdownStyle::default()
        };
        let mut renderer = MarkdownRenderer::new(style);
        let lines = renderer.render("- item", 20);
        assert_eq!(lines[0].plain_text(), "- item");
    }
}
