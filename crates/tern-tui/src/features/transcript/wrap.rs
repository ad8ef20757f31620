//! Width-aware wrapping for plain and styled text.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::style::{Style, StyledLine, StyledSpan};

/// Wraps text at word boundaries to fit within `width` display columns.
///
/// Whitespace runs collapse to single spaces; words wider than `width` are
/// broken by character. Always returns at least one (possibly empty) line.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if !current.is_empty() && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word_width > width {
            let mut pieces = wrap_chars(word, width);
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current_width = last.width();
                current = last;
            }
        } else {
            current = word.to_string();
            current_width = word_width;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Breaks text at character boundaries into pieces of at most `width` columns.
///
/// Zero-width characters stay attached to the preceding character.
pub(crate) fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width > 0 && current_width + ch_width > width && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }

    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}

/// Width and prefixes for [`wrap_styled_spans`].
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Maximum display width for lines, prefixes included.
    pub width: usize,
    /// Prefix for the first line (e.g. a list bullet).
    pub first_prefix: Vec<StyledSpan>,
    /// Hanging indent for every later line.
    pub rest_prefix: Vec<StyledSpan>,
}

impl WrapOptions {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

fn spans_width(spans: &[StyledSpan]) -> usize {
    spans.iter().map(|s| s.text.width()).sum()
}

/// Accumulates spans into lines, applying the right prefix to each.
struct LineBuilder<'a> {
    opts: &'a WrapOptions,
    lines: Vec<StyledLine>,
    spans: Vec<StyledSpan>,
    used: usize,
    first_avail: usize,
    rest_avail: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(opts: &'a WrapOptions) -> Self {
        Self {
            opts,
            lines: Vec::new(),
            spans: Vec::new(),
            used: 0,
            first_avail: opts.width.saturating_sub(spans_width(&opts.first_prefix)).max(1),
            rest_avail: opts.width.saturating_sub(spans_width(&opts.rest_prefix)).max(1),
        }
    }

    fn avail(&self) -> usize {
        if self.lines.is_empty() {
            self.first_avail
        } else {
            self.rest_avail
        }
    }

    fn remaining(&self) -> usize {
        self.avail().saturating_sub(self.used)
    }

    fn break_line(&mut self) {
        let prefix = if self.lines.is_empty() {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        let mut spans = prefix.clone();
        spans.append(&mut self.spans);
        self.lines.push(StyledLine { spans });
        self.used = 0;
    }

    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.used += text.width();
        // Merge adjacent runs of the same style to keep lines compact.
        if let Some(last) = self.spans.last_mut()
            && last.style == style
        {
            last.text.push_str(text);
        } else {
            self.spans.push(StyledSpan::new(text, style));
        }
    }

    fn push_space(&mut self, style: Style) {
        if self.used > 0 && self.remaining() > 0 {
            self.push(" ", style);
        }
    }

    /// Places a piece that must not be split at word level.
    fn push_unbreakable(&mut self, text: &str, style: Style) {
        let width = text.width();
        if width <= self.remaining() {
            self.push(text, style);
            return;
        }
        if self.used > 0 && width <= self.rest_avail {
            self.break_line();
            self.push(text, style);
            return;
        }
        if self.used > 0 && self.remaining() == 0 {
            self.break_line();
        }
        let first = self.remaining().max(1);
        let mut rest = text;
        let head = take_columns(rest, first);
        self.push(head, style);
        rest = &rest[head.len()..];
        while !rest.is_empty() {
            self.break_line();
            let piece = take_columns(rest, self.avail());
            self.push(piece, style);
            rest = &rest[piece.len()..];
        }
    }

    fn push_words(&mut self, text: &str, style: Style) {
        if text.starts_with(char::is_whitespace) {
            self.push_space(style);
        }
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                if self.used + 1 + word.width() <= self.avail() {
                    self.push(" ", style);
                } else {
                    self.break_line();
                }
            }
            self.push_unbreakable(word, style);
        }
        if text.ends_with(char::is_whitespace) && !text.trim().is_empty() {
            self.push_space(style);
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if !self.spans.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Returns the longest prefix of `text` that fits in `columns` (at least one char).
fn take_columns(text: &str, columns: usize) -> &str {
    let mut used = 0usize;
    let mut end = 0usize;
    for (idx, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if used + w > columns && end > 0 {
            break;
        }
        used += w;
        end = idx + ch.len_utf8();
    }
    &text[..end]
}

/// Breaks `spans` into lines of at most `opts.width` columns, keeping styles.
///
/// Normal text wraps at word boundaries; inline code keeps its whitespace and
/// breaks by character. Newlines inside spans force a line break.
pub fn wrap_styled_spans(spans: &[StyledSpan], opts: &WrapOptions) -> Vec<StyledLine> {
    if opts.width == 0 {
        let mut all = opts.first_prefix.clone();
        all.extend(spans.iter().cloned());
        return vec![StyledLine { spans: all }];
    }

    let mut builder = LineBuilder::new(opts);
    for span in spans {
        for (i, part) in span.text.split('\n').enumerate() {
            if i > 0 {
                builder.break_line();
            }
            if matches!(span.style, Style::CodeInline | Style::CodeBlock) {
                builder.push_unbreakable(part, span.style);
            } else {
                builder.push_words(part, span.style);
            }
        }
    }
    builder.finish()
}

/// Renders `content` with `prefix` on the first line and matching indentation
/// on continuation lines. Blank lines in `content` are preserved.
pub(crate) fn render_prefixed_content(
    prefix: &str,
    content: &str,
    width: usize,
    prefix_style: Style,
    content_style: Style,
) -> Vec<StyledLine> {
    let prefix_width = prefix.width();
    let content_width = width.saturating_sub(prefix_width).max(1);
    let mut lines = Vec::new();

    for paragraph in content.split('\n') {
        for piece in wrap_text(paragraph, content_width) {
            let lead = if lines.is_empty() {
                StyledSpan::new(prefix, prefix_style)
            } else {
                StyledSpan::pad(prefix_width)
            };
            let mut spans = vec![lead];
            if !piece.is_empty() {
                spans.push(StyledSpan::new(piece, content_style));
            }
            lines.push(StyledLine { spans });
        }
    }
    lines
}
