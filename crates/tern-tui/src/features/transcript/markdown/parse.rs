use comfy_table::{ContentArrangement, Table};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

use super::{MarkdownStyle, RenderError};
use crate::features::transcript::style::{Style, StyledLine, StyledSpan};
use crate::features::transcript::wrap::{WrapOptions, wrap_styled_spans};

/// Narrowest width the formatter accepts; below it layout degenerates.
pub const MIN_FORMAT_WIDTH: usize = 8;

/// Markdown formatter bound to one width and one set of style knobs.
#[derive(Debug, Clone)]
pub struct Formatter {
    width: usize,
    style: MarkdownStyle,
}

impl Formatter {
    pub(super) fn new(width: usize, style: MarkdownStyle) -> Self {
        Self { width, style }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Formats `text` into wrapped, styled lines with trailing blank lines removed.
    ///
    /// # Errors
    /// Fails when the bound width is outside the supported range.
    pub fn format(&self, text: &str) -> Result<Vec<StyledLine>, RenderError> {
        if self.width < MIN_FORMAT_WIDTH {
            return Err(RenderError::TooNarrow {
                width: self.width,
                min: MIN_FORMAT_WIDTH,
            });
        }
        if u16::try_from(self.width).is_err() {
            return Err(RenderError::TooWide { width: self.width });
        }

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut writer = BlockWriter::new(self.width, &self.style);
        for event in Parser::new_ext(text, options) {
            writer.process_event(event);
        }
        Ok(writer.finish())
    }
}

/// Collects table cells as plain text and lays them out with comfy-table.
#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    in_head: bool,
}

impl TableBuffer {
    fn finish_cell(&mut self) {
        let cell = std::mem::take(&mut self.current_cell);
        self.current_row.push(cell.trim().to_string());
    }

    fn finish_row(&mut self) {
        let row = std::mem::take(&mut self.current_row);
        if self.in_head {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn render(&mut self, width: usize) -> Vec<String> {
        let mut table = Table::new();
        table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if !self.header.is_empty() {
            table.set_header(std::mem::take(&mut self.header));
        }
        for row in self.rows.drain(..) {
            table.add_row(row);
        }
        table.to_string().lines().map(String::from).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct ListLevel {
    /// Next number for ordered lists.
    next_number: Option<u64>,
}

/// Event-driven writer turning pulldown-cmark events into lines.
struct BlockWriter<'a> {
    width: usize,
    style: &'a MarkdownStyle,
    lines: Vec<StyledLine>,
    spans: Vec<StyledSpan>,
    style_stack: Vec<Style>,
    lists: Vec<ListLevel>,
    quote_depth: usize,
    code_block: Option<Option<String>>,
    table: Option<TableBuffer>,
    link_target: Option<String>,
}

impl<'a> BlockWriter<'a> {
    fn new(width: usize, style: &'a MarkdownStyle) -> Self {
        Self {
            width,
            style,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![Style::Response],
            lists: Vec::new(),
            quote_depth: 0,
            code_block: None,
            table: None,
            link_target: None,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or(Style::Response)
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn quote_prefix(&self) -> Vec<StyledSpan> {
        (0..self.quote_depth)
            .map(|_| StyledSpan::new(self.style.quote_prefix.clone(), Style::BlockQuote))
            .collect()
    }

    fn push_line(&mut self, line: StyledLine) {
        let prefix = self.quote_prefix();
        self.lines.push(line.prefixed(&prefix));
    }

    /// Separates blocks; never doubles up and never leads.
    fn blank_line(&mut self) {
        if self.lines.last().is_none_or(|l| l.spans.is_empty()) {
            return;
        }
        self.lines.push(StyledLine::empty());
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.add_inline_code(&code),
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.add_text("\n"),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.spans.push(StyledSpan::new(marker, Style::ListMarker));
            }
            Event::Rule => {
                self.flush_block();
                let rule = self.style.rule.to_string().repeat(self.width);
                self.push_line(StyledLine::single(rule, Style::Rule));
                self.blank_line();
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.spans.push(StyledSpan::new(math.to_string(), Style::CodeInline));
            }
            // Raw HTML is dropped so it cannot inject terminal sequences.
            Event::Html(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_block();
                self.style_stack.push(match level {
                    HeadingLevel::H1 => Style::H1,
                    HeadingLevel::H2 => Style::H2,
                    _ => Style::H3,
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_block();
                self.code_block = Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                });
            }
            Tag::List(start) => {
                self.flush_list_item();
                self.lists.push(ListLevel { next_number: start });
            }
            Tag::Item => self.flush_list_item(),
            Tag::BlockQuote(_) => {
                self.flush_block();
                self.quote_depth += 1;
                self.style_stack.push(Style::BlockQuote);
            }
            Tag::Emphasis => self.style_stack.push(Style::Emphasis),
            Tag::Strong => self.style_stack.push(Style::Strong),
            Tag::Strikethrough | Tag::Superscript | Tag::Subscript => {
                self.style_stack.push(self.current_style());
            }
            Tag::Link { dest_url, .. } => {
                self.style_stack.push(Style::Link);
                self.link_target = Some(dest_url.to_string());
            }
            Tag::Table(_) => {
                self.flush_block();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.current_cell.clear();
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.flush_paragraph();
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_block();
                self.pop_style();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.code_block = None;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_list_item();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush_list_item();
                if let Some(level) = self.lists.last_mut()
                    && let Some(n) = level.next_number.as_mut()
                {
                    *n += 1;
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_block();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::Link => {
                self.pop_style();
                if let Some(target) = self.link_target.take()
                    && !target.is_empty()
                    && !self.spans.iter().any(|s| s.text == target)
                {
                    self.spans
                        .push(StyledSpan::new(format!(" ({target})"), Style::Link));
                }
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript => self.pop_style(),
            TagEnd::Table => {
                if let Some(mut table) = self.table.take() {
                    for line in table.render(self.width) {
                        self.push_line(StyledLine::single(line, Style::Table));
                    }
                }
                self.blank_line();
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut()
                    && !table.in_head
                {
                    table.finish_row();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                }
            }
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(&text.replace('\n', " "));
            return;
        }
        let style = if self.code_block.is_some() {
            Style::CodeBlock
        } else {
            self.current_style()
        };
        self.spans.push(StyledSpan::new(text, style));
    }

    fn add_inline_code(&mut self, code: &str) {
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(&code.replace('\n', " "));
            return;
        }
        self.spans.push(StyledSpan::new(code, Style::CodeInline));
    }

    fn content_width(&self) -> usize {
        self.width
            .saturating_sub(self.quote_depth * self.style.quote_prefix.width())
    }

    /// Flushes pending inline content as a list item or a paragraph.
    fn flush_block(&mut self) {
        if self.lists.is_empty() {
            self.flush_paragraph();
        } else {
            self.flush_list_item();
        }
    }

    fn flush_paragraph(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        for line in wrap_styled_spans(&spans, &WrapOptions::new(self.content_width())) {
            self.push_line(line);
        }
    }

    fn flush_code_block(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        let text: String = spans.iter().map(|s| s.text.as_str()).collect();
        let lang = self.code_block.clone().flatten().unwrap_or_default();

        if self.style.code_fences {
            self.push_line(StyledLine::single(format!("```{lang}"), Style::CodeFence));
        }
        let indent = StyledSpan::pad(self.style.code_indent);
        for line in text.trim_end_matches('\n').split('\n') {
            let line = line.replace('\t', "    ");
            self.push_line(StyledLine::from_spans(vec![
                indent.clone(),
                StyledSpan::new(line, Style::CodeBlock),
            ]));
        }
        if self.style.code_fences {
            self.push_line(StyledLine::single("```", Style::CodeFence));
        }
    }

    fn flush_list_item(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);

        let (marker, indent_level) = match self.lists.last() {
            Some(level) => (
                level
                    .next_number
                    .map_or_else(|| format!("{} ", self.style.bullet), |n| format!("{n}. ")),
                self.lists.len() - 1,
            ),
            None => (format!("{} ", self.style.bullet), 0),
        };
        let indent = "  ".repeat(indent_level);
        let opts = WrapOptions {
            width: self.content_width(),
            first_prefix: vec![
                StyledSpan::pad(indent.len()),
                StyledSpan::new(marker.clone(), Style::ListMarker),
            ],
            rest_prefix: vec![StyledSpan::pad(indent.len() + marker.width())],
        };
        for line in wrap_styled_spans(&spans, &opts) {
            self.push_line(line);
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if self.code_block.is_some() {
            self.flush_code_block();
        } else {
            self.flush_block();
        }
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
