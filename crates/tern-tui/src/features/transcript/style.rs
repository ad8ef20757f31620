use unicode_width::UnicodeWidthStr;

/// A styled span of text (UI-agnostic).
///
/// Converted to ratatui spans by the theme at draw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Run of spaces used for padding and indentation.
    pub fn pad(width: usize) -> Self {
        Self::new(" ".repeat(width), Style::Plain)
    }
}

/// A line of styled spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_spans(spans: Vec<StyledSpan>) -> Self {
        Self { spans }
    }

    pub fn single(text: impl Into<String>, style: Style) -> Self {
        Self {
            spans: vec![StyledSpan::new(text, style)],
        }
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.width()).sum()
    }

    /// Text content with styling dropped.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Returns the line with `spans` prepended.
    #[must_use]
    pub fn prefixed(mut self, prefix: &[StyledSpan]) -> Self {
        let mut spans = prefix.to_vec();
        spans.append(&mut self.spans);
        self.spans = spans;
        self
    }
}

/// Semantic style identifiers (UI-agnostic).
///
/// The theme decides what each one looks like; the transcript only says
/// what a piece of text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// No styling.
    Plain,
    /// Submitted prompt text.
    Prompt,
    /// Answer text.
    Response,
    /// "Thinking" label above reasoning.
    ThinkingLabel,
    /// Reasoning text.
    Thinking,
    /// "Error:" label.
    ErrorLabel,
    /// Error text.
    Error,

    // Markdown styles
    /// Inline code (`code`).
    CodeInline,
    /// Fenced code block content.
    CodeBlock,
    /// Code fence markers.
    CodeFence,
    /// *italic*
    Emphasis,
    /// **bold**
    Strong,
    /// # Heading
    H1,
    /// ## Heading
    H2,
    /// ### Heading and deeper
    H3,
    Link,
    BlockQuote,
    /// List bullet or number.
    ListMarker,
    /// Horizontal rule.
    Rule,
    /// Table borders and cells.
    Table,
}

impl Style {
    /// All styles, in theme-file order.
    pub const ALL: [Style; 20] = [
        Style::Plain,
        Style::Prompt,
        Style::Response,
        Style::ThinkingLabel,
        Style::Thinking,
        Style::ErrorLabel,
        Style::Error,
        Style::CodeInline,
        Style::CodeBlock,
        Style::CodeFence,
        Style::Emphasis,
        Style::Strong,
        Style::H1,
        Style::H2,
        Style::H3,
        Style::Link,
        Style::BlockQuote,
        Style::ListMarker,
        Style::Rule,
        Style::Table,
    ];

    /// Key used in theme files.
    pub fn key(self) -> &'static str {
        match self {
            Style::Plain => "plain",
            Style::Prompt => "prompt",
            Style::Response => "response",
            Style::ThinkingLabel => "thinking_label",
            Style::Thinking => "thinking",
            Style::ErrorLabel => "error_label",
            Style::Error => "error",
            Style::CodeInline => "code_inline",
            Style::CodeBlock => "code_block",
            Style::CodeFence => "code_fence",
            Style::Emphasis => "emphasis",
            Style::Strong => "strong",
            Style::H1 => "h1",
            Style::H2 => "h2",
            Style::H3 => "h3",
            Style::Link => "link",
            Style::BlockQuote => "block_quote",
            Style::ListMarker => "list_marker",
            Style::Rule => "rule",
            Style::Table => "table",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}
