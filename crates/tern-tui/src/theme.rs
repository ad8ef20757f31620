//! Color themes.
//!
//! A theme maps each semantic transcript [`Style`] to a terminal color and
//! carries the markdown layout knobs. Themes are either built in (`dark`,
//! `light`, `plain`) or loaded from a TOML file:
//!
//! ```toml
//! [markdown]
//! bullet = "-"
//! code_fences = false
//!
//! [colors]
//! prompt = "green"
//! code_inline = "#87afff"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use ratatui::style::{Color, Modifier};
use ratatui::text::{Line, Span};
use serde::Deserialize;

use crate::features::transcript::markdown::MarkdownStyle;
use crate::features::transcript::style::{Style, StyledLine};

pub const BUILTIN_THEMES: [&str; 3] = ["dark", "light", "plain"];

#[derive(Debug)]
pub enum ThemeError {
    UnknownBuiltin(String),
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidColor { key: String, value: String },
    UnknownStyleKey(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeError::UnknownBuiltin(name) => write!(
                f,
                "Unknown style '{name}'. Use one of: {} or a path to a theme file",
                BUILTIN_THEMES.join(", ")
            ),
            ThemeError::Read { path, source } => {
                write!(f, "Failed to read theme {}: {source}", path.display())
            }
            ThemeError::Parse { path, source } => {
                write!(f, "Failed to parse theme {}: {source}", path.display())
            }
            ThemeError::InvalidColor { key, value } => {
                write!(f, "Invalid color '{value}' for '{key}'")
            }
            ThemeError::UnknownStyleKey(key) => write!(f, "Unknown theme color key '{key}'"),
        }
    }
}

impl std::error::Error for ThemeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ThemeError::Read { source, .. } => Some(source),
            ThemeError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeFile {
    markdown: MarkdownStyle,
    colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub markdown: MarkdownStyle,
    colors: HashMap<Style, Color>,
}

impl Theme {
    /// Resolves a style id: a built-in name, or a path to a theme file.
    pub fn resolve(id: &str) -> Result<Self, ThemeError> {
        if let Some(theme) = Self::builtin(id) {
            return Ok(theme);
        }
        let path = Path::new(id);
        if id.contains(std::path::MAIN_SEPARATOR) || id.ends_with(".toml") || path.exists() {
            return Self::load(path);
        }
        Err(ThemeError::UnknownBuiltin(id.to_string()))
    }

    pub fn builtin(name: &str) -> Option<Self> {
        let colors: &[(Style, Color)] = match name {
            "dark" => &[
                (Style::Prompt, Color::Green),
                (Style::Response, Color::White),
                (Style::ThinkingLabel, Color::Magenta),
                (Style::Thinking, Color::DarkGray),
                (Style::ErrorLabel, Color::Red),
                (Style::Error, Color::LightRed),
                (Style::CodeInline, Color::Cyan),
                (Style::CodeBlock, Color::Cyan),
                (Style::CodeFence, Color::DarkGray),
                (Style::H1, Color::LightBlue),
                (Style::H2, Color::LightBlue),
                (Style::H3, Color::White),
                (Style::Link, Color::Cyan),
                (Style::BlockQuote, Color::Green),
                (Style::ListMarker, Color::Yellow),
                (Style::Rule, Color::DarkGray),
                (Style::Table, Color::Gray),
            ],
            "light" => &[
                (Style::Prompt, Color::Blue),
                (Style::Response, Color::Black),
                (Style::ThinkingLabel, Color::Magenta),
                (Style::Thinking, Color::Gray),
                (Style::ErrorLabel, Color::Red),
                (Style::Error, Color::Red),
                (Style::CodeInline, Color::Magenta),
                (Style::CodeBlock, Color::Magenta),
                (Style::CodeFence, Color::Gray),
                (Style::H1, Color::Blue),
                (Style::H2, Color::Blue),
                (Style::H3, Color::Black),
                (Style::Link, Color::Blue),
                (Style::BlockQuote, Color::DarkGray),
                (Style::ListMarker, Color::Red),
                (Style::Rule, Color::Gray),
                (Style::Table, Color::DarkGray),
            ],
            "plain" => &[],
            _ => return None,
        };
        Some(Self {
            name: name.to_string(),
            markdown: MarkdownStyle::default(),
            colors: colors.iter().copied().collect(),
        })
    }

    /// Loads a theme file. Colors left out of the file stay unset.
    pub fn load(path: &Path) -> Result<Self, ThemeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ThemeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ThemeFile = toml::from_str(&contents).map_err(|source| ThemeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut colors = HashMap::new();
        for (key, value) in file.colors {
            let style =
                Style::from_key(&key).ok_or_else(|| ThemeError::UnknownStyleKey(key.clone()))?;
            let color = value
                .parse::<Color>()
                .map_err(|_| ThemeError::InvalidColor { key, value })?;
            colors.insert(style, color);
        }

        tracing::info!(path = %path.display(), "loaded theme");
        Ok(Self {
            name: path.display().to_string(),
            markdown: file.markdown,
            colors,
        })
    }

    pub fn color(&self, style: Style) -> Option<Color> {
        self.colors.get(&style).copied()
    }

    /// Terminal style for a semantic style: the theme's color plus fixed
    /// modifiers.
    pub fn style(&self, style: Style) -> ratatui::style::Style {
        let base = self
            .color(style)
            .map_or_else(ratatui::style::Style::default, |c| {
                ratatui::style::Style::default().fg(c)
            });
        let modifiers = match style {
            Style::Prompt | Style::Strong | Style::H2 | Style::ThinkingLabel | Style::ErrorLabel => {
                Modifier::BOLD
            }
            Style::H1 => Modifier::BOLD | Modifier::UNDERLINED,
            Style::H3 | Style::Emphasis | Style::BlockQuote => Modifier::ITALIC,
            Style::Thinking => Modifier::DIM | Modifier::ITALIC,
            Style::CodeFence | Style::Rule => Modifier::DIM,
            Style::Link => Modifier::UNDERLINED,
            _ => Modifier::empty(),
        };
        base.add_modifier(modifiers)
    }

    /// Borders of focused widgets.
    pub fn accent(&self) -> ratatui::style::Style {
        self.style(Style::Prompt)
    }

    /// Borders and labels of unfocused widgets.
    pub fn muted(&self) -> ratatui::style::Style {
        ratatui::style::Style::default().add_modifier(Modifier::DIM)
    }

    pub fn line(&self, line: &StyledLine) -> Line<'static> {
        line.spans
            .iter()
            .map(|s| Span::styled(s.text.clone(), self.style(s.style)))
            .collect::<Vec<_>>()
            .into()
    }
}
