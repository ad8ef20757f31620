//! Application state for the TUI.

use crate::features::input::InputState;
use crate::features::transcript::{RenderConfig, Transcript};
use crate::theme::Theme;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Transcript,
}

impl Focus {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Focus::Input => Focus::Transcript,
            Focus::Transcript => Focus::Input,
        }
    }
}

/// Transcript viewport position.
///
/// Follows the bottom until the user scrolls up; scrolling back down to the
/// end resumes following.
#[derive(Debug, Clone, Copy)]
pub struct ScrollState {
    offset: usize,
    follow: bool,
    max_offset: usize,
    page: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
            max_offset: 0,
            page: 1,
        }
    }
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn scroll_up(&mut self, lines: usize) {
        if self.follow {
            self.offset = self.max_offset;
        }
        self.offset = self.offset.saturating_sub(lines);
        self.follow = self.offset >= self.max_offset;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        if self.follow {
            return;
        }
        self.offset = self.offset.saturating_add(lines);
        if self.offset >= self.max_offset {
            self.to_bottom();
        }
    }

    pub fn to_top(&mut self) {
        self.offset = 0;
        self.follow = self.max_offset == 0;
    }

    pub fn to_bottom(&mut self) {
        self.offset = self.max_offset;
        self.follow = true;
    }

    /// Records the content and viewport size seen at draw time and returns
    /// the first visible line.
    pub fn layout(&mut self, total_lines: usize, height: usize) -> usize {
        self.max_offset = total_lines.saturating_sub(height);
        self.page = height.max(1);
        if self.follow || self.offset > self.max_offset {
            self.offset = self.max_offset;
        }
        self.offset
    }
}

pub struct AppState {
    pub transcript: Transcript,
    pub input: InputState,
    pub scroll: ScrollState,
    pub focus: Focus,
    pub theme: Theme,
    pub model_id: String,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(theme: Theme, layout: RenderConfig, model_id: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(theme.markdown.clone(), layout),
            input: InputState::default(),
            scroll: ScrollState::default(),
            focus: Focus::default(),
            theme,
            model_id: model_id.into(),
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.transcript.is_streaming()
    }
}
