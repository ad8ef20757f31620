//! Prompt input state.

use super::TextBuffer;

#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub textarea: TextBuffer,
}

impl InputState {
    pub fn text(&self) -> String {
        self.textarea.text()
    }

    /// Replaces the contents, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.textarea.set_text(text);
    }

    /// Takes the trimmed contents for submission and clears the editor.
    /// Whitespace-only input is left in place and yields `None`.
    pub fn take_submission(&mut self) -> Option<String> {
        let text = self.textarea.text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let prompt = trimmed.to_string();
        self.textarea.clear();
        Some(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_submission_trims_and_clears() {
        let mut input = InputState::default();
        input.set_text("  hello\n");
        assert_eq!(input.take_submission().as_deref(), Some("hello"));
        assert!(input.textarea.is_empty());
    }

    #[test]
    fn test_blank_submission_ignored() {
        let mut input = InputState::default();
        input.set_text(" \n ");
        assert_eq!(input.take_submission(), None);
        assert_eq!(input.text(), " \n ");
    }
}
