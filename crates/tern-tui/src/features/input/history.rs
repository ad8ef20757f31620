//! Shell-style recall of submitted prompts.
//!
//! Walking back through history keeps whatever the user typed: the unsent
//! text at the tip is saved on the first step back, and edits made while
//! viewing an older prompt shadow it until the next submission.

use std::collections::HashMap;

/// Read-only access to submitted prompts, oldest first.
pub trait PromptHistory {
    fn prompt_count(&self) -> usize;
    fn prompt(&self, index: usize) -> Option<&str>;
}

impl PromptHistory for [String] {
    fn prompt_count(&self) -> usize {
        self.len()
    }

    fn prompt(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Composing a new prompt.
    #[default]
    AtTip,
    /// Showing the prompt at this index.
    Viewing(usize),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryTraverser {
    cursor: Cursor,
    tip: String,
    edits: HashMap<usize, String>,
}

impl HistoryTraverser {
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_browsing(&self) -> bool {
        matches!(self.cursor, Cursor::Viewing(_))
    }

    /// Steps to the previous prompt. Returns the text to show, or `None`
    /// when already at the oldest prompt or the history is empty.
    pub fn prev<H>(&mut self, history: &H, visible: &str) -> Option<String>
    where
        H: PromptHistory + ?Sized,
    {
        let count = history.prompt_count();
        if count == 0 {
            return None;
        }
        self.drop_stale(count);

        let target = match self.cursor {
            Cursor::AtTip => {
                visible.clone_into(&mut self.tip);
                count - 1
            }
            Cursor::Viewing(0) => return None,
            Cursor::Viewing(index) => {
                self.record(history, index, visible);
                index - 1
            }
        };
        self.cursor = Cursor::Viewing(target);
        self.text_at(history, target)
    }

    /// Steps toward the tip. Returns the text to show, or `None` when
    /// already at the tip.
    pub fn next<H>(&mut self, history: &H, visible: &str) -> Option<String>
    where
        H: PromptHistory + ?Sized,
    {
        let count = history.prompt_count();
        self.drop_stale(count);

        let Cursor::Viewing(index) = self.cursor else {
            return None;
        };
        self.record(history, index, visible);
        if index + 1 >= count {
            self.cursor = Cursor::AtTip;
            return Some(std::mem::take(&mut self.tip));
        }
        self.cursor = Cursor::Viewing(index + 1);
        self.text_at(history, index + 1)
    }

    /// Forgets the traversal session. Call after each submission.
    pub fn reset(&mut self) {
        self.cursor = Cursor::AtTip;
        self.tip.clear();
        self.edits.clear();
    }

    fn drop_stale(&mut self, count: usize) {
        if matches!(self.cursor, Cursor::Viewing(i) if i >= count) {
            tracing::debug!(count, "history shrank under the cursor, resetting");
            self.reset();
        }
    }

    fn record<H>(&mut self, history: &H, index: usize, visible: &str)
    where
        H: PromptHistory + ?Sized,
    {
        if history.prompt(index) == Some(visible) {
            self.edits.remove(&index);
        } else {
            self.edits.insert(index, visible.to_string());
        }
    }

    fn text_at<H>(&self, history: &H, index: usize) -> Option<String>
    where
        H: PromptHistory + ?Sized,
    {
        self.edits
            .get(&index)
            .map(String::as_str)
            .or_else(|| history.prompt(index))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_history_is_noop() {
        let history: Vec<String> = Vec::new();
        let mut t = HistoryTraverser::default();
        assert_eq!(t.prev(history.as_slice(), "draft"), None);
        assert_eq!(t.next(history.as_slice(), "draft"), None);
        assert_eq!(t.cursor(), Cursor::AtTip);
    }

    #[test]
    fn test_walks_back_and_stops_at_oldest() {
        let history = prompts(&["one", "two"]);
        let h = history.as_slice();
        let mut t = HistoryTraverser::default();

        assert_eq!(t.prev(h, "").as_deref(), Some("two"));
        assert_eq!(t.prev(h, "two").as_deref(), Some("one"));
        assert_eq!(t.prev(h, "one"), None);
        assert_eq!(t.cursor(), Cursor::Viewing(0));
    }

    #[test]
    fn test_next_at_tip_is_noop() {
        let history = prompts(&["one"]);
        let mut t = HistoryTraverser::default();
        assert_eq!(t.next(history.as_slice(), "draft"), None);
        assert!(!t.is_browsing());
    }

    #[test]
    fn test_round_trip_restores_tip() {
        let history = prompts(&["a", "b", "c"]);
        let h = history.as_slice();
        let mut t = HistoryTraverser::default();

        let mut visible = "my draft".to_string();
        for _ in 0..3 {
            visible = t.prev(h, &visible).unwrap();
        }
        assert_eq!(visible, "a");
        for _ in 0..3 {
            visible = t.next(h, &visible).unwrap();
        }
        assert_eq!(visible, "my draft");
        assert_eq!(t.cursor(), Cursor::AtTip);
    }

    #[test]
    fn test_edits_survive_navigation() {
        let history = prompts(&["a", "b"]);
        let h = history.as_slice();
        let mut t = HistoryTraverser::default();

        assert_eq!(t.prev(h, "").as_deref(), Some("b"));
        assert_eq!(t.prev(h, "b edited").as_deref(), Some("a"));
        assert_eq!(t.next(h, "a").as_deref(), Some("b edited"));
        assert_eq!(history[1], "b");
    }

    #[test]
    fn test_reverting_edit_drops_it() {
        let history = prompts(&["a", "b"]);
        let h = history.as_slice();
        let mut t = HistoryTraverser::default();

        t.prev(h, "");
        t.prev(h, "changed");
        t.next(h, "a");
        t.prev(h, "b");
        assert_eq!(t.next(h, "a").as_deref(), Some("b"));
    }

    #[test]
    fn test_reset_behaves_like_fresh() {
        let history = prompts(&["a", "b"]);
        let h = history.as_slice();

        let mut used = HistoryTraverser::default();
        used.prev(h, "tip");
        used.prev(h, "b edited");
        used.reset();

        let mut fresh = HistoryTraverser::default();
        assert_eq!(used.prev(h, "new"), fresh.prev(h, "new"));
        assert_eq!(used.cursor(), fresh.cursor());
        assert_eq!(used.prev(h, "b"), fresh.prev(h, "b"));
    }

    #[test]
    fn test_stale_cursor_resets() {
        let long = prompts(&["a", "b", "c"]);
        let mut t = HistoryTraverser::default();
        t.prev(long.as_slice(), "");
        assert_eq!(t.cursor(), Cursor::Viewing(2));

        let short = prompts(&["a"]);
        assert_eq!(t.prev(short.as_slice(), "x").as_deref(), Some("a"));
        assert_eq!(t.cursor(), Cursor::Viewing(0));
    }
}
